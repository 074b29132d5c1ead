use chrono::{DateTime, Utc};
use ecow::eco_format;

use super::ops::parse_duration;
use super::val::{format_duration, format_timestamp};
use super::{ErrorKind, Val};
use crate::types::{Type, TypeKind};

fn range_error(from: &Val, to: &Type) -> Val {
    Val::error(
        ErrorKind::Overflow,
        format!("range error converting {} to {}", from, to),
    )
}

// i64::MAX is not representable as f64; the nearest double rounds up to 2^63.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl Val {
    /// Converts to `target`, or returns an error naming the failed conversion.
    ///
    /// Converting to `type` yields the value's own type.
    pub fn convert_to_type(&self, target: &Type) -> Val {
        if self.is_err_or_unknown() {
            return self.clone();
        }
        if target.kind() == TypeKind::Type {
            return Val::Type(self.ty().clone());
        }
        if self.ty() == target {
            return self.clone();
        }
        match (self, target.kind()) {
            (Val::Int(i), TypeKind::Uint) => {
                u64::try_from(*i).map_or_else(|_| range_error(self, target), Val::Uint)
            }
            (Val::Int(i), TypeKind::Double) => Val::Double(*i as f64),
            (Val::Int(i), TypeKind::String) => Val::String(eco_format!("{}", i)),
            (Val::Int(i), TypeKind::Timestamp) => DateTime::<Utc>::from_timestamp(*i, 0)
                .map_or_else(|| range_error(self, target), Val::Timestamp),

            (Val::Uint(u), TypeKind::Int) => {
                i64::try_from(*u).map_or_else(|_| range_error(self, target), Val::Int)
            }
            (Val::Uint(u), TypeKind::Double) => Val::Double(*u as f64),
            (Val::Uint(u), TypeKind::String) => Val::String(eco_format!("{}", u)),

            (Val::Double(d), TypeKind::Int) => {
                if d.is_nan() || *d <= -I64_BOUND || *d >= I64_BOUND {
                    range_error(self, target)
                } else {
                    Val::Int(*d as i64)
                }
            }
            (Val::Double(d), TypeKind::Uint) => {
                if d.is_nan() || *d < 0.0 || *d >= U64_BOUND {
                    range_error(self, target)
                } else {
                    Val::Uint(*d as u64)
                }
            }
            (Val::Double(d), TypeKind::String) => Val::String(eco_format!("{}", d)),

            (Val::String(s), TypeKind::Int) => s
                .parse::<i64>()
                .map_or_else(|_| Val::conversion_error(self.ty(), target), Val::Int),
            (Val::String(s), TypeKind::Uint) => s
                .parse::<u64>()
                .map_or_else(|_| Val::conversion_error(self.ty(), target), Val::Uint),
            (Val::String(s), TypeKind::Double) => s
                .parse::<f64>()
                .map_or_else(|_| Val::conversion_error(self.ty(), target), Val::Double),
            (Val::String(s), TypeKind::Bool) => parse_bool(s)
                .map_or_else(|| Val::conversion_error(self.ty(), target), Val::Bool),
            (Val::String(s), TypeKind::Bytes) => Val::bytes(s.as_bytes()),
            (Val::String(s), TypeKind::Duration) => parse_duration(s).map_or_else(
                || Val::conversion_error(self.ty(), target),
                Val::Duration,
            ),
            (Val::String(s), TypeKind::Timestamp) => DateTime::parse_from_rfc3339(s)
                .map_or_else(
                    |_| Val::conversion_error(self.ty(), target),
                    |t| Val::Timestamp(t.with_timezone(&Utc)),
                ),

            (Val::Bytes(b), TypeKind::String) => std::str::from_utf8(b)
                .map_or_else(|_| Val::conversion_error(self.ty(), target), Val::from),

            (Val::Bool(b), TypeKind::String) => Val::from(if *b { "true" } else { "false" }),

            (Val::Duration(d), TypeKind::String) => Val::from(format_duration(d).as_str()),
            (Val::Duration(d), TypeKind::Int) => Val::Int(d.num_seconds()),

            (Val::Timestamp(t), TypeKind::String) => Val::from(format_timestamp(t).as_str()),
            (Val::Timestamp(t), TypeKind::Int) => Val::Int(t.timestamp()),

            _ => Val::conversion_error(self.ty(), target),
        }
    }
}
