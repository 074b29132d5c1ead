//! Receiver-style method calls: `value.function(args...)`.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

use super::val::propagate;
use super::{ErrorKind, Val};
use crate::types::Traits;

fn parse_time_zone(tz: &str) -> Option<FixedOffset> {
    if tz == "UTC" || tz == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => (1, tz),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn timestamp_accessor(t: &DateTime<Utc>, function: &str, args: &[Val]) -> Option<Val> {
    let offset = match args {
        [] => FixedOffset::east_opt(0)?,
        [Val::String(tz)] => match parse_time_zone(tz) {
            Some(offset) => offset,
            None => {
                return Some(Val::error(
                    ErrorKind::InvalidArgument,
                    format!("unsupported time zone '{}'", tz),
                ));
            }
        },
        _ => return None,
    };
    let local = t.with_timezone(&offset);
    let value = match function {
        "getFullYear" => i64::from(local.year()),
        "getMonth" => i64::from(local.month0()),
        "getDayOfYear" => i64::from(local.ordinal0()),
        "getDate" => i64::from(local.day()),
        "getDayOfMonth" => i64::from(local.day0()),
        "getDayOfWeek" => i64::from(local.weekday().num_days_from_sunday()),
        "getHours" => i64::from(local.hour()),
        "getMinutes" => i64::from(local.minute()),
        "getSeconds" => i64::from(local.second()),
        "getMilliseconds" => i64::from(local.nanosecond() / 1_000_000),
        _ => return None,
    };
    Some(Val::Int(value))
}

impl Val {
    /// Dispatches `self.function(args...)` on types with the `Receiver`
    /// capability.
    pub fn receive(&self, function: &str, args: &[Val]) -> Val {
        let mut operands: Vec<&Val> = Vec::with_capacity(args.len() + 1);
        operands.push(self);
        operands.extend(args.iter());
        if let Some(v) = propagate(&operands) {
            return v;
        }
        if !self.ty().has_trait(Traits::RECEIVER) {
            return Val::no_such_overload(function, &operands);
        }
        let result = match (self, args) {
            (Val::String(s), [Val::String(arg)]) => match function {
                "contains" => Some(Val::Bool(s.contains(arg.as_str()))),
                "startsWith" => Some(Val::Bool(s.starts_with(arg.as_str()))),
                "endsWith" => Some(Val::Bool(s.ends_with(arg.as_str()))),
                _ => None,
            },
            (Val::Timestamp(t), _) => timestamp_accessor(t, function, args),
            (Val::Duration(d), []) => match function {
                "getHours" => Some(Val::Int(d.num_hours())),
                "getMinutes" => Some(Val::Int(d.num_minutes())),
                "getSeconds" => Some(Val::Int(d.num_seconds())),
                "getMilliseconds" => Some(Val::Int(d.num_milliseconds())),
                _ => None,
            },
            (Val::Object(obj), _) => obj.receive(function, args),
            _ => None,
        };
        result.unwrap_or_else(|| Val::no_such_overload(function, &operands))
    }
}
