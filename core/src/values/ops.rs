//! Operator trait methods on [`Val`].
//!
//! Each method checks its operands' variants itself and answers
//! `NoSuchOverload` for unsupported combinations, so callers never observe a
//! Rust-level type failure. `Err`/`Unknown` operands propagate first.

use std::cmp::Ordering;

use ecow::EcoString;
use once_cell::sync::Lazy;
use regex::Regex;

use super::val::propagate;
use super::{ErrorKind, MapKey, Val};

fn int_overflow() -> Val {
    Val::error(ErrorKind::Overflow, "integer overflow")
}

fn uint_overflow() -> Val {
    Val::error(ErrorKind::Overflow, "unsigned integer overflow")
}

fn duration_overflow() -> Val {
    Val::error(ErrorKind::Overflow, "duration overflow")
}

fn timestamp_overflow() -> Val {
    Val::error(ErrorKind::Overflow, "timestamp overflow")
}

macro_rules! propagate_or {
    ($($operand:expr),+) => {
        if let Some(v) = propagate(&[$($operand),+]) {
            return v;
        }
    };
}

impl Val {
    // ========================================================================
    // Arithmetic
    // ========================================================================

    pub fn add(&self, other: &Val) -> Val {
        propagate_or!(self, other);
        match (self, other) {
            (Val::Int(a), Val::Int(b)) => a.checked_add(*b).map_or_else(int_overflow, Val::Int),
            (Val::Uint(a), Val::Uint(b)) => a.checked_add(*b).map_or_else(uint_overflow, Val::Uint),
            (Val::Double(a), Val::Double(b)) => Val::Double(a + b),
            (Val::String(a), Val::String(b)) => {
                let mut s = EcoString::with_capacity(a.len() + b.len());
                s.push_str(a);
                s.push_str(b);
                Val::String(s)
            }
            (Val::Bytes(a), Val::Bytes(b)) => {
                let mut out = a.clone();
                out.extend_from_slice(b);
                Val::Bytes(out)
            }
            (Val::List(a), Val::List(b)) => {
                if a.is_empty() {
                    return Val::List(b.clone());
                }
                let mut out = a.clone();
                out.extend_from_slice(b);
                Val::List(out)
            }
            (Val::Duration(a), Val::Duration(b)) => a
                .checked_add(b)
                .map_or_else(duration_overflow, Val::Duration),
            (Val::Timestamp(t), Val::Duration(d)) | (Val::Duration(d), Val::Timestamp(t)) => t
                .checked_add_signed(*d)
                .map_or_else(timestamp_overflow, Val::Timestamp),
            _ => Val::no_such_overload("_+_", &[self, other]),
        }
    }

    pub fn subtract(&self, other: &Val) -> Val {
        propagate_or!(self, other);
        match (self, other) {
            (Val::Int(a), Val::Int(b)) => a.checked_sub(*b).map_or_else(int_overflow, Val::Int),
            (Val::Uint(a), Val::Uint(b)) => a.checked_sub(*b).map_or_else(uint_overflow, Val::Uint),
            (Val::Double(a), Val::Double(b)) => Val::Double(a - b),
            (Val::Duration(a), Val::Duration(b)) => a
                .checked_sub(b)
                .map_or_else(duration_overflow, Val::Duration),
            (Val::Timestamp(a), Val::Timestamp(b)) => Val::Duration(a.signed_duration_since(*b)),
            (Val::Timestamp(t), Val::Duration(d)) => t
                .checked_sub_signed(*d)
                .map_or_else(timestamp_overflow, Val::Timestamp),
            _ => Val::no_such_overload("_-_", &[self, other]),
        }
    }

    pub fn multiply(&self, other: &Val) -> Val {
        propagate_or!(self, other);
        match (self, other) {
            (Val::Int(a), Val::Int(b)) => a.checked_mul(*b).map_or_else(int_overflow, Val::Int),
            (Val::Uint(a), Val::Uint(b)) => a.checked_mul(*b).map_or_else(uint_overflow, Val::Uint),
            (Val::Double(a), Val::Double(b)) => Val::Double(a * b),
            _ => Val::no_such_overload("_*_", &[self, other]),
        }
    }

    pub fn divide(&self, other: &Val) -> Val {
        propagate_or!(self, other);
        match (self, other) {
            (Val::Int(_), Val::Int(0)) | (Val::Uint(_), Val::Uint(0)) => {
                Val::error(ErrorKind::DivideByZero, "divide by zero")
            }
            (Val::Int(a), Val::Int(b)) => a.checked_div(*b).map_or_else(int_overflow, Val::Int),
            (Val::Uint(a), Val::Uint(b)) => Val::Uint(a / b),
            (Val::Double(a), Val::Double(b)) => Val::Double(a / b),
            _ => Val::no_such_overload("_/_", &[self, other]),
        }
    }

    pub fn modulo(&self, other: &Val) -> Val {
        propagate_or!(self, other);
        match (self, other) {
            (Val::Int(_), Val::Int(0)) | (Val::Uint(_), Val::Uint(0)) => {
                Val::error(ErrorKind::DivideByZero, "modulus by zero")
            }
            (Val::Int(a), Val::Int(b)) => a.checked_rem(*b).map_or_else(int_overflow, Val::Int),
            (Val::Uint(a), Val::Uint(b)) => Val::Uint(a % b),
            _ => Val::no_such_overload("_%_", &[self, other]),
        }
    }

    pub fn negate(&self) -> Val {
        propagate_or!(self);
        match self {
            Val::Int(i) => i.checked_neg().map_or_else(int_overflow, Val::Int),
            Val::Double(d) => Val::Double(-d),
            Val::Duration(d) => chrono::TimeDelta::zero()
                .checked_sub(d)
                .map_or_else(duration_overflow, Val::Duration),
            _ => Val::no_such_overload("-_", &[self]),
        }
    }

    pub fn logical_not(&self) -> Val {
        propagate_or!(self);
        match self {
            Val::Bool(b) => Val::Bool(!b),
            _ => Val::no_such_overload("!_", &[self]),
        }
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Three-way comparison: `Int(-1)`, `Int(0)` or `Int(1)`.
    ///
    /// Only values of the same type are ordered. NaN has no order.
    pub fn compare(&self, other: &Val) -> Val {
        propagate_or!(self, other);
        let ordering = match (self, other) {
            (Val::Bool(a), Val::Bool(b)) => a.cmp(b),
            (Val::Int(a), Val::Int(b)) => a.cmp(b),
            (Val::Uint(a), Val::Uint(b)) => a.cmp(b),
            (Val::Double(a), Val::Double(b)) => match a.partial_cmp(b) {
                Some(ordering) => ordering,
                None => {
                    return Val::error(ErrorKind::InvalidArgument, "NaN values cannot be ordered");
                }
            },
            (Val::String(a), Val::String(b)) => a.cmp(b),
            (Val::Bytes(a), Val::Bytes(b)) => a.as_slice().cmp(b.as_slice()),
            (Val::Duration(a), Val::Duration(b)) => a.cmp(b),
            (Val::Timestamp(a), Val::Timestamp(b)) => a.cmp(b),
            _ => return Val::no_such_overload("compare", &[self, other]),
        };
        Val::Int(match ordering {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        })
    }

    // ========================================================================
    // Indexing, selection, size and membership
    // ========================================================================

    /// `self[key]` for lists, maps and objects.
    ///
    /// Negative list indices count from the end.
    pub fn index(&self, key: &Val) -> Val {
        propagate_or!(self, key);
        match self {
            Val::List(items) => {
                let raw = match key {
                    Val::Int(i) => *i,
                    Val::Uint(u) => match i64::try_from(*u) {
                        Ok(i) => i,
                        Err(_) => return Val::index_out_of_bounds(u),
                    },
                    _ => return Val::no_such_overload("_[_]", &[self, key]),
                };
                match list_position(raw, items.len()) {
                    Some(pos) => items[pos].clone(),
                    None => Val::index_out_of_bounds(raw),
                }
            }
            Val::Map(_) => match MapKey::from_val(key) {
                Some(k) => self.index_key(&k),
                None => {
                    tracing::trace!(key_type = key.ty().name(), "Unsupported map key type");
                    Val::no_such_overload("_[_]", &[self, key])
                }
            },
            Val::Object(obj) => match key {
                Val::String(field) => obj.get(field).unwrap_or_else(|| Val::no_such_field(field)),
                _ => Val::no_such_overload("_[_]", &[self, key]),
            },
            _ => Val::no_such_overload("_[_]", &[self, key]),
        }
    }

    /// Map lookup with a precomputed key. Non-maps fall back to [`Val::index`].
    pub fn index_key(&self, key: &MapKey) -> Val {
        match self {
            Val::Map(map) => map
                .get(key)
                .cloned()
                .unwrap_or_else(|| Val::no_such_key(key)),
            _ => self.index(&key.to_val()),
        }
    }

    /// `self.field` on maps and objects.
    pub fn select_field(&self, field: &MapKey) -> Val {
        propagate_or!(self);
        match (self, field) {
            (Val::Map(_), _) => self.index_key(field),
            (Val::Object(obj), MapKey::String(name)) => {
                obj.get(name).unwrap_or_else(|| Val::no_such_field(name))
            }
            _ => Val::error(
                ErrorKind::NoSuchField,
                format!("type '{}' does not support field selection", self.ty()),
            ),
        }
    }

    /// Presence test behind `has(self.field)`.
    pub fn has_field(&self, field: &str) -> Val {
        propagate_or!(self);
        match self {
            Val::Map(map) => Val::Bool(map.contains_key(&MapKey::from(field))),
            Val::Object(obj) => Val::Bool(obj.is_set(field)),
            _ => Val::no_such_overload("has", &[self]),
        }
    }

    pub fn size(&self) -> Val {
        propagate_or!(self);
        let len = match self {
            Val::String(s) => s.chars().count(),
            Val::Bytes(b) => b.len(),
            Val::List(items) => items.len(),
            Val::Map(map) => map.len(),
            _ => return Val::no_such_overload("size", &[self]),
        };
        i64::try_from(len).map_or_else(|_| int_overflow(), Val::Int)
    }

    /// Membership test where `self` is the container, as in `elem in self`.
    pub fn contains(&self, elem: &Val) -> Val {
        propagate_or!(self, elem);
        match self {
            Val::List(items) => {
                let mut failure: Option<Val> = None;
                for item in items.iter() {
                    match item.equal(elem) {
                        Val::Bool(true) => return Val::Bool(true),
                        Val::Bool(false) => {}
                        other => {
                            failure.get_or_insert(other);
                        }
                    }
                }
                failure.unwrap_or(Val::Bool(false))
            }
            Val::Map(map) => Val::Bool(MapKey::from_val(elem).is_some_and(|k| map.contains_key(&k))),
            _ => Val::no_such_overload("@in", &[elem, self]),
        }
    }

    /// RE2-style full-text search of `pattern` within `self`.
    pub fn matches(&self, pattern: &Val) -> Val {
        propagate_or!(self, pattern);
        match (self, pattern) {
            (Val::String(text), Val::String(pattern)) => match Regex::new(pattern) {
                Ok(re) => Val::Bool(re.is_match(text)),
                Err(err) => Val::Err(std::sync::Arc::new(
                    super::EvalError::new(
                        ErrorKind::InvalidArgument,
                        format!("invalid regular expression '{}'", pattern),
                    )
                    .with_cause(err),
                )),
            },
            _ => Val::no_such_overload("matches", &[self, pattern]),
        }
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Iterates list elements, or map keys in insertion order.
    ///
    /// Returns `None` for types without the `Iterable` capability.
    pub fn iter(&self) -> Option<ValIter<'_>> {
        match self {
            Val::List(items) => Some(ValIter::List(items.iter())),
            Val::Map(map) => Some(ValIter::Map(Box::new(map.keys()))),
            _ => None,
        }
    }

    /// Number of iterations [`Val::iter`] would produce.
    pub fn iter_len(&self) -> Option<usize> {
        match self {
            Val::List(items) => Some(items.len()),
            Val::Map(map) => Some(map.len()),
            _ => None,
        }
    }
}

/// Iterator over an iterable [`Val`].
pub enum ValIter<'a> {
    List(std::slice::Iter<'a, Val>),
    Map(Box<dyn Iterator<Item = &'a MapKey> + 'a>),
}

impl Iterator for ValIter<'_> {
    type Item = Val;

    fn next(&mut self) -> Option<Val> {
        match self {
            ValIter::List(iter) => iter.next().cloned(),
            ValIter::Map(iter) => iter.next().map(MapKey::to_val),
        }
    }
}

fn list_position(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let pos = if index < 0 { index + len } else { index };
    if (0..len).contains(&pos) {
        usize::try_from(pos).ok()
    } else {
        None
    }
}

static DURATION_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h)").expect("static regex")
});

/// Parses Go-style duration strings such as `1h30m`, `-1.5s` or `100ms`.
pub(crate) fn parse_duration(text: &str) -> Option<chrono::TimeDelta> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if body == "0" {
        return Some(chrono::TimeDelta::zero());
    }
    if body.is_empty() {
        return None;
    }
    let mut consumed = 0;
    let mut nanos: i128 = 0;
    for caps in DURATION_PART.captures_iter(body) {
        let whole = caps.get(0)?;
        if whole.start() != consumed {
            return None;
        }
        consumed = whole.end();
        let unit: i128 = match &caps[2] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return None,
        };
        let number = &caps[1];
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        let int_value: i128 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
        nanos = nanos.checked_add(int_value.checked_mul(unit)?)?;
        if !frac_part.is_empty() {
            let digits = frac_part.len().min(18);
            let frac: i128 = frac_part[..digits].parse().ok()?;
            let scale = 10i128.pow(u32::try_from(digits).ok()?);
            nanos = nanos.checked_add(frac * unit / scale)?;
        }
    }
    if consumed != body.len() {
        return None;
    }
    if negative {
        nanos = -nanos;
    }
    let nanos = i64::try_from(nanos).ok()?;
    Some(chrono::TimeDelta::nanoseconds(nanos))
}
