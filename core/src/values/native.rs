//! Conversions between [`Val`] and native Rust values.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use ecow::{EcoString, EcoVec};

use super::{ErrorKind, EvalError, MapValue, Val};

// ============================================================================
// Native -> Val
// ============================================================================

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<i64> for Val {
    fn from(i: i64) -> Self {
        Val::Int(i)
    }
}

impl From<i32> for Val {
    fn from(i: i32) -> Self {
        Val::Int(i64::from(i))
    }
}

impl From<u64> for Val {
    fn from(u: u64) -> Self {
        Val::Uint(u)
    }
}

impl From<u32> for Val {
    fn from(u: u32) -> Self {
        Val::Uint(u64::from(u))
    }
}

impl From<f64> for Val {
    fn from(d: f64) -> Self {
        Val::Double(d)
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::String(EcoString::from(s))
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::String(EcoString::from(s))
    }
}

impl From<EcoString> for Val {
    fn from(s: EcoString) -> Self {
        Val::String(s)
    }
}

impl From<TimeDelta> for Val {
    fn from(d: TimeDelta) -> Self {
        Val::Duration(d)
    }
}

impl From<DateTime<Utc>> for Val {
    fn from(t: DateTime<Utc>) -> Self {
        Val::Timestamp(t)
    }
}

impl From<Vec<Val>> for Val {
    fn from(items: Vec<Val>) -> Self {
        Val::List(EcoVec::from(items))
    }
}

impl From<MapValue> for Val {
    fn from(map: MapValue) -> Self {
        Val::Map(map)
    }
}

impl From<EvalError> for Val {
    fn from(err: EvalError) -> Self {
        Val::Err(Arc::new(err))
    }
}

// ============================================================================
// Val -> Native
// ============================================================================

/// Native shapes a [`Val`] can be converted into.
pub trait FromVal: Sized {
    fn from_val(val: &Val) -> Result<Self, EvalError>;
}

fn unsupported<T>(val: &Val) -> Result<T, EvalError> {
    if let Val::Err(err) = val {
        return Err(EvalError::clone(err));
    }
    Err(EvalError::new(
        ErrorKind::UnsupportedConversion,
        format!(
            "type conversion error from '{}' to '{}'",
            val.ty(),
            std::any::type_name::<T>()
        ),
    ))
}

impl Val {
    /// Converts to a native Rust shape, e.g. `i64`, `String` or `Vec<T>`.
    pub fn convert_to_native<T: FromVal>(&self) -> Result<T, EvalError> {
        T::from_val(self)
    }
}

impl FromVal for Val {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        Ok(val.clone())
    }
}

impl FromVal for bool {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Bool(b) => Ok(*b),
            _ => unsupported(val),
        }
    }
}

impl FromVal for i64 {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Int(i) => Ok(*i),
            _ => unsupported(val),
        }
    }
}

impl FromVal for i32 {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Int(i) => i32::try_from(*i).or_else(|_| unsupported(val)),
            _ => unsupported(val),
        }
    }
}

impl FromVal for u64 {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Uint(u) => Ok(*u),
            _ => unsupported(val),
        }
    }
}

impl FromVal for u32 {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Uint(u) => u32::try_from(*u).or_else(|_| unsupported(val)),
            _ => unsupported(val),
        }
    }
}

impl FromVal for f64 {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Double(d) => Ok(*d),
            _ => unsupported(val),
        }
    }
}

impl FromVal for String {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::String(s) => Ok(s.to_string()),
            _ => unsupported(val),
        }
    }
}

impl FromVal for EcoString {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::String(s) => Ok(s.clone()),
            _ => unsupported(val),
        }
    }
}

impl FromVal for EcoVec<u8> {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Bytes(b) => Ok(b.clone()),
            _ => unsupported(val),
        }
    }
}

impl FromVal for TimeDelta {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Duration(d) => Ok(*d),
            _ => unsupported(val),
        }
    }
}

impl FromVal for DateTime<Utc> {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Timestamp(t) => Ok(*t),
            _ => unsupported(val),
        }
    }
}

impl<T: FromVal> FromVal for Option<T> {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Null => Ok(None),
            other => T::from_val(other).map(Some),
        }
    }
}

impl<T: FromVal> FromVal for Vec<T> {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::List(items) => items.iter().map(T::from_val).collect(),
            _ => unsupported(val),
        }
    }
}

impl<K: FromVal + Eq + Hash, V: FromVal> FromVal for HashMap<K, V> {
    fn from_val(val: &Val) -> Result<Self, EvalError> {
        match val {
            Val::Map(map) => map
                .iter()
                .map(|(k, v)| Ok((K::from_val(&k.to_val())?, V::from_val(v)?)))
                .collect(),
            _ => unsupported(val),
        }
    }
}
