use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use ecow::{EcoString, EcoVec};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use super::{ErrorKind, EvalError, MapKey, MapValue, Object, UnknownSet};
use crate::types::{
    BOOL_TYPE, BYTES_TYPE, DOUBLE_TYPE, DURATION_TYPE, ERROR_TYPE, INT_TYPE, LIST_TYPE, MAP_TYPE,
    NULL_TYPE, STRING_TYPE, TIMESTAMP_TYPE, TYPE_TYPE, Type, UINT_TYPE, UNKNOWN_TYPE,
};

/// A runtime value.
///
/// `Err` and `Unknown` are ordinary values: operators and attributes pass
/// them through instead of failing, so a single evaluation always ends in a
/// `Val`.
#[derive(Clone)]
pub enum Val {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(EcoString),
    Bytes(EcoVec<u8>),
    Null,
    Duration(TimeDelta),
    Timestamp(DateTime<Utc>),
    List(EcoVec<Val>),
    Map(MapValue),
    Type(Type),
    Object(Arc<dyn Object>),
    Err(Arc<EvalError>),
    Unknown(UnknownSet),
}

impl Val {
    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn list(items: impl IntoIterator<Item = Val>) -> Val {
        Val::List(items.into_iter().collect())
    }

    /// Builds a map value. Unsupported key types and duplicate keys produce
    /// an error value.
    pub fn map(entries: impl IntoIterator<Item = (Val, Val)>) -> Val {
        let mut keyed = Vec::new();
        for (key, value) in entries {
            match MapKey::from_val(&key) {
                Some(k) => keyed.push((k, value)),
                None => {
                    return Val::error(
                        ErrorKind::InvalidArgument,
                        format!("unsupported map key type '{}'", key.ty()),
                    );
                }
            }
        }
        match MapValue::from_entries(keyed) {
            Ok(map) => Val::Map(map),
            Err(key) => Val::error(
                ErrorKind::InvalidArgument,
                format!("duplicate map key: {}", key),
            ),
        }
    }

    pub fn bytes(bytes: &[u8]) -> Val {
        Val::Bytes(EcoVec::from(bytes))
    }

    pub fn unknown(id: i64) -> Val {
        Val::Unknown(UnknownSet::new(id))
    }

    pub fn error(kind: ErrorKind, message: impl Into<EcoString>) -> Val {
        Val::Err(Arc::new(EvalError::new(kind, message)))
    }

    pub fn no_such_overload(function: &str, operands: &[&Val]) -> Val {
        let mut message = format!("no such overload: {}(", function);
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                message.push_str(", ");
            }
            message.push_str(operand.ty().name());
        }
        message.push(')');
        Val::error(ErrorKind::NoSuchOverload, message)
    }

    pub fn no_such_field(field: &str) -> Val {
        Val::error(ErrorKind::NoSuchField, format!("no such field '{}'", field))
    }

    pub fn no_such_key(key: &MapKey) -> Val {
        Val::error(ErrorKind::NoSuchKey, format!("no such key: {}", key))
    }

    pub fn index_out_of_bounds(index: impl fmt::Display) -> Val {
        Val::error(
            ErrorKind::IndexOutOfBounds,
            format!("index out of bounds: {}", index),
        )
    }

    pub fn conversion_error(from: &Type, to: &Type) -> Val {
        Val::error(
            ErrorKind::UnsupportedConversion,
            format!("type conversion error from '{}' to '{}'", from, to),
        )
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn ty(&self) -> &Type {
        match self {
            Val::Bool(_) => &BOOL_TYPE,
            Val::Int(_) => &INT_TYPE,
            Val::Uint(_) => &UINT_TYPE,
            Val::Double(_) => &DOUBLE_TYPE,
            Val::String(_) => &STRING_TYPE,
            Val::Bytes(_) => &BYTES_TYPE,
            Val::Null => &NULL_TYPE,
            Val::Duration(_) => &DURATION_TYPE,
            Val::Timestamp(_) => &TIMESTAMP_TYPE,
            Val::List(_) => &LIST_TYPE,
            Val::Map(_) => &MAP_TYPE,
            Val::Type(_) => &TYPE_TYPE,
            Val::Object(obj) => obj.ty(),
            Val::Err(_) => &ERROR_TYPE,
            Val::Unknown(_) => &UNKNOWN_TYPE,
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self, Val::Err(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Val::Unknown(_))
    }

    /// True for values that short-circuit strict evaluation.
    pub fn is_err_or_unknown(&self) -> bool {
        matches!(self, Val::Err(_) | Val::Unknown(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&EvalError> {
        match self {
            Val::Err(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_unknown(&self) -> Option<&UnknownSet> {
        match self {
            Val::Unknown(set) => Some(set),
            _ => None,
        }
    }

    /// Attaches an expression id to an error value. Other values pass through.
    pub fn with_expr_id(self, id: i64) -> Val {
        match self {
            Val::Err(err) if err.expr_id().is_none() => {
                Val::Err(Arc::new(EvalError::clone(&err).with_expr_id(id)))
            }
            other => other,
        }
    }

    // ========================================================================
    // Equality
    // ========================================================================

    /// Total equality.
    ///
    /// Values of different types are unequal. Only an `Err` or `Unknown`
    /// operand makes the result something other than a `Bool`.
    pub fn equal(&self, other: &Val) -> Val {
        if let Some(v) = propagate(&[self, other]) {
            return v;
        }
        let eq = match (self, other) {
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Uint(a), Val::Uint(b)) => a == b,
            (Val::Double(a), Val::Double(b)) => a == b,
            (Val::String(a), Val::String(b)) => a == b,
            (Val::Bytes(a), Val::Bytes(b)) => a == b,
            (Val::Null, Val::Null) => true,
            (Val::Duration(a), Val::Duration(b)) => a == b,
            (Val::Timestamp(a), Val::Timestamp(b)) => a == b,
            (Val::Type(a), Val::Type(b)) => a == b,
            (Val::Object(a), Val::Object(b)) => a.ty() == b.ty() && a.equal(b.as_ref()),
            (Val::List(a), Val::List(b)) => {
                if a.len() != b.len() {
                    return Val::Bool(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.equal(y) {
                        Val::Bool(true) => {}
                        other => return other,
                    }
                }
                true
            }
            (Val::Map(a), Val::Map(b)) => {
                if a.len() != b.len() {
                    return Val::Bool(false);
                }
                for (key, x) in a.iter() {
                    let Some(y) = b.get(key) else {
                        return Val::Bool(false);
                    };
                    match x.equal(y) {
                        Val::Bool(true) => {}
                        other => return other,
                    }
                }
                true
            }
            _ => false,
        };
        Val::Bool(eq)
    }
}

/// Picks the value a strict operation must return when some operand is
/// `Unknown` or `Err`.
///
/// All unknown sets are merged; otherwise the first error in operand order
/// is returned. `None` means every operand is a regular value.
pub fn propagate(operands: &[&Val]) -> Option<Val> {
    let mut unknown: Option<UnknownSet> = None;
    let mut first_err: Option<&Val> = None;
    for operand in operands {
        match operand {
            Val::Unknown(set) => {
                unknown = Some(match unknown {
                    Some(acc) => acc.merge(set),
                    None => set.clone(),
                });
            }
            Val::Err(_) if first_err.is_none() => first_err = Some(*operand),
            _ => {}
        }
    }
    match unknown {
        Some(set) => Some(Val::Unknown(set)),
        None => first_err.cloned(),
    }
}

// ============================================================================
// Trait impls
// ============================================================================

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Err(a), Val::Err(b)) => a.kind() == b.kind() && a.message() == b.message(),
            (Val::Unknown(a), Val::Unknown(b)) => a == b,
            (Val::Err(_) | Val::Unknown(_), _) | (_, Val::Err(_) | Val::Unknown(_)) => false,
            _ => matches!(self.equal(other), Val::Bool(true)),
        }
    }
}

impl fmt::Debug for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Err(err) => f
                .debug_struct("Err")
                .field("kind", &err.kind())
                .field("message", &err.message())
                .finish(),
            Val::Object(obj) => write!(f, "Object({:?})", obj),
            other => write!(f, "{}", other),
        }
    }
}

pub(crate) fn format_duration(d: &TimeDelta) -> String {
    let secs = d.num_seconds();
    let nanos = d.subsec_nanos();
    if nanos == 0 {
        return format!("{}s", secs);
    }
    let sign = if secs < 0 || nanos < 0 { "-" } else { "" };
    let frac = format!("{:09}", nanos.unsigned_abs());
    format!(
        "{}{}.{}s",
        sign,
        secs.unsigned_abs(),
        frac.trim_end_matches('0')
    )
}

pub(crate) fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Bool(b) => write!(f, "{}", b),
            Val::Int(i) => write!(f, "{}", i),
            Val::Uint(u) => write!(f, "{}u", u),
            Val::Double(d) => write!(f, "{:?}", d),
            Val::String(s) => write!(f, "{:?}", s.as_str()),
            Val::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Val::Null => write!(f, "null"),
            Val::Duration(d) => write!(f, "duration({:?})", format_duration(d)),
            Val::Timestamp(t) => write!(f, "timestamp({:?})", format_timestamp(t)),
            Val::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Val::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Val::Type(t) => write!(f, "{}", t),
            Val::Object(obj) => write!(f, "{}{{...}}", obj.ty()),
            Val::Err(err) => write!(f, "error: {}", err),
            Val::Unknown(set) => write!(f, "{}", set),
        }
    }
}

/// JSON-like shape: durations and timestamps as strings, map keys as their
/// string form. `Err` and `Unknown` cannot be serialized.
impl Serialize for Val {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Val::Bool(b) => serializer.serialize_bool(*b),
            Val::Int(i) => serializer.serialize_i64(*i),
            Val::Uint(u) => serializer.serialize_u64(*u),
            Val::Double(d) => serializer.serialize_f64(*d),
            Val::String(s) => serializer.serialize_str(s),
            Val::Bytes(b) => serializer.serialize_bytes(b),
            Val::Null => serializer.serialize_unit(),
            Val::Duration(d) => serializer.serialize_str(&format_duration(d)),
            Val::Timestamp(t) => serializer.serialize_str(&format_timestamp(t)),
            Val::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Val::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    match key {
                        MapKey::String(s) => out.serialize_entry(s.as_str(), value)?,
                        other => out.serialize_entry(&other.to_string(), value)?,
                    }
                }
                out.end()
            }
            Val::Type(t) => serializer.serialize_str(t.name()),
            Val::Object(obj) => {
                let fields = obj.fields();
                let mut out = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in &fields {
                    out.serialize_entry(name.as_str(), value)?;
                }
                out.end()
            }
            Val::Err(err) => Err(S::Error::custom(format!("cannot serialize error: {}", err))),
            Val::Unknown(set) => Err(S::Error::custom(format!("cannot serialize {}", set))),
        }
    }
}
