//! Function names used for operators and built-in functions.

pub const ADD: &str = "_+_";
pub const SUBTRACT: &str = "_-_";
pub const MULTIPLY: &str = "_*_";
pub const DIVIDE: &str = "_/_";
pub const MODULO: &str = "_%_";
pub const NEGATE: &str = "-_";
pub const LOGICAL_NOT: &str = "!_";
pub const LOGICAL_AND: &str = "_&&_";
pub const LOGICAL_OR: &str = "_||_";
pub const CONDITIONAL: &str = "_?_:_";
pub const EQUALS: &str = "_==_";
pub const NOT_EQUALS: &str = "_!=_";
pub const LESS: &str = "_<_";
pub const LESS_EQUALS: &str = "_<=_";
pub const GREATER: &str = "_>_";
pub const GREATER_EQUALS: &str = "_>=_";
pub const INDEX: &str = "_[_]";
pub const IN: &str = "@in";
pub const OLD_IN: &str = "in";
pub const NOT_STRICTLY_FALSE: &str = "@not_strictly_false";
pub const OLD_NOT_STRICTLY_FALSE: &str = "__not_strictly_false__";

pub const SIZE: &str = "size";
pub const MATCHES: &str = "matches";
pub const CONTAINS: &str = "contains";
pub const STARTS_WITH: &str = "startsWith";
pub const ENDS_WITH: &str = "endsWith";

pub const HAS: &str = "has";
pub const ALL: &str = "all";
pub const EXISTS: &str = "exists";
pub const EXISTS_ONE: &str = "exists_one";
pub const MAP: &str = "map";
pub const FILTER: &str = "filter";

pub const TO_INT: &str = "int";
pub const TO_UINT: &str = "uint";
pub const TO_DOUBLE: &str = "double";
pub const TO_STRING: &str = "string";
pub const TO_BYTES: &str = "bytes";
pub const TO_BOOL: &str = "bool";
pub const TO_TIMESTAMP: &str = "timestamp";
pub const TO_DURATION: &str = "duration";
pub const TO_TYPE: &str = "type";
pub const TO_DYN: &str = "dyn";

/// Timestamp and duration accessors, dispatched to the receiver.
pub const TIME_ACCESSORS: [&str; 10] = [
    "getFullYear",
    "getMonth",
    "getDayOfYear",
    "getDate",
    "getDayOfMonth",
    "getDayOfWeek",
    "getHours",
    "getMinutes",
    "getSeconds",
    "getMilliseconds",
];

/// True for the logical operators the planner compiles into short-circuit
/// nodes.
pub fn is_logical(function: &str) -> bool {
    matches!(function, LOGICAL_AND | LOGICAL_OR | CONDITIONAL)
}
