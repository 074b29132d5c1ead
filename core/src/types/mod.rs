//! Runtime type descriptors and capability traits.
//!
//! Every [`Val`](crate::values::Val) reports a [`Type`]. A type is a name plus
//! a fixed [`Traits`] bitset describing which operator capabilities values of
//! that type support. Built-in types are process-wide statics; host object
//! types are created once by a [`TypeProvider`] and shared from there.

pub mod provider;


use std::borrow::Cow;
use std::fmt;

use bitflags::bitflags;

pub use provider::{
    Constructor, DefaultTypeAdapter, FieldType, ObjectType, TypeAdapter, TypeProvider,
    TypeRegistry,
};

bitflags! {
    /// Operator capabilities a type may support.
    ///
    /// Traits are independent: a type supports any combination of them and
    /// dispatch checks the bit, never a type hierarchy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Traits: u16 {
        const ADDER = 1 << 0;
        const COMPARER = 1 << 1;
        const CONTAINER = 1 << 2;
        const DIVIDER = 1 << 3;
        const FIELD_TESTER = 1 << 4;
        const INDEXER = 1 << 5;
        const ITERABLE = 1 << 6;
        const ITERATOR = 1 << 7;
        const MATCHER = 1 << 8;
        const MODDER = 1 << 9;
        const MULTIPLIER = 1 << 10;
        const NEGATER = 1 << 11;
        const RECEIVER = 1 << 12;
        const SIZER = 1 << 13;
        const SUBTRACTOR = 1 << 14;
    }
}

/// The variant family a type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Null,
    Duration,
    Timestamp,
    List,
    Map,
    Type,
    Object,
    Error,
    Unknown,
}

/// Immutable type descriptor.
///
/// Equality is by kind and name; two object types with the same name are the
/// same type regardless of which provider created them.
#[derive(Debug, Clone)]
pub struct Type {
    kind: TypeKind,
    name: Cow<'static, str>,
    traits: Traits,
}

impl Type {
    const fn builtin(kind: TypeKind, name: &'static str, traits: Traits) -> Self {
        Self {
            kind,
            name: Cow::Borrowed(name),
            traits,
        }
    }

    /// Creates a descriptor for a host object type.
    pub fn object(name: impl Into<Cow<'static, str>>, traits: Traits) -> Self {
        Self {
            kind: TypeKind::Object,
            name: name.into(),
            traits,
        }
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn traits(&self) -> Traits {
        self.traits
    }

    /// Returns true when every capability in `traits` is supported.
    pub fn has_trait(&self, traits: Traits) -> bool {
        self.traits.contains(traits)
    }

    /// Looks up one of the built-in types by its expression-level name.
    pub fn builtin_by_name(name: &str) -> Option<&'static Type> {
        BUILTIN_TYPES.iter().copied().find(|t| t.name() == name)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for Type {}

impl std::hash::Hash for Type {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Built-in types
// ============================================================================

pub static BOOL_TYPE: Type = Type::builtin(
    TypeKind::Bool,
    "bool",
    Traits::COMPARER.union(Traits::NEGATER),
);

pub static INT_TYPE: Type = Type::builtin(
    TypeKind::Int,
    "int",
    Traits::ADDER
        .union(Traits::COMPARER)
        .union(Traits::DIVIDER)
        .union(Traits::MODDER)
        .union(Traits::MULTIPLIER)
        .union(Traits::NEGATER)
        .union(Traits::SUBTRACTOR),
);

pub static UINT_TYPE: Type = Type::builtin(
    TypeKind::Uint,
    "uint",
    Traits::ADDER
        .union(Traits::COMPARER)
        .union(Traits::DIVIDER)
        .union(Traits::MODDER)
        .union(Traits::MULTIPLIER)
        .union(Traits::SUBTRACTOR),
);

pub static DOUBLE_TYPE: Type = Type::builtin(
    TypeKind::Double,
    "double",
    Traits::ADDER
        .union(Traits::COMPARER)
        .union(Traits::DIVIDER)
        .union(Traits::MULTIPLIER)
        .union(Traits::NEGATER)
        .union(Traits::SUBTRACTOR),
);

pub static STRING_TYPE: Type = Type::builtin(
    TypeKind::String,
    "string",
    Traits::ADDER
        .union(Traits::COMPARER)
        .union(Traits::MATCHER)
        .union(Traits::RECEIVER)
        .union(Traits::SIZER),
);

pub static BYTES_TYPE: Type = Type::builtin(
    TypeKind::Bytes,
    "bytes",
    Traits::ADDER.union(Traits::COMPARER).union(Traits::SIZER),
);

pub static NULL_TYPE: Type = Type::builtin(TypeKind::Null, "null_type", Traits::empty());

pub static DURATION_TYPE: Type = Type::builtin(
    TypeKind::Duration,
    "google.protobuf.Duration",
    Traits::ADDER
        .union(Traits::COMPARER)
        .union(Traits::NEGATER)
        .union(Traits::RECEIVER)
        .union(Traits::SUBTRACTOR),
);

pub static TIMESTAMP_TYPE: Type = Type::builtin(
    TypeKind::Timestamp,
    "google.protobuf.Timestamp",
    Traits::ADDER
        .union(Traits::COMPARER)
        .union(Traits::RECEIVER)
        .union(Traits::SUBTRACTOR),
);

pub static LIST_TYPE: Type = Type::builtin(
    TypeKind::List,
    "list",
    Traits::ADDER
        .union(Traits::CONTAINER)
        .union(Traits::INDEXER)
        .union(Traits::ITERABLE)
        .union(Traits::SIZER),
);

pub static MAP_TYPE: Type = Type::builtin(
    TypeKind::Map,
    "map",
    Traits::CONTAINER
        .union(Traits::FIELD_TESTER)
        .union(Traits::INDEXER)
        .union(Traits::ITERABLE)
        .union(Traits::SIZER),
);

pub static TYPE_TYPE: Type = Type::builtin(TypeKind::Type, "type", Traits::empty());

pub static ERROR_TYPE: Type = Type::builtin(TypeKind::Error, "error", Traits::empty());

pub static UNKNOWN_TYPE: Type = Type::builtin(TypeKind::Unknown, "unknown", Traits::empty());

static BUILTIN_TYPES: [&Type; 14] = [
    &BOOL_TYPE,
    &INT_TYPE,
    &UINT_TYPE,
    &DOUBLE_TYPE,
    &STRING_TYPE,
    &BYTES_TYPE,
    &NULL_TYPE,
    &DURATION_TYPE,
    &TIMESTAMP_TYPE,
    &LIST_TYPE,
    &MAP_TYPE,
    &TYPE_TYPE,
    &ERROR_TYPE,
    &UNKNOWN_TYPE,
];
