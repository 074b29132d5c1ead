//! Contracts for host type integration.
//!
//! A [`TypeProvider`] describes host object types (their fields and how to
//! construct them) and a [`TypeAdapter`] turns host-native values into
//! [`Val`]s. Both are supplied by the embedding application; the engine only
//! relies on the traits. [`TypeRegistry`] and [`DefaultTypeAdapter`] are small
//! default implementations good enough for records assembled in Rust.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use ecow::EcoString;
use hashbrown::HashMap;

use super::{Traits, Type};
use crate::values::{ErrorKind, Object, Record, Val};

/// Describes host object types to the planner and the evaluator.
pub trait TypeProvider: Send + Sync {
    /// Returns the type registered under `type_name`, if any.
    fn find_type(&self, type_name: &str) -> Option<Type>;

    /// Returns the accessor for `field` on the object type `type_name`.
    fn find_field_type(&self, type_name: &str, field: &str) -> Option<FieldType>;

    /// Resolves an identifier that no variable binds, e.g. a type name.
    fn find_ident(&self, ident: &str) -> Option<Val> {
        Type::builtin_by_name(ident).map(|t| Val::Type(t.clone()))
    }

    /// Constructs an object of `type_name` from named field values.
    fn new_value(&self, type_name: &str, fields: Vec<(EcoString, Val)>) -> Val;
}

/// Converts host-native values into [`Val`]s.
pub trait TypeAdapter: Send + Sync {
    fn native_to_value(&self, value: &(dyn Any + Send + Sync)) -> Val;
}

type FieldTester = Arc<dyn Fn(&dyn Object) -> bool + Send + Sync>;
type FieldGetter = Arc<dyn Fn(&dyn Object) -> Val + Send + Sync>;

/// Structured accessor for one field of a host object type.
///
/// Attribute qualifiers that name a declared field use this getter directly
/// instead of going through generic field lookup.
#[derive(Clone)]
pub struct FieldType {
    ty: Type,
    is_set: FieldTester,
    get_from: FieldGetter,
}

impl FieldType {
    pub fn new(
        ty: Type,
        is_set: impl Fn(&dyn Object) -> bool + Send + Sync + 'static,
        get_from: impl Fn(&dyn Object) -> Val + Send + Sync + 'static,
    ) -> Self {
        Self {
            ty,
            is_set: Arc::new(is_set),
            get_from: Arc::new(get_from),
        }
    }

    /// Field accessor backed by [`Object::get`] and [`Object::is_set`].
    pub fn accessor(name: &str, ty: Type) -> Self {
        let get_name = EcoString::from(name);
        let set_name = get_name.clone();
        Self::new(
            ty,
            move |obj| obj.is_set(&set_name),
            move |obj| {
                obj.get(&get_name)
                    .unwrap_or_else(|| Val::no_such_field(&get_name))
            },
        )
    }

    /// Declared type of the field.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_set(&self, obj: &dyn Object) -> bool {
        (self.is_set)(obj)
    }

    pub fn get_from(&self, obj: &dyn Object) -> Val {
        (self.get_from)(obj)
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldType").field("ty", &self.ty).finish()
    }
}

/// Builds an object of a registered type from its field values.
pub type Constructor = Arc<dyn Fn(&Type, Vec<(EcoString, Val)>) -> Val + Send + Sync>;

/// Declaration of a host object type for [`TypeRegistry`].
#[derive(Clone)]
pub struct ObjectType {
    ty: Type,
    fields: HashMap<EcoString, FieldType>,
    constructor: Option<Constructor>,
}

impl ObjectType {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            ty: Type::object(name, Traits::FIELD_TESTER | Traits::INDEXER | Traits::RECEIVER),
            fields: HashMap::new(),
            constructor: None,
        }
    }

    /// Declares a field read through [`Object::get`].
    pub fn field(self, name: &str, ty: &Type) -> Self {
        let accessor = FieldType::accessor(name, ty.clone());
        self.field_with(name, accessor)
    }

    /// Declares a field with a custom accessor.
    pub fn field_with(mut self, name: &str, field: FieldType) -> Self {
        self.fields.insert(EcoString::from(name), field);
        self
    }

    /// Replaces the default [`Record`] constructor.
    pub fn constructor(
        mut self,
        ctor: impl Fn(&Type, Vec<(EcoString, Val)>) -> Val + Send + Sync + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(ctor));
        self
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

/// Default [`TypeProvider`]: a table of declared object types.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<EcoString, ObjectType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, object_type: ObjectType) -> &mut Self {
        tracing::debug!(type_name = object_type.ty.name(), "Registering object type");
        self.types
            .insert(EcoString::from(object_type.ty.name()), object_type);
        self
    }
}

impl TypeProvider for TypeRegistry {
    fn find_type(&self, type_name: &str) -> Option<Type> {
        self.types
            .get(type_name)
            .map(|t| t.ty.clone())
            .or_else(|| Type::builtin_by_name(type_name).cloned())
    }

    fn find_field_type(&self, type_name: &str, field: &str) -> Option<FieldType> {
        self.types.get(type_name)?.fields.get(field).cloned()
    }

    fn find_ident(&self, ident: &str) -> Option<Val> {
        self.find_type(ident).map(Val::Type)
    }

    fn new_value(&self, type_name: &str, fields: Vec<(EcoString, Val)>) -> Val {
        let Some(object_type) = self.types.get(type_name) else {
            return Val::error(
                ErrorKind::InvalidArgument,
                format!("unknown type '{}'", type_name),
            );
        };
        if let Some((name, _)) = fields
            .iter()
            .find(|(name, _)| !object_type.fields.contains_key(name))
        {
            return Val::no_such_field(name);
        }
        match &object_type.constructor {
            Some(ctor) => ctor(&object_type.ty, fields),
            None => Val::Object(Arc::new(Record::new(object_type.ty.clone(), fields))),
        }
    }
}

/// Adapter for plain Rust primitives, strings, chrono values and [`Val`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeAdapter;

impl TypeAdapter for DefaultTypeAdapter {
    fn native_to_value(&self, value: &(dyn Any + Send + Sync)) -> Val {
        if let Some(v) = value.downcast_ref::<Val>() {
            return v.clone();
        }
        if let Some(v) = value.downcast_ref::<bool>() {
            return Val::Bool(*v);
        }
        if let Some(v) = value.downcast_ref::<i64>() {
            return Val::Int(*v);
        }
        if let Some(v) = value.downcast_ref::<i32>() {
            return Val::Int(i64::from(*v));
        }
        if let Some(v) = value.downcast_ref::<u64>() {
            return Val::Uint(*v);
        }
        if let Some(v) = value.downcast_ref::<u32>() {
            return Val::Uint(u64::from(*v));
        }
        if let Some(v) = value.downcast_ref::<f64>() {
            return Val::Double(*v);
        }
        if let Some(v) = value.downcast_ref::<String>() {
            return Val::from(v.as_str());
        }
        if let Some(v) = value.downcast_ref::<&'static str>() {
            return Val::from(*v);
        }
        if let Some(v) = value.downcast_ref::<Vec<u8>>() {
            return Val::bytes(v);
        }
        if let Some(v) = value.downcast_ref::<TimeDelta>() {
            return Val::Duration(*v);
        }
        if let Some(v) = value.downcast_ref::<DateTime<Utc>>() {
            return Val::Timestamp(*v);
        }
        if let Some(v) = value.downcast_ref::<Vec<Val>>() {
            return Val::list(v.iter().cloned());
        }
        if let Some(v) = value.downcast_ref::<Vec<String>>() {
            return Val::list(v.iter().map(|s| Val::from(s.as_str())));
        }
        if let Some(v) = value.downcast_ref::<Vec<i64>>() {
            return Val::list(v.iter().copied().map(Val::Int));
        }
        Val::error(
            ErrorKind::UnsupportedConversion,
            "unsupported conversion from native value",
        )
    }
}
