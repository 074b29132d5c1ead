use std::any::Any;
use std::fmt;

use ecow::EcoString;

use super::Val;
use crate::types::Type;

/// A host-backed value.
///
/// Implementations expose their fields by name and may answer receiver-style
/// method calls. They must be immutable once handed to the engine.
pub trait Object: fmt::Debug + Send + Sync {
    fn ty(&self) -> &Type;

    /// Value of `field`, or `None` when the object has no such field.
    fn get(&self, field: &str) -> Option<Val>;

    fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    fn equal(&self, other: &dyn Object) -> bool;

    /// Handles `obj.function(args...)`. `None` means the method is unknown.
    fn receive(&self, _function: &str, _args: &[Val]) -> Option<Val> {
        None
    }

    /// Field values used for serialization.
    fn fields(&self) -> Vec<(EcoString, Val)> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any;
}

/// Generic object built by [`TypeRegistry`](crate::types::TypeRegistry) when a
/// type declares no constructor of its own.
#[derive(Debug, Clone)]
pub struct Record {
    ty: Type,
    fields: Vec<(EcoString, Val)>,
}

impl Record {
    pub fn new(ty: Type, fields: Vec<(EcoString, Val)>) -> Self {
        Self { ty, fields }
    }
}

impl Object for Record {
    fn ty(&self) -> &Type {
        &self.ty
    }

    fn get(&self, field: &str) -> Option<Val> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.clone())
    }

    fn equal(&self, other: &dyn Object) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Record>() else {
            return false;
        };
        self.ty == other.ty
            && self.fields.len() == other.fields.len()
            && self.fields.iter().all(|(name, value)| {
                other
                    .get(name)
                    .is_some_and(|o| matches!(value.equal(&o), Val::Bool(true)))
            })
    }

    fn fields(&self) -> Vec<(EcoString, Val)> {
        self.fields.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
