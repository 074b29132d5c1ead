//! Attribute resolution.
//!
//! An [`Attribute`] is a compiled variable reference plus the chain of
//! [`Qualifier`]s (field selections and index operations) applied to it.
//! Attributes are built at plan time and resolved on every evaluation.

use std::fmt;
use std::sync::Arc;

use ecow::{EcoString, eco_format};
use smallvec::SmallVec;

use super::Interpretable;
use super::cost::Cost;
use crate::activation::Activation;
use crate::overloads::operators::CONDITIONAL;
use crate::types::{FieldType, TypeProvider};
use crate::values::{ErrorKind, MapKey, Val};

// ============================================================================
// Qualifiers
// ============================================================================

/// One selection or index step.
#[derive(Clone)]
pub struct Qualifier {
    id: i64,
    kind: QualifierKind,
}

#[derive(Clone)]
enum QualifierKind {
    /// `.name`, with the structured getter when the operand's object type
    /// is known statically.
    Field {
        key: MapKey,
        getter: Option<(EcoString, FieldType)>,
    },
    /// `[constant]`, with the map key precomputed when the constant can be
    /// one.
    Const { value: Val, key: Option<MapKey> },
    /// `[expr]`.
    Computed(Arc<Interpretable>),
}

impl Qualifier {
    pub fn field(id: i64, name: impl Into<EcoString>) -> Self {
        Self {
            id,
            kind: QualifierKind::Field {
                key: MapKey::String(name.into()),
                getter: None,
            },
        }
    }

    /// Field qualifier using `getter` on objects of type `type_name`.
    pub fn typed_field(
        id: i64,
        name: impl Into<EcoString>,
        type_name: impl Into<EcoString>,
        getter: FieldType,
    ) -> Self {
        Self {
            id,
            kind: QualifierKind::Field {
                key: MapKey::String(name.into()),
                getter: Some((type_name.into(), getter)),
            },
        }
    }

    pub fn constant(id: i64, value: Val) -> Self {
        let key = MapKey::from_val(&value);
        Self {
            id,
            kind: QualifierKind::Const { value, key },
        }
    }

    pub fn computed(id: i64, key: Interpretable) -> Self {
        Self {
            id,
            kind: QualifierKind::Computed(Arc::new(key)),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Field name when this qualifier is a field selection.
    fn field_name(&self) -> Option<&str> {
        match &self.kind {
            QualifierKind::Field {
                key: MapKey::String(name),
                ..
            } => Some(name),
            _ => None,
        }
    }

    /// The qualifier's key as a value, evaluating computed keys.
    fn key_value(&self, activation: &dyn Activation) -> Val {
        match &self.kind {
            QualifierKind::Field { key, .. } => key.to_val(),
            QualifierKind::Const { value, .. } => value.clone(),
            QualifierKind::Computed(key) => key.eval(activation),
        }
    }

    /// Applies this qualifier to `operand`.
    pub fn qualify(&self, operand: &Val, activation: &dyn Activation) -> Val {
        match &self.kind {
            QualifierKind::Field { key, getter } => {
                if let (Val::Object(obj), Some((type_name, field))) = (operand, getter) {
                    if obj.ty().name() == type_name.as_str() {
                        return field.get_from(obj.as_ref());
                    }
                }
                operand.select_field(key)
            }
            QualifierKind::Const { key: Some(key), .. } => operand.index_key(key),
            QualifierKind::Const { value, key: None } => operand.index(value),
            QualifierKind::Computed(key) => operand.index(&key.eval(activation)),
        }
    }

    fn cost(&self) -> Cost {
        match &self.kind {
            QualifierKind::Computed(key) => key.cost() + Cost::ONE,
            _ => Cost::ONE,
        }
    }
}

impl fmt::Debug for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            QualifierKind::Field { key, .. } => write!(f, ".{}#{}", key, self.id),
            QualifierKind::Const { value, .. } => write!(f, "[{}]#{}", value, self.id),
            QualifierKind::Computed(_) => write!(f, "[..]#{}", self.id),
        }
    }
}

fn apply_qualifiers(mut value: Val, qualifiers: &[Qualifier], activation: &dyn Activation) -> Val {
    for qualifier in qualifiers {
        if value.is_err_or_unknown() {
            break;
        }
        value = qualifier.qualify(&value, activation).with_expr_id(qualifier.id);
    }
    value
}

// ============================================================================
// Attributes
// ============================================================================

/// A variable reference and its qualifiers, resolvable against an
/// [`Activation`].
#[derive(Debug)]
pub enum Attribute {
    /// A checked variable with its candidate names.
    Absolute(AbsoluteAttribute),
    /// An unchecked name that may be a variable, or a qualified variable.
    Maybe(MaybeAttribute),
    /// Qualifiers applied to the result of a sub-expression.
    Relative(RelativeAttribute),
    /// A ternary whose branches are attributes.
    Conditional(ConditionalAttribute),
}

impl Attribute {
    pub fn absolute(
        id: i64,
        candidates: Vec<EcoString>,
        provider: Arc<dyn TypeProvider>,
    ) -> Attribute {
        Attribute::Absolute(AbsoluteAttribute::new(id, candidates, provider))
    }

    /// A comprehension variable. It shadows outer bindings, including
    /// unknown patterns naming the same variable.
    pub fn local(id: i64, name: EcoString, provider: Arc<dyn TypeProvider>) -> Attribute {
        let mut attr = AbsoluteAttribute::new(id, vec![name], provider);
        attr.local = true;
        Attribute::Absolute(attr)
    }

    pub fn maybe(id: i64, candidates: Vec<EcoString>, provider: Arc<dyn TypeProvider>) -> Attribute {
        Attribute::Maybe(MaybeAttribute {
            id,
            attrs: vec![AbsoluteAttribute::new(id, candidates, provider.clone())],
            provider,
        })
    }

    pub fn relative(id: i64, operand: Interpretable) -> Attribute {
        Attribute::Relative(RelativeAttribute {
            id,
            operand: Box::new(operand),
            qualifiers: Vec::new(),
        })
    }

    pub fn conditional(
        id: i64,
        guard: Interpretable,
        truthy: Attribute,
        falsy: Attribute,
    ) -> Attribute {
        Attribute::Conditional(ConditionalAttribute {
            id,
            guard: Box::new(guard),
            truthy: Box::new(truthy),
            falsy: Box::new(falsy),
        })
    }

    pub fn id(&self) -> i64 {
        match self {
            Attribute::Absolute(a) => a.id,
            Attribute::Maybe(a) => a.id,
            Attribute::Relative(a) => a.id,
            Attribute::Conditional(a) => a.id,
        }
    }

    /// Appends a qualifier; conditional attributes qualify both branches.
    pub fn add_qualifier(&mut self, qualifier: Qualifier) {
        match self {
            Attribute::Absolute(a) => a.qualifiers.push(qualifier),
            Attribute::Maybe(a) => a.add_qualifier(qualifier),
            Attribute::Relative(a) => a.qualifiers.push(qualifier),
            Attribute::Conditional(a) => {
                a.truthy.add_qualifier(qualifier.clone());
                a.falsy.add_qualifier(qualifier);
            }
        }
    }

    pub fn qualifier_count(&self) -> usize {
        match self {
            Attribute::Absolute(a) => a.qualifiers.len(),
            Attribute::Maybe(a) => a.attrs.last().map_or(0, |a| a.qualifiers.len()),
            Attribute::Relative(a) => a.qualifiers.len(),
            Attribute::Conditional(a) => a.truthy.qualifier_count().max(a.falsy.qualifier_count()),
        }
    }

    pub fn resolve(&self, activation: &dyn Activation) -> Val {
        match self {
            Attribute::Absolute(a) => a.resolve(activation),
            Attribute::Maybe(a) => a.resolve(activation),
            Attribute::Relative(a) => a.resolve(activation),
            Attribute::Conditional(a) => a.resolve(activation),
        }
    }

    /// Resolves both branches of conditional attributes before picking one.
    pub fn resolve_exhaustive(&self, activation: &dyn Activation) -> Val {
        match self {
            Attribute::Conditional(a) => a.resolve_exhaustive(activation),
            other => other.resolve(activation),
        }
    }

    pub fn cost(&self) -> Cost {
        match self {
            Attribute::Absolute(a) => a.cost(),
            Attribute::Maybe(a) => a
                .attrs
                .iter()
                .map(AbsoluteAttribute::cost)
                .reduce(Cost::either)
                .unwrap_or(Cost::ZERO),
            Attribute::Relative(a) => {
                a.operand.cost() + a.qualifiers.iter().map(Qualifier::cost).sum::<Cost>()
            }
            Attribute::Conditional(a) => {
                a.guard.cost() + a.truthy.cost().either(a.falsy.cost())
            }
        }
    }
}

/// Candidate variable names, most specific first, plus qualifiers.
pub struct AbsoluteAttribute {
    id: i64,
    candidates: Vec<EcoString>,
    qualifiers: Vec<Qualifier>,
    provider: Arc<dyn TypeProvider>,
    /// Comprehension variable; never matched against unknown patterns.
    local: bool,
}

impl AbsoluteAttribute {
    fn new(id: i64, candidates: Vec<EcoString>, provider: Arc<dyn TypeProvider>) -> Self {
        Self {
            id,
            candidates,
            qualifiers: Vec::new(),
            provider,
            local: false,
        }
    }

    pub fn candidates(&self) -> &[EcoString] {
        &self.candidates
    }

    /// The name as written, used in error messages.
    fn display_name(&self) -> &str {
        self.candidates.last().map_or("", EcoString::as_str)
    }

    fn resolve(&self, activation: &dyn Activation) -> Val {
        self.try_resolve(activation).unwrap_or_else(|| {
            Val::error(
                ErrorKind::NoSuchAttribute,
                eco_format!("no such attribute: {}", self.display_name()),
            )
            .with_expr_id(self.id)
        })
    }

    /// `None` when no candidate is bound and none names a type.
    ///
    /// Candidates are tried in order; for each one, unknown patterns are
    /// consulted before the activation and the type provider.
    fn try_resolve(&self, activation: &dyn Activation) -> Option<Val> {
        for name in &self.candidates {
            if !self.local {
                if let Some(unknown) = self.match_unknown_patterns(name, activation) {
                    return Some(unknown);
                }
            }
            if let Some(value) = activation.resolve_name(name) {
                return Some(apply_qualifiers(value, &self.qualifiers, activation));
            }
            if let Some(ident) = self.provider.find_ident(name) {
                if self.qualifiers.is_empty() {
                    return Some(ident);
                }
                return Some(
                    Val::error(
                        ErrorKind::NoSuchAttribute,
                        eco_format!("no such attribute: {}", self),
                    )
                    .with_expr_id(self.id),
                );
            }
            tracing::trace!(%name, "Attribute candidate not bound");
        }
        None
    }

    /// Reports an `Unknown` when a partial activation marks the variable
    /// `name`, or a prefix of the qualifiers applied to it, as unknown.
    ///
    /// The unknown carries the id of the deepest qualifier the pattern
    /// covers, or the attribute's own id when the pattern names only the
    /// variable.
    fn match_unknown_patterns(&self, name: &str, activation: &dyn Activation) -> Option<Val> {
        let patterns = activation.unknown_patterns();
        if patterns.is_empty() {
            return None;
        }
        let matching: SmallVec<[_; 2]> = patterns
            .iter()
            .filter(|p| p.variable_matches(name))
            .collect();
        if matching.is_empty() {
            return None;
        }
        if self.qualifiers.is_empty() {
            return Some(Val::unknown(self.id));
        }

        let mut keys: SmallVec<[Val; 4]> = SmallVec::with_capacity(self.qualifiers.len());
        for qualifier in &self.qualifiers {
            let key = qualifier.key_value(activation);
            if key.is_unknown() {
                return Some(key);
            }
            keys.push(key);
        }

        for pattern in matching {
            let mut matched_id = self.id;
            let mut matched = true;
            for ((qualifier, key), step) in self
                .qualifiers
                .iter()
                .zip(keys.iter())
                .zip(pattern.qualifiers())
            {
                matched_id = qualifier.id;
                if !step.matches(key) {
                    matched = false;
                    break;
                }
            }
            if matched {
                return Some(Val::unknown(matched_id));
            }
        }
        None
    }

    fn cost(&self) -> Cost {
        self.qualifiers.iter().map(Qualifier::cost).sum()
    }
}

impl fmt::Display for AbsoluteAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())?;
        for qualifier in &self.qualifiers {
            match qualifier.field_name() {
                Some(name) => write!(f, ".{}", name)?,
                None => f.write_str("[..]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AbsoluteAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsoluteAttribute")
            .field("id", &self.id)
            .field("candidates", &self.candidates)
            .field("qualifiers", &self.qualifiers)
            .field("local", &self.local)
            .finish()
    }
}

/// An unchecked dotted name.
///
/// `a.b.c` may be the variable `a.b.c`, the variable `a.b` with field `c`,
/// or the variable `a` with fields `b.c`. Interpretations are tried from the
/// longest variable name down.
pub struct MaybeAttribute {
    id: i64,
    attrs: Vec<AbsoluteAttribute>,
    provider: Arc<dyn TypeProvider>,
}

impl MaybeAttribute {
    fn add_qualifier(&mut self, qualifier: Qualifier) {
        let mut augmented: Vec<EcoString> = Vec::new();
        if let Some(field) = qualifier.field_name() {
            for attr in self.attrs.iter().filter(|a| a.qualifiers.is_empty()) {
                augmented.extend(
                    attr.candidates
                        .iter()
                        .map(|name| eco_format!("{}.{}", name, field)),
                );
            }
        }
        for attr in &mut self.attrs {
            attr.qualifiers.push(qualifier.clone());
        }
        if !augmented.is_empty() {
            let longer = AbsoluteAttribute::new(qualifier.id, augmented, self.provider.clone());
            self.attrs.insert(0, longer);
        }
    }

    /// The interpretations in resolution order.
    pub fn interpretations(&self) -> &[AbsoluteAttribute] {
        &self.attrs
    }

    fn resolve(&self, activation: &dyn Activation) -> Val {
        for attr in &self.attrs {
            if let Some(value) = attr.try_resolve(activation) {
                return value;
            }
        }
        let name = self.attrs.last().map(|a| a.to_string()).unwrap_or_default();
        Val::error(
            ErrorKind::NoSuchAttribute,
            eco_format!("no such attribute: {}", name),
        )
        .with_expr_id(self.id)
    }
}

impl fmt::Debug for MaybeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaybeAttribute")
            .field("id", &self.id)
            .field("attrs", &self.attrs)
            .finish()
    }
}

pub struct RelativeAttribute {
    id: i64,
    operand: Box<Interpretable>,
    qualifiers: Vec<Qualifier>,
}

impl RelativeAttribute {
    fn resolve(&self, activation: &dyn Activation) -> Val {
        let value = self.operand.eval(activation);
        apply_qualifiers(value, &self.qualifiers, activation)
    }
}

impl fmt::Debug for RelativeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelativeAttribute")
            .field("id", &self.id)
            .field("operand", &self.operand)
            .field("qualifiers", &self.qualifiers)
            .finish()
    }
}

/// `guard ? truthy : falsy` where both branches are attributes. Only the
/// selected branch is resolved.
pub struct ConditionalAttribute {
    id: i64,
    guard: Box<Interpretable>,
    truthy: Box<Attribute>,
    falsy: Box<Attribute>,
}

impl ConditionalAttribute {
    fn resolve(&self, activation: &dyn Activation) -> Val {
        match self.guard.eval(activation) {
            Val::Bool(true) => self.truthy.resolve(activation),
            Val::Bool(false) => self.falsy.resolve(activation),
            guard @ (Val::Err(_) | Val::Unknown(_)) => guard,
            guard => Val::no_such_overload(CONDITIONAL, &[&guard]).with_expr_id(self.id),
        }
    }

    fn resolve_exhaustive(&self, activation: &dyn Activation) -> Val {
        let guard = self.guard.eval(activation);
        let truthy = self.truthy.resolve_exhaustive(activation);
        let falsy = self.falsy.resolve_exhaustive(activation);
        match guard {
            Val::Bool(true) => truthy,
            Val::Bool(false) => falsy,
            Val::Err(_) | Val::Unknown(_) => guard,
            guard => Val::no_such_overload(CONDITIONAL, &[&guard]).with_expr_id(self.id),
        }
    }
}

impl fmt::Debug for ConditionalAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalAttribute")
            .field("id", &self.id)
            .field("guard", &self.guard)
            .field("truthy", &self.truthy)
            .field("falsy", &self.falsy)
            .finish()
    }
}
