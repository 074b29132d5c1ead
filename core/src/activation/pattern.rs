use ecow::EcoString;

use crate::values::{MapKey, Val};

/// Marks a variable, or a path below it, as unknown for partial evaluation.
///
/// ```
/// use celeste_core::activation::AttributePattern;
///
/// // Matches `request.auth.claims`, `request.auth["x"]`, ...
/// let pattern = AttributePattern::new("request").field("auth").wildcard();
/// assert_eq!(pattern.variable(), "request");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePattern {
    variable: EcoString,
    qualifiers: Vec<QualifierPattern>,
}

/// One qualifier step of an [`AttributePattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierPattern {
    Wildcard,
    Value(MapKey),
}

impl QualifierPattern {
    /// Tests a resolved qualifier value against this step.
    pub fn matches(&self, qualifier: &Val) -> bool {
        match self {
            QualifierPattern::Wildcard => true,
            QualifierPattern::Value(key) => MapKey::from_val(qualifier).as_ref() == Some(key),
        }
    }
}

impl AttributePattern {
    pub fn new(variable: impl Into<EcoString>) -> Self {
        Self {
            variable: variable.into(),
            qualifiers: Vec::new(),
        }
    }

    pub fn field(self, name: &str) -> Self {
        self.push(QualifierPattern::Value(MapKey::from(name)))
    }

    pub fn int(self, index: i64) -> Self {
        self.push(QualifierPattern::Value(MapKey::Int(index)))
    }

    pub fn uint(self, index: u64) -> Self {
        self.push(QualifierPattern::Value(MapKey::Uint(index)))
    }

    pub fn bool(self, key: bool) -> Self {
        self.push(QualifierPattern::Value(MapKey::Bool(key)))
    }

    pub fn wildcard(self) -> Self {
        self.push(QualifierPattern::Wildcard)
    }

    fn push(mut self, qualifier: QualifierPattern) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn qualifiers(&self) -> &[QualifierPattern] {
        &self.qualifiers
    }

    pub fn variable_matches(&self, name: &str) -> bool {
        self.variable == name
    }
}
