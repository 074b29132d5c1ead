//! Namespace candidate names for identifiers that were not resolved by a
//! type checker.

use ecow::{EcoString, eco_format};

/// Produces fully-qualified candidate names for an identifier, most specific
/// first.
pub trait NameResolver: Send + Sync {
    fn candidate_names(&self, name: &str) -> Vec<EcoString>;
}

/// A dotted namespace such as `acme.billing`.
///
/// Inside container `a.b`, the name `c.d` resolves to `a.b.c.d`, `a.c.d`,
/// then `c.d`. A leading dot makes a name absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    name: EcoString,
}

impl Container {
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self { name: name.into() }
    }

    /// The root namespace.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NameResolver for Container {
    fn candidate_names(&self, name: &str) -> Vec<EcoString> {
        if let Some(absolute) = name.strip_prefix('.') {
            return vec![EcoString::from(absolute)];
        }
        if self.name.is_empty() {
            return vec![EcoString::from(name)];
        }
        let mut candidates = Vec::with_capacity(self.name.matches('.').count() + 2);
        let mut prefix = self.name.as_str();
        loop {
            candidates.push(eco_format!("{}.{}", prefix, name));
            match prefix.rfind('.') {
                Some(idx) => prefix = &prefix[..idx],
                None => break,
            }
        }
        candidates.push(EcoString::from(name));
        candidates
    }
}
