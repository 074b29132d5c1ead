//! Celeste core: the runtime half of an embeddable expression language.
//!
//! The crate takes an already parsed and type annotated syntax tree
//! ([`ast::CheckedExpr`]), plans it once into an immutable tree of
//! [`interpreter::Interpretable`] nodes, and evaluates that tree any number of
//! times against caller supplied [`activation::Activation`]s.
//!
//! Expression level failures never escape as Rust errors: they are ordinary
//! [`values::Val::Err`] values, and unresolved inputs during partial evaluation
//! surface as [`values::Val::Unknown`].

pub mod activation;
pub mod api;
pub mod ast;
pub mod interpreter;
pub mod overloads;
pub mod types;
pub mod values;

pub use activation::{Activation, AttributePattern, MapActivation, PartialActivation};
pub use api::{Env, EnvBuilder, PlanError, PlanOptions, Program};
pub use types::Type;
pub use values::{ErrorKind, EvalError, Val};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_planner() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
