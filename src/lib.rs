//! Celeste - an embeddable runtime for CEL-style expressions
//!
//! # Overview
//!
//! Celeste evaluates annotated expression trees against variable bindings
//! supplied by a host application. Parsing and type checking happen
//! elsewhere; this crate takes their output, plans it once into an immutable
//! [`Program`] and evaluates that program any number of times, from any
//! number of threads.
//!
//! Common use cases include:
//!
//! - Access policies and admission rules
//! - Feature flags and conditional logic
//! - Validation of configuration and request payloads
//!
//! # Quick Start
//!
//! ```
//! use celeste::{Env, Val};
//! use celeste::ast::ExprBuilder;
//! use celeste::overloads::operators::{GREATER, MULTIPLY};
//!
//! let env = Env::new();
//!
//! // quota > used * 2
//! let b = ExprBuilder::new();
//! let doubled = b.binary(MULTIPLY, b.ident("used"), b.literal(2i64));
//! let expr = b.binary(GREATER, b.ident("quota"), doubled);
//!
//! let program = env.plan_unchecked(expr).unwrap();
//! let vars = env.activation().bind("quota", 10i64).bind("used", 3i64);
//! assert_eq!(program.eval(&vars), Val::Bool(true));
//! ```
//!
//! # Results
//!
//! Evaluation never fails at the Rust level. Expression errors such as a
//! division by zero are returned as [`Val::Err`], and attributes matched by
//! the patterns of a [`PartialActivation`] come back as [`Val::Unknown`].
//! Only building an environment or planning a program returns an [`Error`].

mod error_renderer;

use celeste_core::overloads::RegistryError;

pub use celeste_core::activation::{
    self, Activation, AttributePattern, EmptyActivation, FnActivation, HierarchicalActivation,
    MapActivation, PartialActivation,
};
pub use celeste_core::api::{Env, EnvBuilder, PlanError, PlanOptions, Program};
pub use celeste_core::interpreter::{Cost, EvalState, UNBOUNDED};
pub use celeste_core::types::{self, Traits, Type, TypeAdapter, TypeProvider, TypeRegistry};
pub use celeste_core::values::{self, ErrorKind, EvalError, FromVal, UnknownSet, Val};
pub use celeste_core::{ast, overloads};

pub use error_renderer::{render_error, render_error_to_string};

/// Errors raised while setting up an environment or planning a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),
}
