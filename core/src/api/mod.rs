//! Public entry points: build an [`Env`], plan expressions into
//! [`Program`]s, evaluate them against activations.
//!
//! ```
//! use celeste_core::api::{Env, PlanOptions};
//! use celeste_core::ast::ExprBuilder;
//! use celeste_core::Val;
//!
//! let env = Env::builder()
//!     .options(PlanOptions {
//!         optimize: true,
//!         ..PlanOptions::default()
//!     })
//!     .build();
//! let b = ExprBuilder::new();
//! let expr = b.and(b.literal(false), b.binary("_/_", b.literal(1i64), b.literal(0i64)));
//! let program = env.plan_unchecked(expr).expect("plans");
//! assert_eq!(program.eval(&env.activation()), Val::Bool(false));
//! ```

mod env;
mod error;
mod options;
mod program;

#[cfg(test)]
mod env_test;

pub use env::{Env, EnvBuilder};
pub use error::PlanError;
pub use options::PlanOptions;
pub use program::Program;

static_assertions::assert_impl_all!(Env: Send, Sync);
static_assertions::assert_impl_all!(Program: Send, Sync);
