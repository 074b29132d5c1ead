//! Construction-time errors.
//!
//! Expression-level failures are `Val::Err` values, never these. A
//! `PlanError` means the syntax tree handed to the planner cannot be
//! compiled against the environment at all.

use ecow::EcoString;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum PlanError {
    #[error("undeclared reference to function '{function}' (expression {id})")]
    #[diagnostic(
        code(celeste::plan::unknown_function),
        help("register an overload for this function in the environment's registry")
    )]
    UnknownFunction { function: EcoString, id: i64 },

    #[error("no overload of '{function}' takes {found} argument(s) (expression {id})")]
    #[diagnostic(code(celeste::plan::arity_mismatch))]
    ArityMismatch {
        function: EcoString,
        found: usize,
        id: i64,
    },

    #[error("unknown type '{type_name}' (expression {id})")]
    #[diagnostic(
        code(celeste::plan::unknown_type),
        help("object types must be registered with the environment's type provider")
    )]
    UnknownType { type_name: EcoString, id: i64 },

    #[error("malformed expression {id}: {reason}")]
    #[diagnostic(code(celeste::plan::malformed))]
    Malformed { id: i64, reason: EcoString },
}

impl PlanError {
    /// Id of the offending expression node.
    pub fn expr_id(&self) -> i64 {
        match self {
            PlanError::UnknownFunction { id, .. }
            | PlanError::ArityMismatch { id, .. }
            | PlanError::UnknownType { id, .. }
            | PlanError::Malformed { id, .. } => *id,
        }
    }
}
