//! Expression-level evaluation errors.
//!
//! An [`EvalError`] is carried inside [`Val::Err`](super::Val::Err) and flows
//! through operators and attributes like any other value. It is never raised
//! as a Rust error by the evaluator.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use ecow::EcoString;

/// Category of an evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No overload accepts the operand types.
    NoSuchOverload,
    /// No candidate variable name is bound.
    NoSuchAttribute,
    /// Selected field does not exist on an object.
    NoSuchField,
    /// Map lookup on a missing key.
    NoSuchKey,
    /// Integer division or modulus by zero.
    DivideByZero,
    /// List index outside `-len..len`.
    IndexOutOfBounds,
    /// A value cannot be converted to the requested type or native shape.
    UnsupportedConversion,
    /// Integer, duration or timestamp arithmetic overflowed.
    Overflow,
    /// Malformed operand, e.g. an invalid regex or an unordered NaN.
    InvalidArgument,
    /// An overload implementation panicked.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NoSuchOverload => "no such overload",
            ErrorKind::NoSuchAttribute => "no such attribute",
            ErrorKind::NoSuchField => "no such field",
            ErrorKind::NoSuchKey => "no such key",
            ErrorKind::DivideByZero => "divide by zero",
            ErrorKind::IndexOutOfBounds => "index out of bounds",
            ErrorKind::UnsupportedConversion => "unsupported conversion",
            ErrorKind::Overflow => "overflow",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// Error value produced while evaluating an expression.
#[derive(Debug, Clone)]
pub struct EvalError {
    kind: ErrorKind,
    message: EcoString,
    expr_id: Option<i64>,
    cause: Option<Arc<dyn Error + Send + Sync>>,
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<EcoString>) -> Self {
        Self {
            kind,
            message: message.into(),
            expr_id: None,
            cause: None,
        }
    }

    /// Records the originating expression id unless one is already set.
    ///
    /// The innermost expression that produced the error wins.
    pub fn with_expr_id(mut self, id: i64) -> Self {
        self.expr_id.get_or_insert(id);
        self
    }

    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn expr_id(&self) -> Option<i64> {
        self.expr_id
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(id) = self.expr_id {
            write!(f, " (expression {})", id)?;
        }
        Ok(())
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Cause attached to errors produced from a caught overload panic.
#[derive(Debug, Clone)]
pub struct PanicCause {
    pub message: String,
}

impl fmt::Display for PanicCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overload panicked: {}", self.message)
    }
}

impl Error for PanicCause {}
