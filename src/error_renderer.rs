//! Human-readable rendering of planning and registry errors.
//!
//! Errors carry no source text (parsing happens upstream), so reports show
//! the message, diagnostic code and help line.

use std::io::Write;

use miette::{GraphicalReportHandler, GraphicalTheme};

use crate::Error;

/// Render an error to stderr.
///
/// # Example
/// ```no_run
/// use celeste::{Env, render_error};
/// use celeste::ast::ExprBuilder;
///
/// let b = ExprBuilder::new();
/// if let Err(e) = Env::new().plan_unchecked(b.call("nope", vec![])) {
///     render_error(&e.into());
/// }
/// ```
pub fn render_error(error: &Error) {
    let rendered = render(error, GraphicalTheme::unicode());
    // Nothing sensible to do when stderr is gone.
    let _ = std::io::stderr().write_all(rendered.as_bytes());
}

/// Render an error to a String without colors (useful for tests and logs).
///
/// # Example
/// ```
/// use celeste::{Env, render_error_to_string};
/// use celeste::ast::ExprBuilder;
///
/// let b = ExprBuilder::new();
/// let err = Env::new().plan_unchecked(b.call("nope", vec![])).unwrap_err();
/// let output = render_error_to_string(&err.into());
/// assert!(output.contains("undeclared reference to function 'nope'"));
/// ```
pub fn render_error_to_string(error: &Error) -> String {
    render(error, GraphicalTheme::unicode_nocolor())
}

fn render(error: &Error, theme: GraphicalTheme) -> String {
    let mut out = String::new();
    let handler = GraphicalReportHandler::new_themed(theme);
    if handler.render_report(&mut out, error).is_err() {
        // Fall back to the plain message.
        out = format!("{error}\n");
    }
    out
}
