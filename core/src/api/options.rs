//! Configuration options for planning.

/// Options controlling how expressions are compiled into programs.
///
/// # Example
///
/// ```
/// use celeste_core::api::PlanOptions;
///
/// let options = PlanOptions {
///     optimize: true,
///     ..PlanOptions::default()
/// };
/// assert!(!options.track_state);
/// assert!(!PlanOptions::default().optimize);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// Fold constant subtrees at plan time.
    ///
    /// Folding never changes what a program evaluates to; subtrees that
    /// would fold into an error are left in place. Besides folding, `in`
    /// against a constant list becomes a hashed lookup and `matches` with a
    /// constant pattern compiles the pattern once.
    ///
    /// Default: false
    pub optimize: bool,

    /// Record the value of every evaluated node in the
    /// [`EvalState`](crate::interpreter::EvalState) passed to
    /// [`Program::eval_with_state`](crate::api::Program::eval_with_state).
    ///
    /// Default: false
    pub track_state: bool,

    /// Evaluate both operands of `&&`, `||`, both branches of `?:` and
    /// every comprehension iteration, even once the result is decided.
    /// Implies `track_state`.
    ///
    /// Default: false
    pub exhaustive: bool,
}

impl PlanOptions {
    /// Whether planned nodes observe their values into an evaluation state.
    pub fn observes(&self) -> bool {
        self.track_state || self.exhaustive
    }
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            track_state: false,
            exhaustive: false,
        }
    }
}
