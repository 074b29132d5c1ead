//! Planning and evaluation.
//!
//! The [`Planner`] compiles an annotated syntax tree into an immutable
//! [`Interpretable`] tree once; evaluation walks that tree against an
//! [`Activation`](crate::activation::Activation) as many times as needed.
//! Every node also reports a static [`Cost`] bound, and programs planned
//! with state tracking record node values in an [`EvalState`].

mod attribute;
mod container;
mod cost;
mod interpretable;
mod planner;
mod state;

#[cfg(test)]
mod cost_test;
#[cfg(test)]
mod planner_test;

pub use attribute::{
    AbsoluteAttribute, Attribute, ConditionalAttribute, MaybeAttribute, Qualifier,
    RelativeAttribute,
};
pub use container::{Container, NameResolver};
pub use cost::{Cost, UNBOUNDED};
pub use interpretable::{
    Call, Comprehension, ConstMatch, CreateStruct, Fallback, HasField, Interpretable, Node,
    SetMembership,
};
pub use planner::Planner;
pub use state::{EvalState, TrackingActivation};
