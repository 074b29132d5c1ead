//! Runtime values.
//!
//! [`Val`] is a closed tagged union. Operator capabilities are plain methods
//! on `Val` (see `ops.rs`); the [`Traits`](crate::types::Traits) of a value's
//! type say which of them are meaningful.

mod convert;
mod error;
mod map;
mod native;
mod object;
mod ops;
mod receiver;
mod unknown;
mod val;


pub use error::{ErrorKind, EvalError, PanicCause};
pub use map::{MapKey, MapValue};
pub use native::FromVal;
pub use object::{Object, Record};
pub use ops::ValIter;
pub use unknown::UnknownSet;
pub use val::{Val, propagate};

static_assertions::assert_impl_all!(Val: Send, Sync);
