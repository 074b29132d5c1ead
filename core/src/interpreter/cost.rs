//! Static cost bounds.
//!
//! A [`Cost`] is a `(min, max)` pair of abstract work units computed from the
//! shape of a planned program without evaluating it. `max` saturates at
//! [`UNBOUNDED`] when a loop's iteration count or an operand size cannot be
//! bounded statically.

use std::fmt;
use std::ops::Add;

/// Sentinel for an unbounded maximum.
pub const UNBOUNDED: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cost {
    pub min: u64,
    pub max: u64,
}

impl Cost {
    pub const ZERO: Cost = Cost::new(0, 0);
    pub const ONE: Cost = Cost::new(1, 1);
    /// Nothing is known about the work involved.
    pub const UNKNOWN: Cost = Cost::new(0, UNBOUNDED);

    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub const fn constant(c: u64) -> Self {
        Self::new(c, c)
    }

    pub fn is_bounded(&self) -> bool {
        self.max != UNBOUNDED
    }

    /// Cost of running `self` `count` times; `None` means unknown count.
    pub fn repeat(self, count: Option<u64>) -> Cost {
        match count {
            Some(n) => Cost::new(self.min.saturating_mul(n), self.max.saturating_mul(n)),
            None => Cost::new(0, if self.max == 0 { 0 } else { UNBOUNDED }),
        }
    }

    /// Cost when exactly one of two alternatives runs.
    pub fn either(self, other: Cost) -> Cost {
        Cost::new(self.min.min(other.min), self.max.max(other.max))
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost::new(
            self.min.saturating_add(rhs.min),
            self.max.saturating_add(rhs.max),
        )
    }
}

impl std::iter::Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bounded() {
            write!(f, "[{}, {}]", self.min, self.max)
        } else {
            write!(f, "[{}, unbounded]", self.min)
        }
    }
}
