use std::fmt;

use smallvec::SmallVec;

/// Set of expression ids whose attributes could not be resolved.
///
/// Kept sorted and deduplicated so merging is a linear walk and equality is
/// structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownSet(SmallVec<[i64; 2]>);

impl UnknownSet {
    pub fn new(id: i64) -> Self {
        let mut ids = SmallVec::new();
        ids.push(id);
        Self(ids)
    }

    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut ids: SmallVec<[i64; 2]> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Union of two sets.
    pub fn merge(&self, other: &UnknownSet) -> UnknownSet {
        let (a, b) = (&self.0, &other.0);
        let mut out = SmallVec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        UnknownSet(out)
    }
}

impl fmt::Display for UnknownSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown{{")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "}}")
    }
}
