use std::fmt;

use serde_derive::{Deserialize, Serialize};

/// A chain height qualified by the revision number of the chain id.
///
/// Ordering is revision-major: any height of revision `n + 1` is greater
/// than every height of revision `n`, since a chain restarts counting
/// from one when its revision is bumped.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Height {
    pub revision_number: u64,
    pub revision_height: u64,
}

impl Height {
    pub fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.revision_height == 0
    }

    /// The height `delta` blocks later within the same revision.
    pub fn add(&self, delta: u64) -> Height {
        Height {
            revision_number: self.revision_number,
            revision_height: self.revision_height + delta,
        }
    }

    pub fn increment(&self) -> Height {
        self.add(1)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.revision_number, self.revision_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_revision_major() {
        let h = Height::new(0, 42);
        assert!(h < Height::new(0, 43));
        assert!(h > Height::new(0, 41));
        assert!(h < Height::new(1, 1));
        assert!(Height::new(2, 1) > Height::new(1, 1_000_000));
        assert_eq!(h, Height::new(0, 42));
    }

    #[test]
    fn arithmetic() {
        let h = Height::new(1, 10);
        assert_eq!(h.increment(), Height::new(1, 11));
        assert_eq!(h.add(5), Height::new(1, 15));
        assert!(Height::new(0, 0).is_zero());
        assert!(!h.is_zero());
    }
}
