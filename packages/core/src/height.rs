//! This module defines [`Height`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// A revisioned block height. Ordering compares the revision number first.
#[derive(
    Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug, Default,
)]
pub struct Height {
    /// The revision number of the chain. Reset to zero on every hard fork
    /// that restarts height numbering.
    #[serde(default)]
    pub revision_number: u64,
    /// The block height within the revision.
    pub revision_height: u64,
}

impl Height {
    /// Creates a new height.
    #[must_use]
    pub const fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }

    /// Whether both components are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.revision_number == 0 && self.revision_height == 0
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.revision_number, self.revision_height)
    }
}

#[cfg(test)]
mod tests {
    use super::Height;

    #[test]
    fn test_ordering_compares_revision_number_first() {
        assert!(Height::new(1, 5) > Height::new(0, 100));
        assert!(Height::new(0, 2) > Height::new(0, 1));
        assert_eq!(Height::new(3, 7), Height::new(3, 7));
    }

    #[test]
    fn test_display() {
        assert_eq!("0-42", Height::new(0, 42).to_string());
    }

    #[test]
    fn test_serde_defaults_revision_number() {
        let height: Height = serde_json::from_str(r#"{"revision_height":9}"#).unwrap();
        assert_eq!(Height::new(0, 9), height);
    }
}
