//! Commitment path types for membership and non-membership proofs.

use core::fmt;

/// A canonical sequence of key path segments under a commitment root.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct MerklePath {
    /// The path segments, outermost first.
    pub key_path: Vec<Vec<u8>>,
}

impl MerklePath {
    /// Creates a path from raw segments.
    #[must_use]
    pub const fn new(key_path: Vec<Vec<u8>>) -> Self {
        Self { key_path }
    }

    /// Whether the path has no segments. Empty paths are never provable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_path.is_empty()
    }
}

impl fmt::Display for MerklePath {
    /// Renders the segments joined by `/`, with non-UTF-8 segments hex
    /// encoded. Used for error context and signing domains.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .key_path
            .iter()
            .map(|segment| {
                core::str::from_utf8(segment)
                    .map_or_else(|_| hex::encode(segment), ToString::to_string)
            })
            .collect();
        f.write_str(&rendered.join("/"))
    }
}

impl From<Vec<Vec<u8>>> for MerklePath {
    fn from(key_path: Vec<Vec<u8>>) -> Self {
        Self { key_path }
    }
}
