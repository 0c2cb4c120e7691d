//! This module defines [`Status`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// The trust status of a light client.
///
/// `Unknown` is returned by queries for missing or undecodable clients and
/// must be treated as "cannot trust" by any gating decision.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
pub enum Status {
    /// The client is live and accepts updates.
    Active,
    /// Misbehaviour was handled; the client is terminally disabled.
    Frozen,
    /// The client's trusting period lapsed without an update.
    Expired,
    /// The client does not exist or its state failed to decode.
    Unknown,
}

impl Status {
    /// Whether the client may process new updates and proofs.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::Frozen => f.write_str("Frozen"),
            Self::Expired => f.write_str("Expired"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}
