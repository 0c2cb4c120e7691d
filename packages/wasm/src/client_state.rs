//! This module defines the wasm client's [`ClientState`] and
//! [`ConsensusState`] envelopes.
//!
//! Both are envelopes around opaque blobs interpreted only by the loaded
//! module; the framework reads nothing of the inner data beyond the checksum
//! and latest height bookkeeping it needs for dispatch and validation.

use core::fmt;

use cosmwasm_std::Binary;
use lightclient_core::error::ClientError;
use lightclient_core::height::Height;
use serde::{Deserialize, Serialize};

/// The content hash identifying which executable module governs a client.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(transparent)]
pub struct Checksum(
    /// The raw hash bytes, hex encoded on the wire.
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    pub Vec<u8>,
);

impl Checksum {
    /// The checksum length produced by the module loader's content hash.
    pub const LEN: usize = 32;

    /// Structural validation.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedClientState`] if the length is wrong.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.0.len() == Self::LEN {
            Ok(())
        } else {
            Err(ClientError::MalformedClientState(format!(
                "checksum must be {} bytes, got {}",
                Self::LEN,
                self.0.len()
            )))
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// The persisted state of a wasm client: an opaque module-owned blob plus
/// the bookkeeping the framework itself needs.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ClientState {
    /// The module-interpreted state blob.
    pub data: Binary,
    /// The hash of the module governing this client. Changes only through
    /// the migrate entry point.
    pub checksum: Checksum,
    /// The latest height the module has committed.
    pub latest_height: Height,
}

impl ClientState {
    /// Structural validation of an initial or decoded client state.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedClientState`] on any violation.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.data.is_empty() {
            return Err(ClientError::MalformedClientState(
                "client state data cannot be empty".to_string(),
            ));
        }
        self.checksum.validate()?;
        if self.latest_height.is_zero() {
            return Err(ClientError::MalformedClientState(
                "latest height cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// A committed snapshot envelope; the blob is interpreted by the module.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ConsensusState {
    /// The module-interpreted consensus state blob.
    pub data: Binary,
}

impl ConsensusState {
    /// Structural validation.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedConsensusState`] if the blob is empty.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.data.is_empty() {
            return Err(ClientError::MalformedConsensusState(
                "consensus state data cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cosmwasm_std::Binary;
    use lightclient_core::height::Height;

    use super::{Checksum, ClientState};

    fn valid_state() -> ClientState {
        ClientState {
            data: Binary::from(b"state".as_slice()),
            checksum: Checksum(vec![7; 32]),
            latest_height: Height::new(0, 1),
        }
    }

    #[test]
    fn test_validate_accepts_valid_state() {
        valid_state().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_short_checksum() {
        let mut state = valid_state();
        state.checksum = Checksum(vec![7; 16]);
        state.validate().unwrap_err();
    }

    #[test]
    fn test_validate_rejects_zero_height() {
        let mut state = valid_state();
        state.latest_height = Height::new(0, 0);
        state.validate().unwrap_err();
    }

    #[test]
    fn test_checksum_displays_as_hex() {
        assert_eq!("0707", format!("{}", Checksum(vec![7, 7])));
    }
}
