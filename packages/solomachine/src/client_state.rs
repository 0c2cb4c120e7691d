//! This module defines the solo machine [`ClientState`] and
//! [`ConsensusState`].

use ed25519_dalek::{Signature, VerifyingKey};
use lightclient_core::error::ClientError;
use serde::{Deserialize, Serialize};

/// The authority's ed25519 verification key, hex encoded on the wire.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(transparent)]
pub struct PublicKey(
    /// The raw key bytes, hex encoded on the wire.
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    pub Vec<u8>,
);

impl PublicKey {
    /// Parses the stored bytes into a verifying key.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedClientState`] if the bytes are not a
    /// valid 32-byte ed25519 public key.
    pub fn verifying_key(&self) -> Result<VerifyingKey, ClientError> {
        let bytes: [u8; 32] = self.0.as_slice().try_into().map_err(|_| {
            ClientError::MalformedClientState(format!(
                "public key must be 32 bytes, got {}",
                self.0.len()
            ))
        })?;
        VerifyingKey::from_bytes(&bytes).map_err(|err| {
            ClientError::MalformedClientState(format!("invalid ed25519 public key: {err}"))
        })
    }

    /// Verifies an ed25519 signature over `message` under this key.
    ///
    /// # Errors
    /// Returns [`ClientError::VerificationFailed`] if the signature is
    /// malformed or does not verify.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), ClientError> {
        let key = self.verifying_key()?;
        let signature = Signature::from_slice(signature)
            .map_err(|err| ClientError::VerificationFailed(format!("malformed signature: {err}")))?;
        key.verify_strict(message, &signature)
            .map_err(|err| ClientError::VerificationFailed(format!("invalid signature: {err}")))
    }
}

/// The persisted state of a solo machine client.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ClientState {
    /// The last accepted update sequence. New headers must carry a strictly
    /// greater sequence.
    pub sequence: u64,
    /// Terminal once set; a frozen client accepts no further updates.
    pub frozen: bool,
    /// The currently authorized verification key.
    pub public_key: PublicKey,
    /// A free-form domain separator mixed into every signature.
    pub diversifier: String,
    /// The timestamp of the last accepted update, unix nanoseconds.
    pub timestamp: u64,
}

impl ClientState {
    /// Structural validation of an initial or decoded client state.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedClientState`] on any violation.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.verifying_key()?;
        if self.diversifier.trim() != self.diversifier || self.diversifier.is_empty() {
            return Err(ClientError::MalformedClientState(
                "diversifier must be non-empty and contain no surrounding whitespace".to_string(),
            ));
        }
        if self.timestamp == 0 {
            return Err(ClientError::MalformedClientState(
                "timestamp must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The authority's verifying key.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedClientState`] if the stored key bytes
    /// are invalid.
    pub fn verifying_key(&self) -> Result<VerifyingKey, ClientError> {
        self.public_key.verifying_key()
    }
}

/// A committed snapshot the client trusts at one height.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ConsensusState {
    /// The commitment root the authority signed for this sequence.
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    pub root: Vec<u8>,
    /// The authority-declared timestamp, unix nanoseconds.
    pub timestamp: u64,
}

impl ConsensusState {
    /// Structural validation of an initial or decoded consensus state.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedConsensusState`] on any violation.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.root.is_empty() {
            return Err(ClientError::MalformedConsensusState(
                "root cannot be empty".to_string(),
            ));
        }
        if self.timestamp == 0 {
            return Err(ClientError::MalformedConsensusState(
                "timestamp must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientState, ConsensusState, PublicKey};
    use crate::testing::SigningAuthority;

    fn valid_state() -> ClientState {
        ClientState {
            sequence: 0,
            frozen: false,
            public_key: SigningAuthority::from_seed([7; 32]).public_key(),
            diversifier: "oracle".to_string(),
            timestamp: 10,
        }
    }

    #[test]
    fn test_validate_accepts_valid_state() {
        valid_state().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_key() {
        let mut state = valid_state();
        state.public_key = PublicKey(vec![1, 2, 3]);
        state.validate().unwrap_err();
    }

    #[test]
    fn test_validate_rejects_empty_diversifier() {
        let mut state = valid_state();
        state.diversifier = String::new();
        state.validate().unwrap_err();

        state.diversifier = " padded ".to_string();
        state.validate().unwrap_err();
    }

    #[test]
    fn test_consensus_state_validation() {
        ConsensusState {
            root: vec![1; 32],
            timestamp: 5,
        }
        .validate()
        .unwrap();

        ConsensusState {
            root: vec![],
            timestamp: 5,
        }
        .validate()
        .unwrap_err();

        ConsensusState {
            root: vec![1; 32],
            timestamp: 0,
        }
        .validate()
        .unwrap_err();
    }
}
