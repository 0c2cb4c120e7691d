//! Client messages accepted by the solo machine client.

use lightclient_core::ensure;
use lightclient_core::error::ClientError;
use serde::{Deserialize, Serialize};

use crate::client_state::PublicKey;

/// A message submitted to update or freeze a solo machine client.
///
/// The tag is part of the wire format; messages with unrecognized tags fail
/// to decode.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A single signed state update.
    Header(Header),
    /// Evidence of equivocation at one sequence number.
    Misbehaviour(Misbehaviour),
    /// An ordered run of signed state updates applied atomically.
    BatchUpdate(BatchUpdate),
}

impl ClientMessage {
    /// Decodes a message from its JSON wire form.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedClientMessage`] for unknown tags or
    /// structurally invalid payloads.
    pub fn decode(bz: &[u8]) -> Result<Self, ClientError> {
        let message: Self = serde_json::from_slice(bz)
            .map_err(|err| ClientError::MalformedClientMessage(err.to_string()))?;
        message.validate_basic()?;
        Ok(message)
    }

    fn validate_basic(&self) -> Result<(), ClientError> {
        match self {
            Self::Header(header) => header.validate_basic(),
            Self::Misbehaviour(misbehaviour) => misbehaviour.validate_basic(),
            Self::BatchUpdate(batch) => batch.validate_basic(),
        }
    }
}

/// A sequence-numbered state update signed by the authority.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Header {
    /// The update sequence; must exceed the client's stored sequence.
    pub sequence: u64,
    /// The authority-declared timestamp, unix nanoseconds.
    pub timestamp: u64,
    /// The new commitment root trusted from this update on.
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    pub root: Vec<u8>,
    /// The key authorized from this update on (equal to the current key when
    /// the update does not rotate it).
    pub new_public_key: PublicKey,
    /// The diversifier in effect from this update on.
    pub new_diversifier: String,
    /// Signature over the header sign bytes under the currently stored key.
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    pub signature: Vec<u8>,
}

impl Header {
    fn validate_basic(&self) -> Result<(), ClientError> {
        ensure!(
            !self.root.is_empty(),
            ClientError::MalformedClientMessage("header root cannot be empty".to_string())
        );
        ensure!(
            !self.signature.is_empty(),
            ClientError::MalformedClientMessage("header signature cannot be empty".to_string())
        );
        ensure!(
            !self.new_diversifier.is_empty(),
            ClientError::MalformedClientMessage("header diversifier cannot be empty".to_string())
        );
        Ok(())
    }
}

/// One signed payload of a misbehaviour submission.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct SignatureAndData {
    /// Signature over the sign bytes formed from the misbehaviour sequence,
    /// `timestamp`, `path` and `data`.
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    pub signature: Vec<u8>,
    /// The signing domain the data was committed under.
    pub path: String,
    /// The signed content.
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    pub data: Vec<u8>,
    /// The authority-declared timestamp of this signature.
    pub timestamp: u64,
}

impl SignatureAndData {
    fn validate_basic(&self) -> Result<(), ClientError> {
        ensure!(
            !self.signature.is_empty(),
            ClientError::MalformedClientMessage("signature cannot be empty".to_string())
        );
        ensure!(
            !self.data.is_empty(),
            ClientError::MalformedClientMessage("signed data cannot be empty".to_string())
        );
        Ok(())
    }
}

/// Two independently signed payloads at the same sequence number. If both
/// verify and their content differs, the sole authority equivocated.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Misbehaviour {
    /// The sequence number both signatures claim.
    pub sequence: u64,
    /// The first signed payload.
    pub signature_one: SignatureAndData,
    /// The second signed payload.
    pub signature_two: SignatureAndData,
}

impl Misbehaviour {
    fn validate_basic(&self) -> Result<(), ClientError> {
        self.signature_one.validate_basic()?;
        self.signature_two.validate_basic()?;
        ensure!(
            self.signature_one.data != self.signature_two.data
                || self.signature_one.path != self.signature_two.path,
            ClientError::MalformedClientMessage(
                "misbehaviour signatures must be over different content".to_string()
            )
        );
        Ok(())
    }
}

/// An ordered, strictly sequence-increasing run of headers.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct BatchUpdate {
    /// The headers, earliest first.
    pub headers: Vec<Header>,
}

impl BatchUpdate {
    fn validate_basic(&self) -> Result<(), ClientError> {
        ensure!(
            !self.headers.is_empty(),
            ClientError::MalformedClientMessage("batch update cannot be empty".to_string())
        );
        for header in &self.headers {
            header.validate_basic()?;
        }
        let ascending = self
            .headers
            .windows(2)
            .all(|pair| pair[0].sequence < pair[1].sequence);
        ensure!(
            ascending,
            ClientError::MalformedClientMessage(
                "batch update sequences must be strictly increasing".to_string()
            )
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ClientMessage;

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = ClientMessage::decode(br#"{"type":"fork_choice","votes":[]}"#).unwrap_err();
        assert!(err.to_string().contains("malformed client message"));
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        ClientMessage::decode(br#"{"type":"batch_update","headers":[]}"#).unwrap_err();
    }
}
