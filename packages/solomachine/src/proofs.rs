//! Sign-bytes construction and proof verification.
//!
//! Everything the authority signs is the SHA-256 digest of a canonical JSON
//! record of `{sequence, timestamp, diversifier, path, data}`. The `path`
//! doubles as a signing domain: headers use [`HEADER_PATH`], commitment
//! proofs use the commitment path being proven.

use lightclient_core::error::ClientError;
use lightclient_core::path::MerklePath;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::client_state::{ClientState, PublicKey};
use crate::message::Header;

/// The signing domain of header updates.
pub const HEADER_PATH: &str = "solomachine:header";

#[derive(Serialize)]
struct SignBytes<'a> {
    sequence: u64,
    timestamp: u64,
    diversifier: &'a str,
    path: &'a str,
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    data: &'a [u8],
}

#[derive(Serialize)]
struct HeaderData<'a> {
    new_public_key: &'a PublicKey,
    new_diversifier: &'a str,
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    root: &'a [u8],
}

/// The digest the authority signs for the given record.
///
/// # Errors
/// Returns [`ClientError::Internal`] if canonical serialization fails, which
/// indicates a framework bug rather than bad input.
pub fn sign_bytes_digest(
    sequence: u64,
    timestamp: u64,
    diversifier: &str,
    path: &str,
    data: &[u8],
) -> Result<[u8; 32], ClientError> {
    let sign_bytes = SignBytes {
        sequence,
        timestamp,
        diversifier,
        path,
        data,
    };
    let bz = serde_json::to_vec(&sign_bytes)
        .map_err(|err| ClientError::Internal(format!("sign bytes serialization failed: {err}")))?;
    Ok(Sha256::digest(&bz).into())
}

/// The digest signed by a header update, bound to the diversifier currently
/// in effect.
///
/// # Errors
/// Returns [`ClientError::Internal`] if canonical serialization fails.
pub fn header_sign_digest(diversifier: &str, header: &Header) -> Result<[u8; 32], ClientError> {
    let data = HeaderData {
        new_public_key: &header.new_public_key,
        new_diversifier: &header.new_diversifier,
        root: &header.root,
    };
    let data_bz = serde_json::to_vec(&data)
        .map_err(|err| ClientError::Internal(format!("header data serialization failed: {err}")))?;
    sign_bytes_digest(
        header.sequence,
        header.timestamp,
        diversifier,
        HEADER_PATH,
        &data_bz,
    )
}

/// A signed commitment proof: the authority's signature over the commitment
/// path and value (or absence) at one sequence.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct CommitmentProof {
    /// The authority-declared timestamp of the signature.
    pub timestamp: u64,
    /// Signature over the commitment sign bytes.
    #[serde(with = "lightclient_core::serde::hex_bytes")]
    pub signature: Vec<u8>,
}

impl CommitmentProof {
    /// Decodes a proof from its JSON wire form.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedClientMessage`] on decode failure.
    pub fn decode(bz: &[u8]) -> Result<Self, ClientError> {
        serde_json::from_slice(bz)
            .map_err(|err| ClientError::MalformedClientMessage(format!("invalid proof: {err}")))
    }
}

/// Verifies a signed commitment at `sequence` for `path`.
///
/// `value` is the committed bytes for membership, or empty for a
/// non-membership (absence) commitment.
///
/// # Errors
/// Returns [`ClientError::VerificationFailed`] if the path is empty or the
/// signature does not verify under the client's current key.
pub fn verify_commitment(
    client_state: &ClientState,
    sequence: u64,
    path: &MerklePath,
    value: &[u8],
    proof: &CommitmentProof,
) -> Result<(), ClientError> {
    if path.is_empty() {
        return Err(ClientError::VerificationFailed(
            "proof path is empty".to_string(),
        ));
    }
    let digest = sign_bytes_digest(
        sequence,
        proof.timestamp,
        &client_state.diversifier,
        &path.to_string(),
        value,
    )?;
    client_state.public_key.verify(&digest, &proof.signature)
}

#[cfg(test)]
mod tests {
    use lightclient_core::path::MerklePath;

    use super::{sign_bytes_digest, verify_commitment, CommitmentProof};
    use crate::testing::SigningAuthority;

    #[test]
    fn test_digest_is_deterministic() {
        let one = sign_bytes_digest(1, 2, "d", "p", b"data").unwrap();
        let two = sign_bytes_digest(1, 2, "d", "p", b"data").unwrap();
        assert_eq!(one, two);

        let other = sign_bytes_digest(1, 2, "d", "p", b"other").unwrap();
        assert_ne!(one, other);
    }

    #[test]
    fn test_verify_commitment_roundtrip() {
        let authority = SigningAuthority::from_seed([9; 32]);
        let state = authority.client_state(0, "oracle", 100);
        let path = MerklePath::new(vec![b"commitments".to_vec(), b"7".to_vec()]);

        let proof = authority.commitment_proof(3, 100, "oracle", &path, b"value");
        verify_commitment(&state, 3, &path, b"value", &proof).unwrap();

        // wrong value does not verify
        verify_commitment(&state, 3, &path, b"other", &proof).unwrap_err();
        // wrong sequence does not verify
        verify_commitment(&state, 4, &path, b"value", &proof).unwrap_err();
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let authority = SigningAuthority::from_seed([9; 32]);
        let state = authority.client_state(0, "oracle", 100);
        let proof = CommitmentProof {
            timestamp: 100,
            signature: vec![0; 64],
        };
        verify_commitment(&state, 1, &MerklePath::default(), b"value", &proof).unwrap_err();
    }
}
