//! Test support: a deterministic signing authority producing valid headers,
//! misbehaviour evidence and commitment proofs.

use ed25519_dalek::{Signer, SigningKey};
use lightclient_core::path::MerklePath;

use crate::client_state::{ClientState, PublicKey};
use crate::message::{Header, Misbehaviour, SignatureAndData};
use crate::proofs::{header_sign_digest, sign_bytes_digest, CommitmentProof};

/// An ed25519 keypair playing the remote single authority in tests.
pub struct SigningAuthority {
    key: SigningKey,
}

impl SigningAuthority {
    /// Derives a deterministic authority from a fixed seed.
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// The authority's public key in wire form.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.key.verifying_key().to_bytes().to_vec())
    }

    /// A client state naming this authority as the signer.
    #[must_use]
    pub fn client_state(&self, sequence: u64, diversifier: &str, timestamp: u64) -> ClientState {
        ClientState {
            sequence,
            frozen: false,
            public_key: self.public_key(),
            diversifier: diversifier.to_string(),
            timestamp,
        }
    }

    /// Signs a digest, returning the raw signature bytes.
    #[must_use]
    pub fn sign(&self, digest: &[u8]) -> Vec<u8> {
        self.key.sign(digest).to_bytes().to_vec()
    }

    /// A valid header at `sequence` keeping this authority's key and the
    /// given diversifier in force.
    ///
    /// # Panics
    /// Panics if sign-bytes serialization fails.
    #[must_use]
    pub fn header(&self, sequence: u64, timestamp: u64, root: &[u8], diversifier: &str) -> Header {
        self.rotating_header(sequence, timestamp, root, diversifier, self, diversifier)
    }

    /// A valid header rotating the authority key and/or diversifier.
    ///
    /// `diversifier` is the one currently in force (part of the signing
    /// domain); `next`/`new_diversifier` take effect after the update.
    ///
    /// # Panics
    /// Panics if sign-bytes serialization fails.
    #[must_use]
    pub fn rotating_header(
        &self,
        sequence: u64,
        timestamp: u64,
        root: &[u8],
        diversifier: &str,
        next: &Self,
        new_diversifier: &str,
    ) -> Header {
        let mut header = Header {
            sequence,
            timestamp,
            root: root.to_vec(),
            new_public_key: next.public_key(),
            new_diversifier: new_diversifier.to_string(),
            signature: vec![],
        };
        let digest = header_sign_digest(diversifier, &header).unwrap();
        header.signature = self.sign(&digest);
        header
    }

    /// A signed payload for misbehaviour evidence.
    ///
    /// # Panics
    /// Panics if sign-bytes serialization fails.
    #[must_use]
    pub fn signature_and_data(
        &self,
        sequence: u64,
        timestamp: u64,
        diversifier: &str,
        path: &str,
        data: &[u8],
    ) -> SignatureAndData {
        let digest = sign_bytes_digest(sequence, timestamp, diversifier, path, data).unwrap();
        SignatureAndData {
            signature: self.sign(&digest),
            path: path.to_string(),
            data: data.to_vec(),
            timestamp,
        }
    }

    /// Equivocation evidence: two valid signatures over different content at
    /// the same sequence.
    #[must_use]
    pub fn equivocation(
        &self,
        sequence: u64,
        timestamp: u64,
        diversifier: &str,
        data_one: &[u8],
        data_two: &[u8],
    ) -> Misbehaviour {
        Misbehaviour {
            sequence,
            signature_one: self.signature_and_data(
                sequence,
                timestamp,
                diversifier,
                "solomachine:equivocation/1",
                data_one,
            ),
            signature_two: self.signature_and_data(
                sequence,
                timestamp,
                diversifier,
                "solomachine:equivocation/2",
                data_two,
            ),
        }
    }

    /// A valid membership (or, with an empty `value`, non-membership) proof.
    ///
    /// # Panics
    /// Panics if sign-bytes serialization fails.
    #[must_use]
    pub fn commitment_proof(
        &self,
        sequence: u64,
        timestamp: u64,
        diversifier: &str,
        path: &MerklePath,
        value: &[u8],
    ) -> CommitmentProof {
        let digest =
            sign_bytes_digest(sequence, timestamp, diversifier, &path.to_string(), value).unwrap();
        CommitmentProof {
            timestamp,
            signature: self.sign(&digest),
        }
    }
}
