//! The solo machine implementation of the light client module contract.

use lightclient_core::codec::{decode_tagged, encode_tagged, CodecError};
use lightclient_core::context::Context;
use lightclient_core::error::ClientError;
use lightclient_core::height::Height;
use lightclient_core::identifiers::{ClientId, ClientType};
use lightclient_core::module::LightClientModule;
use lightclient_core::path::MerklePath;
use lightclient_core::status::Status;
use lightclient_core::store::{
    consensus_state_key, set_processed_metadata, verify_delay_period, HostStore, CLIENT_STATE_KEY,
};

use crate::client_state::{ClientState, ConsensusState};
use crate::message::{ClientMessage, Header, Misbehaviour};
use crate::proofs::{header_sign_digest, sign_bytes_digest, verify_commitment, CommitmentProof};
use crate::SOLOMACHINE_CLIENT_TYPE;

/// The single-authority client type implementation.
///
/// State machine: `Active -> Frozen` (terminal); nothing else. A single
/// signer makes equivocation the only possible misbehaviour, so detection
/// reduces to same-sequence content comparison.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoloMachineLightClient;

impl SoloMachineLightClient {
    /// Creates the solo machine module.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn map_state_codec_error(err: CodecError) -> ClientError {
    match err {
        CodecError::TypeMismatch { expected, actual } => {
            ClientError::InvalidClientType { expected, actual }
        }
        CodecError::Malformed(reason) => ClientError::MalformedClientState(reason),
    }
}

fn get_client_state(
    store: &dyn HostStore,
    client_id: &ClientId,
) -> Result<ClientState, ClientError> {
    let bz = store
        .get(CLIENT_STATE_KEY.as_bytes())
        .ok_or_else(|| ClientError::ClientNotFound(client_id.to_string()))?;
    decode_tagged(SOLOMACHINE_CLIENT_TYPE, &bz).map_err(map_state_codec_error)
}

fn set_client_state(store: &mut dyn HostStore, state: &ClientState) -> Result<(), ClientError> {
    let bz = encode_tagged(SOLOMACHINE_CLIENT_TYPE, state).map_err(map_state_codec_error)?;
    store.set(CLIENT_STATE_KEY.as_bytes(), &bz);
    Ok(())
}

fn get_consensus_state(
    store: &dyn HostStore,
    client_id: &ClientId,
    height: Height,
) -> Result<ConsensusState, ClientError> {
    let bz = store
        .get(&consensus_state_key(height))
        .ok_or_else(|| ClientError::ConsensusStateNotFound {
            client_id: client_id.to_string(),
            height,
        })?;
    decode_tagged(SOLOMACHINE_CLIENT_TYPE, &bz).map_err(|err| match err {
        CodecError::TypeMismatch { expected, actual } => {
            ClientError::InvalidClientType { expected, actual }
        }
        CodecError::Malformed(reason) => ClientError::MalformedConsensusState(reason),
    })
}

fn set_consensus_state(
    store: &mut dyn HostStore,
    height: Height,
    consensus_state: &ConsensusState,
) -> Result<(), ClientError> {
    let bz = encode_tagged(SOLOMACHINE_CLIENT_TYPE, consensus_state).map_err(|err| {
        ClientError::MalformedConsensusState(err.to_string())
    })?;
    store.set(&consensus_state_key(height), &bz);
    Ok(())
}

/// Verifies one header against the given (possibly simulated) client state.
fn verify_header(state: &ClientState, header: &Header) -> Result<(), ClientError> {
    if header.sequence <= state.sequence {
        return Err(ClientError::VerificationFailed(format!(
            "header sequence {} does not advance the stored sequence {}",
            header.sequence, state.sequence
        )));
    }
    if header.timestamp < state.timestamp {
        return Err(ClientError::VerificationFailed(format!(
            "header timestamp {} is before the stored timestamp {}",
            header.timestamp, state.timestamp
        )));
    }
    let digest = header_sign_digest(&state.diversifier, header)?;
    state.public_key.verify(&digest, &header.signature)
}

/// Folds an accepted header into the client state.
fn apply_header(state: &mut ClientState, header: &Header) {
    state.sequence = header.sequence;
    state.public_key = header.new_public_key.clone();
    state.diversifier = header.new_diversifier.clone();
    state.timestamp = header.timestamp;
}

fn verify_misbehaviour(state: &ClientState, misbehaviour: &Misbehaviour) -> Result<(), ClientError> {
    for side in [&misbehaviour.signature_one, &misbehaviour.signature_two] {
        let digest = sign_bytes_digest(
            misbehaviour.sequence,
            side.timestamp,
            &state.diversifier,
            &side.path,
            &side.data,
        )?;
        state.public_key.verify(&digest, &side.signature)?;
    }
    Ok(())
}

impl LightClientModule for SoloMachineLightClient {
    fn client_type(&self) -> ClientType {
        ClientType::new(SOLOMACHINE_CLIENT_TYPE).expect("static client type tag is valid")
    }

    fn initialize(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        _client_id: &ClientId,
        client_state_bz: &[u8],
        consensus_state_bz: &[u8],
    ) -> Result<(), ClientError> {
        let client_state: ClientState =
            decode_tagged(SOLOMACHINE_CLIENT_TYPE, client_state_bz)
                .map_err(map_state_codec_error)?;
        client_state.validate()?;
        if client_state.frozen {
            return Err(ClientError::MalformedClientState(
                "cannot initialize a frozen client".to_string(),
            ));
        }

        let consensus_state: ConsensusState =
            decode_tagged(SOLOMACHINE_CLIENT_TYPE, consensus_state_bz).map_err(|err| {
                ClientError::MalformedConsensusState(err.to_string())
            })?;
        consensus_state.validate()?;

        // Both payloads are validated; only now touch the store.
        let height = Height::new(0, client_state.sequence);
        set_client_state(store, &client_state)?;
        set_consensus_state(store, height, &consensus_state)?;
        set_processed_metadata(store, height, &ctx.env);
        Ok(())
    }

    fn verify_client_message(
        &self,
        _ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<(), ClientError> {
        let state = get_client_state(store, client_id)?;
        if state.frozen {
            return Err(ClientError::FrozenClient(client_id.to_string()));
        }
        match ClientMessage::decode(message)? {
            ClientMessage::Header(header) => verify_header(&state, &header),
            ClientMessage::Misbehaviour(misbehaviour) => {
                verify_misbehaviour(&state, &misbehaviour)
            }
            ClientMessage::BatchUpdate(batch) => {
                // Later headers may be signed by a rotated key, so verify
                // against a simulated state folded forward header by header.
                let mut simulated = state;
                for header in &batch.headers {
                    verify_header(&simulated, header)?;
                    apply_header(&mut simulated, header);
                }
                Ok(())
            }
        }
    }

    fn check_for_misbehaviour(
        &self,
        _ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<bool, ClientError> {
        get_client_state(store, client_id)?;
        let message = ClientMessage::decode(message)?;
        // Two independently valid signatures over different content at one
        // sequence is equivocation; headers and batches never flag.
        Ok(matches!(message, ClientMessage::Misbehaviour(_)))
    }

    fn update_state_on_misbehaviour(
        &self,
        _ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        _message: &[u8],
    ) -> Result<(), ClientError> {
        let mut state = get_client_state(store, client_id)?;
        if state.frozen {
            // freezing a frozen client is a no-op
            return Ok(());
        }
        state.frozen = true;
        set_client_state(store, &state)
    }

    fn update_state(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<Vec<Height>, ClientError> {
        let mut state = get_client_state(store, client_id)?;
        if state.frozen {
            return Err(ClientError::FrozenClient(client_id.to_string()));
        }
        let headers = match ClientMessage::decode(message)? {
            ClientMessage::Header(header) => vec![header],
            ClientMessage::BatchUpdate(batch) => batch.headers,
            ClientMessage::Misbehaviour(_) => {
                return Err(ClientError::MalformedClientMessage(
                    "misbehaviour cannot update state; use update_state_on_misbehaviour"
                        .to_string(),
                ))
            }
        };

        let mut heights = Vec::with_capacity(headers.len());
        for header in &headers {
            let height = Height::new(0, header.sequence);
            let consensus_state = ConsensusState {
                root: header.root.clone(),
                timestamp: header.timestamp,
            };
            set_consensus_state(store, height, &consensus_state)?;
            set_processed_metadata(store, height, &ctx.env);
            apply_header(&mut state, header);
            heights.push(height);
        }
        set_client_state(store, &state)?;
        heights.dedup();
        Ok(heights)
    }

    fn verify_membership(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        height: Height,
        delay_time_ns: u64,
        delay_blocks: u64,
        proof: &[u8],
        path: &MerklePath,
        value: &[u8],
    ) -> Result<(), ClientError> {
        if value.is_empty() {
            return Err(ClientError::VerificationFailed(
                "membership value cannot be empty".to_string(),
            ));
        }
        let state = get_client_state(store, client_id)?;
        get_consensus_state(store, client_id, height)?;
        verify_delay_period(store, &ctx.env, client_id, height, delay_time_ns, delay_blocks)?;
        let proof = CommitmentProof::decode(proof)?;
        verify_commitment(&state, height.revision_height, path, value, &proof)
    }

    fn verify_non_membership(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        height: Height,
        delay_time_ns: u64,
        delay_blocks: u64,
        proof: &[u8],
        path: &MerklePath,
    ) -> Result<(), ClientError> {
        let state = get_client_state(store, client_id)?;
        get_consensus_state(store, client_id, height)?;
        verify_delay_period(store, &ctx.env, client_id, height, delay_time_ns, delay_blocks)?;
        let proof = CommitmentProof::decode(proof)?;
        // absence is committed as an empty value under the same path domain
        verify_commitment(&state, height.revision_height, path, &[], &proof)
    }

    fn status(
        &self,
        _ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
    ) -> Status {
        match get_client_state(store, client_id) {
            Ok(state) if state.frozen => Status::Frozen,
            Ok(_) => Status::Active,
            Err(_) => Status::Unknown,
        }
    }

    fn timestamp_at_height(
        &self,
        _ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        height: Height,
    ) -> Result<u64, ClientError> {
        Ok(get_consensus_state(store, client_id, height)?.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use lightclient_core::codec::encode_tagged;
    use lightclient_core::context::{Context, HostEnv};
    use lightclient_core::error::ClientError;
    use lightclient_core::height::Height;
    use lightclient_core::identifiers::ClientId;
    use lightclient_core::module::LightClientModule;
    use lightclient_core::path::MerklePath;
    use lightclient_core::status::Status;
    use lightclient_core::store::PrefixedStore;
    use lightclient_core::testing::MemStore;

    use crate::client_state::ConsensusState;
    use crate::message::ClientMessage;
    use crate::testing::SigningAuthority;
    use crate::SOLOMACHINE_CLIENT_TYPE;

    use super::SoloMachineLightClient;

    fn client_id() -> ClientId {
        "solomachine-0".parse().unwrap()
    }

    fn ctx() -> Context {
        Context::new(HostEnv::new("testchain-1", 10, 1_000))
    }

    fn encode_message(message: &ClientMessage) -> Vec<u8> {
        serde_json::to_vec(message).unwrap()
    }

    /// Initializes a fresh client at sequence 0 and returns its host store.
    fn setup(authority: &SigningAuthority) -> MemStore {
        let mut host = MemStore::new();
        let module = SoloMachineLightClient::new();
        let client_state_bz = encode_tagged(
            SOLOMACHINE_CLIENT_TYPE,
            &authority.client_state(0, "oracle", 50),
        )
        .unwrap();
        let consensus_state_bz = encode_tagged(
            SOLOMACHINE_CLIENT_TYPE,
            &ConsensusState {
                root: vec![0; 32],
                timestamp: 50,
            },
        )
        .unwrap();
        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        module
            .initialize(
                &mut ctx(),
                &mut store,
                &client_id(),
                &client_state_bz,
                &consensus_state_bz,
            )
            .unwrap();
        host
    }

    #[test]
    fn test_initialize_then_active() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();
        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        assert_eq!(
            Status::Active,
            module.status(&mut ctx(), &mut store, &client_id())
        );
        assert_eq!(
            50,
            module
                .timestamp_at_height(&mut ctx(), &mut store, &client_id(), Height::new(0, 0))
                .unwrap()
        );
    }

    #[test]
    fn test_initialize_rejects_malformed_payloads_without_writes() {
        let mut host = MemStore::new();
        let module = SoloMachineLightClient::new();
        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        module
            .initialize(
                &mut ctx(),
                &mut store,
                &client_id(),
                b"not json",
                b"not json",
            )
            .unwrap_err();
        assert!(host.is_empty());
    }

    #[test]
    fn test_update_state_advances_sequence_and_heights() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();

        for sequence in [1u64, 2] {
            let header = authority.header(sequence, 60 + sequence, &[sequence as u8; 32], "oracle");
            let message = encode_message(&ClientMessage::Header(header));
            let mut store = PrefixedStore::for_client(&mut host, &client_id());
            module
                .verify_client_message(&mut ctx(), &mut store, &client_id(), &message)
                .unwrap();
            let heights = module
                .update_state(&mut ctx(), &mut store, &client_id(), &message)
                .unwrap();
            assert_eq!(vec![Height::new(0, sequence)], heights);
        }

        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        let first = module
            .timestamp_at_height(&mut ctx(), &mut store, &client_id(), Height::new(0, 1))
            .unwrap();
        let second = module
            .timestamp_at_height(&mut ctx(), &mut store, &client_id(), Height::new(0, 2))
            .unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_replayed_sequence_is_rejected() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();

        let header = authority.header(1, 61, &[1; 32], "oracle");
        let message = encode_message(&ClientMessage::Header(header));
        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        module
            .verify_client_message(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap();
        module
            .update_state(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap();

        let err = module
            .verify_client_message(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap_err();
        assert!(matches!(err, ClientError::VerificationFailed(_)));
    }

    #[test]
    fn test_batch_update_with_key_rotation() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let successor = SigningAuthority::from_seed([2; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();

        // header 1 rotates the key, header 2 is signed by the successor
        let batch = ClientMessage::BatchUpdate(crate::message::BatchUpdate {
            headers: vec![
                authority.rotating_header(1, 61, &[1; 32], "oracle", &successor, "oracle"),
                successor.header(2, 62, &[2; 32], "oracle"),
            ],
        });
        let message = encode_message(&batch);

        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        module
            .verify_client_message(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap();
        let heights = module
            .update_state(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap();
        assert_eq!(vec![Height::new(0, 1), Height::new(0, 2)], heights);
    }

    #[test]
    fn test_equivocation_freezes_permanently() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();

        let evidence = ClientMessage::Misbehaviour(authority.equivocation(
            4,
            70,
            "oracle",
            b"state a",
            b"state b",
        ));
        let message = encode_message(&evidence);

        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        module
            .verify_client_message(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap();
        assert!(module
            .check_for_misbehaviour(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap());

        module
            .update_state_on_misbehaviour(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap();
        assert_eq!(
            Status::Frozen,
            module.status(&mut ctx(), &mut store, &client_id())
        );

        // freezing again is a no-op, not an error
        module
            .update_state_on_misbehaviour(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap();
        assert_eq!(
            Status::Frozen,
            module.status(&mut ctx(), &mut store, &client_id())
        );

        // no later update succeeds
        let header = authority.header(5, 80, &[5; 32], "oracle");
        let update = encode_message(&ClientMessage::Header(header));
        let err = module
            .update_state(&mut ctx(), &mut store, &client_id(), &update)
            .unwrap_err();
        assert!(matches!(err, ClientError::FrozenClient(_)));
    }

    #[test]
    fn test_header_is_not_misbehaviour() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();

        let header = authority.header(1, 61, &[1; 32], "oracle");
        let message = encode_message(&ClientMessage::Header(header));
        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        assert!(!module
            .check_for_misbehaviour(&mut ctx(), &mut store, &client_id(), &message)
            .unwrap());
    }

    #[test]
    fn test_membership_proof_against_committed_height() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();

        let path = MerklePath::new(vec![b"commitments".to_vec(), b"7".to_vec()]);
        let proof = authority.commitment_proof(0, 55, "oracle", &path, b"value");
        let proof_bz = serde_json::to_vec(&proof).unwrap();

        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        module
            .verify_membership(
                &mut ctx(),
                &mut store,
                &client_id(),
                Height::new(0, 0),
                0,
                0,
                &proof_bz,
                &path,
                b"value",
            )
            .unwrap();

        // no root committed at height 1
        let err = module
            .verify_membership(
                &mut ctx(),
                &mut store,
                &client_id(),
                Height::new(0, 1),
                0,
                0,
                &proof_bz,
                &path,
                b"value",
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::ConsensusStateNotFound { .. }));
    }

    #[test]
    fn test_membership_delay_periods_enforced() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();

        let path = MerklePath::new(vec![b"commitments".to_vec()]);
        let proof = authority.commitment_proof(0, 55, "oracle", &path, b"value");
        let proof_bz = serde_json::to_vec(&proof).unwrap();

        // client was initialized at host height 10, time 1000
        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        let mut early = Context::new(HostEnv::new("testchain-1", 11, 1_100));
        let err = module
            .verify_membership(
                &mut early,
                &mut store,
                &client_id(),
                Height::new(0, 0),
                500,
                5,
                &proof_bz,
                &path,
                b"value",
            )
            .unwrap_err();
        assert!(matches!(err, ClientError::DelayPeriodNotElapsed(_)));

        let mut late = Context::new(HostEnv::new("testchain-1", 15, 1_500));
        module
            .verify_membership(
                &mut late,
                &mut store,
                &client_id(),
                Height::new(0, 0),
                500,
                5,
                &proof_bz,
                &path,
                b"value",
            )
            .unwrap();
    }

    #[test]
    fn test_non_membership_uses_absence_commitment() {
        let authority = SigningAuthority::from_seed([1; 32]);
        let mut host = setup(&authority);
        let module = SoloMachineLightClient::new();

        let path = MerklePath::new(vec![b"commitments".to_vec(), b"missing".to_vec()]);
        let proof = authority.commitment_proof(0, 55, "oracle", &path, b"");
        let proof_bz = serde_json::to_vec(&proof).unwrap();

        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        module
            .verify_non_membership(
                &mut ctx(),
                &mut store,
                &client_id(),
                Height::new(0, 0),
                0,
                0,
                &proof_bz,
                &path,
            )
            .unwrap();
    }

    #[test]
    fn test_unknown_client_yields_unknown_status() {
        let mut host = MemStore::new();
        let module = SoloMachineLightClient::new();
        let mut store = PrefixedStore::for_client(&mut host, &client_id());
        assert_eq!(
            Status::Unknown,
            module.status(&mut ctx(), &mut store, &client_id())
        );
    }
}
