//! End-to-end flows through the router: identity allocation, dispatch,
//! update and misbehaviour lifecycles, and client store isolation.

use lightclient_core::codec::encode_tagged;
use lightclient_core::context::{Context, HostEnv};
use lightclient_core::error::ClientError;
use lightclient_core::height::Height;
use lightclient_core::identifiers::{ClientId, ClientType};
use lightclient_core::path::MerklePath;
use lightclient_core::status::Status;
use lightclient_core::testing::MemStore;
use lightclient_router::{ClientModule, Router};
use solomachine_light_client::client_state::ConsensusState;
use solomachine_light_client::message::ClientMessage;
use solomachine_light_client::testing::SigningAuthority;
use solomachine_light_client::{SoloMachineLightClient, SOLOMACHINE_CLIENT_TYPE};
use wasm_light_client::client_state::Checksum;
use wasm_light_client::gas::VmGasConfig;
use wasm_light_client::testing::{
    mock_client_state_bz, mock_consensus_state_bz, mock_header, MockEngine,
};
use wasm_light_client::{WasmLightClient, WASM_CLIENT_TYPE};

fn router() -> Router<MockEngine> {
    Router::new()
        .register(ClientModule::SoloMachine(SoloMachineLightClient::new()))
        .register(ClientModule::Wasm(WasmLightClient::new(
            MockEngine::new(),
            VmGasConfig::default(),
        )))
}

fn ctx() -> Context {
    Context::new(HostEnv::new("testchain-1", 10, 1_000))
}

fn solomachine_type() -> ClientType {
    ClientType::new(SOLOMACHINE_CLIENT_TYPE).unwrap()
}

fn wasm_type() -> ClientType {
    ClientType::new(WASM_CLIENT_TYPE).unwrap()
}

fn solo_client_state_bz(authority: &SigningAuthority) -> Vec<u8> {
    encode_tagged(
        SOLOMACHINE_CLIENT_TYPE,
        &authority.client_state(0, "oracle", 50),
    )
    .unwrap()
}

fn solo_consensus_state_bz() -> Vec<u8> {
    encode_tagged(
        SOLOMACHINE_CLIENT_TYPE,
        &ConsensusState {
            root: vec![0; 32],
            timestamp: 50,
        },
    )
    .unwrap()
}

fn create_solo(
    router: &Router<MockEngine>,
    host: &mut MemStore,
    authority: &SigningAuthority,
) -> ClientId {
    router
        .create_client(
            &mut ctx(),
            host,
            &solomachine_type(),
            &solo_client_state_bz(authority),
            &solo_consensus_state_bz(),
        )
        .unwrap()
}

#[test]
fn test_identities_are_allocated_from_one_counter() {
    let router = router();
    let mut host = MemStore::new();
    let authority = SigningAuthority::from_seed([1; 32]);

    let first = create_solo(&router, &mut host, &authority);
    let second = create_solo(&router, &mut host, &authority);
    let third = router
        .create_client(
            &mut ctx(),
            &mut host,
            &wasm_type(),
            &mock_client_state_bz(Height::new(0, 5)),
            &mock_consensus_state_bz(1_000),
        )
        .unwrap();

    assert_eq!("solomachine-0", first.to_string());
    assert_eq!("solomachine-1", second.to_string());
    assert_eq!("wasm-2", third.to_string());
}

#[test]
fn test_failed_creation_does_not_advance_the_counter() {
    let router = router();
    let mut host = MemStore::new();
    let authority = SigningAuthority::from_seed([1; 32]);

    router
        .create_client(
            &mut ctx(),
            &mut host,
            &solomachine_type(),
            b"not json",
            &solo_consensus_state_bz(),
        )
        .unwrap_err();

    let client_id = create_solo(&router, &mut host, &authority);
    assert_eq!("solomachine-0", client_id.to_string());
}

#[test]
fn test_unregistered_type_is_rejected() {
    let router: Router<MockEngine> =
        Router::new().register(ClientModule::SoloMachine(SoloMachineLightClient::new()));
    let mut host = MemStore::new();

    let err = router
        .create_client(
            &mut ctx(),
            &mut host,
            &wasm_type(),
            &mock_client_state_bz(Height::new(0, 5)),
            &mock_consensus_state_bz(1_000),
        )
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidClientType { .. }), "{err}");

    let unknown: ClientId = "wasm-0".parse().unwrap();
    assert_eq!(Status::Unknown, router.status(&mut ctx(), &mut host, &unknown));
}

#[test]
fn test_solomachine_update_flow() {
    let router = router();
    let mut host = MemStore::new();
    let authority = SigningAuthority::from_seed([2; 32]);
    let client_id = create_solo(&router, &mut host, &authority);

    let header = authority.header(1, 61, &[1; 32], "oracle");
    let message = serde_json::to_vec(&ClientMessage::Header(header)).unwrap();

    router
        .verify_client_message(&mut ctx(), &mut host, &client_id, &message)
        .unwrap();
    assert!(!router
        .check_for_misbehaviour(&mut ctx(), &mut host, &client_id, &message)
        .unwrap());
    let heights = router
        .update_state(&mut ctx(), &mut host, &client_id, &message)
        .unwrap();
    assert_eq!(vec![Height::new(0, 1)], heights);
    assert_eq!(
        61,
        router
            .timestamp_at_height(&mut ctx(), &mut host, &client_id, Height::new(0, 1))
            .unwrap()
    );
}

#[test]
fn test_misbehaviour_freezes_the_client() {
    let router = router();
    let mut host = MemStore::new();
    let authority = SigningAuthority::from_seed([3; 32]);
    let client_id = create_solo(&router, &mut host, &authority);

    let evidence = serde_json::to_vec(&ClientMessage::Misbehaviour(authority.equivocation(
        1,
        55,
        "oracle",
        b"one",
        b"two",
    )))
    .unwrap();

    router
        .verify_client_message(&mut ctx(), &mut host, &client_id, &evidence)
        .unwrap();
    assert!(router
        .check_for_misbehaviour(&mut ctx(), &mut host, &client_id, &evidence)
        .unwrap());
    router
        .update_state_on_misbehaviour(&mut ctx(), &mut host, &client_id, &evidence)
        .unwrap();
    assert_eq!(
        Status::Frozen,
        router.status(&mut ctx(), &mut host, &client_id)
    );

    let header = authority.header(2, 70, &[2; 32], "oracle");
    let message = serde_json::to_vec(&ClientMessage::Header(header)).unwrap();
    let err = router
        .update_state(&mut ctx(), &mut host, &client_id, &message)
        .unwrap_err();
    assert!(matches!(err, ClientError::FrozenClient(_)), "{err}");
}

#[test]
fn test_membership_verification_through_the_router() {
    let router = router();
    let mut host = MemStore::new();
    let authority = SigningAuthority::from_seed([4; 32]);
    let client_id = create_solo(&router, &mut host, &authority);

    let path = MerklePath::new(vec![b"commitments".to_vec(), b"channel-0/1".to_vec()]);
    let proof = authority.commitment_proof(0, 55, "oracle", &path, b"value");
    let proof_bz = serde_json::to_vec(&proof).unwrap();

    router
        .verify_membership(
            &mut ctx(),
            &mut host,
            &client_id,
            Height::new(0, 0),
            0,
            0,
            &proof_bz,
            &path,
            b"value",
        )
        .unwrap();

    let absence_path = MerklePath::new(vec![b"receipts".to_vec(), b"missing".to_vec()]);
    let absence = authority.commitment_proof(0, 55, "oracle", &absence_path, b"");
    let absence_bz = serde_json::to_vec(&absence).unwrap();
    router
        .verify_non_membership(
            &mut ctx(),
            &mut host,
            &client_id,
            Height::new(0, 0),
            0,
            0,
            &absence_bz,
            &absence_path,
        )
        .unwrap();
}

#[test]
fn test_wasm_client_lifecycle_and_migration() {
    let router = router();
    let mut host = MemStore::new();

    let client_id = router
        .create_client(
            &mut ctx(),
            &mut host,
            &wasm_type(),
            &mock_client_state_bz(Height::new(0, 5)),
            &mock_consensus_state_bz(1_000),
        )
        .unwrap();
    assert_eq!("wasm-0", client_id.to_string());

    let header = mock_header(Height::new(0, 6), 2_000);
    router
        .verify_client_message(&mut ctx(), &mut host, &client_id, &header)
        .unwrap();
    let heights = router
        .update_state(&mut ctx(), &mut host, &client_id, &header)
        .unwrap();
    assert_eq!(vec![Height::new(0, 6)], heights);

    let new_checksum = Checksum(vec![0xCD; 32]);
    router
        .migrate_wasm_contract(&mut ctx(), &mut host, &client_id, &new_checksum, b"{}")
        .unwrap();
    assert_eq!(
        Status::Active,
        router.status(&mut ctx(), &mut host, &client_id)
    );

    // Only wasm clients can be migrated.
    let authority = SigningAuthority::from_seed([5; 32]);
    let solo_id = create_solo(&router, &mut host, &authority);
    let err = router
        .migrate_wasm_contract(&mut ctx(), &mut host, &solo_id, &Checksum(vec![0xEF; 32]), b"{}")
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidClientType { .. }), "{err}");
}

#[test]
fn test_client_stores_are_isolated() {
    let router = router();
    let mut host = MemStore::new();
    let first_authority = SigningAuthority::from_seed([6; 32]);
    let second_authority = SigningAuthority::from_seed([7; 32]);

    let first = create_solo(&router, &mut host, &first_authority);
    let second = create_solo(&router, &mut host, &second_authority);

    let header = first_authority.header(1, 61, &[1; 32], "oracle");
    let message = serde_json::to_vec(&ClientMessage::Header(header)).unwrap();
    router
        .update_state(&mut ctx(), &mut host, &first, &message)
        .unwrap();

    // The second client saw none of it.
    let err = router
        .timestamp_at_height(&mut ctx(), &mut host, &second, Height::new(0, 1))
        .unwrap_err();
    assert!(matches!(err, ClientError::ConsensusStateNotFound { .. }), "{err}");

    // And its own authority still updates from its own sequence.
    let header = second_authority.header(1, 62, &[9; 32], "oracle");
    let message = serde_json::to_vec(&ClientMessage::Header(header)).unwrap();
    router
        .update_state(&mut ctx(), &mut host, &second, &message)
        .unwrap();
}
