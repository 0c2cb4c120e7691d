//! A scripted in-memory engine and fixture helpers.
//!
//! [`MockEngine`] behaves like a well-written client module: it keeps a tiny
//! latest-height/frozen state machine in the envelopes a real module would
//! use, so the call wrappers and the post-execution checks are exercised for
//! real. Builder methods inject the failure modes a hostile or broken module
//! could exhibit.

use cosmwasm_std::{BankMsg, Binary, ContractResult, Env, Event, Response};
use lightclient_core::codec;
use lightclient_core::height::Height;
use lightclient_core::store::{consensus_state_key, CLIENT_STATE_KEY};
use serde::{Deserialize, Serialize};

use crate::client_state::{Checksum, ClientState, ConsensusState};
use crate::engine::{EngineError, VmResult, WasmEngine};
use crate::msgs::{
    CheckForMisbehaviourResult, InstantiateMsg, QueryMsg, StatusResult, SudoMsg,
    TimestampAtHeightResult, UpdateStateResult,
};
use crate::store_adapter::ContractStore;
use crate::WASM_CLIENT_TYPE;

/// The inner client state blob the mock module maintains.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct MockClientData {
    /// Whether the module considers itself frozen.
    pub frozen: bool,
}

/// The inner consensus state blob the mock module maintains.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
pub struct MockConsensusData {
    /// Nanosecond timestamp of the mock consensus state.
    pub timestamp: u64,
}

/// The client messages the mock module understands.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MockClientMessage {
    /// A header committing a new height.
    Header {
        /// The height being committed.
        height: Height,
        /// The timestamp recorded with it.
        timestamp: u64,
    },
    /// Evidence the mock module always accepts as misbehaviour.
    Misbehaviour,
}

/// The checksum the mock fixtures are built under.
#[must_use]
pub fn mock_checksum() -> Checksum {
    Checksum(vec![0xAB; Checksum::LEN])
}

/// A tagged client state envelope at `latest_height` under [`mock_checksum`].
///
/// # Panics
/// Panics if fixture serialization fails.
#[must_use]
pub fn mock_client_state_bz(latest_height: Height) -> Vec<u8> {
    let data = serde_json::to_vec(&MockClientData::default()).expect("fixture serializes");
    let state = ClientState {
        data: Binary::from(data),
        checksum: mock_checksum(),
        latest_height,
    };
    codec::encode_tagged(WASM_CLIENT_TYPE, &state).expect("fixture serializes")
}

/// A tagged consensus state envelope carrying `timestamp`.
///
/// # Panics
/// Panics if fixture serialization fails.
#[must_use]
pub fn mock_consensus_state_bz(timestamp: u64) -> Vec<u8> {
    let data = serde_json::to_vec(&MockConsensusData { timestamp }).expect("fixture serializes");
    let state = ConsensusState {
        data: Binary::from(data),
    };
    codec::encode_tagged(WASM_CLIENT_TYPE, &state).expect("fixture serializes")
}

/// A serialized mock header.
///
/// # Panics
/// Panics if fixture serialization fails.
#[must_use]
pub fn mock_header(height: Height, timestamp: u64) -> Vec<u8> {
    serde_json::to_vec(&MockClientMessage::Header { height, timestamp })
        .expect("fixture serializes")
}

/// Serialized mock misbehaviour evidence.
///
/// # Panics
/// Panics if fixture serialization fails.
#[must_use]
pub fn mock_misbehaviour() -> Vec<u8> {
    serde_json::to_vec(&MockClientMessage::Misbehaviour).expect("fixture serializes")
}

/// The proof bytes the mock module accepts for `value` under `path`. Pass an
/// empty value for an absence proof.
#[must_use]
pub fn membership_proof(path: &lightclient_core::path::MerklePath, value: &[u8]) -> Vec<u8> {
    let mut proof = path.to_string().into_bytes();
    proof.push(0);
    proof.extend_from_slice(value);
    proof
}

/// A deterministic engine driving the mock module, with failure injection.
#[derive(Clone, Debug)]
pub struct MockEngine {
    gas_per_call: u64,
    fault: Option<EngineError>,
    contract_error: Option<String>,
    add_events: bool,
    add_attributes: bool,
    add_messages: bool,
    rewrite_checksum: Option<Checksum>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            gas_per_call: 100_000,
            fault: None,
            contract_error: None,
            add_events: false,
            add_attributes: false,
            add_messages: false,
            rewrite_checksum: None,
        }
    }
}

impl MockEngine {
    /// A healthy engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `gas` engine units consumed on every call. Calls whose gas
    /// ceiling is below this abort like a real out-of-gas would.
    #[must_use]
    pub const fn with_gas_per_call(mut self, gas: u64) -> Self {
        self.gas_per_call = gas;
        self
    }

    /// Every call fails in the engine itself, before the module runs.
    #[must_use]
    pub fn with_engine_fault(mut self, msg: &str) -> Self {
        self.fault = Some(EngineError::Aborted(msg.to_string()));
        self
    }

    /// Every call returns a module-level error.
    #[must_use]
    pub fn with_contract_error(mut self, msg: &str) -> Self {
        self.contract_error = Some(msg.to_string());
        self
    }

    /// Successful calls carry an event in the response.
    #[must_use]
    pub const fn with_events(mut self) -> Self {
        self.add_events = true;
        self
    }

    /// Successful calls carry an attribute in the response.
    #[must_use]
    pub const fn with_attributes(mut self) -> Self {
        self.add_attributes = true;
        self
    }

    /// Successful calls carry a submessage in the response.
    #[must_use]
    pub const fn with_messages(mut self) -> Self {
        self.add_messages = true;
        self
    }

    /// Successful sudo calls rewrite the stored checksum, simulating a module
    /// trying to swap itself out.
    #[must_use]
    pub fn with_checksum_rewrite(mut self, checksum: Checksum) -> Self {
        self.rewrite_checksum = Some(checksum);
        self
    }

    fn injected<T>(&self, gas_limit: u64) -> Option<VmResult<T>> {
        if let Some(fault) = &self.fault {
            return Some(VmResult::fault(
                self.gas_per_call.min(gas_limit),
                fault.clone(),
            ));
        }
        if self.gas_per_call > gas_limit {
            return Some(VmResult::fault(
                gas_limit,
                EngineError::Aborted("out of gas".to_string()),
            ));
        }
        if let Some(msg) = &self.contract_error {
            return Some(VmResult::contract_err(self.gas_per_call, msg.clone()));
        }
        None
    }

    fn decorate(&self, mut response: Response) -> Response {
        if self.add_events {
            response = response.add_event(Event::new("mock"));
        }
        if self.add_attributes {
            response = response.add_attribute("mock", "true");
        }
        if self.add_messages {
            response = response.add_message(BankMsg::Send {
                to_address: "nobody".to_string(),
                amount: vec![],
            });
        }
        response
    }

    fn finish(&self, store: &mut dyn ContractStore, result: Result<Response, String>) -> VmResult<Response> {
        match result {
            Ok(response) => {
                if let Some(checksum) = &self.rewrite_checksum {
                    if let Err(err) = rewrite_stored_checksum(store, checksum) {
                        return VmResult::contract_err(self.gas_per_call, err);
                    }
                }
                VmResult {
                    gas_used: self.gas_per_call,
                    result: Ok(ContractResult::Ok(self.decorate(response))),
                }
            }
            Err(err) => VmResult::contract_err(self.gas_per_call, err),
        }
    }
}

fn read_client_state(store: &dyn ContractStore) -> Result<ClientState, String> {
    let bz = store
        .get(CLIENT_STATE_KEY.as_bytes())
        .ok_or_else(|| "client state not found".to_string())?;
    codec::decode_tagged(WASM_CLIENT_TYPE, &bz).map_err(|e| e.to_string())
}

fn write_client_state(store: &mut dyn ContractStore, state: &ClientState) -> Result<(), String> {
    let bz = codec::encode_tagged(WASM_CLIENT_TYPE, state).map_err(|e| e.to_string())?;
    store
        .set(CLIENT_STATE_KEY.as_bytes(), &bz)
        .map_err(|e| e.to_string())
}

fn rewrite_stored_checksum(
    store: &mut dyn ContractStore,
    checksum: &Checksum,
) -> Result<(), String> {
    let mut state = read_client_state(store)?;
    state.checksum = checksum.clone();
    write_client_state(store, &state)
}

fn read_mock_data(state: &ClientState) -> Result<MockClientData, String> {
    serde_json::from_slice(&state.data).map_err(|e| e.to_string())
}

fn write_mock_data(
    store: &mut dyn ContractStore,
    state: &ClientState,
    data: MockClientData,
) -> Result<(), String> {
    let mut state = state.clone();
    state.data = Binary::from(serde_json::to_vec(&data).map_err(|e| e.to_string())?);
    write_client_state(store, &state)
}

fn write_consensus(
    store: &mut dyn ContractStore,
    height: Height,
    timestamp: u64,
) -> Result<(), String> {
    let data = serde_json::to_vec(&MockConsensusData { timestamp }).map_err(|e| e.to_string())?;
    let state = ConsensusState {
        data: Binary::from(data),
    };
    let bz = codec::encode_tagged(WASM_CLIENT_TYPE, &state).map_err(|e| e.to_string())?;
    store
        .set(&consensus_state_key(height), &bz)
        .map_err(|e| e.to_string())
}

fn read_consensus(store: &dyn ContractStore, height: Height) -> Result<MockConsensusData, String> {
    let bz = store
        .get(&consensus_state_key(height))
        .ok_or_else(|| format!("no consensus state at {height}"))?;
    let state: ConsensusState =
        codec::decode_tagged(WASM_CLIENT_TYPE, &bz).map_err(|e| e.to_string())?;
    serde_json::from_slice(&state.data).map_err(|e| e.to_string())
}

fn wire_path(path: &crate::msgs::MerklePath) -> lightclient_core::path::MerklePath {
    lightclient_core::path::MerklePath::new(
        path.key_path.iter().map(|segment| segment.to_vec()).collect(),
    )
}

fn data_response<T: Serialize>(value: &T) -> Result<Response, String> {
    let bz = serde_json::to_vec(value).map_err(|e| e.to_string())?;
    Ok(Response::new().set_data(Binary::from(bz)))
}

fn run_sudo(store: &mut dyn ContractStore, msg: &SudoMsg) -> Result<Response, String> {
    match msg {
        SudoMsg::UpdateState(msg) => {
            let state = read_client_state(store)?;
            let data = read_mock_data(&state)?;
            if data.frozen {
                return Err("client is frozen".to_string());
            }
            let MockClientMessage::Header { height, timestamp } =
                serde_json::from_slice(&msg.client_message).map_err(|e| e.to_string())?
            else {
                return Err("cannot update from misbehaviour evidence".to_string());
            };
            write_consensus(store, height, timestamp)?;
            let mut state = state;
            if height > state.latest_height {
                state.latest_height = height;
            }
            write_client_state(store, &state)?;
            data_response(&UpdateStateResult {
                heights: vec![height],
            })
        }
        SudoMsg::UpdateStateOnMisbehaviour(_) => {
            let state = read_client_state(store)?;
            write_mock_data(store, &state, MockClientData { frozen: true })?;
            Ok(Response::new())
        }
        SudoMsg::VerifyMembership(msg) => {
            read_consensus(store, msg.height)?;
            let expected = membership_proof(&wire_path(&msg.merkle_path), &msg.value);
            if msg.proof.as_slice() == expected.as_slice() {
                Ok(Response::new())
            } else {
                Err("membership proof mismatch".to_string())
            }
        }
        SudoMsg::VerifyNonMembership(msg) => {
            read_consensus(store, msg.height)?;
            let expected = membership_proof(&wire_path(&msg.merkle_path), &[]);
            if msg.proof.as_slice() == expected.as_slice() {
                Ok(Response::new())
            } else {
                Err("absence proof mismatch".to_string())
            }
        }
        SudoMsg::MigrateClientStore(_) => Ok(Response::new()),
    }
}

fn run_query(store: &dyn ContractStore, msg: &QueryMsg) -> Result<Vec<u8>, String> {
    match msg {
        QueryMsg::Status(_) => {
            let state = read_client_state(store)?;
            let data = read_mock_data(&state)?;
            let status = if data.frozen { "Frozen" } else { "Active" };
            serde_json::to_vec(&StatusResult {
                status: status.to_string(),
            })
            .map_err(|e| e.to_string())
        }
        QueryMsg::VerifyClientMessage(msg) => {
            let state = read_client_state(store)?;
            let data = read_mock_data(&state)?;
            if data.frozen {
                return Err("client is frozen".to_string());
            }
            match serde_json::from_slice(&msg.client_message).map_err(|e| e.to_string())? {
                MockClientMessage::Header { height, .. } => {
                    if height > state.latest_height {
                        serde_json::to_vec(&crate::msgs::EmptyResult {})
                            .map_err(|e| e.to_string())
                    } else {
                        Err("header height is not newer than the latest height".to_string())
                    }
                }
                MockClientMessage::Misbehaviour => {
                    serde_json::to_vec(&crate::msgs::EmptyResult {}).map_err(|e| e.to_string())
                }
            }
        }
        QueryMsg::CheckForMisbehaviour(msg) => {
            let message: MockClientMessage =
                serde_json::from_slice(&msg.client_message).map_err(|e| e.to_string())?;
            serde_json::to_vec(&CheckForMisbehaviourResult {
                found_misbehaviour: matches!(message, MockClientMessage::Misbehaviour),
            })
            .map_err(|e| e.to_string())
        }
        QueryMsg::TimestampAtHeight(msg) => {
            let consensus = read_consensus(store, msg.height)?;
            serde_json::to_vec(&TimestampAtHeightResult {
                timestamp: consensus.timestamp,
            })
            .map_err(|e| e.to_string())
        }
    }
}

impl WasmEngine for MockEngine {
    fn instantiate(
        &self,
        _checksum: &Checksum,
        _env: &Env,
        store: &mut dyn ContractStore,
        msg: &[u8],
        gas_limit: u64,
    ) -> VmResult<Response> {
        if let Some(result) = self.injected(gas_limit) {
            return result;
        }
        let result = (|| {
            let msg: InstantiateMsg = serde_json::from_slice(msg).map_err(|e| e.to_string())?;
            let state: ClientState =
                codec::decode_tagged(WASM_CLIENT_TYPE, &msg.client_state).map_err(|e| e.to_string())?;
            let consensus: ConsensusState = codec::decode_tagged(WASM_CLIENT_TYPE, &msg.consensus_state)
                .map_err(|e| e.to_string())?;
            let data: MockConsensusData =
                serde_json::from_slice(&consensus.data).map_err(|e| e.to_string())?;
            write_client_state(store, &state)?;
            write_consensus(store, state.latest_height, data.timestamp)?;
            Ok(Response::new())
        })();
        self.finish(store, result)
    }

    fn sudo(
        &self,
        _checksum: &Checksum,
        _env: &Env,
        store: &mut dyn ContractStore,
        msg: &[u8],
        gas_limit: u64,
    ) -> VmResult<Response> {
        if let Some(result) = self.injected(gas_limit) {
            return result;
        }
        let result = serde_json::from_slice::<SudoMsg>(msg)
            .map_err(|e| e.to_string())
            .and_then(|msg| run_sudo(store, &msg));
        self.finish(store, result)
    }

    fn query(
        &self,
        _checksum: &Checksum,
        _env: &Env,
        store: &dyn ContractStore,
        msg: &[u8],
        gas_limit: u64,
    ) -> VmResult<Binary> {
        if let Some(result) = self.injected(gas_limit) {
            return result;
        }
        let result = serde_json::from_slice::<QueryMsg>(msg)
            .map_err(|e| e.to_string())
            .and_then(|msg| run_query(store, &msg));
        match result {
            Ok(bz) => VmResult::ok(self.gas_per_call, Binary::from(bz)),
            Err(err) => VmResult::contract_err(self.gas_per_call, err),
        }
    }

    fn migrate(
        &self,
        checksum: &Checksum,
        _env: &Env,
        store: &mut dyn ContractStore,
        msg: &[u8],
        gas_limit: u64,
    ) -> VmResult<Response> {
        if let Some(result) = self.injected(gas_limit) {
            return result;
        }
        let result = (|| {
            serde_json::from_slice::<serde_json::Value>(msg).map_err(|e| e.to_string())?;
            rewrite_stored_checksum(store, checksum)?;
            Ok(Response::new())
        })();
        self.finish(store, result)
    }
}
