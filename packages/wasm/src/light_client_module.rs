//! The sandboxed client type: every operation is delegated to an executable
//! module run through the engine, with the framework enforcing gas, store
//! isolation and post-execution discipline around each call.

use cosmwasm_std::Binary;
use lightclient_core::codec::{self, CodecError};
use lightclient_core::context::Context;
use lightclient_core::error::ClientError;
use lightclient_core::height::Height;
use lightclient_core::identifiers::{ClientId, ClientType};
use lightclient_core::module::LightClientModule;
use lightclient_core::path::MerklePath;
use lightclient_core::status::Status;
use lightclient_core::store::{HostStore, CLIENT_STATE_KEY};

use crate::client_state::{Checksum, ClientState, ConsensusState};
use crate::contract::{decode_result, wasm_instantiate, wasm_migrate, wasm_query, wasm_sudo};
use crate::engine::WasmEngine;
use crate::gas::VmGasConfig;
use crate::msgs::{
    CheckForMisbehaviourMsg, CheckForMisbehaviourResult, InstantiateMsg, QueryMsg, StatusMsg,
    StatusResult, SudoMsg, TimestampAtHeightMsg, TimestampAtHeightResult,
    UpdateStateOnMisbehaviourMsg, UpdateStateMsg, UpdateStateResult, VerifyClientMessageMsg,
    VerifyMembershipMsg, VerifyNonMembershipMsg,
};
use crate::WASM_CLIENT_TYPE;

/// The wasm client type implementation, generic over the engine backing it.
pub struct WasmLightClient<E: WasmEngine> {
    engine: E,
    gas_config: VmGasConfig,
}

fn client_state_codec_err(client_id: &ClientId, err: CodecError) -> ClientError {
    match err {
        CodecError::TypeMismatch { expected, actual } => {
            ClientError::InvalidClientType { expected, actual }
        }
        CodecError::Malformed(msg) => ClientError::MalformedClientState(format!(
            "client state of {client_id}: {msg}"
        )),
    }
}

fn get_client_state(
    store: &dyn HostStore,
    client_id: &ClientId,
) -> Result<ClientState, ClientError> {
    let bz = store
        .get(CLIENT_STATE_KEY.as_bytes())
        .ok_or_else(|| ClientError::ClientNotFound(client_id.to_string()))?;
    codec::decode_tagged(WASM_CLIENT_TYPE, &bz).map_err(|e| client_state_codec_err(client_id, e))
}

fn set_client_state(
    store: &mut dyn HostStore,
    client_state: &ClientState,
) -> Result<(), ClientError> {
    let bz = codec::encode_tagged(WASM_CLIENT_TYPE, client_state)
        .map_err(|e| ClientError::Internal(format!("encoding client state: {e}")))?;
    store.set(CLIENT_STATE_KEY.as_bytes(), &bz);
    Ok(())
}

fn validate_update_heights(heights: &[Height]) -> Result<(), ClientError> {
    if heights.is_empty() {
        return Err(ClientError::InvalidResponseData(
            "update returned no heights".to_string(),
        ));
    }
    if heights.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(ClientError::InvalidResponseData(
            "update heights are not strictly ascending".to_string(),
        ));
    }
    Ok(())
}

impl<E: WasmEngine> WasmLightClient<E> {
    /// Builds the client type implementation around an engine. All gas
    /// parameters are fixed here; nothing about accounting is read from
    /// global state later.
    #[must_use]
    pub const fn new(engine: E, gas_config: VmGasConfig) -> Self {
        Self { engine, gas_config }
    }

    /// Swaps the module governing `client_id` to the module identified by
    /// `new_checksum`, driving that module's migrate entry point over the
    /// client's existing store. This is the only path on which the stored
    /// checksum may change.
    ///
    /// `msg` is the module-defined migration payload, passed through as-is.
    ///
    /// # Errors
    /// Returns [`ClientError::ClientNotFound`] for unknown clients,
    /// [`ClientError::MalformedClientState`] if the checksum is invalid or
    /// equal to the current one, and the usual engine call failure modes.
    pub fn migrate_contract(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        new_checksum: &Checksum,
        msg: &[u8],
    ) -> Result<(), ClientError> {
        new_checksum.validate()?;
        let mut client_state = get_client_state(store, client_id)?;
        if client_state.checksum == *new_checksum {
            return Err(ClientError::MalformedClientState(
                "new checksum equals the current checksum".to_string(),
            ));
        }
        client_state.checksum = new_checksum.clone();
        set_client_state(store, &client_state)?;
        wasm_migrate(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            new_checksum,
            msg,
        )?;
        Ok(())
    }
}

impl<E: WasmEngine> LightClientModule for WasmLightClient<E> {
    fn client_type(&self) -> ClientType {
        ClientType::new(WASM_CLIENT_TYPE).expect("static client type tag is valid")
    }

    fn initialize(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        client_state_bz: &[u8],
        consensus_state_bz: &[u8],
    ) -> Result<(), ClientError> {
        let client_state: ClientState = codec::decode_tagged(WASM_CLIENT_TYPE, client_state_bz)
            .map_err(|e| client_state_codec_err(client_id, e))?;
        client_state.validate()?;
        let consensus_state: ConsensusState =
            codec::decode_tagged(WASM_CLIENT_TYPE, consensus_state_bz)
                .map_err(|e| ClientError::MalformedConsensusState(e.to_string()))?;
        consensus_state.validate()?;

        // The module writes its own initial records; the call wrapper
        // validates what it left behind.
        wasm_instantiate(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &InstantiateMsg {
                client_state: Binary::from(client_state_bz),
                consensus_state: Binary::from(consensus_state_bz),
                checksum: Binary::from(client_state.checksum.0.clone()),
            },
        )?;
        Ok(())
    }

    fn verify_client_message(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<(), ClientError> {
        let client_state = get_client_state(store, client_id)?;
        let _: crate::msgs::EmptyResult = wasm_query(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &QueryMsg::VerifyClientMessage(VerifyClientMessageMsg {
                client_message: Binary::from(message),
            }),
        )?;
        Ok(())
    }

    fn check_for_misbehaviour(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<bool, ClientError> {
        let client_state = get_client_state(store, client_id)?;
        let result: CheckForMisbehaviourResult = wasm_query(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &QueryMsg::CheckForMisbehaviour(CheckForMisbehaviourMsg {
                client_message: Binary::from(message),
            }),
        )?;
        Ok(result.found_misbehaviour)
    }

    fn update_state_on_misbehaviour(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<(), ClientError> {
        let client_state = get_client_state(store, client_id)?;
        wasm_sudo(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &SudoMsg::UpdateStateOnMisbehaviour(UpdateStateOnMisbehaviourMsg {
                client_message: Binary::from(message),
            }),
        )?;
        Ok(())
    }

    fn update_state(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<Vec<Height>, ClientError> {
        let client_state = get_client_state(store, client_id)?;
        let data = wasm_sudo(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &SudoMsg::UpdateState(UpdateStateMsg {
                client_message: Binary::from(message),
            }),
        )?
        .ok_or_else(|| {
            ClientError::InvalidResponseData("update returned no data".to_string())
        })?;
        let result: UpdateStateResult = decode_result(&data)?;
        validate_update_heights(&result.heights)?;
        Ok(result.heights)
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
        let client_state = get_client_state(store, client_id)?;
        wasm_sudo(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &SudoMsg::VerifyMembership(VerifyMembershipMsg {
                height,
                delay_time_period: delay_time_ns,
                delay_block_period: delay_blocks,
                proof: Binary::from(proof),
                merkle_path: path.into(),
                value: Binary::from(value),
            }),
        )?;
        Ok(())
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
        let client_state = get_client_state(store, client_id)?;
        wasm_sudo(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &SudoMsg::VerifyNonMembership(VerifyNonMembershipMsg {
                height,
                delay_time_period: delay_time_ns,
                delay_block_period: delay_blocks,
                proof: Binary::from(proof),
                merkle_path: path.into(),
            }),
        )?;
        Ok(())
    }

    fn status(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
    ) -> Status {
        let Ok(client_state) = get_client_state(store, client_id) else {
            return Status::Unknown;
        };
        let result: Result<StatusResult, ClientError> = wasm_query(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &QueryMsg::Status(StatusMsg {}),
        );
        match result {
            Ok(result) => match result.status.as_str() {
                "Active" => Status::Active,
                "Frozen" => Status::Frozen,
                "Expired" => Status::Expired,
                _ => Status::Unknown,
            },
            Err(_) => Status::Unknown,
        }
    }

    fn timestamp_at_height(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        height: Height,
    ) -> Result<u64, ClientError> {
        let client_state = get_client_state(store, client_id)?;
        let result: TimestampAtHeightResult = wasm_query(
            &self.engine,
            &self.gas_config,
            ctx,
            store,
            client_id,
            &client_state.checksum,
            &QueryMsg::TimestampAtHeight(TimestampAtHeightMsg { height }),
        )?;
        Ok(result.timestamp)
    }
}
