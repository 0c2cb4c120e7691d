//! Host-side wrappers around the engine entry points.
//!
//! Every call follows the same shape: charge the setup cost, derive the
//! engine gas ceiling from the remaining meter, run the module, charge the
//! gas it consumed back to the meter whether or not the call succeeded,
//! then validate what came back and what the module left in its store.

use cosmwasm_std::{Addr, Binary, BlockInfo, ContractInfo, ContractResult, Env, Response, Timestamp, TransactionInfo};
use lightclient_core::codec;
use lightclient_core::context::Context;
use lightclient_core::error::ClientError;
use lightclient_core::identifiers::ClientId;
use lightclient_core::store::{HostStore, CLIENT_STATE_KEY};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client_state::{Checksum, ClientState};
use crate::engine::{engine_fault, VmResult, WasmEngine};
use crate::gas::VmGasConfig;
use crate::store_adapter::{ReadonlyStoreAdapter, ScopedStoreAdapter};
use crate::WASM_CLIENT_TYPE;

/// Builds the environment a module call runs under. The contract address is
/// the client identifier, so a module can tell its own instance apart.
pub fn contract_env(ctx: &Context, client_id: &ClientId) -> Env {
    Env {
        block: BlockInfo {
            height: ctx.env.block_height,
            time: Timestamp::from_nanos(ctx.env.block_time_ns),
            chain_id: ctx.env.chain_id.clone(),
        },
        transaction: None::<TransactionInfo>,
        contract: ContractInfo {
            address: Addr::unchecked(client_id.to_string()),
        },
    }
}

/// Serializes a message for the wire.
pub fn encode_msg<T: Serialize>(msg: &T) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(msg).map_err(|e| ClientError::Internal(format!("encoding contract message: {e}")))
}

/// Decodes a module's result payload.
pub fn decode_result<T: DeserializeOwned>(bz: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(bz).map_err(|e| ClientError::InvalidResponseData(e.to_string()))
}

fn unwrap_call<T>(
    gas_config: &VmGasConfig,
    ctx: &mut Context,
    descriptor: &'static str,
    res: VmResult<T>,
) -> Result<T, ClientError> {
    // Gas is charged back even when the call failed.
    gas_config.consume_runtime_gas(&mut ctx.gas, res.gas_used, descriptor)?;
    match res.result {
        Err(err) => Err(engine_fault(&err)),
        Ok(ContractResult::Err(msg)) => Err(ClientError::ContractCallFailed(msg)),
        Ok(ContractResult::Ok(value)) => Ok(value),
    }
}

/// A module may only mutate its own scoped store; any other side channel in
/// the response is rejected.
fn check_response(response: &Response) -> Result<(), ClientError> {
    if !response.messages.is_empty() {
        return Err(ClientError::SubMessagesNotAllowed);
    }
    if !response.events.is_empty() {
        return Err(ClientError::EventsNotAllowed);
    }
    if !response.attributes.is_empty() {
        return Err(ClientError::AttributesNotAllowed);
    }
    Ok(())
}

/// Re-reads the client state after a mutating call and checks the module
/// left it well-formed and under the expected checksum.
fn validate_post_execution_client_state(
    store: &dyn HostStore,
    expected_checksum: &Checksum,
) -> Result<ClientState, ClientError> {
    let bz = store.get(CLIENT_STATE_KEY.as_bytes()).ok_or_else(|| {
        ClientError::InvalidContractModification("client state was removed".to_string())
    })?;
    let client_state: ClientState = codec::decode_tagged(WASM_CLIENT_TYPE, &bz)
        .map_err(|e| ClientError::InvalidContractModification(format!("client state undecodable: {e}")))?;
    client_state
        .validate()
        .map_err(|e| ClientError::InvalidContractModification(e.to_string()))?;
    if client_state.checksum != *expected_checksum {
        return Err(ClientError::InvalidContractModification(format!(
            "checksum changed from {expected_checksum} to {}",
            client_state.checksum
        )));
    }
    Ok(client_state)
}

/// Runs the instantiate entry point and validates the state it committed.
pub fn wasm_instantiate<E: WasmEngine, M: Serialize>(
    engine: &E,
    gas_config: &VmGasConfig,
    ctx: &mut Context,
    store: &mut dyn HostStore,
    client_id: &ClientId,
    checksum: &Checksum,
    msg: &M,
) -> Result<ClientState, ClientError> {
    let msg = encode_msg(msg)?;
    ctx.gas.consume(gas_config.setup_cost(msg.len()), "wasm contract instantiation")?;
    let gas_limit = gas_config.runtime_gas_for_contract(&ctx.gas);
    let env = contract_env(ctx, client_id);
    let res = {
        let mut adapter = ScopedStoreAdapter::new(store);
        engine.instantiate(checksum, &env, &mut adapter, &msg, gas_limit)
    };
    let response = unwrap_call(gas_config, ctx, "wasm contract instantiation", res)?;
    check_response(&response)?;
    validate_post_execution_client_state(store, checksum)
}

/// Runs a sudo entry point and validates the state it left behind.
/// Returns the response data for the caller to decode.
pub fn wasm_sudo<E: WasmEngine, M: Serialize>(
    engine: &E,
    gas_config: &VmGasConfig,
    ctx: &mut Context,
    store: &mut dyn HostStore,
    client_id: &ClientId,
    checksum: &Checksum,
    msg: &M,
) -> Result<Option<Binary>, ClientError> {
    let msg = encode_msg(msg)?;
    ctx.gas.consume(gas_config.setup_cost(msg.len()), "wasm contract sudo")?;
    let gas_limit = gas_config.runtime_gas_for_contract(&ctx.gas);
    let env = contract_env(ctx, client_id);
    let res = {
        let mut adapter = ScopedStoreAdapter::new(store);
        engine.sudo(checksum, &env, &mut adapter, &msg, gas_limit)
    };
    let response = unwrap_call(gas_config, ctx, "wasm contract sudo", res)?;
    check_response(&response)?;
    validate_post_execution_client_state(store, checksum)?;
    Ok(response.data)
}

/// Runs a query entry point against a read-only view of the client store.
pub fn wasm_query<E: WasmEngine, M: Serialize, T: DeserializeOwned>(
    engine: &E,
    gas_config: &VmGasConfig,
    ctx: &mut Context,
    store: &dyn HostStore,
    client_id: &ClientId,
    checksum: &Checksum,
    msg: &M,
) -> Result<T, ClientError> {
    let msg = encode_msg(msg)?;
    ctx.gas.consume(gas_config.setup_cost(msg.len()), "wasm contract query")?;
    let gas_limit = gas_config.runtime_gas_for_contract(&ctx.gas);
    let env = contract_env(ctx, client_id);
    let res = {
        let adapter = ReadonlyStoreAdapter::new(store);
        engine.query(checksum, &env, &adapter, &msg, gas_limit)
    };
    let data = unwrap_call(gas_config, ctx, "wasm contract query", res)?;
    decode_result(&data)
}

/// Runs the migrate entry point of the new module against the client's
/// existing store. The stored client state must come out carrying the new
/// checksum; this is the one call where a checksum change is legitimate.
pub fn wasm_migrate<E: WasmEngine>(
    engine: &E,
    gas_config: &VmGasConfig,
    ctx: &mut Context,
    store: &mut dyn HostStore,
    client_id: &ClientId,
    new_checksum: &Checksum,
    msg: &[u8],
) -> Result<ClientState, ClientError> {
    ctx.gas.consume(gas_config.setup_cost(msg.len()), "wasm contract migration")?;
    let gas_limit = gas_config.runtime_gas_for_contract(&ctx.gas);
    let env = contract_env(ctx, client_id);
    let res = {
        let mut adapter = ScopedStoreAdapter::new(store);
        engine.migrate(new_checksum, &env, &mut adapter, msg, gas_limit)
    };
    let response = unwrap_call(gas_config, ctx, "wasm contract migration", res)?;
    check_response(&response)?;
    validate_post_execution_client_state(store, new_checksum)
}
