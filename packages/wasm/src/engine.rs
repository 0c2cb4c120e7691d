//! The executable-module engine boundary.
//!
//! The framework never links a virtual machine directly. It talks to one
//! through [`WasmEngine`], which exposes the four entry points a loaded
//! module can be driven through. Implementations wrap an actual VM; the
//! test-utils build ships a scripted in-memory engine.

use cosmwasm_std::{Binary, ContractResult, Env, Response};
use lightclient_core::error::ClientError;

use crate::client_state::Checksum;
use crate::store_adapter::ContractStore;

/// A failure of the engine itself, as opposed to an error returned by the
/// module it was running.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No module with the requested checksum is loaded.
    #[error("no module loaded for checksum {0}")]
    ModuleNotFound(String),
    /// The engine aborted the call before the module returned.
    #[error("engine aborted: {0}")]
    Aborted(String),
}

/// The outcome of a single engine call: how much gas the module consumed,
/// and either the module's own result or an engine fault.
#[derive(Debug)]
pub struct VmResult<T> {
    /// Gas consumed by the call, in the engine's own unit.
    pub gas_used: u64,
    /// Engine fault, or the module's result (which may itself be an error).
    pub result: Result<ContractResult<T>, EngineError>,
}

impl<T> VmResult<T> {
    /// A successful call.
    #[must_use]
    pub fn ok(gas_used: u64, value: T) -> Self {
        Self {
            gas_used,
            result: Ok(ContractResult::Ok(value)),
        }
    }

    /// A call the module itself rejected.
    #[must_use]
    pub fn contract_err(gas_used: u64, msg: impl Into<String>) -> Self {
        Self {
            gas_used,
            result: Ok(ContractResult::Err(msg.into())),
        }
    }

    /// A call the engine aborted.
    #[must_use]
    pub fn fault(gas_used: u64, err: EngineError) -> Self {
        Self {
            gas_used,
            result: Err(err),
        }
    }
}

/// The four entry points a loaded module is driven through.
///
/// `sudo`, `instantiate` and `migrate` receive a mutable store scoped to the
/// client; `query` receives a read-only view and must not write.
pub trait WasmEngine {
    /// Creates the module's initial state for a fresh client.
    fn instantiate(
        &self,
        checksum: &Checksum,
        env: &Env,
        store: &mut dyn ContractStore,
        msg: &[u8],
        gas_limit: u64,
    ) -> VmResult<Response>;

    /// Drives a state-mutating entry point of the module.
    fn sudo(
        &self,
        checksum: &Checksum,
        env: &Env,
        store: &mut dyn ContractStore,
        msg: &[u8],
        gas_limit: u64,
    ) -> VmResult<Response>;

    /// Asks the module a read-only question.
    fn query(
        &self,
        checksum: &Checksum,
        env: &Env,
        store: &dyn ContractStore,
        msg: &[u8],
        gas_limit: u64,
    ) -> VmResult<Binary>;

    /// Runs the migration entry point of the module identified by the new
    /// checksum against the client's existing state.
    fn migrate(
        &self,
        checksum: &Checksum,
        env: &Env,
        store: &mut dyn ContractStore,
        msg: &[u8],
        gas_limit: u64,
    ) -> VmResult<Response>;
}

/// Maps an engine fault to the framework error taxonomy.
#[must_use]
pub fn engine_fault(err: &EngineError) -> ClientError {
    ClientError::EngineFault(err.to_string())
}
