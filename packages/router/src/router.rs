//! Dispatch over a closed set of client type implementations.

use lightclient_core::context::Context;
use lightclient_core::error::ClientError;
use lightclient_core::height::Height;
use lightclient_core::identifiers::{ClientId, ClientType};
use lightclient_core::module::LightClientModule;
use lightclient_core::path::MerklePath;
use lightclient_core::status::Status;
use lightclient_core::store::{HostStore, PrefixedStore, NEXT_CLIENT_SEQUENCE_KEY};
use solomachine_light_client::SoloMachineLightClient;
use wasm_light_client::client_state::Checksum;
use wasm_light_client::engine::WasmEngine;
use wasm_light_client::WasmLightClient;

/// One registered client type implementation.
///
/// The set is closed on purpose: which implementations exist is a consensus
/// decision made when the router is constructed, not something discovered at
/// runtime.
pub enum ClientModule<E: WasmEngine> {
    /// The single-signer client type.
    SoloMachine(SoloMachineLightClient),
    /// The sandboxed wasm client type.
    Wasm(WasmLightClient<E>),
}

impl<E: WasmEngine> ClientModule<E> {
    fn as_module(&self) -> &dyn LightClientModule {
        match self {
            Self::SoloMachine(module) => module,
            Self::Wasm(module) => module,
        }
    }
}

/// Routes every client operation to the implementation registered for the
/// client identifier's type tag, under the client's isolated store view.
pub struct Router<E: WasmEngine> {
    modules: Vec<ClientModule<E>>,
}

impl<E: WasmEngine> Default for Router<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: WasmEngine> Router<E> {
    /// An empty router; register modules before use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Registers a client type implementation. The first registration of a
    /// type tag wins.
    #[must_use]
    pub fn register(mut self, module: ClientModule<E>) -> Self {
        self.modules.push(module);
        self
    }

    fn route(&self, client_type: &ClientType) -> Result<&dyn LightClientModule, ClientError> {
        self.modules
            .iter()
            .map(ClientModule::as_module)
            .find(|module| module.client_type() == *client_type)
            .ok_or_else(|| ClientError::InvalidClientType {
                expected: self.registered_types(),
                actual: client_type.to_string(),
            })
    }

    fn registered_types(&self) -> String {
        let tags: Vec<String> = self
            .modules
            .iter()
            .map(|module| module.as_module().client_type().to_string())
            .collect();
        tags.join(", ")
    }

    /// Allocates the next identity for `client_type` and initializes the
    /// client from the given state records. The allocation counter advances
    /// only when the whole creation succeeds, so a failed creation leaves no
    /// trace.
    ///
    /// # Errors
    /// Fails if the type is unregistered, the records are malformed, or the
    /// freshly initialized client does not report itself active.
    pub fn create_client(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_type: &ClientType,
        client_state_bz: &[u8],
        consensus_state_bz: &[u8],
    ) -> Result<ClientId, ClientError> {
        let module = self.route(client_type)?;
        let sequence = next_client_sequence(host);
        let client_id = ClientId::new(client_type.clone(), sequence);
        tracing::debug!(client = %client_id, "creating client");

        {
            let mut store = PrefixedStore::for_client(host, &client_id);
            module.initialize(ctx, &mut store, &client_id, client_state_bz, consensus_state_bz)?;
            let status = module.status(ctx, &mut store, &client_id);
            if !status.is_active() {
                return Err(ClientError::MalformedClientState(format!(
                    "initialized client {client_id} has status {status}"
                )));
            }
        }

        host.set(
            NEXT_CLIENT_SEQUENCE_KEY.as_bytes(),
            &(sequence + 1).to_be_bytes(),
        );
        Ok(client_id)
    }

    /// Checks a client message against the client's trusted state.
    ///
    /// # Errors
    /// Propagates the client type implementation's verification errors.
    pub fn verify_client_message(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<(), ClientError> {
        let module = self.route(client_id.client_type())?;
        let mut store = PrefixedStore::for_client(host, client_id);
        module.verify_client_message(ctx, &mut store, client_id, message)
    }

    /// Inspects an already-verified message for conflicting commitments.
    ///
    /// # Errors
    /// Propagates the client type implementation's errors.
    pub fn check_for_misbehaviour(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<bool, ClientError> {
        let module = self.route(client_id.client_type())?;
        let mut store = PrefixedStore::for_client(host, client_id);
        module.check_for_misbehaviour(ctx, &mut store, client_id, message)
    }

    /// Freezes the client in response to confirmed misbehaviour.
    ///
    /// # Errors
    /// Propagates the client type implementation's errors.
    pub fn update_state_on_misbehaviour(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<(), ClientError> {
        let module = self.route(client_id.client_type())?;
        tracing::debug!(client = %client_id, "freezing client for misbehaviour");
        let mut store = PrefixedStore::for_client(host, client_id);
        module.update_state_on_misbehaviour(ctx, &mut store, client_id, message)
    }

    /// Applies a verified client message, returning the newly trusted
    /// heights in ascending order.
    ///
    /// # Errors
    /// Propagates the client type implementation's errors.
    pub fn update_state(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<Vec<Height>, ClientError> {
        let module = self.route(client_id.client_type())?;
        tracing::debug!(client = %client_id, "updating client");
        let mut store = PrefixedStore::for_client(host, client_id);
        module.update_state(ctx, &mut store, client_id, message)
    }

    /// Verifies that `value` is committed under `path` at `height`.
    ///
    /// # Errors
    /// Propagates the client type implementation's errors.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_membership(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
        height: Height,
        delay_time_ns: u64,
        delay_blocks: u64,
        proof: &[u8],
        path: &MerklePath,
        value: &[u8],
    ) -> Result<(), ClientError> {
        let module = self.route(client_id.client_type())?;
        let mut store = PrefixedStore::for_client(host, client_id);
        module.verify_membership(
            ctx,
            &mut store,
            client_id,
            height,
            delay_time_ns,
            delay_blocks,
            proof,
            path,
            value,
        )
    }

    /// Verifies that nothing is committed under `path` at `height`.
    ///
    /// # Errors
    /// Propagates the client type implementation's errors.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_non_membership(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
        height: Height,
        delay_time_ns: u64,
        delay_blocks: u64,
        proof: &[u8],
        path: &MerklePath,
    ) -> Result<(), ClientError> {
        let module = self.route(client_id.client_type())?;
        let mut store = PrefixedStore::for_client(host, client_id);
        module.verify_non_membership(
            ctx,
            &mut store,
            client_id,
            height,
            delay_time_ns,
            delay_blocks,
            proof,
            path,
        )
    }

    /// The client's trust status. Unregistered types and unknown clients
    /// yield [`Status::Unknown`].
    #[must_use]
    pub fn status(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
    ) -> Status {
        let Ok(module) = self.route(client_id.client_type()) else {
            return Status::Unknown;
        };
        let mut store = PrefixedStore::for_client(host, client_id);
        module.status(ctx, &mut store, client_id)
    }

    /// The timestamp of the consensus state committed at `height`.
    ///
    /// # Errors
    /// Propagates the client type implementation's errors.
    pub fn timestamp_at_height(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
        height: Height,
    ) -> Result<u64, ClientError> {
        let module = self.route(client_id.client_type())?;
        let mut store = PrefixedStore::for_client(host, client_id);
        module.timestamp_at_height(ctx, &mut store, client_id, height)
    }

    /// Swaps the module governing a wasm client, driving the new module's
    /// migrate entry point over the client's existing store.
    ///
    /// # Errors
    /// Fails with [`ClientError::InvalidClientType`] if no wasm module is
    /// registered or the client is not a wasm client.
    pub fn migrate_wasm_contract(
        &self,
        ctx: &mut Context,
        host: &mut dyn HostStore,
        client_id: &ClientId,
        new_checksum: &Checksum,
        msg: &[u8],
    ) -> Result<(), ClientError> {
        let module = self
            .modules
            .iter()
            .find_map(|module| match module {
                ClientModule::Wasm(module) => Some(module),
                ClientModule::SoloMachine(_) => None,
            })
            .ok_or_else(|| ClientError::InvalidClientType {
                expected: self.registered_types(),
                actual: client_id.client_type().to_string(),
            })?;
        if module.client_type() != *client_id.client_type() {
            return Err(ClientError::InvalidClientType {
                expected: module.client_type().to_string(),
                actual: client_id.client_type().to_string(),
            });
        }
        tracing::debug!(client = %client_id, checksum = %new_checksum, "migrating client contract");
        let mut store = PrefixedStore::for_client(host, client_id);
        module.migrate_contract(ctx, &mut store, client_id, new_checksum, msg)
    }
}

fn next_client_sequence(host: &dyn HostStore) -> u64 {
    host.get(NEXT_CLIENT_SEQUENCE_KEY.as_bytes())
        .and_then(|bz| bz.try_into().ok())
        .map_or(0, u64::from_be_bytes)
}
