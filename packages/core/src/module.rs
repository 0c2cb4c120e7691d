//! This module defines the [`LightClientModule`] trait, the uniform contract
//! every client type implementation must satisfy.

use crate::context::Context;
use crate::error::ClientError;
use crate::height::Height;
use crate::identifiers::{ClientId, ClientType};
use crate::path::MerklePath;
use crate::status::Status;
use crate::store::HostStore;

/// The uniform operation set of a client type implementation.
///
/// Every operation receives the client's already-prefixed store view; an
/// implementation can address nothing outside its own namespace. The router
/// is responsible for resolving the view and for validating that the client
/// identifier's type tag matches the implementation before any of these
/// methods run.
///
/// `verify_client_message`, `check_for_misbehaviour`, `status` and
/// `timestamp_at_height` must not mutate the store. `check_for_misbehaviour`,
/// `update_state` and `update_state_on_misbehaviour` may assume the message
/// already passed `verify_client_message`.
pub trait LightClientModule {
    /// The client type tag this implementation serves.
    fn client_type(&self) -> ClientType;

    /// Decodes and structurally validates both initial records, then persists
    /// them. The store must be left untouched on failure.
    ///
    /// # Errors
    /// Returns a `Malformed*` error if either payload fails to decode or
    /// validate.
    fn initialize(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        client_state_bz: &[u8],
        consensus_state_bz: &[u8],
    ) -> Result<(), ClientError>;

    /// Statelessly checks that the message is internally consistent and
    /// authentic against the currently trusted state.
    ///
    /// # Errors
    /// Returns [`ClientError::ClientNotFound`] for unknown clients and a
    /// verification-specific error otherwise.
    fn verify_client_message(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<(), ClientError>;

    /// Inspects an already-verified message for conflicting commitments.
    ///
    /// # Errors
    /// Returns [`ClientError::ClientNotFound`] for unknown clients.
    fn check_for_misbehaviour(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<bool, ClientError>;

    /// Freezes the client. Idempotent; freezing a frozen client is a no-op.
    ///
    /// # Errors
    /// Returns [`ClientError::ClientNotFound`] for unknown clients.
    fn update_state_on_misbehaviour(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<(), ClientError>;

    /// Persists the new consensus state(s) and advances the client's
    /// bookkeeping. Returns the newly trusted heights in ascending order with
    /// no duplicates.
    ///
    /// # Errors
    /// Returns [`ClientError::ClientNotFound`] for unknown clients and
    /// [`ClientError::FrozenClient`] for frozen ones.
    fn update_state(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        message: &[u8],
    ) -> Result<Vec<Height>, ClientError>;

    /// Verifies that `value` is committed under `path` at `height`.
    ///
    /// # Errors
    /// Fails with [`ClientError::ConsensusStateNotFound`] if no root was
    /// committed at `height`, [`ClientError::DelayPeriodNotElapsed`] if either
    /// delay requirement is unmet, and a verification error otherwise.
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<(), ClientError>;

    /// Verifies that nothing is committed under `path` at `height`.
    ///
    /// # Errors
    /// Same failure modes as [`LightClientModule::verify_membership`].
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<(), ClientError>;

    /// The client's trust status. Unknown identities or undecodable state
    /// yield [`Status::Unknown`], never an error.
    fn status(&self, ctx: &mut Context, store: &mut dyn HostStore, client_id: &ClientId)
        -> Status;

    /// The timestamp of the consensus state committed at `height`.
    ///
    /// # Errors
    /// Returns [`ClientError::ConsensusStateNotFound`] if the height was
    /// never committed.
    fn timestamp_at_height(
        &self,
        ctx: &mut Context,
        store: &mut dyn HostStore,
        client_id: &ClientId,
        height: Height,
    ) -> Result<u64, ClientError>;
}
