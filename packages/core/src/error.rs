//! This module defines [`ClientError`], the error taxonomy shared by every
//! client type and the router.

use crate::height::Height;

/// Errors returned by light client module operations.
///
/// All variants are recoverable rejections of the supplied input except
/// [`ClientError::Internal`], which signals a framework invariant violation;
/// callers should halt processing instead of treating it as an ordinary
/// verification failure. See [`ClientError::is_fatal`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No client exists under the given identifier.
    #[error("client not found: {0}")]
    ClientNotFound(String),

    /// No consensus state was committed at the requested height.
    #[error("consensus state not found for client {client_id} at height {height}")]
    ConsensusStateNotFound {
        /// The client being queried.
        client_id: String,
        /// The height that was never committed.
        height: Height,
    },

    /// The identifier's type tag does not match the implementation invoked.
    #[error("invalid client type, expected: {expected}, got: {actual}")]
    InvalidClientType {
        /// The client type of the invoked implementation.
        expected: String,
        /// The client type found in the identifier or decoded state.
        actual: String,
    },

    /// The client identifier is not of the form `{type}-{sequence}`.
    #[error("malformed client identifier: {0}")]
    MalformedClientId(String),

    /// The client state payload failed to decode or validate.
    #[error("malformed client state: {0}")]
    MalformedClientState(String),

    /// The consensus state payload failed to decode or validate.
    #[error("malformed consensus state: {0}")]
    MalformedConsensusState(String),

    /// The client message payload failed to decode or validate.
    #[error("malformed client message: {0}")]
    MalformedClientMessage(String),

    /// A cryptographic or membership check did not hold.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// The client is frozen and accepts no further updates.
    #[error("client {0} is frozen")]
    FrozenClient(String),

    /// The time or block delay requirement for a proof is unmet.
    #[error("delay period not elapsed: {0}")]
    DelayPeriodNotElapsed(String),

    /// The operation's gas budget was exhausted.
    #[error("out of gas while {descriptor}: consumed {consumed}, limit {limit}")]
    OutOfGas {
        /// What was being charged for when the budget ran out.
        descriptor: &'static str,
        /// Gas consumed including the rejected charge.
        consumed: u64,
        /// The gas ceiling of the surrounding operation.
        limit: u64,
    },

    /// The sandboxed module runtime itself failed to execute.
    #[error("wasm engine fault: {0}")]
    EngineFault(String),

    /// The sandboxed module ran to completion but reported an error.
    #[error("wasm contract call failed: {0}")]
    ContractCallFailed(String),

    /// The contract's result payload failed to decode as the expected shape.
    #[error("invalid contract response data: {0}")]
    InvalidResponseData(String),

    /// The client state record was missing, undecodable, or had its checksum
    /// changed after a contract call that is not allowed to change it.
    #[error("invalid contract modification: {0}")]
    InvalidContractModification(String),

    /// The contract response carried outbound submessages.
    #[error("contract submessages are not allowed")]
    SubMessagesNotAllowed,

    /// The contract response carried events.
    #[error("contract events are not allowed")]
    EventsNotAllowed,

    /// The contract response carried attributes.
    #[error("contract attributes are not allowed")]
    AttributesNotAllowed,

    /// A framework invariant was violated; the system state cannot be trusted.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl ClientError {
    /// Whether this error indicates a framework bug rather than rejected
    /// input. Fatal errors must stop processing; continuing risks silent
    /// state corruption.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}
