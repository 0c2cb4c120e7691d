//! The JSON API spoken between the framework and a loaded module.
//!
//! Every module must understand these messages regardless of which
//! consensus protocol it verifies; the opaque payloads inside are its own
//! business.

use cosmwasm_std::Binary;
use lightclient_core::height::Height;
use serde::{Deserialize, Serialize};

/// The message driving a fresh module instance.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct InstantiateMsg {
    /// The initial client state envelope, JSON-encoded.
    pub client_state: Binary,
    /// The initial consensus state envelope, JSON-encoded.
    pub consensus_state: Binary,
    /// The checksum of the module being instantiated.
    pub checksum: Binary,
}

/// State-mutating entry points.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum SudoMsg {
    /// Applies a verified header and commits new consensus states.
    UpdateState(UpdateStateMsg),
    /// Freezes the client after confirmed misbehaviour.
    UpdateStateOnMisbehaviour(UpdateStateOnMisbehaviourMsg),
    /// Proves a key-value pair exists in the counterparty state.
    VerifyMembership(VerifyMembershipMsg),
    /// Proves a key is absent from the counterparty state.
    VerifyNonMembership(VerifyNonMembershipMsg),
    /// Runs state migration after a code swap.
    MigrateClientStore(MigrateClientStoreMsg),
}

/// Payload of [`SudoMsg::UpdateState`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct UpdateStateMsg {
    /// The already-verified client message.
    pub client_message: Binary,
}

/// Payload of [`SudoMsg::UpdateStateOnMisbehaviour`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct UpdateStateOnMisbehaviourMsg {
    /// The client message that evidenced misbehaviour.
    pub client_message: Binary,
}

/// Payload of [`SudoMsg::VerifyMembership`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct VerifyMembershipMsg {
    /// The consensus height to verify against.
    pub height: Height,
    /// Minimum nanoseconds that must elapse after the consensus state was
    /// stored before the proof is accepted.
    pub delay_time_period: u64,
    /// Minimum blocks that must elapse after the consensus state was stored.
    pub delay_block_period: u64,
    /// The opaque proof.
    pub proof: Binary,
    /// The path of the key being proven.
    pub merkle_path: MerklePath,
    /// The value being proven.
    pub value: Binary,
}

/// Payload of [`SudoMsg::VerifyNonMembership`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct VerifyNonMembershipMsg {
    /// The consensus height to verify against.
    pub height: Height,
    /// Minimum nanoseconds that must elapse after the consensus state was
    /// stored before the proof is accepted.
    pub delay_time_period: u64,
    /// Minimum blocks that must elapse after the consensus state was stored.
    pub delay_block_period: u64,
    /// The opaque proof.
    pub proof: Binary,
    /// The path of the key being proven absent.
    pub merkle_path: MerklePath,
}

/// Payload of [`SudoMsg::MigrateClientStore`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct MigrateClientStoreMsg {}

/// Read-only entry points.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    /// Reports the client's current standing.
    Status(StatusMsg),
    /// Checks a client message's proofs without mutating anything.
    VerifyClientMessage(VerifyClientMessageMsg),
    /// Checks whether a client message evidences misbehaviour.
    CheckForMisbehaviour(CheckForMisbehaviourMsg),
    /// Looks up the timestamp recorded at a consensus height.
    TimestampAtHeight(TimestampAtHeightMsg),
}

/// Payload of [`QueryMsg::Status`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct StatusMsg {}

/// Payload of [`QueryMsg::VerifyClientMessage`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct VerifyClientMessageMsg {
    /// The client message to verify.
    pub client_message: Binary,
}

/// Payload of [`QueryMsg::CheckForMisbehaviour`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct CheckForMisbehaviourMsg {
    /// The client message to inspect.
    pub client_message: Binary,
}

/// Payload of [`QueryMsg::TimestampAtHeight`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct TimestampAtHeightMsg {
    /// The height to look up.
    pub height: Height,
}

/// A key path on the wire, one raw segment per hop.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct MerklePath {
    /// The ordered path segments.
    pub key_path: Vec<Binary>,
}

impl From<&lightclient_core::path::MerklePath> for MerklePath {
    fn from(path: &lightclient_core::path::MerklePath) -> Self {
        Self {
            key_path: path.key_path.iter().cloned().map(Binary::from).collect(),
        }
    }
}

/// Data returned by [`SudoMsg::UpdateState`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct UpdateStateResult {
    /// The consensus heights the module committed, ascending.
    pub heights: Vec<Height>,
}

/// Data returned by [`QueryMsg::Status`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct StatusResult {
    /// The module's own view of its standing.
    pub status: String,
}

/// Data returned by [`QueryMsg::CheckForMisbehaviour`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct CheckForMisbehaviourResult {
    /// Whether the message evidences misbehaviour.
    pub found_misbehaviour: bool,
}

/// Data returned by [`QueryMsg::TimestampAtHeight`].
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct TimestampAtHeightResult {
    /// Nanosecond timestamp recorded at the height.
    pub timestamp: u64,
}

/// Data returned by entry points that carry no payload back.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct EmptyResult {}

#[cfg(test)]
mod tests {
    use cosmwasm_std::Binary;

    use super::{QueryMsg, StatusMsg, SudoMsg, UpdateStateMsg};

    #[test]
    fn test_sudo_msg_uses_snake_case_tags() {
        let msg = SudoMsg::UpdateState(UpdateStateMsg {
            client_message: Binary::from(b"m".as_slice()),
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with("{\"update_state\""), "{json}");
    }

    #[test]
    fn test_query_msg_round_trips() {
        let msg = QueryMsg::Status(StatusMsg {});
        let json = serde_json::to_vec(&msg).unwrap();
        assert_eq!(msg, serde_json::from_slice(&json).unwrap());
    }
}
