//! A single-authority ("solo machine") light client.
//!
//! The remote "chain" is one party holding an ed25519 key. Every state
//! update is a sequence-numbered record signed by that key; the only possible
//! misbehaviour is equivocation, two distinct signed records at the same
//! sequence number.
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod client_state;
pub mod message;
pub mod proofs;

mod light_client_module;

pub use light_client_module::SoloMachineLightClient;

#[cfg(feature = "test-utils")]
pub mod testing;

/// The client type tag of the solo machine client.
pub const SOLOMACHINE_CLIENT_TYPE: &str = "solomachine";
