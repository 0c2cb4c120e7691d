//! A light client whose verification logic lives in an externally loaded,
//! content-addressed wasm module.
//!
//! The module is trusted with the light client semantics it implements but
//! treated as adversarial with respect to resource consumption and output
//! shape: every call runs under a deterministic gas ceiling, and every
//! mutating call's output and store effects are validated before being
//! trusted.
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod client_state;
pub mod engine;
pub mod gas;
pub mod msgs;
pub mod store_adapter;

mod contract;
mod light_client_module;

pub use light_client_module::WasmLightClient;

#[cfg(feature = "test-utils")]
pub mod testing;

/// The client type tag of the wasm client.
pub const WASM_CLIENT_TYPE: &str = "wasm";
