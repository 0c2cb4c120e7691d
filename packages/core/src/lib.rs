//! Shared types and traits for the light client module framework.
//!
//! This crate defines the contract every client type must satisfy
//! ([`module::LightClientModule`]), the identifier, height, status and proof
//! path types that flow through it, and the store capability handed to each
//! client ([`store::HostStore`] and its prefixed per-client view).
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod codec;
pub mod context;
pub mod error;
pub mod height;
pub mod identifiers;
pub mod module;
pub mod path;
pub mod serde;
pub mod status;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod testing;

/// Ensure that a condition is true, otherwise return an error.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
