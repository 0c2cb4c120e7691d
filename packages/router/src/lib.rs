//! The host-facing entry point of the light client framework: allocates
//! client identities, resolves each client's isolated store view and
//! dispatches every operation to the registered client type implementation.
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

mod router;

pub use router::{ClientModule, Router};
