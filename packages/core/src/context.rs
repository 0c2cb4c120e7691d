//! The per-operation host context: execution environment and gas budget.

use crate::error::ClientError;

/// The deterministic execution environment of the current operation.
///
/// This record is the only ambient state a client type implementation (and,
/// for the sandboxed type, the loaded module) may observe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEnv {
    /// The host chain identifier.
    pub chain_id: String,
    /// The current block height of the host.
    pub block_height: u64,
    /// The current block time in unix nanoseconds.
    pub block_time_ns: u64,
}

impl HostEnv {
    /// Creates a host environment record.
    #[must_use]
    pub fn new(chain_id: impl Into<String>, block_height: u64, block_time_ns: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            block_height,
            block_time_ns,
        }
    }
}

/// A deterministic gas meter charged by the surrounding operation.
///
/// Gas consumed is never refunded, also on failure; retrying a failed
/// operation costs the caller again.
#[derive(Clone, Debug)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    /// Creates a meter with the given ceiling.
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Creates a meter that never runs out. Used by callers that do not
    /// meter, e.g. pure local queries.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self::new(u64::MAX)
    }

    /// Charges `amount` gas.
    ///
    /// # Errors
    /// Returns [`ClientError::OutOfGas`] once the ceiling is crossed. The
    /// charge is still recorded, capped at the ceiling.
    pub fn consume(&mut self, amount: u64, descriptor: &'static str) -> Result<(), ClientError> {
        let consumed = self.consumed.saturating_add(amount);
        if consumed > self.limit {
            self.consumed = self.limit;
            return Err(ClientError::OutOfGas {
                descriptor,
                consumed,
                limit: self.limit,
            });
        }
        self.consumed = consumed;
        Ok(())
    }

    /// Gas still available under the ceiling.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.limit - self.consumed
    }

    /// Gas charged so far.
    #[must_use]
    pub const fn consumed(&self) -> u64 {
        self.consumed
    }

    /// The meter's ceiling.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }
}

/// The context threaded through every light client module operation.
#[derive(Clone, Debug)]
pub struct Context {
    /// The execution environment record.
    pub env: HostEnv,
    /// The gas budget of the surrounding operation.
    pub gas: GasMeter,
}

impl Context {
    /// Creates a context with an unlimited gas budget.
    #[must_use]
    pub const fn new(env: HostEnv) -> Self {
        Self {
            env,
            gas: GasMeter::unlimited(),
        }
    }

    /// Creates a context with an explicit gas ceiling.
    #[must_use]
    pub const fn with_gas_limit(env: HostEnv, gas_limit: u64) -> Self {
        Self {
            env,
            gas: GasMeter::new(gas_limit),
        }
    }
}
