//! Deterministic gas accounting across the engine boundary.
//!
//! Host gas and engine gas live in different units; a fixed multiplier
//! converts between them. The conversion is part of consensus, so all
//! parameters travel in [`VmGasConfig`], fixed when the client module is
//! constructed.

use lightclient_core::context::GasMeter;
use lightclient_core::error::ClientError;

/// Gas parameters for driving modules through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmGasConfig {
    /// Flat host-gas cost of setting up a module instance.
    pub instance_cost: u64,
    /// Host-gas cost per byte of the message passed to the module.
    pub msg_byte_cost: u64,
    /// Engine gas units per host gas unit.
    pub gas_multiplier: u64,
}

impl Default for VmGasConfig {
    fn default() -> Self {
        Self {
            instance_cost: 60_000,
            msg_byte_cost: 3,
            gas_multiplier: 140_000,
        }
    }
}

impl VmGasConfig {
    /// Host-gas setup cost for a call carrying `msg_len` message bytes.
    #[must_use]
    pub const fn setup_cost(&self, msg_len: usize) -> u64 {
        self.instance_cost
            .saturating_add(self.msg_byte_cost.saturating_mul(msg_len as u64))
    }

    /// Converts the meter's remaining host gas into an engine gas ceiling.
    #[must_use]
    pub fn runtime_gas_for_contract(&self, meter: &GasMeter) -> u64 {
        meter.remaining().saturating_mul(self.gas_multiplier)
    }

    /// Charges the host meter for engine gas the module consumed.
    ///
    /// Rounds up so partially used host units are still paid for. Callers
    /// must charge even when the call itself failed.
    ///
    /// # Errors
    /// Returns [`ClientError::OutOfGas`] if the meter is exhausted.
    pub fn consume_runtime_gas(
        &self,
        meter: &mut GasMeter,
        engine_gas_used: u64,
        descriptor: &'static str,
    ) -> Result<(), ClientError> {
        let host_gas = engine_gas_used.div_ceil(self.gas_multiplier.max(1));
        meter.consume(host_gas, descriptor)
    }
}

#[cfg(test)]
mod tests {
    use lightclient_core::context::GasMeter;

    use super::VmGasConfig;

    #[test]
    fn test_setup_cost_scales_with_message_length() {
        let config = VmGasConfig::default();
        assert_eq!(config.instance_cost, config.setup_cost(0));
        assert_eq!(config.instance_cost + 300, config.setup_cost(100));
    }

    #[test]
    fn test_runtime_gas_is_remaining_times_multiplier() {
        let config = VmGasConfig::default();
        let mut meter = GasMeter::new(1_000);
        meter.consume(400, "setup").unwrap();
        assert_eq!(600 * config.gas_multiplier, config.runtime_gas_for_contract(&meter));
    }

    #[test]
    fn test_charge_back_rounds_up() {
        let config = VmGasConfig {
            instance_cost: 0,
            msg_byte_cost: 0,
            gas_multiplier: 100,
        };
        let mut meter = GasMeter::new(1_000);
        config.consume_runtime_gas(&mut meter, 101, "call").unwrap();
        assert_eq!(2, meter.consumed());
    }

    #[test]
    fn test_charge_back_reports_out_of_gas() {
        let config = VmGasConfig {
            instance_cost: 0,
            msg_byte_cost: 0,
            gas_multiplier: 1,
        };
        let mut meter = GasMeter::new(10);
        config.consume_runtime_gas(&mut meter, 11, "call").unwrap_err();
        assert_eq!(10, meter.consumed());
    }
}
