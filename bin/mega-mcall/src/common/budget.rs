//! Invocation budget and aggregator configuration

use alloy_primitives::{Address, U256};
use clap::Args;
use mega_multicall::{
    constants::{AGGREGATOR_ADDRESS, DEFAULT_CALL_GAS_LIMIT, DEFAULT_GAS_BUFFER},
    AggregatorConfig, BatchContext,
};

/// Budget of one invocation and the aggregator settings
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Budget Options")]
pub struct BudgetArgs {
    /// Gas available to the invocation
    #[arg(long = "gas", default_value = "30000000")]
    pub gas: u64,

    /// Native value attached to the invocation
    #[arg(long = "value", default_value = "0")]
    pub value: U256,

    /// Gas kept back by the budget-guarded modes
    #[arg(long = "gas-buffer", default_value_t = DEFAULT_GAS_BUFFER)]
    pub gas_buffer: u64,

    /// Gas withheld on top of the gas buffer for assembling the response
    #[arg(long = "finalize-reserve", default_value = "0")]
    pub finalize_reserve: u64,

    /// Gas charged by the aggregator for each dispatched call
    #[arg(long = "call-overhead", default_value = "0")]
    pub call_overhead: u64,

    /// Gas limit of calls that do not carry their own
    #[arg(long = "call-gas-limit", default_value_t = DEFAULT_CALL_GAS_LIMIT)]
    pub call_gas_limit: u64,

    /// Address calls are dispatched from
    #[arg(long = "aggregator", default_value_t = AGGREGATOR_ADDRESS)]
    pub aggregator: Address,
}

impl BudgetArgs {
    /// Creates the [`AggregatorConfig`].
    pub const fn config(&self) -> AggregatorConfig {
        AggregatorConfig {
            address: self.aggregator,
            finalize_reserve: self.finalize_reserve,
            call_overhead_gas: self.call_overhead,
            default_call_gas_limit: self.call_gas_limit,
        }
    }

    /// Creates the [`BatchContext`].
    pub const fn context(&self) -> BatchContext {
        BatchContext { value: self.value, gas_limit: self.gas }
    }
}
