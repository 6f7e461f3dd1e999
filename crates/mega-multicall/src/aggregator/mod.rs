//! The aggregator: one invocation of the batch-call engine.
//!
//! An [`Aggregator`] is created per external invocation with the caller's [`BatchContext`]
//! (attached value and gas budget). Every public operation widens its input calls to
//! [`CallDescriptor`](crate::CallDescriptor)s and runs them through a single execution loop
//! parameterized by an [`ExecutionPlan`](crate::ExecutionPlan).

use alloy_primitives::{Address, U256};

use crate::{
    constants::{AGGREGATOR_ADDRESS, DEFAULT_CALL_GAS_LIMIT},
    BatchMetadata, EnvReader, GasBudget, Host,
};

mod execution;
pub use execution::Execution;

mod ops;

/// Static configuration of the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct AggregatorConfig {
    /// The address calls are dispatched from.
    pub address: Address,
    /// Gas withheld on top of a caller's gas buffer for assembling the response.
    pub finalize_reserve: u64,
    /// Gas the aggregator itself consumes per dispatched call.
    pub call_overhead_gas: u64,
    /// The per-call gas limit applied to calls decoded from the compact encoding.
    pub default_call_gas_limit: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            address: AGGREGATOR_ADDRESS,
            finalize_reserve: 0,
            call_overhead_gas: 0,
            default_call_gas_limit: DEFAULT_CALL_GAS_LIMIT,
        }
    }
}

/// The context of one external invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct BatchContext {
    /// The native value attached to the invocation.
    pub value: U256,
    /// The gas the invocation may consume.
    pub gas_limit: u64,
}

impl BatchContext {
    /// A context with `gas_limit` and no value.
    pub const fn new(gas_limit: u64) -> Self {
        Self { value: U256::ZERO, gas_limit }
    }

    /// Attaches `value` to the invocation.
    pub const fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// One invocation of the batch-call engine over a [`Host`].
#[derive(Debug)]
pub struct Aggregator<H> {
    host: H,
    config: AggregatorConfig,
    context: BatchContext,
    budget: GasBudget,
    /// Attached value not yet forwarded by a successful call.
    value_left: U256,
}

impl<H: Host> Aggregator<H> {
    /// Creates an aggregator over `host` with the default configuration.
    pub fn new(host: H, context: BatchContext) -> Self {
        Self::with_config(host, AggregatorConfig::default(), context)
    }

    /// Creates an aggregator over `host` with `config`.
    pub fn with_config(host: H, config: AggregatorConfig, context: BatchContext) -> Self {
        Self {
            host,
            config,
            context,
            budget: GasBudget::new(context.gas_limit),
            value_left: context.value,
        }
    }

    /// The aggregator configuration.
    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// The context of this invocation.
    pub const fn context(&self) -> &BatchContext {
        &self.context
    }

    /// The gas budget of this invocation.
    pub const fn budget(&self) -> &GasBudget {
        &self.budget
    }

    /// Gas left in the invocation's budget.
    pub const fn gas_left(&self) -> u64 {
        self.budget.remaining()
    }

    /// Attached value not yet forwarded.
    pub const fn value_left(&self) -> U256 {
        self.value_left
    }

    /// Read-only accessors over the host's environment.
    pub fn env(&self) -> EnvReader<'_, H> {
        EnvReader::new(&self.host)
    }

    /// A reference to the host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// A mutable reference to the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the aggregator and returns the host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Block metadata of the batch, with the current block hash if `with_hash` is set.
    fn metadata(&self, with_hash: bool) -> BatchMetadata {
        let env = self.env();
        BatchMetadata {
            block_number: env.block_number(),
            block_hash: with_hash.then(|| env.current_block_hash()),
        }
    }
}
