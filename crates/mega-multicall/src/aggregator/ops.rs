use alloy_primitives::{Address, Bytes, U256};
use tracing::debug;

use super::{Aggregator, Execution};
use crate::{
    codec, Aggregated, Call, Call3, Call3Value, CallDescriptor, CallGas, CallGasValue, CallResult,
    DeployRequest, ExecutionPlan, FailurePolicy, GasValueAggregated, Host, MulticallError,
    ResultGas,
};

impl<H: Host> Aggregator<H> {
    /// Executes every call. Any failure aborts the batch with [`MulticallError::BatchAborted`].
    pub fn aggregate(
        &mut self,
        calls: Vec<Call>,
    ) -> Result<Aggregated<CallResult>, MulticallError> {
        let execution =
            self.execute_widened(calls, ExecutionPlan::new(FailurePolicy::AbortOnAnyFailure))?;
        Ok(Aggregated { metadata: self.metadata(false), results: into_results(execution) })
    }

    /// Executes every call. With `require_success` any failure aborts the batch, otherwise every
    /// call is attempted and its outcome recorded.
    pub fn try_aggregate(
        &mut self,
        require_success: bool,
        calls: Vec<Call>,
    ) -> Result<Vec<CallResult>, MulticallError> {
        let plan = ExecutionPlan::new(FailurePolicy::from_require_success(require_success));
        Ok(into_results(self.execute_widened(calls, plan)?))
    }

    /// [`Self::aggregate`] with the current block hash in the metadata.
    pub fn block_and_aggregate(
        &mut self,
        calls: Vec<Call>,
    ) -> Result<Aggregated<CallResult>, MulticallError> {
        self.try_block_and_aggregate(true, calls)
    }

    /// [`Self::try_aggregate`] with block number and hash in the metadata.
    pub fn try_block_and_aggregate(
        &mut self,
        require_success: bool,
        calls: Vec<Call>,
    ) -> Result<Aggregated<CallResult>, MulticallError> {
        let results = self.try_aggregate(require_success, calls)?;
        Ok(Aggregated { metadata: self.metadata(true), results })
    }

    /// Executes every call. A failing call aborts the batch unless it allows failure.
    pub fn aggregate3(&mut self, calls: Vec<Call3>) -> Result<Vec<CallResult>, MulticallError> {
        let plan = ExecutionPlan::new(FailurePolicy::PerCallAllowFailure);
        Ok(into_results(self.execute_widened(calls, plan)?))
    }

    /// [`Self::aggregate3`] forwarding each call's value. Fails with
    /// [`MulticallError::ValueOverflow`] before dispatching anything if the summed value exceeds
    /// the value attached to the invocation.
    pub fn aggregate3_value(
        &mut self,
        calls: Vec<Call3Value>,
    ) -> Result<Vec<CallResult>, MulticallError> {
        let plan = ExecutionPlan::new(FailurePolicy::PerCallAllowFailure).with_value();
        Ok(into_results(self.execute_widened(calls, plan)?))
    }

    /// Executes every call with its own gas limit, recording outcome and gas used.
    pub fn multicall(
        &mut self,
        calls: Vec<CallGas>,
    ) -> Result<Aggregated<ResultGas>, MulticallError> {
        let execution =
            self.execute_widened(calls, ExecutionPlan::new(FailurePolicy::AlwaysTolerate))?;
        Ok(Aggregated { metadata: self.metadata(false), results: execution.results })
    }

    /// [`Self::multicall`] that stops dispatching once the remaining budget no longer covers
    /// `gas_buffer`. Undispatched calls have no entry in the results.
    pub fn multicall_with_gas_limitation(
        &mut self,
        calls: Vec<CallGas>,
        gas_buffer: u64,
    ) -> Result<Aggregated<ResultGas>, MulticallError> {
        let plan = ExecutionPlan::new(FailurePolicy::AlwaysTolerate).with_gas_buffer(gas_buffer);
        let execution = self.execute_widened(calls, plan)?;
        Ok(Aggregated { metadata: self.metadata(false), results: execution.results })
    }

    /// [`Self::multicall_with_gas_limitation`] forwarding each call's value, reporting the last
    /// successful input index.
    pub fn multicall_with_gas_limitation_value(
        &mut self,
        calls: Vec<CallGasValue>,
        gas_buffer: u64,
    ) -> Result<GasValueAggregated, MulticallError> {
        let plan = ExecutionPlan::new(FailurePolicy::AlwaysTolerate)
            .with_gas_buffer(gas_buffer)
            .with_value();
        let Execution { results, last_success_index } = self.execute_widened(calls, plan)?;
        Ok(GasValueAggregated { metadata: self.metadata(false), results, last_success_index })
    }

    /// Deploys `init_code` from the aggregator address and returns the created contract's
    /// address.
    pub fn deploy_contract(&mut self, init_code: Bytes) -> Result<Address, MulticallError> {
        self.deploy_reserving(init_code, 0)
    }

    /// Deploys `init_code`, points every call targeting the zero address at the new contract and
    /// runs the calls with [`Self::multicall_with_gas_limitation`].
    ///
    /// The deployment never consumes `gas_buffer` or the finalize reserve.
    pub fn multicall_with_deployment(
        &mut self,
        init_code: Bytes,
        calls: Vec<CallGas>,
        gas_buffer: u64,
    ) -> Result<(Address, Aggregated<ResultGas>), MulticallError> {
        let reserved = gas_buffer.saturating_add(self.config.finalize_reserve);
        let address = self.deploy_reserving(init_code, reserved)?;
        let calls = retarget(calls, address);
        let batch = self.multicall_with_gas_limitation(calls, gas_buffer)?;
        Ok((address, batch))
    }

    /// Deploys `init_code` with the budget left after withholding `reserved` and the call
    /// overhead.
    fn deploy_reserving(
        &mut self,
        init_code: Bytes,
        reserved: u64,
    ) -> Result<Address, MulticallError> {
        let overhead = self.config.call_overhead_gas;
        let gas_limit = self.budget.available(reserved.saturating_add(overhead)).unwrap_or(0);
        let outcome = self.host.deploy(DeployRequest {
            deployer: self.config.address,
            init_code,
            value: U256::ZERO,
            gas_limit,
        })?;
        self.budget.record(outcome.gas_used.min(gas_limit).saturating_add(overhead));

        match outcome.address {
            Some(address) => {
                debug!(target: "multicall", %address, gas_used = outcome.gas_used, "deployed");
                Ok(address)
            }
            None => {
                debug!(target: "multicall", gas_limit, reserved, "deployment failed");
                Err(MulticallError::DeploymentFailed { return_data: outcome.output })
            }
        }
    }

    /// Runs a compact call encoding and returns the packed result encoding.
    ///
    /// Calls get the configured default gas limit. With `init_code`, a contract is deployed
    /// first and calls targeting the zero address are pointed at it.
    pub fn execute_compact(
        &mut self,
        encoded: &[u8],
        init_code: Option<Bytes>,
        gas_buffer: u64,
    ) -> Result<Bytes, MulticallError> {
        let gas_limit = self.config.default_call_gas_limit;
        let calls: Vec<CallGas> = codec::decode_compact_calls(encoded)?
            .into_iter()
            .map(|call| CallGas { target: call.target, gas_limit, payload: call.payload })
            .collect();

        let batch = match init_code {
            Some(init_code) => self.multicall_with_deployment(init_code, calls, gas_buffer)?.1,
            None => self.multicall_with_gas_limitation(calls, gas_buffer)?,
        };
        Ok(codec::encode_packed_results(&batch.results)?)
    }

    fn execute_widened<C: Into<CallDescriptor>>(
        &mut self,
        calls: Vec<C>,
        plan: ExecutionPlan,
    ) -> Result<Execution, MulticallError> {
        self.execute(calls.into_iter().map(Into::into).collect(), plan)
    }
}

fn into_results(execution: Execution) -> Vec<CallResult> {
    execution.results.into_iter().map(CallResult::from).collect()
}

fn retarget(calls: Vec<CallGas>, address: Address) -> Vec<CallGas> {
    calls
        .into_iter()
        .map(|call| if call.target.is_zero() { CallGas { target: address, ..call } } else { call })
        .collect()
}
