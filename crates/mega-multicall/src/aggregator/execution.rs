use core::ops::ControlFlow;

use alloy_primitives::U256;
use tracing::{debug, trace};

use super::Aggregator;
use crate::{
    CallDescriptor, CallFailure, CallRequest, ExecutionPlan, Host, MulticallError, ResultGas,
};

/// The outcome of one pass of the execution loop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Execution {
    /// One result per attempted call, in input order. Shorter than the input when the gas guard
    /// stopped the loop early. A call the guard starved into running out of gas is rolled back
    /// and has no result.
    pub results: Vec<ResultGas>,
    /// The highest input index whose call executed and succeeded.
    pub last_success_index: Option<usize>,
}

/// Signals that the gas guard stops the loop.
#[derive(Debug, Clone, Copy)]
struct BudgetExhausted {
    remaining: u64,
    reserved: u64,
}

impl<H: Host> Aggregator<H> {
    /// Runs `calls` in input order according to `plan`.
    ///
    /// Aborting reverts the host to the checkpoint taken before the first dispatch; completing
    /// (including an early stop of the gas guard) commits it.
    pub(crate) fn execute(
        &mut self,
        calls: Vec<CallDescriptor>,
        plan: ExecutionPlan,
    ) -> Result<Execution, MulticallError> {
        debug!(
            target: "multicall",
            calls = calls.len(),
            policy = ?plan.policy,
            gas_buffer = ?plan.gas_buffer,
            gas_left = self.budget.remaining(),
            "executing batch"
        );
        if plan.forward_value {
            self.check_value(&calls)?;
        }

        let value_left = self.value_left;
        let checkpoint = self.host.checkpoint();
        match self.run(calls, plan) {
            Ok(execution) => {
                self.host.commit(checkpoint);
                Ok(execution)
            }
            Err(err) => {
                self.host.revert_to(checkpoint);
                self.value_left = value_left;
                Err(err)
            }
        }
    }

    /// Fails with [`MulticallError::ValueOverflow`] if the summed value of `calls` exceeds the
    /// value left to the invocation.
    fn check_value(&self, calls: &[CallDescriptor]) -> Result<(), MulticallError> {
        let available = self.value_left;
        let requested =
            calls.iter().try_fold(U256::ZERO, |total, call| total.checked_add(call.value));
        match requested {
            Some(requested) if requested <= available => Ok(()),
            requested => {
                let requested = requested.unwrap_or(U256::MAX);
                debug!(target: "multicall", %requested, %available, "batch value overflow");
                Err(MulticallError::ValueOverflow { requested, available })
            }
        }
    }

    fn run(
        &mut self,
        calls: Vec<CallDescriptor>,
        plan: ExecutionPlan,
    ) -> Result<Execution, MulticallError> {
        let mut execution =
            Execution { results: Vec::with_capacity(calls.len()), last_success_index: None };

        for (index, call) in calls.into_iter().enumerate() {
            let gas_limit = match self.forwardable_gas(&call, plan.gas_buffer) {
                ControlFlow::Continue(gas_limit) => gas_limit,
                ControlFlow::Break(exhausted) => {
                    debug!(
                        target: "multicall",
                        index,
                        remaining = exhausted.remaining,
                        reserved = exhausted.reserved,
                        "gas budget exhausted, stopping batch"
                    );
                    break;
                }
            };
            let value = if plan.forward_value { call.value } else { U256::ZERO };
            // A guarded call forwarded less than its own limit that runs out of gas was starved
            // by the guard rather than failing on its own.
            let capped =
                plan.gas_buffer.is_some() && call.gas_limit.is_some_and(|limit| gas_limit < limit);
            let call_checkpoint = capped.then(|| self.host.checkpoint());

            let outcome = self.host.dispatch(CallRequest {
                caller: self.config.address,
                target: call.target,
                value,
                gas_limit,
                input: call.payload,
            })?;
            let gas_used = outcome.gas_used.min(gas_limit);
            self.budget.record(gas_used.saturating_add(self.config.call_overhead_gas));

            if let Some(checkpoint) = call_checkpoint {
                if !outcome.is_success() && gas_used >= gas_limit {
                    self.host.revert_to(checkpoint);
                    debug!(
                        target: "multicall",
                        index,
                        gas_limit,
                        requested = ?call.gas_limit,
                        "call starved by the gas guard, stopping batch"
                    );
                    break;
                }
                self.host.commit(checkpoint);
            }
            trace!(
                target: "multicall",
                index,
                target_address = %call.target,
                status = ?outcome.status,
                gas_limit,
                gas_used,
                "dispatched call"
            );

            match CallFailure::from_status(outcome.status) {
                Some(reason) if !plan.policy.tolerates(call.allow_failure) => {
                    debug!(target: "multicall", index, %reason, "aborting batch");
                    return Err(MulticallError::BatchAborted {
                        index,
                        reason,
                        return_data: outcome.output,
                    });
                }
                Some(_) => {}
                None => {
                    self.value_left = self.value_left.saturating_sub(value);
                    execution.last_success_index = Some(index);
                }
            }

            execution.results.push(ResultGas {
                success: outcome.is_success(),
                gas_used,
                return_data: outcome.output,
            });
        }

        Ok(execution)
    }

    /// The gas forwarded to `call`.
    ///
    /// Without a guard, the call gets its own limit capped by the remaining budget. With a
    /// guard, `gas_buffer`, the finalize reserve and the call overhead are withheld first, and
    /// the loop stops once nothing is left after withholding them.
    fn forwardable_gas(
        &self,
        call: &CallDescriptor,
        gas_buffer: Option<u64>,
    ) -> ControlFlow<BudgetExhausted, u64> {
        let overhead = self.config.call_overhead_gas;
        let available = match gas_buffer {
            Some(gas_buffer) => {
                let reserved = gas_buffer
                    .saturating_add(self.config.finalize_reserve)
                    .saturating_add(overhead);
                match self.budget.available(reserved) {
                    Some(available) => available,
                    None => {
                        return ControlFlow::Break(BudgetExhausted {
                            remaining: self.budget.remaining(),
                            reserved,
                        })
                    }
                }
            }
            None => self.budget.remaining().saturating_sub(overhead),
        };
        ControlFlow::Continue(call.gas_limit.map_or(available, |limit| limit.min(available)))
    }
}
