//! Chunked execution of batches larger than one invocation can carry.

use tracing::debug;

use crate::{
    constants::{DEFAULT_BATCH_SIZE, DEFAULT_GAS_BUFFER},
    Aggregator, AggregatorConfig, BatchContext, CallGas, DispatchError, Host, MulticallError,
    ResultGas,
};

/// Runs a large batch as a sequence of gas-limited invocations.
///
/// Each invocation receives at most `batch_size` calls and a fresh [`BatchContext`]. When the gas
/// guard truncates an invocation, the next one resumes at the first undispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRunner {
    batch_size: usize,
    gas_buffer: u64,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, gas_buffer: DEFAULT_GAS_BUFFER }
    }
}

impl BatchRunner {
    /// Creates a runner submitting up to `batch_size` calls per invocation.
    pub fn new(batch_size: usize, gas_buffer: u64) -> Self {
        Self { batch_size: batch_size.max(1), gas_buffer }
    }

    /// The maximum number of calls per invocation.
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The gas buffer of every invocation.
    pub const fn gas_buffer(&self) -> u64 {
        self.gas_buffer
    }

    /// Runs `calls` against `host`, one invocation with `context` per chunk, and returns one
    /// entry per call.
    ///
    /// An invocation the host fails is split in half and each half retried, down to single
    /// calls. A single call the host still fails gets that [`DispatchError`] as its entry and the
    /// run moves on.
    ///
    /// Fails with [`MulticallError::NoProgress`] if an invocation cannot dispatch a single call.
    pub fn run<H: Host>(
        &self,
        host: &mut H,
        config: AggregatorConfig,
        context: BatchContext,
        calls: &[CallGas],
    ) -> Result<Vec<Result<ResultGas, DispatchError>>, MulticallError> {
        let mut results = Vec::with_capacity(calls.len());

        while results.len() < calls.len() {
            let start = results.len();
            let end = calls.len().min(start.saturating_add(self.batch_size));
            let chunk = self.invoke(host, config, context, &calls[start..end], start)?;
            debug!(
                target: "multicall::runner",
                start,
                dispatched = chunk.len(),
                submitted = end - start,
                "chunk completed"
            );
            results.extend(chunk);
        }

        Ok(results)
    }

    /// Runs `chunk`, whose first call is at input index `start`, and returns the entries of the
    /// calls it got through, in order.
    fn invoke<H: Host>(
        &self,
        host: &mut H,
        config: AggregatorConfig,
        context: BatchContext,
        chunk: &[CallGas],
        start: usize,
    ) -> Result<Vec<Result<ResultGas, DispatchError>>, MulticallError> {
        let attempt = Aggregator::with_config(&mut *host, config, context)
            .multicall_with_gas_limitation(chunk.to_vec(), self.gas_buffer);

        match attempt {
            Ok(batch) if batch.results.is_empty() => {
                Err(MulticallError::NoProgress { index: start })
            }
            Ok(batch) => Ok(batch.results.into_iter().map(Ok).collect()),
            Err(MulticallError::Dispatch(err)) if chunk.len() == 1 => {
                debug!(target: "multicall::runner", index = start, %err, "host failed on call");
                Ok(vec![Err(err)])
            }
            Err(MulticallError::Dispatch(err)) => {
                let mid = chunk.len() / 2;
                debug!(
                    target: "multicall::runner",
                    start,
                    calls = chunk.len(),
                    %err,
                    "host failed, splitting invocation"
                );
                let mut results = self.invoke(host, config, context, &chunk[..mid], start)?;
                // a truncated first half leaves the rest to the next chunk
                if results.len() == mid {
                    results.extend(self.invoke(host, config, context, &chunk[mid..], start + mid)?);
                }
                Ok(results)
            }
            Err(err) => Err(err),
        }
    }
}
