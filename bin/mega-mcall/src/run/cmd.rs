use std::{path::PathBuf, time::Instant};

use clap::{Parser, ValueEnum};
use mega_multicall::{test_utils::MemoryChain, Aggregator, BatchRunner};
use tracing::info;

use crate::common::{
    load_batch, load_hex, print_batch_failure, BatchEntry, BatchOutcome, BudgetArgs, EnvArgs,
    McallError, PreStateArgs, Result,
};

/// Aggregation mode a batch runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Any failure aborts the batch
    Aggregate,
    /// Failures abort only with `--require-success`
    TryAggregate,
    /// `aggregate` with the block hash
    BlockAndAggregate,
    /// `try-aggregate` with block number and hash
    TryBlockAndAggregate,
    /// Per-call allow-failure
    Aggregate3,
    /// Per-call allow-failure, forwarding each call's value
    Aggregate3Value,
    /// Per-call gas limits, failures tolerated
    Multicall,
    /// `multicall` that stops once the gas buffer would be touched
    MulticallWithGasLimitation,
    /// `multicall-with-gas-limitation` forwarding each call's value
    MulticallWithGasLimitationValue,
    /// Deploys `--init-code` first, then runs `multicall-with-gas-limitation`
    MulticallWithDeployment,
    /// Splits the batch over as many invocations as needed
    Chunked,
}

/// Run a JSON batch through one aggregation mode
#[derive(Parser, Debug)]
pub struct Cmd {
    /// JSON file with the batch: an array of `{ target, payload, allowFailure, value, gasLimit }`
    #[arg(long = "batch")]
    pub batch: PathBuf,

    /// Aggregation mode
    #[arg(long = "mode", value_enum, default_value_t = Mode::Aggregate3)]
    pub mode: Mode,

    /// Abort on the first failure in `try-aggregate` modes
    #[arg(long = "require-success")]
    pub require_success: bool,

    /// Init code deployed by `multicall-with-deployment` (hex string)
    #[arg(long = "init-code")]
    pub init_code: Option<String>,

    /// Maximum number of calls per invocation in `chunked` mode
    #[arg(long = "batch-size", default_value_t = mega_multicall::constants::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Budget configuration
    #[command(flatten)]
    pub budget_args: BudgetArgs,

    /// Pre-execution state configuration
    #[command(flatten)]
    pub prestate_args: PreStateArgs,

    /// Environment configuration
    #[command(flatten)]
    pub env_args: EnvArgs,
}

impl Cmd {
    /// Execute the run command
    pub fn run(&self) -> Result<()> {
        let batch = load_batch(&self.batch)?;
        let chain = self.prestate_args.create_chain(self.env_args.create_block_snapshot())?;

        let start = Instant::now();
        let outcome = self.execute(chain, &batch).inspect_err(|err| {
            if let McallError::Multicall(err) = err {
                print_batch_failure(err);
            }
        })?;
        info!(mode = ?self.mode, elapsed = ?start.elapsed(), "Batch executed");

        outcome.print()
    }

    /// Runs `batch` against `chain` in the selected mode.
    fn execute(&self, chain: MemoryChain, batch: &[BatchEntry]) -> Result<BatchOutcome> {
        let config = self.budget_args.config();
        let context = self.budget_args.context();
        let gas_buffer = self.budget_args.gas_buffer;
        let gas_limit = config.default_call_gas_limit;
        let submitted = batch.len();

        let mut aggregator = Aggregator::with_config(chain, config, context);
        let calls = || batch.iter().map(BatchEntry::call).collect::<Vec<_>>();
        let calls_gas = || batch.iter().map(|entry| entry.call_gas(gas_limit)).collect::<Vec<_>>();

        let outcome = match self.mode {
            Mode::Aggregate => {
                let batch = aggregator.aggregate(calls())?;
                BatchOutcome::from_results(submitted, batch.results).with_metadata(batch.metadata)
            }
            Mode::TryAggregate => BatchOutcome::from_results(
                submitted,
                aggregator.try_aggregate(self.require_success, calls())?,
            ),
            Mode::BlockAndAggregate => {
                let batch = aggregator.block_and_aggregate(calls())?;
                BatchOutcome::from_results(submitted, batch.results).with_metadata(batch.metadata)
            }
            Mode::TryBlockAndAggregate => {
                let batch = aggregator.try_block_and_aggregate(self.require_success, calls())?;
                BatchOutcome::from_results(submitted, batch.results).with_metadata(batch.metadata)
            }
            Mode::Aggregate3 => BatchOutcome::from_results(
                submitted,
                aggregator.aggregate3(batch.iter().map(BatchEntry::call3).collect())?,
            ),
            Mode::Aggregate3Value => BatchOutcome::from_results(
                submitted,
                aggregator.aggregate3_value(batch.iter().map(BatchEntry::call3_value).collect())?,
            ),
            Mode::Multicall => {
                let batch = aggregator.multicall(calls_gas())?;
                BatchOutcome::from_gas_results(submitted, batch.results)
                    .with_metadata(batch.metadata)
            }
            Mode::MulticallWithGasLimitation => {
                let batch = aggregator.multicall_with_gas_limitation(calls_gas(), gas_buffer)?;
                BatchOutcome::from_gas_results(submitted, batch.results)
                    .with_metadata(batch.metadata)
            }
            Mode::MulticallWithGasLimitationValue => {
                let calls = batch.iter().map(|entry| entry.call_gas_value(gas_limit)).collect();
                let batch = aggregator.multicall_with_gas_limitation_value(calls, gas_buffer)?;
                BatchOutcome::from_gas_results(submitted, batch.results)
                    .with_metadata(batch.metadata)
                    .with_last_success_index(batch.last_success_index)
            }
            Mode::MulticallWithDeployment => {
                let init_code = load_hex(self.init_code.as_deref(), None)?.ok_or_else(|| {
                    McallError::InvalidInput("--init-code is required for this mode".to_string())
                })?;
                let (address, batch) =
                    aggregator.multicall_with_deployment(init_code, calls_gas(), gas_buffer)?;
                BatchOutcome::from_gas_results(submitted, batch.results)
                    .with_metadata(batch.metadata)
                    .with_deployed(address)
            }
            Mode::Chunked => {
                let runner = BatchRunner::new(self.batch_size, gas_buffer);
                let results = runner.run(aggregator.host_mut(), config, context, &calls_gas())?;
                // every chunk runs in its own invocation, so there is no single budget to report
                return Ok(BatchOutcome::from_chunked_results(submitted, results));
            }
        };

        Ok(outcome.with_aggregator(&aggregator))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, bytes, Address, Bytes, U256};
    use mega_multicall::{
        constants::AGGREGATOR_ADDRESS, test_utils::MockContract, BlockSnapshot, CallFailure,
        MulticallError,
    };
    use rstest::rstest;

    use super::*;

    const OK: Address = address!("1000000000000000000000000000000000000001");
    const REVERTER: Address = address!("1000000000000000000000000000000000000002");

    fn cmd(args: &[&str]) -> Cmd {
        let mut argv = vec!["run", "--batch", "batch.json"];
        argv.extend_from_slice(args);
        Cmd::parse_from(argv)
    }

    fn chain() -> MemoryChain {
        MemoryChain::new(BlockSnapshot::new(10, Default::default(), 6342))
            .contract(OK, MockContract::returning(1_000, bytes!("01")))
            .contract(REVERTER, MockContract::reverting(1_000, Bytes::new()))
            .account_balance(AGGREGATOR_ADDRESS, U256::from(100))
    }

    fn entry(target: Address, allow_failure: bool) -> BatchEntry {
        BatchEntry { target, allow_failure, ..Default::default() }
    }

    #[rstest]
    #[case::aggregate3("aggregate3", vec![true, false])]
    #[case::try_aggregate("try-aggregate", vec![true, false])]
    #[case::multicall("multicall", vec![true, false])]
    fn test_tolerant_modes(#[case] mode: &str, #[case] expected: Vec<bool>) {
        let outcome = cmd(&["--mode", mode])
            .execute(chain(), &[entry(OK, false), entry(REVERTER, true)])
            .unwrap();

        let success: Vec<_> = outcome.results.iter().map(|result| result.success).collect();
        assert_eq!(success, expected);
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_aggregate_abort() {
        let err = cmd(&["--mode", "aggregate"])
            .execute(chain(), &[entry(OK, false), entry(REVERTER, true)])
            .unwrap_err();
        assert!(matches!(
            err,
            McallError::Multicall(MulticallError::BatchAborted {
                index: 1,
                reason: CallFailure::CallReverted,
                ..
            })
        ));
    }

    #[test]
    fn test_gas_limitation_truncates() {
        let outcome = cmd(&[
            "--mode",
            "multicall-with-gas-limitation",
            "--gas",
            "102000",
            "--gas-buffer",
            "100000",
        ])
        .execute(chain(), &vec![entry(OK, false); 5])
        .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.truncated);
        assert_eq!(outcome.gas_left, Some(100_000));
    }

    #[test]
    fn test_value_mode_reports_last_success() {
        let mut paid = entry(OK, false);
        paid.value = U256::from(40);
        let outcome = cmd(&["--mode", "multicall-with-gas-limitation-value", "--value", "50"])
            .execute(chain(), &[paid, entry(REVERTER, false)])
            .unwrap();

        assert_eq!(outcome.last_success_index, Some(0));
        assert_eq!(outcome.value_left, Some(U256::from(10)));
    }

    #[test]
    fn test_chunked_mode() {
        let outcome = cmd(&["--mode", "chunked", "--batch-size", "2"])
            .execute(chain(), &vec![entry(OK, false); 5])
            .unwrap();
        assert_eq!(outcome.results.len(), 5);
        assert!(outcome.results.iter().all(|result| result.gas_used == Some(1_000)));
    }

    #[test]
    fn test_deployment_requires_init_code() {
        let err = cmd(&["--mode", "multicall-with-deployment"])
            .execute(chain(), &[entry(Address::ZERO, false)])
            .unwrap_err();
        assert!(matches!(err, McallError::InvalidInput(_)));
    }
}
