use std::path::PathBuf;

use alloy_primitives::{hex, Bytes};
use clap::Parser;
use mega_multicall::{
    codec::{decode_compact_calls, decode_packed_results, encode_compact_calls},
    Aggregator,
};
use tracing::debug;

use crate::common::{
    load_batch, load_hex, print_batch_failure, BatchEntry, BatchOutcome, BudgetArgs, EnvArgs,
    McallError, PreStateArgs, Result,
};

/// Execute a compact-encoded batch and print the packed results
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Compact-encoded calls as hex string (positional argument)
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,

    /// File containing the compact-encoded calls. If '-' is specified, input is read from stdin
    #[arg(long = "inputfile")]
    pub inputfile: Option<String>,

    /// JSON batch file to encode instead of a compact input
    #[arg(long = "batch", conflicts_with_all = ["input", "inputfile"])]
    pub batch: Option<PathBuf>,

    /// Only print the compact encoding of `--batch` without executing it
    #[arg(long = "encode-only", requires = "batch")]
    pub encode_only: bool,

    /// Init code deployed before the calls; calls to the zero address target the new contract
    #[arg(long = "init-code")]
    pub init_code: Option<String>,

    /// Print the raw packed results instead of decoded JSON
    #[arg(long = "raw")]
    pub raw: bool,

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
    /// Execute the compact command
    pub fn run(&self) -> Result<()> {
        let encoded = self.load_input()?;
        if self.encode_only {
            println!("{}", hex::encode_prefixed(&encoded));
            return Ok(());
        }

        let packed = self.execute(&encoded).inspect_err(|err| {
            if let McallError::Multicall(err) = err {
                print_batch_failure(err);
            }
        })?;

        if self.raw {
            println!("{}", hex::encode_prefixed(&packed));
            return Ok(());
        }
        let submitted = decode_compact_calls(&encoded)?.len();
        BatchOutcome::from_gas_results(submitted, decode_packed_results(&packed)?).print()
    }

    /// Loads the compact input, encoding the JSON batch if one is given.
    fn load_input(&self) -> Result<Bytes> {
        if let Some(path) = &self.batch {
            let calls: Vec<_> = load_batch(path)?.iter().map(BatchEntry::call).collect();
            return Ok(encode_compact_calls(&calls)?);
        }
        load_hex(self.input.as_deref(), self.inputfile.as_deref())?.ok_or_else(|| {
            McallError::InvalidInput("one of INPUT, --inputfile or --batch is required".into())
        })
    }

    /// Runs the compact calls and returns the packed results.
    fn execute(&self, encoded: &[u8]) -> Result<Bytes> {
        let chain = self.prestate_args.create_chain(self.env_args.create_block_snapshot())?;
        let init_code = load_hex(self.init_code.as_deref(), None)?;
        let mut aggregator =
            Aggregator::with_config(chain, self.budget_args.config(), self.budget_args.context());

        let packed = aggregator.execute_compact(encoded, init_code, self.budget_args.gas_buffer)?;
        debug!(
            packed_len = packed.len(),
            gas_left = aggregator.gas_left(),
            "Compact batch executed"
        );
        Ok(packed)
    }
}
