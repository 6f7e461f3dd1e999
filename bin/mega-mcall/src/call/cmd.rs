use alloy_primitives::{hex, Bytes, FixedBytes};
use clap::Parser;
use mega_multicall::{decode_revert_reason, handle_call, Aggregator, Operation};
use tracing::info;

use crate::common::{load_hex, BudgetArgs, EnvArgs, McallError, PreStateArgs, Result};

/// Send raw ABI calldata to the aggregator entry point
#[derive(Parser, Debug)]
pub struct Cmd {
    /// ABI-encoded calldata as hex string (positional argument)
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,

    /// File containing the calldata. If '-' is specified, calldata is read from stdin
    #[arg(long = "inputfile")]
    pub inputfile: Option<String>,

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
    /// Execute the call command
    pub fn run(&self) -> Result<()> {
        let output = self.execute()?;
        match output {
            Ok(output) => println!("{}", hex::encode_prefixed(&output)),
            Err(revert) => {
                println!("{}", hex::encode_prefixed(&revert));
                eprintln!(" error: reverted ({})", decode_revert_reason(&revert));
            }
        }
        Ok(())
    }

    /// Runs the calldata and returns the entry point's output or revert data.
    fn execute(&self) -> Result<std::result::Result<Bytes, Bytes>> {
        let input = load_hex(self.input.as_deref(), self.inputfile.as_deref())?.ok_or_else(|| {
            McallError::InvalidInput("one of INPUT or --inputfile is required".into())
        })?;
        let operation = input
            .get(..4)
            .and_then(|selector| Operation::from_selector(FixedBytes::from_slice(selector)));
        if let Some(operation) = operation {
            info!(operation = operation.name(), mutability = ?operation.mutability(), "Calling");
        }

        let chain = self.prestate_args.create_chain(self.env_args.create_block_snapshot())?;
        let mut aggregator =
            Aggregator::with_config(chain, self.budget_args.config(), self.budget_args.context());
        Ok(handle_call(&mut aggregator, &input))
    }
}
