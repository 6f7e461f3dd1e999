//! Block environment configuration

use alloy_primitives::{Address, B256, U256};
use clap::Args;
use mega_multicall::BlockSnapshot;

/// Block environment the batch executes in
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Environment Options")]
pub struct EnvArgs {
    /// `ChainID` to use
    #[arg(long = "state.chainid", default_value = "6342")]
    pub chain_id: u64,

    /// Block number
    #[arg(long = "block.number", default_value = "1")]
    pub block_number: u64,

    /// Block hash
    #[arg(
        long = "block.hash",
        default_value = "0x0000000000000000000000000000000000000000000000000000000000000000"
    )]
    pub block_hash: B256,

    /// Block coinbase/beneficiary address
    #[arg(long = "block.coinbase", default_value = "0x0000000000000000000000000000000000000000")]
    pub block_coinbase: Address,

    /// Block timestamp
    #[arg(long = "block.timestamp", default_value = "1")]
    pub block_timestamp: u64,

    /// Block gas limit
    #[arg(long = "block.gaslimit", default_value = "10000000000")]
    pub block_gas_limit: u64,

    /// Block base fee per gas (EIP-1559)
    #[arg(long = "block.basefee", default_value = "0")]
    pub block_basefee: u64,

    /// Block difficulty (prevrandao after the merge)
    #[arg(long = "block.difficulty", default_value = "0")]
    pub block_difficulty: U256,
}

impl EnvArgs {
    /// Creates the [`BlockSnapshot`] described by the arguments.
    pub fn create_block_snapshot(&self) -> BlockSnapshot {
        let mut env = BlockSnapshot::new(self.block_number, self.block_hash, self.chain_id);
        env.coinbase = self.block_coinbase;
        env.timestamp = self.block_timestamp;
        env.gas_limit = self.block_gas_limit;
        env.basefee = self.block_basefee;
        env.difficulty = self.block_difficulty;
        env
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        env: EnvArgs,
    }

    #[test]
    fn test_block_snapshot_from_args() {
        let cli = TestCli::parse_from([
            "test",
            "--block.number",
            "42",
            "--state.chainid",
            "1",
            "--block.basefee",
            "7",
        ]);
        let env = cli.env.create_block_snapshot();
        assert_eq!(env.number, 42);
        assert_eq!(env.chain_id, 1);
        assert_eq!(env.basefee, 7);
        assert_eq!(env.gas_limit, 10_000_000_000);
        assert_eq!(env.hash, B256::ZERO);
    }
}
