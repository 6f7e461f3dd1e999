//! Pre-execution state of the in-memory host

use std::{path::PathBuf, str::FromStr};

use alloy_primitives::{map::HashMap, Address, Bytes, B256, U256};
use clap::Args;
use mega_multicall::{
    test_utils::{MemoryChain, MockContract},
    BlockSnapshot,
};
use serde::Deserialize;
use tracing::{debug, trace};

use super::{McallError, Result};

/// Pre-execution state configuration arguments
#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "State Options")]
pub struct PreStateArgs {
    /// JSON file with the prestate: balances, nonces, contracts, deployable init codes and
    /// historical block hashes.
    #[arg(long = "prestate", visible_aliases = ["pre-state"])]
    pub prestate: Option<PathBuf>,

    /// History block hashes served to `getBlockHash`. Each entry should be in the format
    /// `block_number:block_hash` (can be repeated). Overrides the prestate file.
    #[arg(long = "block-hash", visible_aliases = ["blockhash"])]
    pub block_hashes: Vec<String>,

    /// Override balance for specified addresses. Each entry format: `ADDRESS=VALUE`
    /// VALUE can be: plain number (wei), or number with suffix (ether, gwei, wei).
    /// Examples: `--balance 0x1234=100ether`
    #[arg(long = "balance")]
    pub balance: Vec<String>,
}

/// A contract the host is able to deploy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployable {
    /// The init code that deploys the contract.
    pub init_code: Bytes,
    /// The deployed contract.
    pub contract: MockContract,
}

/// Prestate file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Prestate {
    /// Native balances.
    pub balances: HashMap<Address, U256>,
    /// Account nonces.
    pub nonces: HashMap<Address, u64>,
    /// Hosted contracts.
    pub contracts: HashMap<Address, MockContract>,
    /// Contracts available for deployment.
    pub deployables: Vec<Deployable>,
    /// Hashes of past blocks.
    pub block_hashes: HashMap<u64, B256>,
}

/// Parse ether value string into wei (U256).
/// Supports: plain number (wei), or number with suffix (ether, gwei, wei, etc).
fn parse_ether_value(s: &str) -> Result<U256> {
    use alloy_primitives::utils::parse_units;

    let s = s.trim();
    let split_pos = s.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(s.len());
    let (num_str, unit) = s.split_at(split_pos);
    let unit = if unit.is_empty() { "wei" } else { unit };

    let parsed = parse_units(num_str, unit)
        .map_err(|e| McallError::InvalidInput(format!("Invalid ether value '{s}': {e}")))?;

    Ok(parsed.into())
}

impl PreStateArgs {
    /// Parse block hashes from CLI arguments.
    pub fn parse_block_hashes(&self) -> Result<Vec<(u64, B256)>> {
        self.block_hashes
            .iter()
            .map(|entry| {
                let (num_str, hash_str) = entry.split_once(':').ok_or_else(|| {
                    McallError::InvalidInput(format!(
                        "Invalid block hash entry '{entry}': expected format \
                         'block_number:block_hash'"
                    ))
                })?;
                let number = num_str.trim().parse().map_err(|e| {
                    McallError::InvalidInput(format!("Invalid block number '{num_str}': {e}"))
                })?;
                Ok((number, B256::from_str(hash_str.trim())?))
            })
            .collect()
    }

    /// Parse balance override entries from CLI arguments.
    pub fn parse_balance(&self) -> Result<Vec<(Address, U256)>> {
        self.balance
            .iter()
            .map(|entry| {
                let (addr_str, value_str) = entry.split_once('=').ok_or_else(|| {
                    McallError::InvalidInput(format!(
                        "Invalid balance entry '{entry}': expected format 'ADDRESS=VALUE'"
                    ))
                })?;
                Ok((Address::from_str(addr_str.trim())?, parse_ether_value(value_str)?))
            })
            .collect()
    }

    /// Loads the prestate file, if any.
    pub fn load_prestate(&self) -> Result<Prestate> {
        let Some(path) = &self.prestate else { return Ok(Prestate::default()) };
        debug!(path = %path.display(), "Loading prestate");
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Builds the in-memory host: the prestate file, then the command-line overrides.
    pub fn create_chain(&self, env: BlockSnapshot) -> Result<MemoryChain> {
        let prestate = self.load_prestate()?;
        let mut chain = MemoryChain::new(env);

        for (address, balance) in prestate.balances {
            chain.set_account_balance(address, balance);
        }
        for (address, nonce) in prestate.nonces {
            chain.set_account_nonce(address, nonce);
        }
        for (address, contract) in prestate.contracts {
            chain.set_contract(address, contract);
        }
        for deployable in prestate.deployables {
            chain.set_deployable(deployable.init_code, deployable.contract);
        }
        for (number, hash) in prestate.block_hashes.into_iter().chain(self.parse_block_hashes()?) {
            chain.history.insert(number, hash);
        }
        for (address, balance) in self.parse_balance()? {
            chain.set_account_balance(address, balance);
        }

        trace!(?chain, "Host created");
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("1000", U256::from(1_000))]
    #[case("2gwei", U256::from(2_000_000_000u64))]
    #[case("1ether", U256::from(1_000_000_000_000_000_000u128))]
    fn test_parse_ether_value(#[case] input: &str, #[case] expected: U256) {
        assert_eq!(parse_ether_value(input).unwrap(), expected);
    }

    #[test]
    fn test_overrides() {
        let args = PreStateArgs {
            block_hashes: vec![format!("7:{}", B256::repeat_byte(0x11))],
            balance: vec!["0x1000000000000000000000000000000000000001=5gwei".to_string()],
            ..Default::default()
        };
        let chain = args.create_chain(BlockSnapshot::new(8, B256::ZERO, 1)).unwrap();

        assert_eq!(
            chain.balance_of(address!("1000000000000000000000000000000000000001")),
            U256::from(5_000_000_000u64)
        );
        assert_eq!(chain.history.get(&7), Some(&B256::repeat_byte(0x11)));
    }

    #[test]
    fn test_malformed_entries() {
        let args = PreStateArgs { block_hashes: vec!["7".to_string()], ..Default::default() };
        assert!(matches!(args.parse_block_hashes(), Err(McallError::InvalidInput(_))));

        let args = PreStateArgs { balance: vec!["0x01=1".to_string()], ..Default::default() };
        assert!(args.parse_balance().is_err());
    }

    #[test]
    fn test_prestate_json() {
        let prestate: Prestate = serde_json::from_str(
            r#"{
                "balances": { "0x1000000000000000000000000000000000000001": "0x64" },
                "contracts": {
                    "0x1000000000000000000000000000000000000002": { "kind": "echo", "gas": 100 }
                },
                "deployables": [{ "initCode": "0x6000", "contract": { "kind": "echo", "gas": 1 } }],
                "blockHashes": { "3": "0x1111111111111111111111111111111111111111111111111111111111111111" }
            }"#,
        )
        .unwrap();

        assert_eq!(prestate.balances.len(), 1);
        assert_eq!(prestate.contracts.len(), 1);
        assert_eq!(prestate.deployables[0].init_code, Bytes::from_static(&[0x60, 0x00]));
        assert_eq!(prestate.block_hashes.get(&3), Some(&B256::repeat_byte(0x11)));
    }
}
