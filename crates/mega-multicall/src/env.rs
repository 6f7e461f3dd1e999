//! Block environment snapshot and the read-only accessor shim.

use alloy_primitives::{map::HashMap, Address, B256, U256};

use crate::{constants::BLOCK_HASH_HISTORY, BlockEnvironment};

/// A fixed snapshot of the block context a batch executes in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct BlockSnapshot {
    /// The current block number.
    pub number: u64,
    /// The hash of the current block.
    pub hash: B256,
    /// The current block timestamp.
    pub timestamp: u64,
    /// The current block beneficiary.
    pub coinbase: Address,
    /// The current block difficulty or prevrandao.
    pub difficulty: U256,
    /// The current block gas limit.
    pub gas_limit: u64,
    /// The current block base fee.
    pub basefee: u64,
    /// The chain id.
    pub chain_id: u64,
    /// Hashes of past blocks by number.
    pub history: HashMap<u64, B256>,
}

impl BlockSnapshot {
    /// Creates a snapshot of block `number` with hash `hash` on chain `chain_id`.
    pub fn new(number: u64, hash: B256, chain_id: u64) -> Self {
        Self { number, hash, chain_id, ..Default::default() }
    }

    /// Records the hash of a past block.
    pub fn with_history(mut self, number: u64, hash: B256) -> Self {
        self.history.insert(number, hash);
        self
    }

    /// Returns `true` if the hash of block `number` is retained: the current block and the
    /// [`BLOCK_HASH_HISTORY`] blocks before it.
    pub const fn is_retained(&self, number: u64) -> bool {
        number <= self.number && self.number - number <= BLOCK_HASH_HISTORY
    }
}

impl BlockEnvironment for BlockSnapshot {
    fn block_number(&self) -> u64 {
        self.number
    }

    fn block_hash(&self, number: u64) -> Option<B256> {
        if !self.is_retained(number) {
            return None;
        }
        if number == self.number {
            return Some(self.hash);
        }
        self.history.get(&number).copied()
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn coinbase(&self) -> Address {
        self.coinbase
    }

    fn difficulty(&self) -> U256 {
        self.difficulty
    }

    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    fn basefee(&self) -> u64 {
        self.basefee
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn balance(&self, _address: Address) -> Option<U256> {
        None
    }
}

/// Read-only accessors over a [`BlockEnvironment`]. Queries the environment cannot answer read
/// as zero instead of failing.
#[derive(Debug)]
pub struct EnvReader<'a, E: ?Sized> {
    env: &'a E,
}

impl<'a, E: BlockEnvironment + ?Sized> EnvReader<'a, E> {
    /// Wraps `env`.
    pub const fn new(env: &'a E) -> Self {
        Self { env }
    }

    /// The current block number.
    pub fn block_number(&self) -> u64 {
        self.env.block_number()
    }

    /// The hash of block `number`, zero outside the retained history.
    pub fn block_hash(&self, number: u64) -> B256 {
        self.env.block_hash(number).unwrap_or_default()
    }

    /// The hash of the current block.
    pub fn current_block_hash(&self) -> B256 {
        self.block_hash(self.block_number())
    }

    /// The hash of the previous block, zero at genesis.
    pub fn last_block_hash(&self) -> B256 {
        self.block_number().checked_sub(1).map(|number| self.block_hash(number)).unwrap_or_default()
    }

    /// The current block timestamp.
    pub fn timestamp(&self) -> u64 {
        self.env.timestamp()
    }

    /// The current block beneficiary.
    pub fn coinbase(&self) -> Address {
        self.env.coinbase()
    }

    /// The current block difficulty or prevrandao.
    pub fn difficulty(&self) -> U256 {
        self.env.difficulty()
    }

    /// The current block gas limit.
    pub fn gas_limit(&self) -> u64 {
        self.env.gas_limit()
    }

    /// The current block base fee.
    pub fn basefee(&self) -> u64 {
        self.env.basefee()
    }

    /// The chain id.
    pub fn chain_id(&self) -> u64 {
        self.env.chain_id()
    }

    /// The native balance of `address`, zero if unknown.
    pub fn balance(&self, address: Address) -> U256 {
        self.env.balance(address).unwrap_or_default()
    }
}
