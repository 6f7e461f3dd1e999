//! Constants for the multicall engine.

use alloy_primitives::{address, Address};

/// The default address the aggregator dispatches calls from. It is the `msg.sender` observed by
/// every target of a batch.
pub const AGGREGATOR_ADDRESS: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");

/// The gas reserved by default for finalizing and returning a gas-limited batch response.
pub const DEFAULT_GAS_BUFFER: u64 = 1_000_000;

/// The per-call gas limit used when calls are submitted without one (compact batches, batch
/// runner inputs built from plain calls).
pub const DEFAULT_CALL_GAS_LIMIT: u64 = 100_000_000;

/// The default number of calls submitted per invocation by the batch runner.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// The number of past block hashes retained by the environment. Hashes of older blocks read as
/// zero.
pub const BLOCK_HASH_HISTORY: u64 = 256;

/// Constants of the compact call encoding and packed result encoding.
pub mod compact {
    /// Length of the big-endian call count header of a compact batch.
    pub const CALL_COUNT_LEN: usize = 32;

    /// Flag bit set when a call targets the same address as the previous call.
    pub const SAME_TARGET_FLAG: u8 = 1;

    /// Flag bit set when a call carries the same calldata as the previous call.
    pub const SAME_CALLDATA_FLAG: u8 = 2;

    /// Length of the record length prefix of a packed result.
    pub const RECORD_LENGTH_LEN: usize = 2;

    /// Length of the fixed header of a packed result: record length, success byte and gas used.
    pub const RECORD_HEADER_LEN: usize = RECORD_LENGTH_LEN + 1 + 4;

    /// The largest return data a single packed result can hold.
    pub const MAX_RECORD_DATA_LEN: usize = u16::MAX as usize - RECORD_HEADER_LEN;
}
