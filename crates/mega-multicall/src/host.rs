//! The external collaborators of the aggregator.
//!
//! The engine never executes code itself. Calls and deployments are handed to a
//! [`CallDispatcher`], block context and balances are read from a [`BlockEnvironment`]. A type
//! implementing both is a [`Host`].

use core::fmt::Debug;

use alloy_primitives::{Address, Bytes, B256, U256};
use auto_impl::auto_impl;

/// A call handed to the dispatch primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// The address the call originates from (the aggregator).
    pub caller: Address,
    /// The address the call is dispatched to.
    pub target: Address,
    /// The native value transferred with the call.
    pub value: U256,
    /// The gas made available to the call.
    pub gas_limit: u64,
    /// Opaque calldata.
    pub input: Bytes,
}

/// How a dispatched call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum CallStatus {
    /// The target executed and returned normally.
    Success,
    /// The target executed and signalled failure (revert, halt, out of gas).
    Reverted,
    /// The dispatch primitive could not resolve the target.
    Unreachable,
}

/// The outcome reported by the dispatch primitive for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// How the call ended.
    pub status: CallStatus,
    /// The gas actually consumed by the call.
    pub gas_used: u64,
    /// The bytes returned by the target. Empty for unreachable targets.
    pub output: Bytes,
}

impl DispatchOutcome {
    /// A successful outcome.
    pub fn success(gas_used: u64, output: impl Into<Bytes>) -> Self {
        Self { status: CallStatus::Success, gas_used, output: output.into() }
    }

    /// A reverted outcome carrying the revert data.
    pub fn revert(gas_used: u64, output: impl Into<Bytes>) -> Self {
        Self { status: CallStatus::Reverted, gas_used, output: output.into() }
    }

    /// An outcome for a target the dispatch primitive could not resolve.
    pub fn unreachable() -> Self {
        Self { status: CallStatus::Unreachable, gas_used: 0, output: Bytes::new() }
    }

    /// Returns `true` if the call succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self.status, CallStatus::Success)
    }
}

/// A contract creation handed to the deploy primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// The creating account (the aggregator).
    pub deployer: Address,
    /// Creation bytecode.
    pub init_code: Bytes,
    /// The native value endowed to the new contract.
    pub value: U256,
    /// The gas made available to the creation.
    pub gas_limit: u64,
}

/// The outcome of a contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    /// The address of the created contract, `None` if the creation failed.
    pub address: Option<Address>,
    /// The gas consumed by the creation.
    pub gas_used: u64,
    /// Revert data of a failed creation, empty otherwise.
    pub output: Bytes,
}

/// Failures of the host itself, as opposed to failures of a dispatched call. They are never
/// recorded into a result; the aggregator propagates them to its caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The host's state could not be read or written.
    #[error("host state error: {0}")]
    State(String),
    /// The host does not support the requested primitive.
    #[error("unsupported host operation: {0}")]
    Unsupported(&'static str),
}

/// The opaque call-dispatch primitive.
///
/// Calls are dispatched one at a time; implementations must complete a call before returning.
#[auto_impl(&mut, Box)]
pub trait CallDispatcher {
    /// Executes `request` against its target.
    fn dispatch(&mut self, request: CallRequest) -> Result<DispatchOutcome, DispatchError>;

    /// Creates a contract from `request.init_code`.
    fn deploy(&mut self, request: DeployRequest) -> Result<DeployOutcome, DispatchError> {
        let _ = request;
        Err(DispatchError::Unsupported("deploy"))
    }

    /// Takes a checkpoint of the host state and returns its identifier. Hosts without state
    /// rollback return `0` and ignore [`Self::revert_to`] and [`Self::commit`].
    fn checkpoint(&mut self) -> usize {
        0
    }

    /// Reverts the host state to `checkpoint`, discarding later checkpoints.
    fn revert_to(&mut self, checkpoint: usize) {
        let _ = checkpoint;
    }

    /// Discards `checkpoint`, keeping the state changes made after it.
    fn commit(&mut self, checkpoint: usize) {
        let _ = checkpoint;
    }
}

/// Read-only queries into the execution environment.
///
/// Methods returning `Option` yield `None` when the environment snapshot cannot answer the
/// query; the accessor shim turns that into a zero value.
#[auto_impl(&, &mut, Box, Arc)]
pub trait BlockEnvironment: Debug {
    /// The current block number.
    fn block_number(&self) -> u64;

    /// The hash of block `number`, if it is within the retained history.
    fn block_hash(&self, number: u64) -> Option<B256>;

    /// The current block timestamp.
    fn timestamp(&self) -> u64;

    /// The current block beneficiary.
    fn coinbase(&self) -> Address;

    /// The current block difficulty (prevrandao after the merge).
    fn difficulty(&self) -> U256;

    /// The current block gas limit.
    fn gas_limit(&self) -> u64;

    /// The current block base fee.
    fn basefee(&self) -> u64;

    /// The chain id.
    fn chain_id(&self) -> u64;

    /// The native balance of `address`, if known.
    fn balance(&self, address: Address) -> Option<U256>;
}

/// A complete host: dispatch primitive and environment.
pub trait Host: CallDispatcher + BlockEnvironment {}

impl<T: CallDispatcher + BlockEnvironment> Host for T {}

/// Calculates the address of a contract created by `sender` with `nonce`:
/// `keccak256(rlp([sender, nonce]))[12:]`.
pub fn calculate_create_address(sender: Address, nonce: u64) -> Address {
    sender.create(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_create_address() {
        // Known vectors for the first two creations of this sender.
        let sender = address!("0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0");
        assert_eq!(
            calculate_create_address(sender, 0),
            address!("0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d")
        );
        assert_eq!(
            calculate_create_address(sender, 1),
            address!("0x343c43a37d37dff08ae8c4a11544c718abb4fcf8")
        );
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(DispatchOutcome::success(1, Bytes::new()).is_success());
        assert!(!DispatchOutcome::revert(1, Bytes::new()).is_success());
        let unreachable = DispatchOutcome::unreachable();
        assert_eq!(unreachable.status, CallStatus::Unreachable);
        assert_eq!(unreachable.gas_used, 0);
    }
}
