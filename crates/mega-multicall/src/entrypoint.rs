//! The ABI entry point of the aggregator.
//!
//! [`handle_call`] takes raw calldata of the [`IMulticall`] interface, routes it to the matching
//! [`Aggregator`] operation and returns ABI-encoded return data, or ABI-encoded revert data on
//! failure.

use alloy_primitives::{Bytes, FixedBytes, I256, U256};
use alloy_sol_types::{SolCall, SolInterface};
use tracing::debug;

use crate::{
    encode_error_result, Aggregator, EntryError, Host,
    IMulticall::{self, IMulticallCalls},
};

/// The caller-visible classification of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Pure read of the environment.
    ReadOnly,
    /// May mutate external state through dispatched calls. Rejects attached value.
    StateMutating,
    /// May mutate external state and accepts attached value.
    ValueAccepting,
}

/// The operations of the [`IMulticall`] interface, named after their Solidity functions.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Aggregate,
    TryAggregate,
    BlockAndAggregate,
    TryBlockAndAggregate,
    Aggregate3,
    Aggregate3Value,
    Multicall,
    MulticallWithGasLimitation,
    MulticallWithGasLimitationValue,
    DeployContract,
    GetBlockNumber,
    GetBlockHash,
    GetLastBlockHash,
    GetCurrentBlockTimestamp,
    GetCurrentBlockCoinbase,
    GetCurrentBlockDifficulty,
    GetCurrentBlockGasLimit,
    GetBasefee,
    GetChainId,
    GetEthBalance,
    GetGasLeft,
}

impl Operation {
    /// Every operation of the interface.
    pub const ALL: [Self; 21] = [
        Self::Aggregate,
        Self::TryAggregate,
        Self::BlockAndAggregate,
        Self::TryBlockAndAggregate,
        Self::Aggregate3,
        Self::Aggregate3Value,
        Self::Multicall,
        Self::MulticallWithGasLimitation,
        Self::MulticallWithGasLimitationValue,
        Self::DeployContract,
        Self::GetBlockNumber,
        Self::GetBlockHash,
        Self::GetLastBlockHash,
        Self::GetCurrentBlockTimestamp,
        Self::GetCurrentBlockCoinbase,
        Self::GetCurrentBlockDifficulty,
        Self::GetCurrentBlockGasLimit,
        Self::GetBasefee,
        Self::GetChainId,
        Self::GetEthBalance,
        Self::GetGasLeft,
    ];

    /// The Solidity function name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::TryAggregate => "tryAggregate",
            Self::BlockAndAggregate => "blockAndAggregate",
            Self::TryBlockAndAggregate => "tryBlockAndAggregate",
            Self::Aggregate3 => "aggregate3",
            Self::Aggregate3Value => "aggregate3Value",
            Self::Multicall => "multicall",
            Self::MulticallWithGasLimitation => "multicallWithGasLimitation",
            Self::MulticallWithGasLimitationValue => "multicallWithGasLimitationValue",
            Self::DeployContract => "deployContract",
            Self::GetBlockNumber => "getBlockNumber",
            Self::GetBlockHash => "getBlockHash",
            Self::GetLastBlockHash => "getLastBlockHash",
            Self::GetCurrentBlockTimestamp => "getCurrentBlockTimestamp",
            Self::GetCurrentBlockCoinbase => "getCurrentBlockCoinbase",
            Self::GetCurrentBlockDifficulty => "getCurrentBlockDifficulty",
            Self::GetCurrentBlockGasLimit => "getCurrentBlockGasLimit",
            Self::GetBasefee => "getBasefee",
            Self::GetChainId => "getChainId",
            Self::GetEthBalance => "getEthBalance",
            Self::GetGasLeft => "getGasLeft",
        }
    }

    /// The 4-byte function selector.
    pub const fn selector(&self) -> FixedBytes<4> {
        FixedBytes(match self {
            Self::Aggregate => IMulticall::aggregateCall::SELECTOR,
            Self::TryAggregate => IMulticall::tryAggregateCall::SELECTOR,
            Self::BlockAndAggregate => IMulticall::blockAndAggregateCall::SELECTOR,
            Self::TryBlockAndAggregate => IMulticall::tryBlockAndAggregateCall::SELECTOR,
            Self::Aggregate3 => IMulticall::aggregate3Call::SELECTOR,
            Self::Aggregate3Value => IMulticall::aggregate3ValueCall::SELECTOR,
            Self::Multicall => IMulticall::multicallCall::SELECTOR,
            Self::MulticallWithGasLimitation => {
                IMulticall::multicallWithGasLimitationCall::SELECTOR
            }
            Self::MulticallWithGasLimitationValue => {
                IMulticall::multicallWithGasLimitationValueCall::SELECTOR
            }
            Self::DeployContract => IMulticall::deployContractCall::SELECTOR,
            Self::GetBlockNumber => IMulticall::getBlockNumberCall::SELECTOR,
            Self::GetBlockHash => IMulticall::getBlockHashCall::SELECTOR,
            Self::GetLastBlockHash => IMulticall::getLastBlockHashCall::SELECTOR,
            Self::GetCurrentBlockTimestamp => IMulticall::getCurrentBlockTimestampCall::SELECTOR,
            Self::GetCurrentBlockCoinbase => IMulticall::getCurrentBlockCoinbaseCall::SELECTOR,
            Self::GetCurrentBlockDifficulty => IMulticall::getCurrentBlockDifficultyCall::SELECTOR,
            Self::GetCurrentBlockGasLimit => IMulticall::getCurrentBlockGasLimitCall::SELECTOR,
            Self::GetBasefee => IMulticall::getBasefeeCall::SELECTOR,
            Self::GetChainId => IMulticall::getChainIdCall::SELECTOR,
            Self::GetEthBalance => IMulticall::getEthBalanceCall::SELECTOR,
            Self::GetGasLeft => IMulticall::getGasLeftCall::SELECTOR,
        })
    }

    /// The operation with `selector`, if any.
    pub fn from_selector(selector: FixedBytes<4>) -> Option<Self> {
        Self::ALL.into_iter().find(|operation| operation.selector() == selector)
    }

    /// The caller-visible classification.
    pub const fn mutability(&self) -> Mutability {
        match self {
            Self::Aggregate |
            Self::TryAggregate |
            Self::BlockAndAggregate |
            Self::TryBlockAndAggregate |
            Self::Aggregate3 |
            Self::Aggregate3Value |
            Self::MulticallWithGasLimitationValue => Mutability::ValueAccepting,
            Self::Multicall | Self::MulticallWithGasLimitation | Self::DeployContract => {
                Mutability::StateMutating
            }
            _ => Mutability::ReadOnly,
        }
    }
}

/// Executes `input` as a call to the aggregator.
///
/// Returns the ABI-encoded return data of the selected operation, or ABI-encoded revert data
/// (one of the [`IMulticall`] errors) if the call fails.
pub fn handle_call<H: Host>(aggregator: &mut Aggregator<H>, input: &[u8]) -> Result<Bytes, Bytes> {
    route(aggregator, input).map_err(|err| {
        debug!(target: "multicall", %err, "call reverted");
        encode_error_result(&err)
    })
}

fn route<H: Host>(aggregator: &mut Aggregator<H>, input: &[u8]) -> Result<Bytes, EntryError> {
    let selector = input
        .get(..4)
        .map(FixedBytes::<4>::from_slice)
        .ok_or(EntryError::MalformedInput)?;
    let operation =
        Operation::from_selector(selector).ok_or(EntryError::UnknownSelector(selector))?;
    if !aggregator.context().value.is_zero() && operation.mutability() != Mutability::ValueAccepting
    {
        return Err(EntryError::NonPayable);
    }
    let call = IMulticallCalls::abi_decode(input).map_err(|_| EntryError::MalformedInput)?;
    debug!(target: "multicall", operation = operation.name(), "handling call");

    let output = match call {
        IMulticallCalls::aggregate(call) => {
            let batch = aggregator.aggregate(convert(call.calls))?;
            IMulticall::aggregateCall::abi_encode_returns(&IMulticall::aggregateReturn {
                blockNumber: U256::from(batch.metadata.block_number),
                returnData: batch.results.into_iter().map(|result| result.return_data).collect(),
            })
        }
        IMulticallCalls::tryAggregate(call) => {
            let results = aggregator.try_aggregate(call.requireSuccess, convert(call.calls))?;
            IMulticall::tryAggregateCall::abi_encode_returns(&convert(results))
        }
        IMulticallCalls::blockAndAggregate(call) => {
            let batch = aggregator.block_and_aggregate(convert(call.calls))?;
            IMulticall::blockAndAggregateCall::abi_encode_returns(
                &IMulticall::blockAndAggregateReturn {
                    blockNumber: U256::from(batch.metadata.block_number),
                    blockHash: batch.metadata.block_hash.unwrap_or_default(),
                    returnData: convert(batch.results),
                },
            )
        }
        IMulticallCalls::tryBlockAndAggregate(call) => {
            let batch =
                aggregator.try_block_and_aggregate(call.requireSuccess, convert(call.calls))?;
            IMulticall::tryBlockAndAggregateCall::abi_encode_returns(
                &IMulticall::tryBlockAndAggregateReturn {
                    blockNumber: U256::from(batch.metadata.block_number),
                    blockHash: batch.metadata.block_hash.unwrap_or_default(),
                    returnData: convert(batch.results),
                },
            )
        }
        IMulticallCalls::aggregate3(call) => {
            let results = aggregator.aggregate3(convert(call.calls))?;
            IMulticall::aggregate3Call::abi_encode_returns(&convert(results))
        }
        IMulticallCalls::aggregate3Value(call) => {
            let results = aggregator.aggregate3_value(convert(call.calls))?;
            IMulticall::aggregate3ValueCall::abi_encode_returns(&convert(results))
        }
        IMulticallCalls::multicall(call) => {
            let batch = aggregator.multicall(convert(call.calls))?;
            IMulticall::multicallCall::abi_encode_returns(&IMulticall::multicallReturn {
                blockNumber: U256::from(batch.metadata.block_number),
                returnData: convert(batch.results),
            })
        }
        IMulticallCalls::multicallWithGasLimitation(call) => {
            let gas_buffer = call.gasBuffer.saturating_to();
            let batch = aggregator.multicall_with_gas_limitation(convert(call.calls), gas_buffer)?;
            IMulticall::multicallWithGasLimitationCall::abi_encode_returns(
                &IMulticall::multicallWithGasLimitationReturn {
                    blockNumber: U256::from(batch.metadata.block_number),
                    returnData: convert(batch.results),
                },
            )
        }
        IMulticallCalls::multicallWithGasLimitationValue(call) => {
            let batch = aggregator.multicall_with_gas_limitation_value(
                convert(call.calls),
                call.gasBuffer.saturating_to(),
            )?;
            // usize indices always fit the positive range of int256
            let last_success_index = batch
                .last_success_index
                .map_or(I256::MINUS_ONE, |index| I256::from_raw(U256::from(index)));
            IMulticall::multicallWithGasLimitationValueCall::abi_encode_returns(
                &IMulticall::multicallWithGasLimitationValueReturn {
                    blockNumber: U256::from(batch.metadata.block_number),
                    returnData: convert(batch.results),
                    lastSuccessIndex: last_success_index,
                },
            )
        }
        IMulticallCalls::deployContract(call) => {
            let address = aggregator.deploy_contract(call.contractBytecode)?;
            IMulticall::deployContractCall::abi_encode_returns(&address)
        }
        IMulticallCalls::getBlockNumber(_) => {
            let number = aggregator.env().block_number();
            IMulticall::getBlockNumberCall::abi_encode_returns(&U256::from(number))
        }
        IMulticallCalls::getBlockHash(call) => {
            let hash = aggregator.env().block_hash(call.blockNumber.saturating_to());
            IMulticall::getBlockHashCall::abi_encode_returns(&hash)
        }
        IMulticallCalls::getLastBlockHash(_) => {
            let hash = aggregator.env().last_block_hash();
            IMulticall::getLastBlockHashCall::abi_encode_returns(&hash)
        }
        IMulticallCalls::getCurrentBlockTimestamp(_) => {
            let timestamp = aggregator.env().timestamp();
            IMulticall::getCurrentBlockTimestampCall::abi_encode_returns(&U256::from(timestamp))
        }
        IMulticallCalls::getCurrentBlockCoinbase(_) => {
            let coinbase = aggregator.env().coinbase();
            IMulticall::getCurrentBlockCoinbaseCall::abi_encode_returns(&coinbase)
        }
        IMulticallCalls::getCurrentBlockDifficulty(_) => {
            let difficulty = aggregator.env().difficulty();
            IMulticall::getCurrentBlockDifficultyCall::abi_encode_returns(&difficulty)
        }
        IMulticallCalls::getCurrentBlockGasLimit(_) => {
            let gas_limit = aggregator.env().gas_limit();
            IMulticall::getCurrentBlockGasLimitCall::abi_encode_returns(&U256::from(gas_limit))
        }
        IMulticallCalls::getBasefee(_) => {
            let basefee = aggregator.env().basefee();
            IMulticall::getBasefeeCall::abi_encode_returns(&U256::from(basefee))
        }
        IMulticallCalls::getChainId(_) => {
            let chain_id = aggregator.env().chain_id();
            IMulticall::getChainIdCall::abi_encode_returns(&U256::from(chain_id))
        }
        IMulticallCalls::getEthBalance(call) => {
            let balance = aggregator.env().balance(call.addr);
            IMulticall::getEthBalanceCall::abi_encode_returns(&balance)
        }
        IMulticallCalls::getGasLeft(_) => {
            IMulticall::getGasLeftCall::abi_encode_returns(&U256::from(aggregator.gas_left()))
        }
    };
    Ok(output.into())
}

fn convert<S, T: From<S>>(items: Vec<S>) -> Vec<T> {
    items.into_iter().map(T::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_are_unique() {
        for (i, a) in Operation::ALL.iter().enumerate() {
            for b in &Operation::ALL[i + 1..] {
                assert_ne!(a.selector(), b.selector(), "{} and {}", a.name(), b.name());
            }
            assert_eq!(Operation::from_selector(a.selector()), Some(*a));
        }
    }

    #[test]
    fn test_mutability() {
        assert_eq!(Operation::Aggregate3Value.mutability(), Mutability::ValueAccepting);
        assert_eq!(Operation::MulticallWithGasLimitation.mutability(), Mutability::StateMutating);
        assert_eq!(Operation::GetGasLeft.mutability(), Mutability::ReadOnly);
        assert_eq!(Operation::from_selector(FixedBytes::ZERO), None);
    }
}
