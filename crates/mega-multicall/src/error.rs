//! Error types of the aggregation engine.

use alloy_primitives::{Bytes, FixedBytes, U256};
use alloy_sol_types::SolError;

use crate::{codec::CodecError, CallStatus, DispatchError, IMulticall};

/// Why a single call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CallFailure {
    /// The dispatch primitive could not resolve the target.
    #[display("target unreachable")]
    TargetUnreachable,
    /// The target executed and signalled failure.
    #[display("call reverted")]
    CallReverted,
}

impl CallFailure {
    /// The failure matching a dispatch status, `None` for a successful call.
    pub const fn from_status(status: CallStatus) -> Option<Self> {
        match status {
            CallStatus::Success => None,
            CallStatus::Reverted => Some(Self::CallReverted),
            CallStatus::Unreachable => Some(Self::TargetUnreachable),
        }
    }
}

/// Errors returned by aggregator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MulticallError {
    /// A call that was not allowed to fail failed. No results are returned.
    #[error("batch aborted: call {index} failed ({reason})")]
    BatchAborted {
        /// Input index of the failing call.
        index: usize,
        /// How the call failed.
        reason: CallFailure,
        /// The bytes the call returned.
        return_data: Bytes,
    },
    /// The summed value of the batch exceeds the value available to it. Raised before any call
    /// is dispatched.
    #[error("value overflow: batch forwards {requested}, {available} available")]
    ValueOverflow {
        /// The value the batch tries to forward, saturated at `U256::MAX`.
        requested: U256,
        /// The value available to the batch.
        available: U256,
    },
    /// The deploy primitive did not create a contract.
    #[error("contract deployment failed")]
    DeploymentFailed {
        /// Revert data of the creation.
        return_data: Bytes,
    },
    /// A fresh invocation could not dispatch a single call.
    #[error("no progress: call {index} cannot be dispatched within the gas budget")]
    NoProgress {
        /// Input index of the call that could not be dispatched.
        index: usize,
    },
    /// Malformed compact input.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The host failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Errors of the ABI entry point that happen before an operation is selected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    /// The calldata is too short or does not decode.
    #[error("malformed input")]
    MalformedInput,
    /// No operation has this selector.
    #[error("unknown selector {0}")]
    UnknownSelector(FixedBytes<4>),
    /// Value was attached to an operation that does not accept it.
    #[error("operation does not accept value")]
    NonPayable,
    /// The operation itself failed.
    #[error(transparent)]
    Multicall(#[from] MulticallError),
}

/// Encodes an engine error as ABI-encoded revert data.
///
/// Uses the Solidity error bindings of [`IMulticall`].
pub fn encode_error_result(error: &EntryError) -> Bytes {
    match error {
        EntryError::MalformedInput => IMulticall::MalformedInput {}.abi_encode().into(),
        EntryError::UnknownSelector(selector) => {
            IMulticall::UnknownSelector { selector: *selector }.abi_encode().into()
        }
        EntryError::NonPayable => IMulticall::NonPayable {}.abi_encode().into(),
        EntryError::Multicall(error) => encode_multicall_error(error),
    }
}

fn encode_multicall_error(error: &MulticallError) -> Bytes {
    match error {
        MulticallError::BatchAborted { index, return_data, .. } => IMulticall::BatchAborted {
            index: U256::from(*index),
            returnData: return_data.clone(),
        }
        .abi_encode()
        .into(),
        MulticallError::ValueOverflow { requested, available } => {
            IMulticall::ValueOverflow { requested: *requested, available: *available }
                .abi_encode()
                .into()
        }
        MulticallError::DeploymentFailed { return_data } => {
            IMulticall::DeploymentFailed { returnData: return_data.clone() }.abi_encode().into()
        }
        MulticallError::NoProgress { index } => {
            IMulticall::NoProgress { index: U256::from(*index) }.abi_encode().into()
        }
        MulticallError::Codec(_) => IMulticall::MalformedInput {}.abi_encode().into(),
        MulticallError::Dispatch(error) => {
            IMulticall::HostFailure { message: error.to_string() }.abi_encode().into()
        }
    }
}
