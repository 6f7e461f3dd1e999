//! Solidity bindings of the aggregator's call interface.
//!
//! The standard aggregation functions and getters keep the selectors and encodings of the
//! canonical Multicall3 deployment, so existing clients can call the engine unchanged.

use alloy_primitives::U256;
use alloy_sol_types::sol;

use crate::{Call, Call3, Call3Value, CallGas, CallGasValue, CallResult, ResultGas};

sol! {
    /// The aggregator call interface.
    interface IMulticall {
        #[derive(Debug, PartialEq, Eq)]
        struct Call {
            address target;
            bytes callData;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Call3Value {
            address target;
            bool allowFailure;
            uint256 value;
            bytes callData;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct CallGas {
            address target;
            uint256 gasLimit;
            bytes callData;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct CallGasValue {
            address target;
            uint256 value;
            uint256 gasLimit;
            bytes callData;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Result {
            bool success;
            bytes returnData;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct ResultGas {
            bool success;
            uint256 gasUsed;
            bytes returnData;
        }

        #[derive(Debug, PartialEq, Eq)]
        error BatchAborted(uint256 index, bytes returnData);
        #[derive(Debug, PartialEq, Eq)]
        error ValueOverflow(uint256 requested, uint256 available);
        #[derive(Debug, PartialEq, Eq)]
        error NonPayable();
        #[derive(Debug, PartialEq, Eq)]
        error UnknownSelector(bytes4 selector);
        #[derive(Debug, PartialEq, Eq)]
        error DeploymentFailed(bytes returnData);
        #[derive(Debug, PartialEq, Eq)]
        error MalformedInput();
        #[derive(Debug, PartialEq, Eq)]
        error NoProgress(uint256 index);
        #[derive(Debug, PartialEq, Eq)]
        error HostFailure(string message);

        function aggregate(Call[] calldata calls) external payable returns (uint256 blockNumber, bytes[] memory returnData);
        function tryAggregate(bool requireSuccess, Call[] calldata calls) external payable returns (Result[] memory returnData);
        function blockAndAggregate(Call[] calldata calls) external payable returns (uint256 blockNumber, bytes32 blockHash, Result[] memory returnData);
        function tryBlockAndAggregate(bool requireSuccess, Call[] calldata calls) external payable returns (uint256 blockNumber, bytes32 blockHash, Result[] memory returnData);
        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
        function aggregate3Value(Call3Value[] calldata calls) external payable returns (Result[] memory returnData);

        function multicall(CallGas[] calldata calls) external returns (uint256 blockNumber, ResultGas[] memory returnData);
        function multicallWithGasLimitation(CallGas[] calldata calls, uint256 gasBuffer) external returns (uint256 blockNumber, ResultGas[] memory returnData);
        function multicallWithGasLimitationValue(CallGasValue[] calldata calls, uint256 gasBuffer) external payable returns (uint256 blockNumber, ResultGas[] memory returnData, int256 lastSuccessIndex);

        function deployContract(bytes calldata contractBytecode) external returns (address contractAddress);

        function getBlockNumber() external view returns (uint256 blockNumber);
        function getBlockHash(uint256 blockNumber) external view returns (bytes32 blockHash);
        function getLastBlockHash() external view returns (bytes32 blockHash);
        function getCurrentBlockTimestamp() external view returns (uint256 timestamp);
        function getCurrentBlockCoinbase() external view returns (address coinbase);
        function getCurrentBlockDifficulty() external view returns (uint256 difficulty);
        function getCurrentBlockGasLimit() external view returns (uint256 gaslimit);
        function getBasefee() external view returns (uint256 basefee);
        function getChainId() external view returns (uint256 chainid);
        function getEthBalance(address addr) external view returns (uint256 balance);
        function getGasLeft() external view returns (uint256 gasLeft);
    }
}

impl From<IMulticall::Call> for Call {
    fn from(call: IMulticall::Call) -> Self {
        Self { target: call.target, payload: call.callData }
    }
}

impl From<Call> for IMulticall::Call {
    fn from(call: Call) -> Self {
        Self { target: call.target, callData: call.payload }
    }
}

impl From<IMulticall::Call3> for Call3 {
    fn from(call: IMulticall::Call3) -> Self {
        Self { target: call.target, allow_failure: call.allowFailure, payload: call.callData }
    }
}

impl From<Call3> for IMulticall::Call3 {
    fn from(call: Call3) -> Self {
        Self { target: call.target, allowFailure: call.allow_failure, callData: call.payload }
    }
}

impl From<IMulticall::Call3Value> for Call3Value {
    fn from(call: IMulticall::Call3Value) -> Self {
        Self {
            target: call.target,
            allow_failure: call.allowFailure,
            value: call.value,
            payload: call.callData,
        }
    }
}

impl From<Call3Value> for IMulticall::Call3Value {
    fn from(call: Call3Value) -> Self {
        Self {
            target: call.target,
            allowFailure: call.allow_failure,
            value: call.value,
            callData: call.payload,
        }
    }
}

// Gas limits above u64::MAX cannot be honored by any host and saturate.
impl From<IMulticall::CallGas> for CallGas {
    fn from(call: IMulticall::CallGas) -> Self {
        Self {
            target: call.target,
            gas_limit: call.gasLimit.saturating_to(),
            payload: call.callData,
        }
    }
}

impl From<CallGas> for IMulticall::CallGas {
    fn from(call: CallGas) -> Self {
        Self { target: call.target, gasLimit: U256::from(call.gas_limit), callData: call.payload }
    }
}

impl From<IMulticall::CallGasValue> for CallGasValue {
    fn from(call: IMulticall::CallGasValue) -> Self {
        Self {
            target: call.target,
            value: call.value,
            gas_limit: call.gasLimit.saturating_to(),
            payload: call.callData,
        }
    }
}

impl From<CallGasValue> for IMulticall::CallGasValue {
    fn from(call: CallGasValue) -> Self {
        Self {
            target: call.target,
            value: call.value,
            gasLimit: U256::from(call.gas_limit),
            callData: call.payload,
        }
    }
}

impl From<CallResult> for IMulticall::Result {
    fn from(result: CallResult) -> Self {
        Self { success: result.success, returnData: result.return_data }
    }
}

impl From<IMulticall::Result> for CallResult {
    fn from(result: IMulticall::Result) -> Self {
        Self { success: result.success, return_data: result.returnData }
    }
}

impl From<ResultGas> for IMulticall::ResultGas {
    fn from(result: ResultGas) -> Self {
        Self {
            success: result.success,
            gasUsed: U256::from(result.gas_used),
            returnData: result.return_data,
        }
    }
}

impl From<IMulticall::ResultGas> for ResultGas {
    fn from(result: IMulticall::ResultGas) -> Self {
        Self {
            success: result.success,
            gas_used: result.gasUsed.saturating_to(),
            return_data: result.returnData,
        }
    }
}
