//! Call descriptors and result records of a batch.
//!
//! The lean descriptor variants ([`Call`], [`Call3`], [`Call3Value`], [`CallGas`],
//! [`CallGasValue`]) mirror the structs of the wire interface. All of them widen losslessly into
//! [`CallDescriptor`], the single shape the execution loop works on.

use alloy_primitives::{Address, Bytes, B256, U256};

/// A plain call: target and payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Call {
    /// The address the call is dispatched to.
    pub target: Address,
    /// Opaque calldata forwarded to the target.
    #[cfg_attr(feature = "serde", serde(default))]
    pub payload: Bytes,
}

/// A call with a per-call failure policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Call3 {
    /// The address the call is dispatched to.
    pub target: Address,
    /// Whether the call may fail without aborting the batch.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_failure: bool,
    /// Opaque calldata forwarded to the target.
    #[cfg_attr(feature = "serde", serde(default))]
    pub payload: Bytes,
}

/// A call with a per-call failure policy that forwards native value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Call3Value {
    /// The address the call is dispatched to.
    pub target: Address,
    /// Whether the call may fail without aborting the batch.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_failure: bool,
    /// The native value forwarded with the call.
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: U256,
    /// Opaque calldata forwarded to the target.
    #[cfg_attr(feature = "serde", serde(default))]
    pub payload: Bytes,
}

/// A call with an explicit gas limit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CallGas {
    /// The address the call is dispatched to.
    pub target: Address,
    /// The maximum gas made available to the call.
    pub gas_limit: u64,
    /// Opaque calldata forwarded to the target.
    #[cfg_attr(feature = "serde", serde(default))]
    pub payload: Bytes,
}

/// A call with an explicit gas limit that forwards native value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CallGasValue {
    /// The address the call is dispatched to.
    pub target: Address,
    /// The native value forwarded with the call.
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: U256,
    /// The maximum gas made available to the call.
    pub gas_limit: u64,
    /// Opaque calldata forwarded to the target.
    #[cfg_attr(feature = "serde", serde(default))]
    pub payload: Bytes,
}

/// The general call descriptor every variant widens into.
///
/// `gas_limit` of `None` means the call may use whatever remains of the batch budget.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallDescriptor {
    /// The address the call is dispatched to.
    pub target: Address,
    /// Whether the call may fail without aborting the batch (only consulted under
    /// [`FailurePolicy::PerCallAllowFailure`](crate::FailurePolicy::PerCallAllowFailure)).
    pub allow_failure: bool,
    /// The native value forwarded with the call.
    pub value: U256,
    /// The maximum gas made available to the call.
    pub gas_limit: Option<u64>,
    /// Opaque calldata forwarded to the target.
    pub payload: Bytes,
}

impl CallDescriptor {
    /// Creates a descriptor for `target` with `payload` and no value, gas limit or
    /// allow-failure flag.
    pub fn new(target: Address, payload: impl Into<Bytes>) -> Self {
        Self { target, payload: payload.into(), ..Default::default() }
    }

    /// Sets the allow-failure flag.
    pub fn with_allow_failure(mut self, allow_failure: bool) -> Self {
        self.allow_failure = allow_failure;
        self
    }

    /// Sets the forwarded value.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the per-call gas limit.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

impl From<Call> for Call3 {
    fn from(call: Call) -> Self {
        Self { target: call.target, allow_failure: false, payload: call.payload }
    }
}

impl From<Call3> for Call3Value {
    fn from(call: Call3) -> Self {
        Self {
            target: call.target,
            allow_failure: call.allow_failure,
            value: U256::ZERO,
            payload: call.payload,
        }
    }
}

impl From<CallGas> for CallGasValue {
    fn from(call: CallGas) -> Self {
        Self {
            target: call.target,
            value: U256::ZERO,
            gas_limit: call.gas_limit,
            payload: call.payload,
        }
    }
}

impl From<Call> for CallDescriptor {
    fn from(call: Call) -> Self {
        Self::new(call.target, call.payload)
    }
}

impl From<Call3> for CallDescriptor {
    fn from(call: Call3) -> Self {
        Self::new(call.target, call.payload).with_allow_failure(call.allow_failure)
    }
}

impl From<Call3Value> for CallDescriptor {
    fn from(call: Call3Value) -> Self {
        Self::new(call.target, call.payload)
            .with_allow_failure(call.allow_failure)
            .with_value(call.value)
    }
}

impl From<CallGas> for CallDescriptor {
    fn from(call: CallGas) -> Self {
        Self::new(call.target, call.payload).with_gas_limit(call.gas_limit)
    }
}

impl From<CallGasValue> for CallDescriptor {
    fn from(call: CallGasValue) -> Self {
        Self::new(call.target, call.payload).with_value(call.value).with_gas_limit(call.gas_limit)
    }
}

/// The outcome of one call: success flag and whatever the target returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CallResult {
    /// Whether the call succeeded.
    pub success: bool,
    /// The bytes returned by the target, revert data included.
    pub return_data: Bytes,
}

/// The outcome of one call including the gas it consumed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ResultGas {
    /// Whether the call succeeded.
    pub success: bool,
    /// The gas consumed by the call, as reported by the dispatch primitive.
    pub gas_used: u64,
    /// The bytes returned by the target, revert data included.
    pub return_data: Bytes,
}

impl From<ResultGas> for CallResult {
    fn from(result: ResultGas) -> Self {
        Self { success: result.success, return_data: result.return_data }
    }
}

/// Block context attached to a batch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BatchMetadata {
    /// The block number at the time the response was assembled.
    pub block_number: u64,
    /// The block hash, only captured by block-anchored operations.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub block_hash: Option<B256>,
}

/// The response of an aggregation operation: metadata and one record per attempted call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Aggregated<R> {
    /// Block context of the batch.
    pub metadata: BatchMetadata,
    /// One record per attempted call, in submission order.
    pub results: Vec<R>,
}

/// The response of [`multicall_with_gas_limitation_value`](crate::Aggregator::multicall_with_gas_limitation_value).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct GasValueAggregated {
    /// Block context of the batch.
    pub metadata: BatchMetadata,
    /// One record per dispatched call, in submission order.
    pub results: Vec<ResultGas>,
    /// The highest input index whose call was dispatched and succeeded.
    pub last_success_index: Option<usize>,
}

impl GasValueAggregated {
    /// Returns `true` if the budget guard stopped the batch before every call was dispatched.
    pub fn is_truncated(&self, submitted: usize) -> bool {
        self.results.len() < submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes};

    const TARGET: Address = address!("1000000000000000000000000000000000000001");

    #[test]
    fn test_widening_is_lossless() {
        let call = Call { target: TARGET, payload: bytes!("01020304") };
        let call3 = Call3::from(call.clone());
        assert!(!call3.allow_failure);
        assert_eq!(call3.payload, call.payload);

        let value = Call3Value::from(call3);
        assert_eq!(value.value, U256::ZERO);
        assert_eq!(value.target, TARGET);

        let gas = CallGas { target: TARGET, gas_limit: 21_000, payload: bytes!("ff") };
        let gas_value = CallGasValue::from(gas);
        assert_eq!(gas_value.gas_limit, 21_000);
        assert_eq!(gas_value.value, U256::ZERO);
    }

    #[test]
    fn test_descriptor_keeps_optional_fields() {
        let descriptor = CallDescriptor::from(CallGasValue {
            target: TARGET,
            value: U256::from(7),
            gas_limit: 50_000,
            payload: Bytes::new(),
        });
        assert_eq!(descriptor.value, U256::from(7));
        assert_eq!(descriptor.gas_limit, Some(50_000));
        assert!(!descriptor.allow_failure);

        let descriptor = CallDescriptor::from(Call3 {
            target: TARGET,
            allow_failure: true,
            payload: Bytes::new(),
        });
        assert!(descriptor.allow_failure);
        assert_eq!(descriptor.gas_limit, None);
    }

    #[test]
    fn test_call_deserializes_from_camel_case() {
        let call: Call3Value = serde_json::from_str(
            r#"{"target":"0x1000000000000000000000000000000000000001","allowFailure":true,"value":"0x5","payload":"0xabcd"}"#,
        )
        .unwrap();
        assert_eq!(call.target, TARGET);
        assert!(call.allow_failure);
        assert_eq!(call.value, U256::from(5));
        assert_eq!(call.payload, bytes!("abcd"));
    }
}
