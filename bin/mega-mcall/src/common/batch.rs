//! Batch file loading

use std::path::Path;

use alloy_primitives::{Address, Bytes, U256};
use mega_multicall::{Call, Call3, Call3Value, CallGas, CallGasValue};
use serde::Deserialize;
use tracing::debug;

use super::Result;

/// One call of a batch file. Fields a mode does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchEntry {
    /// The address the call is dispatched to.
    pub target: Address,
    /// Whether the call may fail without aborting the batch.
    pub allow_failure: bool,
    /// The native value forwarded with the call.
    pub value: U256,
    /// Per-call gas limit; falls back to the command's default limit.
    pub gas_limit: Option<u64>,
    /// Calldata forwarded to the target.
    pub payload: Bytes,
}

impl BatchEntry {
    /// Narrows the entry to a [`Call`].
    pub fn call(&self) -> Call {
        Call { target: self.target, payload: self.payload.clone() }
    }

    /// Narrows the entry to a [`Call3`].
    pub fn call3(&self) -> Call3 {
        Call3 {
            target: self.target,
            allow_failure: self.allow_failure,
            payload: self.payload.clone(),
        }
    }

    /// Narrows the entry to a [`Call3Value`].
    pub fn call3_value(&self) -> Call3Value {
        Call3Value {
            target: self.target,
            allow_failure: self.allow_failure,
            value: self.value,
            payload: self.payload.clone(),
        }
    }

    /// Narrows the entry to a [`CallGas`].
    pub fn call_gas(&self, default_gas_limit: u64) -> CallGas {
        CallGas {
            target: self.target,
            gas_limit: self.gas_limit.unwrap_or(default_gas_limit),
            payload: self.payload.clone(),
        }
    }

    /// Narrows the entry to a [`CallGasValue`].
    pub fn call_gas_value(&self, default_gas_limit: u64) -> CallGasValue {
        CallGasValue {
            target: self.target,
            value: self.value,
            gas_limit: self.gas_limit.unwrap_or(default_gas_limit),
            payload: self.payload.clone(),
        }
    }
}

/// Loads a JSON array of [`BatchEntry`] from `path`.
pub fn load_batch(path: &Path) -> Result<Vec<BatchEntry>> {
    let content = std::fs::read_to_string(path)?;
    let batch: Vec<BatchEntry> = serde_json::from_str(&content)?;
    debug!(path = %path.display(), calls = batch.len(), "Batch loaded");
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, bytes};

    use super::*;

    #[test]
    fn test_entry_defaults_and_narrowing() {
        let batch: Vec<BatchEntry> = serde_json::from_str(
            r#"[
                { "target": "0x1000000000000000000000000000000000000001", "payload": "0xc0ffee" },
                {
                    "target": "0x1000000000000000000000000000000000000002",
                    "allowFailure": true,
                    "value": "0x0a",
                    "gasLimit": 5000
                }
            ]"#,
        )
        .unwrap();

        assert_eq!(batch[0].call().payload, bytes!("c0ffee"));
        assert!(!batch[0].allow_failure);
        assert_eq!(batch[0].call_gas(77).gas_limit, 77);

        let call = batch[1].call_gas_value(77);
        assert_eq!(call.target, address!("1000000000000000000000000000000000000002"));
        assert_eq!(call.value, U256::from(10));
        assert_eq!(call.gas_limit, 5_000);
        assert!(call.payload.is_empty());
        assert!(batch[1].call3_value().allow_failure);
    }
}
