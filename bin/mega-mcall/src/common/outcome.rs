//! JSON outcome printed by the commands

use alloy_primitives::{Address, Bytes, B256, U256};
use mega_multicall::{
    decode_revert_reason, Aggregator, BatchMetadata, CallResult, DispatchError, Host,
    MulticallError, ResultGas,
};
use serde::Serialize;

use super::Result;

/// Outcome of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    /// Position of the call in the batch.
    pub index: usize,
    /// Whether the call succeeded.
    pub success: bool,
    /// Gas consumed, for the modes that record it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    /// Raw return data.
    pub return_data: Bytes,
    /// Decoded revert reason of a failed call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CallOutcome {
    fn new(index: usize, success: bool, gas_used: Option<u64>, return_data: Bytes) -> Self {
        let reason = (!success).then(|| decode_revert_reason(&return_data));
        Self { index, success, gas_used, return_data, reason }
    }

    fn host_failure(index: usize, err: &DispatchError) -> Self {
        Self {
            index,
            success: false,
            gas_used: None,
            return_data: Bytes::new(),
            reason: Some(err.to_string()),
        }
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Number of calls submitted.
    pub submitted: usize,
    /// Block number the batch observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Block hash the batch observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Address of the contract deployed before the batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed: Option<Address>,
    /// Per-call outcomes in submission order.
    pub results: Vec<CallOutcome>,
    /// Index of the last successful call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success_index: Option<usize>,
    /// Whether the batch stopped before dispatching every call.
    pub truncated: bool,
    /// Gas left in the invocation budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_left: Option<u64>,
    /// Value left unspent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_left: Option<U256>,
}

impl BatchOutcome {
    /// Creates an outcome from results without gas accounting.
    pub fn from_results(submitted: usize, results: Vec<CallResult>) -> Self {
        let results = results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                CallOutcome::new(index, result.success, None, result.return_data)
            })
            .collect::<Vec<_>>();
        Self { submitted, truncated: results.len() < submitted, results, ..Default::default() }
    }

    /// Creates an outcome from results with gas accounting.
    pub fn from_gas_results(submitted: usize, results: Vec<ResultGas>) -> Self {
        let results = results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                CallOutcome::new(index, result.success, Some(result.gas_used), result.return_data)
            })
            .collect::<Vec<_>>();
        Self { submitted, truncated: results.len() < submitted, results, ..Default::default() }
    }

    /// Creates an outcome from chunked results, where the host may have failed individual calls.
    pub fn from_chunked_results(
        submitted: usize,
        results: Vec<std::result::Result<ResultGas, DispatchError>>,
    ) -> Self {
        let results = results
            .into_iter()
            .enumerate()
            .map(|(index, result)| match result {
                Ok(result) => CallOutcome::new(
                    index,
                    result.success,
                    Some(result.gas_used),
                    result.return_data,
                ),
                Err(err) => CallOutcome::host_failure(index, &err),
            })
            .collect::<Vec<_>>();
        Self { submitted, truncated: results.len() < submitted, results, ..Default::default() }
    }

    /// Sets the block metadata.
    pub fn with_metadata(mut self, metadata: BatchMetadata) -> Self {
        self.block_number = Some(metadata.block_number);
        self.block_hash = metadata.block_hash;
        self
    }

    /// Sets the deployed contract address.
    pub fn with_deployed(mut self, address: Address) -> Self {
        self.deployed = Some(address);
        self
    }

    /// Sets the index of the last successful call.
    pub fn with_last_success_index(mut self, index: Option<usize>) -> Self {
        self.last_success_index = index;
        self
    }

    /// Records the budget left after the batch.
    pub fn with_remaining(mut self, gas_left: u64, value_left: U256) -> Self {
        self.gas_left = Some(gas_left);
        self.value_left = Some(value_left);
        self
    }

    /// Records the budget left in `aggregator`.
    pub fn with_aggregator<H: Host>(self, aggregator: &Aggregator<H>) -> Self {
        self.with_remaining(aggregator.gas_left(), aggregator.value_left())
    }

    /// Prints the outcome as pretty JSON on stdout.
    pub fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Prints a human-readable description of a failed batch on stderr.
pub fn print_batch_failure(err: &MulticallError) {
    eprintln!("batch failed: {err}");
    if let MulticallError::BatchAborted { return_data, .. } = err {
        eprintln!(" reason: {}", decode_revert_reason(return_data));
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::bytes;

    use super::*;

    #[test]
    fn test_failed_calls_carry_reason() {
        let outcome = BatchOutcome::from_gas_results(
            3,
            vec![
                ResultGas { success: true, gas_used: 10, return_data: bytes!("01") },
                ResultGas { success: false, gas_used: 20, return_data: Bytes::new() },
            ],
        );

        assert!(outcome.truncated);
        assert_eq!(outcome.results[0].reason, None);
        assert_eq!(outcome.results[1].reason.as_deref(), Some("unknown"));
        assert_eq!(outcome.results[1].gas_used, Some(20));
    }

    #[test]
    fn test_host_failure_entry() {
        let outcome = BatchOutcome::from_chunked_results(
            2,
            vec![
                Ok(ResultGas { success: true, gas_used: 10, return_data: bytes!("01") }),
                Err(DispatchError::State("missing account".to_string())),
            ],
        );

        assert!(!outcome.truncated);
        assert!(outcome.results[0].success);
        let failed = &outcome.results[1];
        assert!(!failed.success);
        assert_eq!(failed.gas_used, None);
        assert_eq!(failed.reason.as_deref(), Some("host state error: missing account"));
    }

    #[test]
    fn test_json_shape() {
        let outcome = BatchOutcome::from_results(
            1,
            vec![CallResult { success: true, return_data: bytes!("c0ffee") }],
        )
        .with_remaining(5, U256::from(1));
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["results"][0]["returnData"], "0xc0ffee");
        assert_eq!(json["truncated"], false);
        assert_eq!(json["gasLeft"], 5);
        assert!(json.get("blockHash").is_none());
        assert!(json["results"][0].get("gasUsed").is_none());
    }
}
