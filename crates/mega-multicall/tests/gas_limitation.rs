//! Tests for the budget-guarded aggregation modes.

use alloy_primitives::{address, bytes, Address, Bytes, U256};
use mega_multicall::{
    constants::AGGREGATOR_ADDRESS,
    test_utils::{MemoryChain, MockContract},
    Aggregator, AggregatorConfig, BatchContext, CallGas, CallGasValue, MulticallError,
};
use rstest::rstest;

const WORKER: Address = address!("1000000000000000000000000000000000000001");
const REVERTER: Address = address!("1000000000000000000000000000000000000002");

const CALL_GAS: u64 = 10_000;
const GAS_BUFFER: u64 = 100_000;

fn chain() -> MemoryChain {
    MemoryChain::default()
        .contract(WORKER, MockContract::returning(CALL_GAS, bytes!("01")))
        .contract(REVERTER, MockContract::reverting(CALL_GAS, Bytes::new()))
        .account_balance(AGGREGATOR_ADDRESS, U256::from(1_000))
}

fn calls(count: usize) -> Vec<CallGas> {
    (0..count)
        .map(|_| CallGas { target: WORKER, gas_limit: 50_000, payload: Bytes::new() })
        .collect()
}

#[rstest]
#[case(1, 5)]
#[case(3, 5)]
#[case(4, 10)]
#[case(0, 3)]
fn test_stops_after_k_calls(#[case] k: usize, #[case] n: usize) {
    let budget = GAS_BUFFER + k as u64 * CALL_GAS;
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(budget));

    let batch = aggregator.multicall_with_gas_limitation(calls(n), GAS_BUFFER).unwrap();

    assert_eq!(batch.results.len(), k);
    assert!(batch.results.iter().all(|result| result.success && result.gas_used == CALL_GAS));
    assert_eq!(aggregator.host().dispatch_count(), k);
    assert_eq!(aggregator.gas_left(), GAS_BUFFER);
}

#[test]
fn test_forwarded_gas_never_touches_buffer() {
    let budget = GAS_BUFFER + 25_000;
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(budget));

    let batch = aggregator.multicall_with_gas_limitation(calls(5), GAS_BUFFER).unwrap();

    let forwarded: Vec<_> =
        aggregator.host().dispatched().iter().map(|request| request.gas_limit).collect();
    assert_eq!(forwarded, [25_000, 15_000, 5_000]);
    // the third call runs out of gas on what is left above the buffer and is dropped
    assert_eq!(batch.results.len(), 2);
    assert!(batch.results.iter().all(|result| result.success));
    assert_eq!(aggregator.host().dispatch_count(), 3);
    assert_eq!(aggregator.gas_left(), GAS_BUFFER);
}

#[test]
fn test_starved_call_is_rolled_back() {
    const COUNTER: Address = address!("1000000000000000000000000000000000000003");
    let chain = chain().contract(COUNTER, MockContract::Counter { gas: 100, count: 0 });
    let calls = (0..10)
        .map(|_| CallGas { target: COUNTER, gas_limit: 1_000, payload: Bytes::new() })
        .collect();
    let mut aggregator = Aggregator::new(chain, BatchContext::new(50 + 380));

    let batch = aggregator.multicall_with_gas_limitation(calls, 50).unwrap();

    // 380, 280 and 180 gas fit a call, the fourth gets 80 and runs out of gas
    assert_eq!(batch.results.len(), 3);
    assert!(batch.results.iter().all(|result| result.success));
    assert_eq!(aggregator.host().dispatch_count(), 4);
    assert!(matches!(
        aggregator.host().contract_at(COUNTER),
        Some(MockContract::Counter { count: 3, .. })
    ));
    assert_eq!(aggregator.gas_left(), 50);
}

#[test]
fn test_starved_call_keeps_value_and_last_success() {
    let context = BatchContext::new(GAS_BUFFER + 15_000).with_value(U256::from(100));
    let mut aggregator = Aggregator::new(chain(), context);
    // the second call gets 5_000 of its 50_000 and runs out of gas
    let calls = vec![value_call(WORKER, 10), value_call(WORKER, 20), value_call(WORKER, 30)];

    let batch = aggregator.multicall_with_gas_limitation_value(calls, GAS_BUFFER).unwrap();

    assert_eq!(batch.results.len(), 1);
    assert!(batch.is_truncated(3));
    assert_eq!(batch.last_success_index, Some(0));
    assert_eq!(aggregator.value_left(), U256::from(90));
    assert_eq!(aggregator.host().balance_of(WORKER), U256::from(10));
    assert_eq!(aggregator.host().dispatch_count(), 2);
}

#[test]
fn test_revert_within_forwarded_gas_is_recorded() {
    // the reverter fails on its own with gas to spare, so it is a real result
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS_BUFFER + 25_000));
    let calls = vec![
        CallGas { target: REVERTER, gas_limit: 50_000, payload: Bytes::new() },
        CallGas { target: WORKER, gas_limit: 50_000, payload: Bytes::new() },
    ];

    let batch = aggregator.multicall_with_gas_limitation(calls, GAS_BUFFER).unwrap();

    assert_eq!(batch.results.len(), 2);
    assert!(!batch.results[0].success);
    assert_eq!(batch.results[0].gas_used, CALL_GAS);
    assert!(batch.results[1].success);
}

#[test]
fn test_finalize_reserve_and_overhead() {
    let config = AggregatorConfig {
        finalize_reserve: 5_000,
        call_overhead_gas: 1_000,
        ..Default::default()
    };
    // two calls with their overhead fit on top of buffer and reserve
    let budget = GAS_BUFFER + 5_000 + 2 * (CALL_GAS + 1_000);
    let mut aggregator = Aggregator::with_config(chain(), config, BatchContext::new(budget));

    let batch = aggregator.multicall_with_gas_limitation(calls(4), GAS_BUFFER).unwrap();

    assert_eq!(batch.results.len(), 2);
    assert_eq!(aggregator.gas_left(), GAS_BUFFER + 5_000);
}

#[test]
fn test_buffer_larger_than_budget() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(1_000));
    let batch = aggregator.multicall_with_gas_limitation(calls(3), u64::MAX).unwrap();
    assert!(batch.results.is_empty());
    assert_eq!(aggregator.host().dispatch_count(), 0);
}

fn value_call(target: Address, value: u64) -> CallGasValue {
    CallGasValue { target, value: U256::from(value), gas_limit: 50_000, payload: Bytes::new() }
}

#[test]
fn test_last_success_index() {
    let context = BatchContext::new(GAS_BUFFER + 6 * CALL_GAS).with_value(U256::from(100));
    let mut aggregator = Aggregator::new(chain(), context);
    let calls = vec![
        value_call(REVERTER, 0),
        value_call(REVERTER, 0),
        value_call(WORKER, 10),
        value_call(REVERTER, 0),
        value_call(REVERTER, 5),
        value_call(WORKER, 20),
        value_call(REVERTER, 0),
        value_call(WORKER, 0),
    ];

    let batch = aggregator.multicall_with_gas_limitation_value(calls, GAS_BUFFER).unwrap();

    // six calls fit the budget, the last two are never dispatched
    assert_eq!(batch.results.len(), 6);
    assert!(batch.is_truncated(8));
    assert_eq!(batch.last_success_index, Some(5));
    assert_eq!(aggregator.value_left(), U256::from(70));
    assert_eq!(aggregator.host().balance_of(WORKER), U256::from(30));
    assert_eq!(aggregator.host().balance_of(REVERTER), U256::ZERO);
}

#[test]
fn test_last_success_index_none() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(10_000_000));
    let batch = aggregator
        .multicall_with_gas_limitation_value(
            vec![value_call(REVERTER, 0), value_call(REVERTER, 0)],
            GAS_BUFFER,
        )
        .unwrap();
    assert_eq!(batch.results.len(), 2);
    assert_eq!(batch.last_success_index, None);
    assert!(!batch.is_truncated(2));
}

#[test]
fn test_value_overflow_precedes_dispatch() {
    let context = BatchContext::new(10_000_000).with_value(U256::from(10));
    let mut aggregator = Aggregator::new(chain(), context);
    let err = aggregator
        .multicall_with_gas_limitation_value(
            vec![value_call(WORKER, 5), value_call(WORKER, 6)],
            GAS_BUFFER,
        )
        .unwrap_err();
    assert_eq!(
        err,
        MulticallError::ValueOverflow { requested: U256::from(11), available: U256::from(10) }
    );
    assert_eq!(aggregator.host().dispatch_count(), 0);
}
