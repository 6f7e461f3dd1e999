//! Tests for the failure policies of the aggregation modes.

use alloy_primitives::{address, b256, bytes, Address, Bytes, B256, U256};
use mega_multicall::{
    constants::AGGREGATOR_ADDRESS,
    test_utils::{MemoryChain, MockContract},
    Aggregator, BatchContext, BlockSnapshot, Call, Call3, Call3Value, CallFailure, CallGas,
    MulticallError,
};
use rstest::rstest;

const OK_A: Address = address!("1000000000000000000000000000000000000001");
const OK_B: Address = address!("1000000000000000000000000000000000000002");
const REVERTER: Address = address!("1000000000000000000000000000000000000003");
const COUNTER: Address = address!("1000000000000000000000000000000000000004");
const TOKEN: Address = address!("1000000000000000000000000000000000000005");
const MISSING: Address = address!("1000000000000000000000000000000000000009");

const HOLDER_1: Address = address!("2000000000000000000000000000000000000001");
const HOLDER_2: Address = address!("2000000000000000000000000000000000000002");
const HOLDER_3: Address = address!("2000000000000000000000000000000000000003");

const BLOCK_HASH: B256 = b256!("0xabababababababababababababababababababababababababababababababab");
const GAS: u64 = 10_000_000;

fn chain() -> MemoryChain {
    MemoryChain::new(BlockSnapshot::new(1_234, BLOCK_HASH, 6342))
        .contract(OK_A, MockContract::returning(1_000, bytes!("aa")))
        .contract(OK_B, MockContract::returning(2_000, bytes!("bb")))
        .contract(REVERTER, MockContract::reverting(500, bytes!("dead")))
        .contract(COUNTER, MockContract::Counter { gas: 5_000, count: 0 })
        .contract(TOKEN, MockContract::BalanceOf { gas: 2_600 })
        .account_balance(HOLDER_1, U256::from(1))
        .account_balance(HOLDER_2, U256::from(22))
        .account_balance(HOLDER_3, U256::from(333))
}

fn call(target: Address) -> Call {
    Call { target, payload: bytes!("01") }
}

fn call3(target: Address, allow_failure: bool) -> Call3 {
    Call3 { target, allow_failure, payload: bytes!("01") }
}

fn call3_value(target: Address, allow_failure: bool, value: U256) -> Call3Value {
    Call3Value { target, allow_failure, value, payload: Bytes::new() }
}

fn counter_count(chain: &MemoryChain) -> u64 {
    match chain.contract_at(COUNTER) {
        Some(MockContract::Counter { count, .. }) => *count,
        other => panic!("unexpected contract {other:?}"),
    }
}

fn balance_of(holder: Address) -> Bytes {
    let mut payload = bytes!("70a08231").to_vec();
    payload.extend_from_slice(&[0u8; 12]);
    payload.extend_from_slice(holder.as_slice());
    payload.into()
}

#[test]
fn test_aggregate_success() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let batch = aggregator.aggregate(vec![call(OK_A), call(OK_B), call(COUNTER)]).unwrap();

    assert_eq!(batch.metadata.block_number, 1_234);
    assert_eq!(batch.metadata.block_hash, None);
    assert_eq!(batch.results.len(), 3);
    assert!(batch.results.iter().all(|result| result.success));
    assert_eq!(batch.results[0].return_data, bytes!("aa"));
    assert_eq!(batch.results[1].return_data, bytes!("bb"));
    assert_eq!(counter_count(aggregator.host()), 1);
}

#[rstest]
#[case::reverted(REVERTER, CallFailure::CallReverted, bytes!("dead"))]
#[case::unreachable(MISSING, CallFailure::TargetUnreachable, Bytes::new())]
fn test_aggregate_aborts(
    #[case] failing: Address,
    #[case] reason: CallFailure,
    #[case] return_data: Bytes,
) {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let calls = vec![call(COUNTER), call(OK_A), call(failing), call(OK_B)];
    let err = aggregator.aggregate(calls).unwrap_err();

    assert_eq!(err, MulticallError::BatchAborted { index: 2, reason, return_data });
    // the batch stops at the failing call and its effects are rolled back
    assert_eq!(aggregator.host().dispatch_count(), 3);
    assert_eq!(counter_count(aggregator.host()), 0);
}

#[test]
fn test_try_aggregate_tolerant() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let results = aggregator
        .try_aggregate(false, vec![call(REVERTER), call(OK_A), call(MISSING), call(COUNTER)])
        .unwrap();

    let success: Vec<_> = results.iter().map(|result| result.success).collect();
    assert_eq!(success, [false, true, false, true]);
    assert_eq!(results[0].return_data, bytes!("dead"));
    assert_eq!(results[2].return_data, Bytes::new());
    assert_eq!(counter_count(aggregator.host()), 1);
}

#[test]
fn test_try_aggregate_require_success() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let err = aggregator.try_aggregate(true, vec![call(OK_A), call(REVERTER)]).unwrap_err();
    assert!(matches!(err, MulticallError::BatchAborted { index: 1, .. }));
}

#[test]
fn test_try_aggregate_balance_queries() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let holders = [HOLDER_1, HOLDER_2, HOLDER_3];
    let calls =
        holders.iter().map(|holder| Call { target: TOKEN, payload: balance_of(*holder) }).collect();

    let results = aggregator.try_aggregate(false, calls).unwrap();

    assert_eq!(results.len(), 3);
    for (result, expected) in results.iter().zip([1u64, 22, 333]) {
        assert!(result.success);
        assert_eq!(U256::from_be_slice(&result.return_data), U256::from(expected));
    }
    assert_eq!(aggregator.env().block_number(), 1_234);
}

#[test]
fn test_block_and_aggregate_metadata() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let batch = aggregator.block_and_aggregate(vec![call(OK_A)]).unwrap();
    assert_eq!(batch.metadata.block_number, 1_234);
    assert_eq!(batch.metadata.block_hash, Some(BLOCK_HASH));

    let batch = aggregator.try_block_and_aggregate(false, vec![call(REVERTER)]).unwrap();
    assert_eq!(batch.metadata.block_hash, Some(BLOCK_HASH));
    assert!(!batch.results[0].success);

    let err = aggregator.block_and_aggregate(vec![call(REVERTER)]).unwrap_err();
    assert!(matches!(err, MulticallError::BatchAborted { index: 0, .. }));
}

#[test]
fn test_aggregate3_mixed_policy() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let results = aggregator
        .aggregate3(vec![
            call3(OK_A, false),
            call3(REVERTER, true),
            call3(OK_B, false),
            call3(MISSING, true),
        ])
        .unwrap();

    let success: Vec<_> = results.iter().map(|result| result.success).collect();
    assert_eq!(success, [true, false, true, false]);
}

#[test]
fn test_aggregate3_disallowed_failure_aborts() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let err = aggregator
        .aggregate3(vec![call3(COUNTER, false), call3(REVERTER, true), call3(REVERTER, false)])
        .unwrap_err();

    assert_eq!(
        err,
        MulticallError::BatchAborted {
            index: 2,
            reason: CallFailure::CallReverted,
            return_data: bytes!("dead"),
        }
    );
    assert_eq!(counter_count(aggregator.host()), 0);
}

#[test]
fn test_aggregate3_value_forwards_value() {
    let chain = chain().account_balance(AGGREGATOR_ADDRESS, U256::from(100));
    let context = BatchContext::new(GAS).with_value(U256::from(100));
    let mut aggregator = Aggregator::new(chain, context);

    let calls = vec![
        call3_value(OK_A, false, U256::from(30)),
        call3_value(REVERTER, true, U256::from(50)),
        call3_value(OK_B, false, U256::from(20)),
    ];
    let results = aggregator.aggregate3_value(calls).unwrap();

    assert!(results[0].success && !results[1].success && results[2].success);
    // only successful calls consume the attached value
    assert_eq!(aggregator.value_left(), U256::from(50));
    let host = aggregator.host();
    assert_eq!(host.balance_of(OK_A), U256::from(30));
    assert_eq!(host.balance_of(REVERTER), U256::ZERO);
    assert_eq!(host.balance_of(OK_B), U256::from(20));
    assert_eq!(host.dispatched()[1].value, U256::from(50));
}

#[rstest]
#[case::exceeds(U256::from(60), U256::from(101))]
#[case::overflows(U256::MAX, U256::MAX)]
fn test_aggregate3_value_overflow(#[case] second_value: U256, #[case] requested: U256) {
    let context = BatchContext::new(GAS).with_value(U256::from(100));
    let mut aggregator = Aggregator::new(chain(), context);

    let calls = vec![
        call3_value(OK_A, true, U256::from(41)),
        call3_value(OK_B, true, second_value),
    ];
    let err = aggregator.aggregate3_value(calls).unwrap_err();

    assert_eq!(err, MulticallError::ValueOverflow { requested, available: U256::from(100) });
    assert_eq!(aggregator.host().dispatch_count(), 0);
}

#[test]
fn test_multicall_records_gas_and_limits_calls() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    let batch = aggregator
        .multicall(vec![
            CallGas { target: OK_A, gas_limit: 50_000, payload: Bytes::new() },
            CallGas { target: OK_B, gas_limit: 1_999, payload: Bytes::new() },
            CallGas { target: REVERTER, gas_limit: 50_000, payload: Bytes::new() },
        ])
        .unwrap();

    assert_eq!(batch.results.len(), 3);
    assert!(batch.results[0].success);
    assert_eq!(batch.results[0].gas_used, 1_000);
    // out of gas under its own limit
    assert!(!batch.results[1].success);
    assert_eq!(batch.results[1].gas_used, 1_999);
    assert_eq!(batch.results[2].gas_used, 500);
    assert_eq!(aggregator.host().dispatched()[1].gas_limit, 1_999);
    assert_eq!(aggregator.gas_left(), GAS - 1_000 - 1_999 - 500);
}

#[test]
fn test_calls_originate_from_aggregator() {
    let mut aggregator = Aggregator::new(chain(), BatchContext::new(GAS));
    aggregator.try_aggregate(false, vec![call(OK_A), call(MISSING)]).unwrap();
    let dispatched = aggregator.host().dispatched();
    assert!(dispatched.iter().all(|request| request.caller == AGGREGATOR_ADDRESS));
}
