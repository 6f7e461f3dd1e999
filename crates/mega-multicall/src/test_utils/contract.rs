use core::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};

use crate::{CallRequest, DispatchOutcome};

/// A call handler for [`MockContract::Custom`].
pub type CallHandler = Arc<dyn Fn(&CallRequest) -> DispatchOutcome + Send + Sync>;

/// The behavior of a contract hosted by [`MemoryChain`](super::MemoryChain).
///
/// Every kind charges a fixed `gas`; a call with a lower gas limit runs out of gas and reverts
/// with empty data.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum MockContract {
    /// Returns `output`, or reverts with it if `success` is unset.
    Fixed {
        /// Whether the call succeeds.
        success: bool,
        /// Gas charged per call.
        gas: u64,
        /// Return or revert data.
        #[cfg_attr(feature = "serde", serde(default))]
        output: Bytes,
    },
    /// Returns its calldata.
    Echo {
        /// Gas charged per call.
        gas: u64,
    },
    /// `balanceOf(address)`: returns the ABI-encoded native balance of the address in the
    /// calldata, reverts on short calldata.
    BalanceOf {
        /// Gas charged per call.
        gas: u64,
    },
    /// Increments a counter on every successful call and returns the new count.
    Counter {
        /// Gas charged per call.
        gas: u64,
        /// The current count.
        #[cfg_attr(feature = "serde", serde(default))]
        count: u64,
    },
    /// Runs a custom handler.
    #[cfg_attr(feature = "serde", serde(skip))]
    Custom(CallHandler),
}

impl fmt::Debug for MockContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { success, gas, output } => f
                .debug_struct("Fixed")
                .field("success", success)
                .field("gas", gas)
                .field("output", output)
                .finish(),
            Self::Echo { gas } => f.debug_struct("Echo").field("gas", gas).finish(),
            Self::BalanceOf { gas } => f.debug_struct("BalanceOf").field("gas", gas).finish(),
            Self::Counter { gas, count } => {
                f.debug_struct("Counter").field("gas", gas).field("count", count).finish()
            }
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl MockContract {
    /// A contract that returns `output` for `gas`.
    pub fn returning(gas: u64, output: impl Into<Bytes>) -> Self {
        Self::Fixed { success: true, gas, output: output.into() }
    }

    /// A contract that reverts with `output` for `gas`.
    pub fn reverting(gas: u64, output: impl Into<Bytes>) -> Self {
        Self::Fixed { success: false, gas, output: output.into() }
    }

    /// A contract running `handler` on every call.
    pub fn custom(
        handler: impl Fn(&CallRequest) -> DispatchOutcome + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(Arc::new(handler))
    }

    /// The gas charged per call, `None` for custom handlers.
    pub const fn gas(&self) -> Option<u64> {
        match self {
            Self::Fixed { gas, .. } |
            Self::Echo { gas } |
            Self::BalanceOf { gas } |
            Self::Counter { gas, .. } => Some(*gas),
            Self::Custom(_) => None,
        }
    }

    /// Executes `request`. `balance_of` resolves native balances.
    pub(crate) fn call(
        &mut self,
        request: &CallRequest,
        balance_of: impl Fn(Address) -> U256,
    ) -> DispatchOutcome {
        if let Some(gas) = self.gas() {
            if gas > request.gas_limit {
                return DispatchOutcome::revert(request.gas_limit, Bytes::new());
            }
        }

        match self {
            Self::Fixed { success: true, gas, output } => {
                DispatchOutcome::success(*gas, output.clone())
            }
            Self::Fixed { success: false, gas, output } => {
                DispatchOutcome::revert(*gas, output.clone())
            }
            Self::Echo { gas } => DispatchOutcome::success(*gas, request.input.clone()),
            Self::BalanceOf { gas } => match request.input.get(16..36) {
                Some(address) => {
                    let balance = balance_of(Address::from_slice(address));
                    DispatchOutcome::success(*gas, balance.to_be_bytes::<32>().to_vec())
                }
                None => DispatchOutcome::revert(*gas, Bytes::new()),
            },
            Self::Counter { gas, count } => {
                *count += 1;
                DispatchOutcome::success(*gas, U256::from(*count).to_be_bytes::<32>().to_vec())
            }
            Self::Custom(handler) => handler(request),
        }
    }
}
