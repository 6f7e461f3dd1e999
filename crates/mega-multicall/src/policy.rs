//! Failure policies and execution plans of the aggregation loop.

/// How the aggregation loop reacts to a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailurePolicy {
    /// The first failure aborts the whole batch.
    AbortOnAnyFailure,
    /// A failure aborts the batch unless the failing call allows failure.
    PerCallAllowFailure,
    /// Failures are recorded and the batch always completes.
    AlwaysTolerate,
}

impl FailurePolicy {
    /// Returns `true` if a failure of a call with the given allow-failure flag is recorded
    /// rather than aborting the batch.
    pub const fn tolerates(&self, allow_failure: bool) -> bool {
        match self {
            Self::AbortOnAnyFailure => false,
            Self::PerCallAllowFailure => allow_failure,
            Self::AlwaysTolerate => true,
        }
    }

    /// The policy selected by a whole-batch `requireSuccess` flag.
    pub const fn from_require_success(require_success: bool) -> Self {
        if require_success {
            Self::AbortOnAnyFailure
        } else {
            Self::AlwaysTolerate
        }
    }
}

/// The parameters of one pass of the aggregation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// The failure policy.
    pub policy: FailurePolicy,
    /// The gas withheld from dispatch for finalizing the response. When set, the loop stops
    /// dispatching once the remaining budget no longer covers it.
    pub gas_buffer: Option<u64>,
    /// Whether descriptor values are forwarded (and checked against the value available to the
    /// batch). When unset, every call is dispatched without value.
    pub forward_value: bool,
}

impl ExecutionPlan {
    /// A plan with `policy`, no gas guard and no value forwarding.
    pub const fn new(policy: FailurePolicy) -> Self {
        Self { policy, gas_buffer: None, forward_value: false }
    }

    /// Enables the gas guard with `gas_buffer`.
    pub const fn with_gas_buffer(mut self, gas_buffer: u64) -> Self {
        self.gas_buffer = Some(gas_buffer);
        self
    }

    /// Enables value forwarding.
    pub const fn with_value(mut self) -> Self {
        self.forward_value = true;
        self
    }
}
