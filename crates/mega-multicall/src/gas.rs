/// Tracks gas consumption of one aggregator invocation against the caller-supplied budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GasBudget {
    /// The budget supplied by the caller.
    limit: u64,
    /// Gas consumed by dispatched calls and aggregator overhead so far.
    spent: u64,
}

impl GasBudget {
    /// Creates a budget of `limit` gas.
    pub const fn new(limit: u64) -> Self {
        Self { limit, spent: 0 }
    }

    /// The budget supplied by the caller.
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas consumed so far.
    pub const fn spent(&self) -> u64 {
        self.spent
    }

    /// Gas left in the budget.
    pub const fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.spent)
    }

    /// Records `gas` as consumed. Consumption never exceeds the limit.
    pub fn record(&mut self, gas: u64) {
        self.spent = self.spent.saturating_add(gas).min(self.limit);
    }

    /// The gas that may be forwarded to the next call once `reserved` is withheld, or `None` if
    /// nothing is left.
    pub fn available(&self, reserved: u64) -> Option<u64> {
        self.remaining().checked_sub(reserved).filter(|gas| *gas > 0)
    }
}
