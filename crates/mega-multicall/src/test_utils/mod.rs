//! Test utilities for the multicall engine.

mod chain;
mod contract;

pub use chain::*;
pub use contract::*;
