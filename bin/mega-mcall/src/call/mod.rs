//! Call module for sending raw ABI calldata to the aggregator entry point

mod cmd;

pub use cmd::*;
