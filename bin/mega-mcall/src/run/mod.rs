//! Run module for executing a JSON batch through one aggregation mode

mod cmd;

pub use cmd::*;
