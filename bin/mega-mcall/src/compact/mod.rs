//! Compact module for running compact-encoded batches

mod cmd;

pub use cmd::*;
