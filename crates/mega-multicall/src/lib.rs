//! Batch-call aggregation engine for `MegaETH`.
//!
//! The [`Aggregator`] takes an ordered batch of calls, dispatches them one at a time through a
//! [`Host`] and collects per-call outcomes under a failure policy (abort on any failure,
//! per-call allow-failure, or always tolerate), optionally guarded by a gas budget and
//! forwarding native value. [`handle_call`] exposes the engine through the Multicall3-compatible
//! [`IMulticall`] ABI.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod aggregator;
pub use aggregator::*;

pub mod codec;
pub use codec::{decode_revert_reason, CodecError};

mod entrypoint;
pub use entrypoint::*;

mod env;
pub use env::*;

mod error;
pub use error::*;

mod gas;
pub use gas::*;

mod host;
pub use host::*;

mod interface;
pub use interface::*;

mod policy;
pub use policy::*;

mod runner;
pub use runner::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod types;
pub use types::*;
