//! Command-line runner for call batches.
//!
//! Loads a batch of calls and an optional prestate, runs them through the aggregation engine
//! against an in-memory host and prints the per-call outcomes as JSON.

use clap::Parser;

mod cmd;
pub use cmd::*;

pub mod call;
pub mod common;
pub mod compact;
pub mod run;

fn main() -> Result<(), Error> {
    set_thread_panic_hook();
    Cli::parse().run().inspect_err(|e| eprintln!("{e}"))
}

/// Sets thread panic hook, useful for having tests that panic.
fn set_thread_panic_hook() {
    use std::{
        backtrace::Backtrace,
        panic::{set_hook, take_hook},
        process::exit,
    };
    let orig_hook = take_hook();
    set_hook(Box::new(move |panic_info| {
        eprintln!("Custom backtrace: {}", Backtrace::capture());
        orig_hook(panic_info);
        exit(1);
    }));
}
