use clap::{Parser, Subcommand};

use crate::common::{LogArgs, McallError};

/// Command-line interface of the mega-mcall tool
#[derive(Parser, Debug)]
#[command(version = "0.1")]
pub struct Cli {
    /// The command to run
    #[command(subcommand)]
    pub cmd: MainCmd,

    /// Logging configuration
    #[command(flatten)]
    pub log_args: LogArgs,
}

/// Main command enumeration for the mega-mcall CLI tool
#[derive(Subcommand, Debug)]
#[command(infer_subcommands = true)]
#[allow(clippy::large_enum_variant)]
pub enum MainCmd {
    /// Run a JSON batch through one aggregation mode
    Run(crate::run::Cmd),
    /// Execute a compact-encoded batch and print the packed results
    Compact(crate::compact::Cmd),
    /// Send raw ABI calldata to the aggregator entry point
    Call(crate::call::Cmd),
}

/// Error types for the main command system
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error raised while setting up or running a command
    #[error("{0}")]
    Mcall(#[from] McallError),
}

impl Cli {
    /// Execute the selected command
    pub fn run(&self) -> Result<(), Error> {
        self.log_args.init()?;
        match &self.cmd {
            MainCmd::Run(cmd) => cmd.run()?,
            MainCmd::Compact(cmd) => cmd.run()?,
            MainCmd::Call(cmd) => cmd.run()?,
        }
        Ok(())
    }
}
