//! Argument groups, input loading and output shared by the commands

mod batch;
mod budget;
mod env;
mod error;
mod hex;
mod logging;
mod outcome;
mod state;

pub use batch::*;
pub use budget::*;
pub use env::*;
pub use error::*;
pub use hex::*;
pub use logging::*;
pub use outcome::*;
pub use state::*;
