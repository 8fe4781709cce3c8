//! # sim_command
//!
//! Operator commands. They consume the inventory contract only and never
//! touch spatial or ability state.
//!
//! - [`clear`]: remove items from a player's inventory.
//! - [`args`]: tagged-integer argument extraction shared by commands.

pub mod args;
pub mod clear;
pub mod error;

pub use clear::{ClearCommand, ClearParams};
pub use error::CommandError;
