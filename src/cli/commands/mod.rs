//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Commands only translate arguments
//! into bootstrap options and print the outcome; the work happens in
//! [`crate::bootstrap`].

pub mod dispatcher;
pub mod list;
pub mod local;
pub mod remote;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
