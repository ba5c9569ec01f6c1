//! Command-line front end for the protocol version lifecycle manager.
//!
//! - [`cli`]: argument definitions
//! - [`commands`]: command execution against a file store
//! - [`logging`]: `tracing` subscriber setup
//! - [`summary`]: table rendering

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
