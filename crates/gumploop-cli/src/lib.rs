//! gumploop command-line interface.
//!
//! Parses arguments and maps each subcommand onto one pipeline operation.

pub mod cli;
pub mod commands;
