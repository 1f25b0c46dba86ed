//! Subcommand handlers.

pub(crate) mod config;
pub(crate) mod function;
pub(crate) mod resolve;
pub(crate) mod serve;
