//! Interview prep CLI library.
//!
//! Command definitions, handlers and plain-text rendering for the `prep`
//! binary.

pub mod cli;
pub mod commands;
pub mod render;
