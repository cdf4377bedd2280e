//! Pouch CLI - command surface and HTTP transport
//!
//! The actual protocol and state handling live in `pouch-core`; this crate
//! contributes argument parsing, the reqwest-based transport, and output
//! formatting.

pub mod client;
pub mod commands;
pub mod display;

pub use client::HttpTransport;
pub use commands::{run, Cli, Commands};
