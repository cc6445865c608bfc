//! funnel CLI library: command definitions, HTTP server, and output formatting.
//!
//! The `funnel` binary is a thin wrapper over this crate so the server can be
//! driven from integration tests.

pub mod cli;
pub mod output;
pub mod server;
pub mod telemetry;
