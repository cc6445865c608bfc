//! Core library for funnel: investor outreach tracking.
//!
//! Holds the domain model, the SQLite store and its connection pool, the
//! flat-to-nested projection used by clients, and the service layer that the
//! HTTP server and terminal UI both drive.

pub mod api;
pub mod core;
pub mod model;
pub mod projection;
pub mod store;
