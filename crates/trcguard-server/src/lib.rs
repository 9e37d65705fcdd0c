//! # trcguard-server
//!
//! HTTP API over the trcguard safety layer: upload a schema, then ask for
//! SQL in natural language and get back the statement, its TRC explanation
//! and the validation verdict.

pub mod config;
pub mod error;
pub mod generator;
pub mod routes;
pub mod state;

pub use routes::router;
