//! CLI command implementations for trcguard.

pub mod kg;
pub mod trc;
pub mod validate;
