//! CLI command implementations.

pub mod client;
pub mod scan;
pub mod serve;
