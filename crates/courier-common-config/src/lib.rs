//! Configuration types for Courier.
//!
//! Settings live in `.courier/config.yaml` and configure the HTTP client
//! and URI resolution used by the transport. The transport core reads no
//! configuration of its own.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
