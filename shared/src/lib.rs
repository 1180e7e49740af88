//! Shared types and models for the inventory platform
//!
//! This crate holds the pure domain: entities, request validation and the
//! stock arithmetic applied by movement processing. It performs no I/O.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
