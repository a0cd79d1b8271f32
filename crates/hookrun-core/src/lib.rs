//! hookrun core
//!
//! Domain types, traits, and error handling for hookrun.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used by the coordinator, the worker, and every adapter crate.

pub mod error;
pub mod execution;
pub mod ids;
pub mod message;
pub mod ports;
pub mod repo_url;
pub mod trigger;

pub use error::{Error, Result};
pub use ids::*;
