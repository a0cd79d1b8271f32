//! Execution worker.
//!
//! Consumes dispatch messages one at a time and drives each execution through
//! `Queued -> In Progress -> Done | Failed`: secrets are materialized into a
//! dotenv file, the repository is cloned, the workflow tool runs with its
//! stdout captured as execution logs, and the workspace is always cleaned up.

pub mod config;
pub mod worker;

pub use config::WorkerConfig;
pub use worker::ExecutionWorker;
