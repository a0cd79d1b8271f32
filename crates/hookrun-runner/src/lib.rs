//! Workspace preparation and workflow execution for hookrun.

pub mod dotenv;
pub mod process;
pub mod runner;
pub mod workspace;

pub use process::ActRunner;
pub use runner::{OutputLine, OutputStream, PipelineRunner, RunInvocation, RunOutcome, RunnerConfig};
pub use workspace::WorkspaceManager;
