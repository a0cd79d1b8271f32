//! Worker configuration.

use hookrun_runner::{RunnerConfig, WorkspaceManager};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Directory holding per-execution clones and secret files.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// Bound on clone plus workflow run. `0` disables the timeout.
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_secs: u64,
    #[serde(default = "default_git_program")]
    pub git_program: String,
    /// The workflow tool, `act` by default.
    #[serde(default = "default_workflow_program")]
    pub workflow_program: String,
    /// Directory inside the repository holding workflow files.
    #[serde(default = "default_workflows_dir")]
    pub workflows_dir: String,
    /// Output lines buffered between the process and the log writer.
    #[serde(default = "default_log_buffer")]
    pub log_buffer: usize,
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("/var/lib/hookrun/pipelines")
}

fn default_execution_timeout() -> u64 {
    3600
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_workflow_program() -> String {
    "act".to_string()
}

fn default_workflows_dir() -> String {
    ".github/workflows".to_string()
}

fn default_log_buffer() -> usize {
    256
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            execution_timeout_secs: default_execution_timeout(),
            git_program: default_git_program(),
            workflow_program: default_workflow_program(),
            workflows_dir: default_workflows_dir(),
            log_buffer: default_log_buffer(),
        }
    }
}

impl WorkerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        match self.execution_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default()
            .with_git_program(&self.git_program)
            .with_workflow_program(&self.workflow_program)
            .with_workflows_dir(&self.workflows_dir)
            .with_timeout(self.timeout())
    }

    pub fn workspace(&self) -> WorkspaceManager {
        WorkspaceManager::new(self.workspace_root.clone())
    }
}
