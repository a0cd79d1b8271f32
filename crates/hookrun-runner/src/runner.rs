//! Core runner trait and types.

use async_trait::async_trait;
use hookrun_core::Result;
use hookrun_core::ids::ExecutionId;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line from a workflow run.
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub content: String,
    pub line_number: u32,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Output stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Everything needed to clone a repository and run one workflow file.
#[derive(Clone)]
pub struct RunInvocation {
    pub execution_id: ExecutionId,
    /// Clone URL, possibly carrying credentials. Never logged.
    pub clone_url: String,
    /// Workflow file name relative to the workflows directory.
    pub workflow_file: String,
    /// Directory the repository is cloned into. Must not exist yet.
    pub workspace: PathBuf,
    pub secret_file: Option<PathBuf>,
}

impl fmt::Debug for RunInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunInvocation")
            .field("execution_id", &self.execution_id)
            .field("clone_url", &crate::process::mask_userinfo(&self.clone_url))
            .field("workflow_file", &self.workflow_file)
            .field("workspace", &self.workspace)
            .field("secret_file", &self.secret_file)
            .finish()
    }
}

/// Result of a workflow run that got as far as starting the workflow tool.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub success: bool,
    pub duration_ms: u64,
    /// Last stderr lines of the workflow tool, for the failure reason.
    pub stderr_tail: Vec<String>,
}

impl RunOutcome {
    pub fn failure_reason(&self) -> String {
        if self.stderr_tail.is_empty() {
            format!("workflow exited with code {}", self.exit_code)
        } else {
            format!(
                "workflow exited with code {}: {}",
                self.exit_code,
                self.stderr_tail.join(" | ")
            )
        }
    }
}

/// Clones a repository and runs a workflow in it.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    /// Run the workflow, streaming stdout to `output_tx` line by line.
    ///
    /// Returns `Err` when the tool could not be started, the clone failed or
    /// the run timed out; a workflow that ran and exited non-zero is an
    /// `Ok` outcome with `success == false`.
    async fn run(
        &self,
        invocation: &RunInvocation,
        output_tx: mpsc::Sender<OutputLine>,
    ) -> Result<RunOutcome>;
}

/// Configuration for workflow execution.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub git_program: String,
    pub workflow_program: String,
    /// Directory inside the repository holding workflow files.
    pub workflows_dir: String,
    /// Bound on clone plus run.
    pub timeout: Option<Duration>,
    /// stderr lines kept for the failure reason.
    pub stderr_tail_lines: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            git_program: "git".to_string(),
            workflow_program: "act".to_string(),
            workflows_dir: ".github/workflows".to_string(),
            timeout: Some(Duration::from_secs(3600)), // 1 hour default
            stderr_tail_lines: 20,
        }
    }
}

impl RunnerConfig {
    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    pub fn with_workflow_program(mut self, program: impl Into<String>) -> Self {
        self.workflow_program = program.into();
        self
    }

    pub fn with_workflows_dir(mut self, dir: impl Into<String>) -> Self {
        self.workflows_dir = dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
