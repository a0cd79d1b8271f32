//! Execution-scoped workspace directories and secret files.
//!
//! Layout under the root:
//!
//! ```text
//! <root>/<execution id>/        cloned repository
//! <root>/.env.<execution id>    dotenv secret file
//! ```

use hookrun_core::ids::ExecutionId;
use hookrun_core::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            Error::Internal(format!(
                "Failed to create workspace root {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    pub fn workspace_dir(&self, id: ExecutionId) -> PathBuf {
        self.root.join(id.to_string())
    }

    pub fn secret_file_path(&self, id: ExecutionId) -> PathBuf {
        self.root.join(format!(".env.{}", id))
    }

    /// Write the dotenv text for an execution, readable by the owner only.
    pub async fn write_secret_file(&self, id: ExecutionId, contents: &str) -> Result<PathBuf> {
        self.prepare().await?;
        let path = self.secret_file_path(id);

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), "Secret file written");
        Ok(path)
    }

    /// Remove the workspace directory and secret file of an execution.
    ///
    /// Missing paths are not an error. Both removals are attempted even if
    /// the first fails.
    pub async fn cleanup(&self, id: ExecutionId) -> Result<()> {
        let dir = self.workspace_dir(id);
        let secret = self.secret_file_path(id);
        let mut failures = Vec::new();

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(path = %dir.display(), "Workspace removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => failures.push(format!("{}: {}", dir.display(), e)),
        }

        match tokio::fs::remove_file(&secret).await {
            Ok(()) => debug!(path = %secret.display(), "Secret file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => failures.push(format!("{}: {}", secret.display(), e)),
        }

        if failures.is_empty() {
            info!(execution_id = %id, "Workspace cleaned up");
            Ok(())
        } else {
            Err(Error::Cleanup(failures.join("; ")))
        }
    }
}
