//! Test helper functions and utilities.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, header};
use hookrun_api::{AppState, auth};
use hookrun_core::Result;
use hookrun_core::execution::{Execution, ExecutionLog, ExecutionStatus};
use hookrun_core::ids::{ExecutionId, TriggerId};
use hookrun_core::ports::ExecutionRepository;
use hookrun_db::InMemoryStore;
use hookrun_nats::MemoryQueue;
use hookrun_runner::{ActRunner, PipelineRunner, RunnerConfig, WorkspaceManager};
use hookrun_scheduler::{Coordinator, TriggerService};
use hookrun_secrets::NativeSecretStore;
use hookrun_worker::ExecutionWorker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

pub const TEST_API_KEY: &str = "test-api-key";
pub const PUBLIC_BASE_URL: &str = "http://hooks.test";

/// Execution store that records every status write that went through.
pub struct RecordingExecutions {
    inner: Arc<InMemoryStore>,
    transitions: Mutex<Vec<(ExecutionId, ExecutionStatus, ExecutionStatus)>>,
}

impl RecordingExecutions {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            transitions: Mutex::new(Vec::new()),
        }
    }

    /// Statuses `id` moved through, starting from `Queued`.
    pub async fn history(&self, id: ExecutionId) -> Vec<ExecutionStatus> {
        let transitions = self.transitions.lock().await;
        let mut history = vec![ExecutionStatus::Queued];
        for (_, from, to) in transitions.iter().filter(|(e, _, _)| *e == id) {
            assert_eq!(history.last(), Some(from), "transition from a stale status");
            history.push(*to);
        }
        history
    }
}

#[async_trait]
impl ExecutionRepository for RecordingExecutions {
    async fn create(&self, execution: &Execution) -> Result<()> {
        ExecutionRepository::create(self.inner.as_ref(), execution).await
    }

    async fn get(&self, id: ExecutionId) -> Result<Option<Execution>> {
        ExecutionRepository::get(self.inner.as_ref(), id).await
    }

    async fn list_by_trigger(
        &self,
        trigger_id: TriggerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Execution>> {
        self.inner.list_by_trigger(trigger_id, limit, offset).await
    }

    async fn update_status(
        &self,
        id: ExecutionId,
        from: ExecutionStatus,
        to: ExecutionStatus,
    ) -> Result<bool> {
        let written = self.inner.update_status(id, from, to).await?;
        if written {
            self.transitions.lock().await.push((id, from, to));
        }
        Ok(written)
    }

    async fn get_queued(&self, limit: u32) -> Result<Vec<Execution>> {
        self.inner.get_queued(limit).await
    }

    async fn append_log(&self, log: &ExecutionLog) -> Result<()> {
        self.inner.append_log(log).await
    }

    async fn logs(&self, execution_id: ExecutionId) -> Result<Vec<ExecutionLog>> {
        self.inner.logs(execution_id).await
    }
}

/// Fake `git` and workflow tool for host runs.
///
/// `git clone <url> <dir>` records the URL and creates the workflows
/// directory. The workflow tool records the secret file it was given, prints
/// the configured lines and exits with the configured code.
#[cfg(unix)]
pub struct FakeTools {
    dir: TempDir,
    git: String,
    act: String,
}

#[cfg(unix)]
impl FakeTools {
    pub fn new(lines: &[&str], exit_code: i32) -> anyhow::Result<Self> {
        let echo: String = lines
            .iter()
            .map(|line| format!("echo '{}'\n", line))
            .collect();
        Self::with_act_body(&format!("{}exit {}", echo, exit_code))
    }

    /// A workflow tool that prints one line and then hangs.
    pub fn hanging() -> anyhow::Result<Self> {
        Self::with_act_body("echo started\nexec sleep 30")
    }

    fn with_act_body(body: &str) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let record = dir.path().display().to_string();

        let git = write_script(
            dir.path(),
            "git",
            &format!(
                "echo \"$2\" >> \"{record}/clones\"\nmkdir -p \"$3/.github/workflows\"",
            ),
        )?;
        let act = write_script(
            dir.path(),
            "act",
            &format!(
                "if [ \"$3\" = \"--secret-file\" ]; then cat \"$4\" >> \"{record}/secrets\"; fi\n{body}",
            ),
        )?;

        Ok(Self { dir, git, act })
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default()
            .with_git_program(&self.git)
            .with_workflow_program(&self.act)
    }

    /// URLs passed to `git clone`, in call order.
    pub fn clone_urls(&self) -> Vec<String> {
        read_lines(&self.dir.path().join("clones"))
    }

    /// Contents of every secret file the workflow tool was handed.
    pub fn secret_contents(&self) -> Vec<String> {
        read_lines(&self.dir.path().join("secrets"))
    }
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> anyhow::Result<String> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path.display().to_string())
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// The whole pipeline wired in-process: memory store, memory queue and a
/// worker with its own workspace root.
pub struct Pipeline {
    pub store: Arc<InMemoryStore>,
    pub executions: Arc<RecordingExecutions>,
    pub secrets: Arc<NativeSecretStore>,
    pub queue: Arc<MemoryQueue>,
    pub triggers: Arc<TriggerService>,
    pub coordinator: Arc<Coordinator>,
    pub worker: Arc<ExecutionWorker>,
    workspace: TempDir,
}

impl Pipeline {
    pub fn new(runner: Arc<dyn PipelineRunner>) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let workspace = tempfile::tempdir()?;
        let store = Arc::new(InMemoryStore::new());
        let executions = Arc::new(RecordingExecutions::new(store.clone()));
        let secrets = Arc::new(NativeSecretStore::from_master_key("integration"));
        let queue = Arc::new(MemoryQueue::new(3));

        let triggers = Arc::new(TriggerService::new(
            store.clone(),
            executions.clone(),
            secrets.clone(),
            PUBLIC_BASE_URL,
        ));
        let coordinator = Arc::new(Coordinator::new(
            store.clone(),
            executions.clone(),
            queue.clone(),
        ));
        let worker = Arc::new(ExecutionWorker::new(
            executions.clone(),
            secrets.clone(),
            runner,
            WorkspaceManager::new(workspace.path().join("pipelines")),
        ));

        Ok(Self {
            store,
            executions,
            secrets,
            queue,
            triggers,
            coordinator,
            worker,
            workspace,
        })
    }

    /// Pipeline whose worker runs the host runner with `config`.
    pub fn with_runner_config(config: RunnerConfig) -> anyhow::Result<Self> {
        Self::new(Arc::new(ActRunner::new(config)))
    }

    /// Deliver every queued message to the worker.
    pub async fn drain(&self) -> usize {
        self.queue.run_until_idle(self.worker.as_ref()).await
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.workspace.path().join("pipelines")
    }

    /// Entries left in the workspace root.
    pub fn workspace_entries(&self) -> Vec<String> {
        std::fs::read_dir(self.workspace_root())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn status(&self, id: ExecutionId) -> Option<ExecutionStatus> {
        ExecutionRepository::get(self.store.as_ref(), id)
            .await
            .ok()
            .flatten()
            .map(|e| e.status)
    }

    pub async fn log_lines(&self, id: ExecutionId) -> Vec<String> {
        self.store
            .logs(id)
            .await
            .map(|logs| logs.into_iter().map(|l| l.log).collect())
            .unwrap_or_default()
    }

    pub fn app_state(&self) -> Arc<AppState> {
        let queue = self.queue.clone();
        Arc::new(
            AppState::new(
                self.triggers.clone(),
                self.coordinator.clone(),
                Some(TEST_API_KEY.to_string()),
            )
            .with_broker_health(Arc::new(move || queue.health_check())),
        )
    }

    pub fn router(&self) -> Router {
        hookrun_api::create_router(self.app_state())
    }
}

/// A request to an admin route carrying the test API key.
pub fn admin_request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(auth::API_KEY_HEADER, TEST_API_KEY);

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    };
    request.expect("valid request")
}

/// A webhook delivery signed with `key`.
pub fn signed_webhook(hash: &str, key: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/triggers-execute/{}", hash))
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            auth::SIGNATURE_HEADER,
            auth::sign(key.as_bytes(), body.as_bytes()).expect("hmac key"),
        )
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Read a response body as JSON.
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
