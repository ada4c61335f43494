//! Replays an agent history saved to disk instead of running a new task.

use super::{Agent, AgentError, AgentHistory, AgentTask};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReplayAgent {
    path: PathBuf,
}

impl ReplayAgent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<AgentHistory, AgentError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| AgentError::Read {
                path: self.path.clone(),
                source,
            })?;
        AgentHistory::from_json(&body, &self.path.display().to_string())
    }
}

#[async_trait]
impl Agent for ReplayAgent {
    /// The task is ignored; the recorded history is returned as-is.
    async fn run(&self, task: &AgentTask) -> Result<AgentHistory, AgentError> {
        let history = self.load().await?;
        info!(
            path = %self.path.display(),
            steps = history.len(),
            task_len = task.task.len(),
            "replayed agent history"
        );
        Ok(history)
    }
}
