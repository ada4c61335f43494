//! Client for an agent service reachable over HTTP.
//!
//! The service owns the browser and the LLM conversation; we post it a task
//! and block until it returns the full step history.

use super::{Agent, AgentError, AgentHistory, AgentTask, Secrets};
use crate::utils::fmt_duration;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

#[derive(Serialize)]
struct LlmConfig<'a> {
    model: &'a str,
    api_key: &'a str,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    task: &'a str,
    llm: LlmConfig<'a>,
    sensitive_data: &'a Secrets,
    max_steps: u32,
    max_actions_per_step: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_schema: Option<&'a Value>,
}

/// Runs tasks on a remote agent service via `POST {base}/run`.
pub struct HttpAgent {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl fmt::Debug for HttpAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAgent")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpAgent {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, AgentError> {
        // Without a trailing slash, join() would replace the last path segment
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        let endpoint = base.join("run")?;

        // Runs take minutes; only connecting is bounded
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Agent for HttpAgent {
    async fn run(&self, task: &AgentTask) -> Result<AgentHistory, AgentError> {
        let request = RunRequest {
            task: &task.task,
            llm: LlmConfig {
                model: &self.model,
                api_key: &self.api_key,
            },
            sensitive_data: &task.secrets,
            max_steps: task.max_steps,
            max_actions_per_step: task.max_actions_per_step,
            output_schema: task.output_schema.as_ref(),
        };

        info!(
            endpoint = %self.endpoint,
            model = %self.model,
            max_steps = task.max_steps,
            structured = task.output_schema.is_some(),
            "dispatching agent run"
        );
        let start = Instant::now();

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let elapsed = start.elapsed();

        if status == StatusCode::UNAUTHORIZED {
            warn!(duration = fmt_duration(elapsed), "agent reported portal login failure");
            return Err(AgentError::LoginFailed);
        }
        if !status.is_success() {
            return Err(AgentError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let history = AgentHistory::from_json(&body, self.endpoint.as_str())?;
        debug!(
            steps = history.len(),
            done = history.is_done(),
            errors = history.errors().len(),
            "agent history decoded"
        );
        info!(
            duration = fmt_duration(elapsed),
            steps = history.len(),
            "agent run finished"
        );
        Ok(history)
    }
}
