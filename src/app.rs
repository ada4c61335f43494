use crate::agent::{Agent, AgentError, AgentHistory, AgentTask, HttpAgent, Secrets};
use crate::config::Config;
use crate::extract::{self, Source};
use crate::models::{CourseFilters, CourseOfferings};
use crate::prompt::build_task;
use crate::utils::{fmt_duration, log_if_slow};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Agent runs longer than this are called out in the logs.
const SLOW_RUN: Duration = Duration::from_secs(5 * 60);

/// Per-run limits and targets taken from configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub max_steps: u32,
    pub max_actions_per_step: u32,
    pub portal_url: String,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_steps: config.max_steps,
            max_actions_per_step: config.max_actions_per_step,
            portal_url: config.portal_url.clone(),
        }
    }
}

/// Result of a scrape: the offerings (if any were extracted) and the raw history.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub offerings: Option<CourseOfferings>,
    pub source: Option<Source>,
    pub history: AgentHistory,
}

/// Drives one agent per invocation: builds the task, runs it, extracts courses.
pub struct App<A: Agent> {
    agent: A,
    settings: RunSettings,
}

impl App<HttpAgent> {
    /// App backed by the configured agent service, authenticated with `api_key`.
    pub fn connect(config: &Config, api_key: &str) -> Result<Self, AgentError> {
        let agent = HttpAgent::new(&config.agent_url, config.agent_model.clone(), api_key)?;
        Ok(Self::new(agent, RunSettings::from(config)))
    }
}

impl<A: Agent> App<A> {
    pub fn new(agent: A, settings: RunSettings) -> Self {
        Self { agent, settings }
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Scrape the course offerings table with the given filters.
    pub async fn scrape(
        &self,
        secrets: &Secrets,
        filters: &CourseFilters,
    ) -> Result<ScrapeOutcome, AgentError> {
        let task = build_task(filters, &self.settings.portal_url);
        let history = self.execute(task, secrets, Some(offerings_schema())).await?;
        Ok(Self::extract(history))
    }

    /// Run a free-form instruction. A structured answer is requested only when
    /// `structured` is set and the instruction asks for an extraction.
    pub async fn instruct(
        &self,
        secrets: &Secrets,
        instruction: &str,
        structured: bool,
    ) -> Result<ScrapeOutcome, AgentError> {
        let wants_schema = structured && instruction.to_lowercase().contains("extract");
        let schema = wants_schema.then(offerings_schema);
        let history = self.execute(instruction.to_owned(), secrets, schema).await?;
        Ok(Self::extract(history))
    }

    async fn execute(
        &self,
        task: String,
        secrets: &Secrets,
        output_schema: Option<Value>,
    ) -> Result<AgentHistory, AgentError> {
        let task = AgentTask {
            task,
            secrets: secrets.clone(),
            max_steps: self.settings.max_steps,
            max_actions_per_step: self.settings.max_actions_per_step,
            output_schema,
        };

        let start = Instant::now();
        let history = self.agent.run(&task).await?;
        log_if_slow(start, SLOW_RUN, "agent run");

        for error in history.errors() {
            warn!(error, "agent step reported an error");
        }
        info!(
            duration = fmt_duration(start.elapsed()),
            steps = history.len(),
            done = history.is_done(),
            "agent run completed"
        );
        Ok(history)
    }

    fn extract(history: AgentHistory) -> ScrapeOutcome {
        let (offerings, source) = match extract::normalize_with_source(&history) {
            Some((offerings, source)) => (Some(offerings), Some(source)),
            None => (None, None),
        };
        ScrapeOutcome {
            offerings,
            source,
            history,
        }
    }
}

/// JSON schema of `{"courses": [Course, ...]}` for structured agent output.
pub fn offerings_schema() -> Value {
    let properties: serde_json::Map<String, Value> = crate::models::FIELD_NAMES
        .iter()
        .map(|field| ((*field).to_owned(), json!({"type": "string"})))
        .collect();

    json!({
        "title": "CourseOfferings",
        "type": "object",
        "properties": {
            "courses": {
                "type": "array",
                "items": {
                    "title": "Course",
                    "type": "object",
                    "properties": properties,
                    "required": crate::models::FIELD_NAMES,
                }
            }
        },
        "required": ["courses"],
    })
}
