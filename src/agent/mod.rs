//! Seam between this crate and the external browser-automation agent.
//!
//! The agent itself (browser control, LLM tool calls) runs out of process.
//! This module describes what we send it ([`AgentTask`]) and the capability
//! view we need over whatever it returns ([`AgentRun`]).

pub mod errors;
pub mod history;
pub mod http;
pub mod replay;

pub use errors::AgentError;
pub use history::AgentHistory;
pub use http::HttpAgent;
pub use replay::ReplayAgent;

use crate::prompt::{SECRET_PASSWORD, SECRET_USER};
use async_trait::async_trait;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// One step of an agent run, as seen by the result normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepView {
    /// Actions the model chose in this step, keyed by action name (`done`, `click_element`, ...).
    pub action: Option<Map<String, Value>>,
    /// Free-text output the controller produced while executing those actions.
    pub controller_response: Option<String>,
}

/// Capabilities an agent run result may expose. Both are optional and
/// independent: a result may offer a final answer, a step sequence, both,
/// or neither.
pub trait AgentRun {
    /// The agent's own final structured answer, if it produced one.
    fn final_answer(&self) -> Option<String> {
        None
    }

    /// The steps of the run, if the result is iterable.
    fn steps(&self) -> Option<Vec<StepView>> {
        None
    }
}

/// A bare text result carries no recognizable capabilities.
impl AgentRun for str {}

impl AgentRun for String {}

/// Portal credentials, forwarded to the agent as its secret bag.
///
/// Serializes as `{"user": ..., "password": ...}` to match the placeholders
/// used in the task prompt.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub username: String,
    pub password: String,
}

impl Secrets {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Serialize for Secrets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(SECRET_USER, &self.username)?;
        map.serialize_entry(SECRET_PASSWORD, &self.password)?;
        map.end()
    }
}

/// Everything the agent needs for one run.
#[derive(Debug, Clone)]
pub struct AgentTask {
    pub task: String,
    pub secrets: Secrets,
    /// Upper bound on agent steps; the only limit placed on a run.
    pub max_steps: u32,
    pub max_actions_per_step: u32,
    /// JSON schema the agent's final answer should conform to.
    pub output_schema: Option<Value>,
}

/// Something that can execute an [`AgentTask`] to completion.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, task: &AgentTask) -> Result<AgentHistory, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_never_show_the_password_in_debug() {
        let secrets = Secrets::new("student", "hunter2");
        let debug = format!("{secrets:?}");
        assert!(debug.contains("student"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn secrets_serialize_under_prompt_placeholders() {
        let value = serde_json::to_value(Secrets::new("student", "hunter2")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"user": "student", "password": "hunter2"})
        );
    }

    #[test]
    fn text_results_expose_nothing() {
        let text = String::from("Error running browser instruction");
        assert_eq!(text.final_answer(), None);
        assert_eq!(text.steps(), None);
    }
}
