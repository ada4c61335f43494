//! The step history an agent run reports back.
//!
//! Mirrors the JSON the agent service emits: a list of steps, each with the
//! model's chosen actions and the results of executing them. Every field is
//! optional on the wire; LLM-driven runs routinely omit parts of it.

use super::{AgentError, AgentRun, StepView};
use crate::json::parse_json_with_context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentHistory {
    #[serde(default)]
    pub history: Vec<HistoryItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(default)]
    pub model_output: Option<ModelOutput>,
    #[serde(default)]
    pub result: Vec<ActionResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// The model's reasoning state (evaluation, memory, next goal).
    #[serde(default)]
    pub current_state: Option<Value>,
    /// One single-key map per action, e.g. `{"done": {"text": ..., "success": true}}`.
    #[serde(default)]
    pub action: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub is_done: Option<bool>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub extracted_content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AgentHistory {
    /// Decode a history document, naming `origin` in the error.
    pub fn from_json(body: &str, origin: &str) -> Result<Self, AgentError> {
        parse_json_with_context(body).map_err(|source| AgentError::ParseFailed {
            origin: origin.to_owned(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Whether the last step marked the run as finished.
    pub fn is_done(&self) -> bool {
        self.last_result()
            .and_then(|r| r.is_done)
            .unwrap_or(false)
    }

    /// Content of the last result of the last step, if non-empty.
    pub fn final_result(&self) -> Option<&str> {
        self.last_result()
            .and_then(|r| r.extracted_content.as_deref())
            .filter(|content| !content.trim().is_empty())
    }

    /// Every error reported by any step, in order.
    pub fn errors(&self) -> Vec<&str> {
        self.history
            .iter()
            .flat_map(|item| item.result.iter())
            .filter_map(|r| r.error.as_deref())
            .collect()
    }

    fn last_result(&self) -> Option<&ActionResult> {
        self.history.last().and_then(|item| item.result.last())
    }
}

impl HistoryItem {
    /// All actions of this step merged into one map. Null-valued entries
    /// (unselected action slots) are dropped.
    pub fn actions(&self) -> Option<Map<String, Value>> {
        let output = self.model_output.as_ref()?;
        let mut merged = Map::new();
        for action in &output.action {
            for (name, params) in action {
                if !params.is_null() {
                    merged.insert(name.clone(), params.clone());
                }
            }
        }
        (!merged.is_empty()).then_some(merged)
    }

    /// Extracted content of this step's results, joined by newlines.
    pub fn response(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .result
            .iter()
            .filter_map(|r| r.extracted_content.as_deref())
            .filter(|content| !content.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n"))
    }

    /// The model's stated next goal, if it recorded one.
    pub fn thought(&self) -> Option<&str> {
        self.model_output
            .as_ref()?
            .current_state
            .as_ref()?
            .get("next_goal")?
            .as_str()
    }
}

impl AgentRun for AgentHistory {
    fn final_answer(&self) -> Option<String> {
        self.final_result().map(str::to_owned)
    }

    fn steps(&self) -> Option<Vec<StepView>> {
        Some(
            self.history
                .iter()
                .map(|item| StepView {
                    action: item.actions(),
                    controller_response: item.response(),
                })
                .collect(),
        )
    }
}
