//! Runtime configuration, read from `offerings.toml` and the environment.
//!
//! Environment variables win over the file. Keys are matched
//! case-insensitively, so `AGENT_URL` sets `agent_url`.

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Login page of the course registration portal.
pub const DEFAULT_PORTAL_URL: &str = "https://cudportal.cud.ac.ae/student/login.asp";

#[derive(Clone, Deserialize)]
pub struct Config {
    /// LLM provider key forwarded to the agent. Required for any agent run.
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base URL of the browser agent service.
    #[serde(default = "default_agent_url")]
    pub agent_url: String,
    #[serde(default = "default_agent_model")]
    pub agent_model: String,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_max_actions_per_step")]
    pub max_actions_per_step: u32,
    #[serde(default = "default_portal_url")]
    pub portal_url: String,
    /// Directory that receives `results.csv` and `course_offerings.xlsx`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_agent_url() -> String {
    "http://127.0.0.1:8765".to_owned()
}

fn default_agent_model() -> String {
    "gemini-2.0-flash-exp".to_owned()
}

fn default_max_steps() -> u32 {
    100
}

fn default_max_actions_per_step() -> u32 {
    4
}

fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.to_owned()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("log_level", &self.log_level)
            .field("agent_url", &self.agent_url)
            .field("agent_model", &self.agent_model)
            .field("max_steps", &self.max_steps)
            .field("max_actions_per_step", &self.max_actions_per_step)
            .field("portal_url", &self.portal_url)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("offerings.toml"))
            .merge(Env::raw().only(&[
                "GEMINI_API_KEY",
                "LOG_LEVEL",
                "AGENT_URL",
                "AGENT_MODEL",
                "MAX_STEPS",
                "MAX_ACTIONS_PER_STEP",
                "PORTAL_URL",
                "OUTPUT_DIR",
            ]))
    }

    /// The LLM API key, or an error naming the variable to set.
    pub fn require_api_key(&self) -> anyhow::Result<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY not found in environment or .env file"))
    }
}
