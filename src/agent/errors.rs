//! Error types for talking to the browser agent.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Portal login failed: invalid username or password")]
    LoginFailed,
    #[error("Invalid agent service URL")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Agent service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("Failed to parse agent history from {origin}")]
    ParseFailed {
        origin: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Failed to read agent history at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    RequestFailed(#[from] reqwest::Error),
}
