use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Wrap a provider failure, keeping the full context chain
    pub fn upstream(err: &anyhow::Error) -> Self {
        AgentError::Upstream(format!("{:#}", err))
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
