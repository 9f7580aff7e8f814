use thiserror::Error;

use crate::Discrete;

/// Failures surfaced while talking to an environment.
#[derive(Error, Debug)]
pub enum GymError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed json payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no '{0}' field")]
    MissingField(String),

    #[error("unsupported space: {0}")]
    UnsupportedSpace(String),

    #[error("action {action} is outside of Discrete({n})")]
    InvalidAction { action: Discrete, n: Discrete },
}

pub type GymResult<T> = Result<T, GymError>;
