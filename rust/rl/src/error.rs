use gymnasium::{Discrete, GymError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("policy picks action {action} in state {state}, but there are only {n_a} actions")]
    InvalidAction {
        state: Discrete,
        action: Discrete,
        n_a: usize,
    },

    #[error("label {label} is outside of {classes} classes")]
    InvalidLabel { label: usize, classes: usize },

    #[error("cannot compute a loss over an empty batch")]
    EmptyBatch,

    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Gym(#[from] GymError),
}

pub type Result<T> = std::result::Result<T, SolverError>;
