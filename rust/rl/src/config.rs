use crate::Result;
use serde::Deserialize;
use std::path::Path;

/// Knobs for solving and evaluating a tabular MDP, loaded from JSON.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub gamma: f64,
    pub value_iteration_tol: f64,
    pub policy_iteration_tol: f64,
    /// Caps sweeps and improvement rounds. `None` iterates until convergence.
    pub max_iterations: Option<usize>,
    pub eval_max_steps: usize,
    pub eval_max_episodes: usize,
    pub map_name: String,
    pub is_slippery: bool,
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            value_iteration_tol: 1e-3,
            policy_iteration_tol: 10e-3,
            max_iterations: None,
            eval_max_steps: 100,
            eval_max_episodes: 32,
            map_name: "4x4".to_string(),
            is_slippery: true,
            seed: None,
        }
    }
}

impl SolverConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}
