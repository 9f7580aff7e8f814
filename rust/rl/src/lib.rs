//! Dynamic programming over tabular Markov Decision Processes: policy evaluation and
//! improvement, policy iteration, value iteration, and a harness to roll the resulting
//! policies out in an environment.

pub mod algos;
pub mod classifiers;
pub mod config;
pub mod environments;
pub mod envs;
pub mod error;
pub mod eval;

pub use algos::mbased::mdp::*;
pub use config::SolverConfig;
pub use error::*;
