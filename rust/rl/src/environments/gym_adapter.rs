use crate::algos::mbased::mdp::Mdp;
use crate::Result;
use gymnasium::*;
use std::rc::Rc;
use tracing::info;

/// Exposes the dynamics of a gymnasium environment with discrete spaces as an [`Mdp`].
///
/// `new` fetches them once from a remote server. `from_parts` shares a table that is
/// already in memory, e.g. the one driving an in-process environment.
pub struct GymAdapter {
    name: String,
    n_s: usize,
    n_a: usize,
    transitions: Rc<Transitions>,
}

impl GymAdapter {
    pub fn new(env: &Environment) -> Result<Self> {
        let name = env.name()?;
        let n_s = env.observation_space().discrete_n()?;
        let n_a = env.action_space().discrete_n()?;
        let transitions = env.transitions()?;
        info!(%name, n_s, n_a, "fetched environment dynamics");

        Ok(Self::from_parts(name, transitions))
    }

    pub fn from_parts(name: String, transitions: Rc<Transitions>) -> Self {
        Self {
            name,
            n_s: transitions.n_s(),
            n_a: transitions.n_a(),
            transitions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Mdp for GymAdapter {
    fn n_s(&self) -> usize {
        self.n_s
    }

    fn n_a(&self) -> usize {
        self.n_a
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}
