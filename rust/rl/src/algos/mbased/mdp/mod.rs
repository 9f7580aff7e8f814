pub mod common;
pub mod pi;
pub mod vi;

pub use common::*;
pub use pi::*;
pub use vi::*;

use gymnasium::*;
use std::rc::Rc;

/// Markov Decision Process - Sutton & Barto 2018.
pub trait Mdp {
    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn transitions(&self) -> Rc<Transitions>;
}

pub trait MdpSolver<T> {
    fn v_star(&self, s: Discrete) -> f64;

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<f64>;

    fn pi_star(&self, s: Discrete) -> Option<Discrete>;

    /// Runs the solver from its current estimate, returning its outcome and the number
    /// of iterations it took.
    fn exec(&mut self, theta: f64, num_iterations: Option<usize>) -> (T, usize);
}

/// Acts greedily with respect to a solver's current policy.
///
/// # Panics
///
/// `policy` panics for a state the solver has no action for, i.e. one outside of the
/// solved MDP. Roll it out only in environments whose observation space matches the
/// model's states.
pub struct MdpSolverPolicy<T> {
    pub mdp_solver: Rc<dyn MdpSolver<T>>,
}

impl<T> Policy for MdpSolverPolicy<T> {
    fn policy(&self, s: Discrete) -> Discrete {
        self.mdp_solver
            .pi_star(s)
            .unwrap_or_else(|| panic!("State {s} is outside of the solved MDP."))
    }
}
