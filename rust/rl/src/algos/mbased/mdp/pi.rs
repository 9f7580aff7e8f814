use super::{common::*, Mdp, MdpSolver};
use gymnasium::Discrete;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Policy iteration starting from the policy that always takes action 0.
///
/// `tol` is handed to every policy evaluation. `max_iterations` caps both the improvement
/// rounds and the sweeps of each evaluation. The result only counts as converged when the
/// policy is stable and its last evaluation reached `tol`.
pub fn policy_iteration<M: Mdp + ?Sized>(
    mdp: &M,
    gamma: f64,
    tol: f64,
    max_iterations: Option<usize>,
) -> Solution {
    iterate(mdp, vec![0; mdp.n_s()], gamma, tol, max_iterations)
}

fn iterate<M: Mdp + ?Sized>(
    mdp: &M,
    mut pi: Vec<Discrete>,
    gamma: f64,
    tol: f64,
    max_iterations: Option<usize>,
) -> Solution {
    let transitions = mdp.transitions();
    let mut candidate = pi.clone();
    let mut iterations = 0;
    loop {
        let (v, sweeps) = evaluate(&transitions, &pi, gamma, tol, max_iterations);
        improve(&transitions, mdp.n_a(), &v, gamma, &mut candidate);
        iterations += 1;

        let changed = pi.iter().zip(&candidate).filter(|(a, b)| a != b).count();
        debug!(round = iterations, sweeps = sweeps.count, changed, "policy iteration");

        if changed == 0 {
            if sweeps.converged {
                info!(rounds = iterations, "policy iteration converged");
            } else {
                warn!(
                    rounds = iterations,
                    delta = sweeps.delta,
                    tol,
                    "policy is stable but its evaluation stopped before converging"
                );
            }
            return Solution {
                v,
                pi,
                iterations,
                converged: sweeps.converged,
            };
        }

        if max_iterations.is_some_and(|m| iterations >= m) {
            warn!(rounds = iterations, changed, "policy iteration stopped before the policy was stable");
            return Solution {
                v,
                pi,
                iterations,
                converged: false,
            };
        }

        std::mem::swap(&mut pi, &mut candidate);
    }
}

/// Policy iteration that keeps its estimate between runs, so `exec` resumes from the
/// last policy found.
#[derive(Clone)]
pub struct PolicyIteration {
    mdp: Rc<dyn Mdp>,
    gamma: f64,
    v: Vec<f64>,
    pi: Vec<Discrete>,
}

impl PolicyIteration {
    pub fn new(mdp: Rc<dyn Mdp>, gamma: f64) -> Self {
        let n_s = mdp.n_s();
        Self {
            mdp,
            gamma,
            v: vec![0.; n_s],
            pi: vec![0; n_s],
        }
    }

    pub fn v(&self) -> &[f64] {
        &self.v
    }

    pub fn pi(&self) -> &[Discrete] {
        &self.pi
    }
}

impl MdpSolver<bool> for PolicyIteration {
    fn v_star(&self, s: Discrete) -> f64 {
        self.v[s]
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<f64> {
        if s < self.mdp.n_s() && a < self.mdp.n_a() {
            Some(q_value(&self.mdp.transitions(), s, a, &self.v, self.gamma))
        } else {
            None
        }
    }

    fn pi_star(&self, s: Discrete) -> Option<Discrete> {
        self.pi.get(s).copied()
    }

    /// Returns whether the policy is stable and the number of improvement rounds.
    fn exec(&mut self, theta: f64, num_iterations: Option<usize>) -> (bool, usize) {
        let sol = iterate(
            &*self.mdp,
            self.pi.clone(),
            self.gamma,
            theta,
            num_iterations,
        );
        self.v = sol.v;
        self.pi = sol.pi;

        (sol.converged, sol.iterations)
    }
}
