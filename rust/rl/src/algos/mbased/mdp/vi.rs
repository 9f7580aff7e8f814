use super::{common::*, Mdp, MdpSolver};
use gymnasium::Discrete;
use std::rc::Rc;
use tracing::{info, trace, warn};

/// Value iteration from all zeros. The policy is the greedy action of the last sweep.
pub fn value_iteration<M: Mdp + ?Sized>(
    mdp: &M,
    gamma: f64,
    tol: f64,
    max_iterations: Option<usize>,
) -> Solution {
    iterate(mdp, vec![0.; mdp.n_s()], gamma, tol, max_iterations)
}

fn iterate<M: Mdp + ?Sized>(
    mdp: &M,
    mut v: Vec<f64>,
    gamma: f64,
    tol: f64,
    max_iterations: Option<usize>,
) -> Solution {
    let transitions = mdp.transitions();
    let mut next = vec![0.; v.len()];
    let mut pi = vec![0; v.len()];
    let mut q = vec![0.; mdp.n_a()];
    let mut sweeps = 0;
    loop {
        for (s, (x, a)) in next.iter_mut().zip(pi.iter_mut()).enumerate() {
            q_values(&transitions, s, &v, gamma, &mut q);
            (*a, *x) = greedy(&q);
        }

        let delta = max_abs_diff(&v, &next);
        std::mem::swap(&mut v, &mut next);
        sweeps += 1;
        trace!(sweep = sweeps, delta, "value iteration");

        if delta < tol {
            info!(sweeps, "value iteration converged");
            return Solution {
                v,
                pi,
                iterations: sweeps,
                converged: true,
            };
        }

        if max_iterations.is_some_and(|m| sweeps >= m) {
            warn!(sweeps, delta, tol, "value iteration stopped before converging");
            return Solution {
                v,
                pi,
                iterations: sweeps,
                converged: false,
            };
        }
    }
}

#[derive(Clone)]
pub struct ValueIteration {
    mdp: Rc<dyn Mdp>,
    gamma: f64,
    v: Vec<f64>,
    pi: Vec<Discrete>,
}

impl ValueIteration {
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

impl MdpSolver<bool> for ValueIteration {
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

    /// Returns whether the values converged and the number of sweeps.
    fn exec(&mut self, theta: f64, num_iterations: Option<usize>) -> (bool, usize) {
        let sol = iterate(
            &*self.mdp,
            std::mem::take(&mut self.v),
            self.gamma,
            theta,
            num_iterations,
        );
        self.v = sol.v;
        self.pi = sol.pi;

        (sol.converged, sol.iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::simple_golf::SimpleGolf;
    use float_eq::*;

    #[test]
    fn simple_golf() {
        let sol = value_iteration(&SimpleGolf::new(), 0.9, 1e-8, None);

        assert!(sol.converged);
        assert_eq!(sol.pi, vec![0, 2, 0]);
        assert_float_eq!(
            sol.v,
            vec![8.803284627460451, 9.89010989010989, 0.],
            abs_all <= 1e-6
        );
    }

    #[test]
    fn sweep_cap_reports_partial_values() {
        let sol = value_iteration(&SimpleGolf::new(), 0.9, 1e-8, Some(1));

        assert!(!sol.converged);
        assert_eq!(sol.iterations, 1);
        assert_float_eq!(sol.v, vec![0., 9., 0.], abs_all <= 1e-12);
    }

    #[test]
    fn exec_resumes_from_previous_values() {
        let mdp = Rc::new(SimpleGolf::new()) as Rc<dyn Mdp>;
        let mut vi = ValueIteration::new(mdp, 0.9);

        let (converged, first) = vi.exec(1e-8, Some(3));
        assert!(!converged);
        assert_eq!(first, 3);

        let (converged, rest) = vi.exec(1e-8, None);
        assert!(converged);
        let (_, fresh) = ValueIteration::new(Rc::new(SimpleGolf::new()), 0.9).exec(1e-8, None);
        assert!(rest < fresh);

        assert_float_eq!(vi.v_star(0), 8.803284627460451, abs <= 1e-6);
        assert_eq!(vi.pi_star(1), Some(2));
        assert_eq!(vi.pi(), &[0, 2, 0]);
    }
}
