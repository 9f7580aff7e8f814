//! Building blocks shared by policy and value iteration.
//!
//! All sweeps are synchronous: a sweep reads only the previous sweep's values, so the
//! result does not depend on the order states are visited in.

use super::Mdp;
use crate::{Result, SolverError};
use gymnasium::{Discrete, Transitions};
use itertools::zip_eq;
use tracing::{trace, warn};

/// How an iterative evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweeps {
    pub count: usize,
    /// Largest per-state change in the last sweep.
    pub delta: f64,
    pub converged: bool,
}

/// Value function and policy produced by a solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub v: Vec<f64>,
    pub pi: Vec<Discrete>,
    /// Sweeps for value iteration, improvement rounds for policy iteration.
    pub iterations: usize,
    pub converged: bool,
}

/// One step lookahead: `sum p * (r + gamma * v[s'])` over the outcomes of `(s, a)`.
/// An empty outcome list is worth zero.
pub fn q_value(transitions: &Transitions, s: Discrete, a: Discrete, v: &[f64], gamma: f64) -> f64 {
    transitions[(s, a)]
        .iter()
        .map(|t| t.probability * (t.reward + gamma * v[t.next_state]))
        .sum()
}

/// Fills `q` with the lookahead value of every action in `s`.
pub fn q_values(transitions: &Transitions, s: Discrete, v: &[f64], gamma: f64, q: &mut [f64]) {
    for (a, q) in q.iter_mut().enumerate() {
        *q = q_value(transitions, s, a, v, gamma);
    }
}

/// Argmax over action values, lowest index wins ties.
pub fn greedy(q: &[f64]) -> (Discrete, f64) {
    let mut best = (0, q.first().copied().unwrap_or_default());
    for (a, &x) in q.iter().enumerate().skip(1) {
        if x > best.1 {
            best = (a, x);
        }
    }

    best
}

pub fn max_abs_diff(old: &[f64], new: &[f64]) -> f64 {
    zip_eq(old, new)
        .map(|(o, n)| (o - n).abs())
        .fold(0., f64::max)
}

/// A single Bellman backup of `v` under `policy`.
pub fn policy_backup<M: Mdp + ?Sized>(
    mdp: &M,
    policy: &[Discrete],
    v: &[f64],
    gamma: f64,
) -> Result<Vec<f64>> {
    validate_policy(mdp, policy)?;
    check_len(mdp.n_s(), v.len())?;

    let transitions = mdp.transitions();
    let mut next = vec![0.; v.len()];
    backup_into(&transitions, policy, v, gamma, &mut next);

    Ok(next)
}

/// Evaluates a fixed policy, starting from all zeros, until no state value moves by
/// `tol` or more. `max_sweeps` of `None` never gives up.
pub fn policy_evaluation<M: Mdp + ?Sized>(
    mdp: &M,
    policy: &[Discrete],
    gamma: f64,
    tol: f64,
    max_sweeps: Option<usize>,
) -> Result<(Vec<f64>, Sweeps)> {
    validate_policy(mdp, policy)?;

    Ok(evaluate(&mdp.transitions(), policy, gamma, tol, max_sweeps))
}

/// Greedy policy with respect to `v`.
pub fn policy_improvement<M: Mdp + ?Sized>(mdp: &M, v: &[f64], gamma: f64) -> Result<Vec<Discrete>> {
    check_len(mdp.n_s(), v.len())?;

    let mut pi = vec![0; mdp.n_s()];
    improve(&mdp.transitions(), mdp.n_a(), v, gamma, &mut pi);

    Ok(pi)
}

pub(crate) fn evaluate(
    transitions: &Transitions,
    policy: &[Discrete],
    gamma: f64,
    tol: f64,
    max_sweeps: Option<usize>,
) -> (Vec<f64>, Sweeps) {
    let mut v = vec![0.; policy.len()];
    let mut next = vec![0.; policy.len()];
    let mut count = 0;
    loop {
        backup_into(transitions, policy, &v, gamma, &mut next);
        let delta = max_abs_diff(&v, &next);
        std::mem::swap(&mut v, &mut next);
        count += 1;
        trace!(sweep = count, delta, "policy evaluation");

        if delta < tol {
            return (
                v,
                Sweeps {
                    count,
                    delta,
                    converged: true,
                },
            );
        }

        if max_sweeps.is_some_and(|m| count >= m) {
            warn!(sweeps = count, delta, tol, "policy evaluation stopped before converging");
            return (
                v,
                Sweeps {
                    count,
                    delta,
                    converged: false,
                },
            );
        }
    }
}

pub(crate) fn improve(
    transitions: &Transitions,
    n_a: usize,
    v: &[f64],
    gamma: f64,
    pi: &mut [Discrete],
) {
    let mut q = vec![0.; n_a];
    for (s, a) in pi.iter_mut().enumerate() {
        q_values(transitions, s, v, gamma, &mut q);
        *a = greedy(&q).0;
    }
}

fn backup_into(transitions: &Transitions, policy: &[Discrete], v: &[f64], gamma: f64, out: &mut [f64]) {
    for (s, x) in out.iter_mut().enumerate() {
        *x = q_value(transitions, s, policy[s], v, gamma);
    }
}

fn validate_policy<M: Mdp + ?Sized>(mdp: &M, policy: &[Discrete]) -> Result<()> {
    check_len(mdp.n_s(), policy.len())?;

    let n_a = mdp.n_a();
    match policy.iter().enumerate().find(|&(_, &a)| a >= n_a) {
        Some((state, &action)) => Err(SolverError::InvalidAction { state, action, n_a }),
        None => Ok(()),
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SolverError::DimensionMismatch { expected, actual })
    }
}
