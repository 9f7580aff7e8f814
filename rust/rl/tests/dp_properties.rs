extern crate mdp_solvers;

use assertor::*;
use float_eq::*;
use gymnasium::{Discrete, Transition, Transitions};
use mdp_solvers::envs::{frozen_lake::FrozenLake, simple_golf::SimpleGolf};
use mdp_solvers::*;
use rstest::rstest;
use std::rc::Rc;

struct TableMdp(Rc<Transitions>);

impl Mdp for TableMdp {
    fn n_s(&self) -> usize {
        self.0.n_s()
    }

    fn n_a(&self) -> usize {
        self.0.n_a()
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.0)
    }
}

/// State 0 --(action 0, reward 1)--> state 1, which only loops onto itself.
fn two_state() -> TableMdp {
    TableMdp(Rc::new(Transitions::from_fn(2, 2, |s, a| match (s, a) {
        (0, 0) => vec![Transition::new(1., 1, 1., true)],
        (0, _) => vec![Transition::new(1., 0, 0., false)],
        _ => vec![Transition::new(1., 1, 0., true)],
    })))
}

#[test]
fn two_state_policy_evaluation() {
    let tol = 1e-3;

    let (v, sweeps) = policy_evaluation(&two_state(), &[0, 0], 0.9, tol, None).unwrap();

    assert!(sweeps.converged);
    assert_float_eq!(v, vec![1., 0.], abs_all <= tol);
}

#[test]
fn zero_reward_terminal_model_is_worthless() {
    let mdp = TableMdp(Rc::new(Transitions::from_fn(4, 3, |_, _| {
        vec![Transition::new(1., 3, 0., true)]
    })));

    for sol in [
        value_iteration(&mdp, 0.9, 1e-3, None),
        policy_iteration(&mdp, 0.9, 1e-3, None),
    ] {
        assert!(sol.converged);
        assert_float_eq!(sol.v, vec![0.; 4], abs_all <= 1e-12);
        assert_that!(sol.pi).is_equal_to(vec![0; 4]);
    }
}

#[rstest]
#[case("4x4")]
#[case("8x8")]
fn deterministic_lake_solvers_agree(#[case] map_name: &str) {
    let mdp = FrozenLake::new(map_name, false).unwrap();

    let vi = value_iteration(&mdp, 0.9, 1e-3, None);
    let pi = policy_iteration(&mdp, 0.9, 10e-3, None);

    assert!(vi.converged && pi.converged);
    assert_that!(pi.pi).is_equal_to(vi.pi);
    assert_float_eq!(pi.v, vi.v, abs_all <= 1e-2);
}

#[test]
fn deterministic_lake_shortest_paths() {
    let mdp = FrozenLake::new("4x4", false).unwrap();

    let sol = value_iteration(&mdp, 0.9, 1e-3, None);

    let expected: Vec<Discrete> = vec![1, 2, 1, 0, 1, 0, 1, 0, 2, 1, 1, 0, 0, 2, 2, 0];
    assert_that!(sol.pi).is_equal_to(expected);
    assert_float_eq!(sol.v[14], 1., abs <= 1e-12);
    assert_float_eq!(sol.v[0], 0.9f64.powi(5), abs <= 1e-12);
}

#[rstest]
#[case(0.9)]
#[case(0.99)]
fn slippery_lake_values_agree(#[case] gamma: f64) {
    let mdp = FrozenLake::new("4x4", true).unwrap();

    let vi = value_iteration(&mdp, gamma, 1e-8, None);
    let pi = policy_iteration(&mdp, gamma, 1e-8, None);

    assert_float_eq!(pi.v, vi.v, abs_all <= 1e-2);
    assert!(vi.v.iter().all(|&v| (0. ..=1.).contains(&v)));
}

#[rstest]
#[case(1e-3)]
#[case(1e-6)]
fn evaluation_is_a_fixed_point_within_tolerance(#[case] tol: f64) {
    let mdp = FrozenLake::new("4x4", true).unwrap();
    let policy = value_iteration(&mdp, 0.9, 1e-6, None).pi;

    let (v, _) = policy_evaluation(&mdp, &policy, 0.9, tol, None).unwrap();
    let again = policy_backup(&mdp, &policy, &v, 0.9).unwrap();

    assert_float_eq!(again, v, abs_all <= tol);
}

#[rstest]
#[case::golf(Rc::new(SimpleGolf::new()) as Rc<dyn Mdp>)]
#[case::lake(Rc::new(FrozenLake::new("8x8", false).unwrap()) as Rc<dyn Mdp>)]
fn improving_an_optimal_policy_changes_nothing(#[case] mdp: Rc<dyn Mdp>) {
    let optimal = policy_iteration(&*mdp, 0.9, 1e-8, None);

    let (v, _) = policy_evaluation(&*mdp, &optimal.pi, 0.9, 1e-8, None).unwrap();
    let improved = policy_improvement(&*mdp, &v, 0.9).unwrap();

    assert_that!(improved).is_equal_to(optimal.pi);
}

#[test]
fn policies_stay_in_action_range() {
    let mdp = FrozenLake::new("8x8", true).unwrap();

    let sol = value_iteration(&mdp, 0.95, 1e-4, None);

    assert_eq!(sol.v.len(), mdp.n_s());
    assert_eq!(sol.pi.len(), mdp.n_s());
    assert!(sol.pi.iter().all(|&a| a < mdp.n_a()));
}
