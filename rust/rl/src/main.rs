use gymnasium::*;
use mdp_solvers::{environments::gym_adapter::GymAdapter, envs::frozen_lake::*, eval::*, *};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Solves FrozenLake with both dynamic programming methods and plays the result.
///
/// Takes an optional path to a JSON `SolverConfig`.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = std::env::args()
        .nth(1)
        .map(SolverConfig::load)
        .transpose()?
        .unwrap_or_default();

    let mut env = FrozenLake::new(&config.map_name, config.is_slippery)?;
    let mdp = Rc::new(GymAdapter::from_parts(
        format!("FrozenLake-{}", config.map_name),
        env.transitions(),
    )) as Rc<dyn Mdp>;

    let theta = config.policy_iteration_tol;
    let pi = &mut PolicyIteration::new(Rc::clone(&mdp), config.gamma);
    let ret = pi.exec(theta, config.max_iterations);
    println!(
        "Theta: {}, Converged: {}, Number of iterations: {}",
        theta, ret.0, ret.1
    );

    let pi = &*pi;
    let v_star = (0..mdp.n_s()).map(|s| pi.v_star(s)).collect::<Vec<_>>();
    println!("{v_star:?}");
    let pi_star = (0..mdp.n_s())
        .filter_map(|s| pi.pi_star(s))
        .collect::<Vec<_>>();
    println!("{pi_star:?}");
    let mut q_star = Vec::new();
    for s in 0..mdp.n_s() {
        for a in 0..mdp.n_a() {
            q_star.push(pi.q_star(s, a))
        }
    }
    println!("{q_star:?}");
    println!("{}\n", env.render_policy(&pi_star));

    let vi = value_iteration(
        &*mdp,
        config.gamma,
        config.value_iteration_tol,
        config.max_iterations,
    );
    println!(
        "Theta: {}, Converged: {}, Number of sweeps: {}",
        config.value_iteration_tol, vi.converged, vi.iterations
    );
    println!("{:?}", vi.v);
    println!("{}\n", env.render_policy(&vi.pi));

    let policy = MdpSolverPolicy {
        mdp_solver: Rc::new(pi.clone()) as Rc<dyn MdpSolver<bool>>,
    };
    if let Some(seed) = config.seed {
        env.reset(Some(seed))?;
    }
    let outcome = render_single(&mut env, &policy, config.eval_max_steps)?;
    println!("Episode reward: {}", outcome.reward);

    let ev = evaluate(
        &mut env,
        &vi.pi,
        config.eval_max_steps,
        config.eval_max_episodes,
        config.seed,
    )?;
    println!(
        "> Average reward over {} episodes:\t\t\t {}",
        ev.episodes, ev.mean_reward
    );
    println!(
        "> Percentage of episodes goal reached:\t\t\t {:.0}%",
        ev.success_rate * 100.
    );

    Ok(())
}
