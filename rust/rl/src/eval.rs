//! Rolling a solved policy out in an environment.

use gymnasium::{Env, GymResult, Policy};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    pub reward: f64,
    pub steps: usize,
    /// The episode reached a terminal state within the step budget.
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub mean_reward: f64,
    /// Fraction of episodes that reached a terminal state.
    pub success_rate: f64,
    pub episodes: usize,
}

/// Plays one episode, rendering every frame at debug level.
pub fn render_single<E, P>(env: &mut E, policy: &P, max_steps: usize) -> GymResult<EpisodeOutcome>
where
    E: Env + ?Sized,
    P: Policy + ?Sized,
{
    let outcome = run_episode(env, policy, max_steps, None, true)?;
    if outcome.done {
        info!(reward = outcome.reward, steps = outcome.steps, "episode finished");
    } else {
        warn!(max_steps, "the agent didn't reach a terminal state");
    }

    Ok(outcome)
}

/// Averages `max_episodes` episodes. `seed` only seeds the first reset, later episodes
/// continue the environment's random stream.
pub fn evaluate<E, P>(
    env: &mut E,
    policy: &P,
    max_steps: usize,
    max_episodes: usize,
    seed: Option<u64>,
) -> GymResult<Evaluation>
where
    E: Env + ?Sized,
    P: Policy + ?Sized,
{
    let mut total_reward = 0.;
    let mut dones = 0;
    for ep in 0..max_episodes {
        let outcome = run_episode(env, policy, max_steps, seed.filter(|_| ep == 0), false)?;
        total_reward += outcome.reward;
        dones += usize::from(outcome.done);
    }

    let n = max_episodes.max(1) as f64;
    let evaluation = Evaluation {
        mean_reward: total_reward / n,
        success_rate: dones as f64 / n,
        episodes: max_episodes,
    };
    info!(
        episodes = max_episodes,
        mean_reward = evaluation.mean_reward,
        "terminal state reached in {:.0}% of episodes",
        evaluation.success_rate * 100.
    );

    Ok(evaluation)
}

fn run_episode<E, P>(
    env: &mut E,
    policy: &P,
    max_steps: usize,
    seed: Option<u64>,
    render: bool,
) -> GymResult<EpisodeOutcome>
where
    E: Env + ?Sized,
    P: Policy + ?Sized,
{
    let mut s = env.reset(seed)?;
    let mut outcome = EpisodeOutcome {
        reward: 0.,
        steps: 0,
        done: false,
    };

    for _ in 0..max_steps {
        if render {
            log_frame(env)?;
        }

        let step = env.step(policy.policy(s))?;
        outcome.reward += step.reward;
        outcome.steps += 1;
        s = step.observation;

        if step.terminated {
            outcome.done = true;
            break;
        }
        if step.truncated {
            break;
        }
    }

    if render {
        log_frame(env)?;
    }

    Ok(outcome)
}

fn log_frame<E: Env + ?Sized>(env: &E) -> GymResult<()> {
    if let Some(frame) = env.render()?.as_str() {
        debug!("\n{frame}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::frozen_lake::{FrozenLake, DOWN, LEFT, RIGHT};
    use float_eq::*;
    use gymnasium::Discrete;

    // Shortest path on the deterministic 4x4 lake.
    const OPTIMAL: [Discrete; 16] = [1, 2, 1, 0, 1, 0, 1, 0, 2, 1, 1, 0, 0, 2, 2, 0];

    #[test]
    fn optimal_policy_reaches_goal() {
        let mut env = FrozenLake::new("4x4", false).unwrap();

        let outcome = render_single(&mut env, &OPTIMAL[..], 100).unwrap();

        assert!(outcome.done);
        assert_eq!(outcome.steps, 6);
        assert_float_eq!(outcome.reward, 1., abs <= 1e-12);
    }

    #[test]
    fn looping_policy_runs_out_of_steps() {
        let mut env = FrozenLake::new("4x4", false).unwrap();
        let policy = vec![LEFT; 16];

        let outcome = render_single(&mut env, &policy, 7).unwrap();

        assert!(!outcome.done);
        assert_eq!(outcome.steps, 7);
        assert_float_eq!(outcome.reward, 0., abs <= 1e-12);
    }

    #[test]
    fn truncation_ends_the_episode() {
        let mut env = FrozenLake::new("4x4", false).unwrap().with_max_episode_steps(3);
        let policy = vec![LEFT; 16];

        let outcome = render_single(&mut env, &policy, 100).unwrap();

        assert!(!outcome.done);
        assert_eq!(outcome.steps, 3);
    }

    #[test]
    fn falling_into_a_hole_counts_as_done_without_reward() {
        let mut env = FrozenLake::new("4x4", false).unwrap();
        let mut policy = vec![DOWN; 16];
        policy[8] = RIGHT;
        policy[9] = RIGHT;
        policy[10] = RIGHT;

        let ev = evaluate(&mut env, &policy, 100, 4, Some(7)).unwrap();

        assert_eq!(ev.episodes, 4);
        assert_float_eq!(ev.mean_reward, 0., abs <= 1e-12);
        assert_float_eq!(ev.success_rate, 1., abs <= 1e-12);
    }

    #[test]
    fn evaluate_averages_episodes() {
        let mut env = FrozenLake::new("4x4", false).unwrap();

        let ev = evaluate(&mut env, &OPTIMAL[..], 100, 32, Some(2718)).unwrap();

        assert_float_eq!(ev.mean_reward, 1., abs <= 1e-12);
        assert_float_eq!(ev.success_rate, 1., abs <= 1e-12);
    }

    #[test]
    fn zero_episodes_is_not_nan() {
        let mut env = FrozenLake::new("4x4", false).unwrap();

        let ev = evaluate(&mut env, &OPTIMAL[..], 100, 0, None).unwrap();

        assert_eq!(ev.episodes, 0);
        assert_float_eq!(ev.mean_reward, 0., abs <= 1e-12);
    }
}
