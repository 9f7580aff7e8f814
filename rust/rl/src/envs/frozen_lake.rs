use super::mdp_simulator::pick_next;
use crate::algos::mbased::mdp::Mdp;
use crate::{Result, SolverError};
use gymnasium::*;
use itertools::Itertools;
use rand::prelude::*;
use serde_json::json;
use std::rc::Rc;

pub const LEFT: Discrete = 0;
pub const DOWN: Discrete = 1;
pub const RIGHT: Discrete = 2;
pub const UP: Discrete = 3;

const N_A: usize = 4;
const ACTION_NAMES: [&str; N_A] = ["Left", "Down", "Right", "Up"];
const ARROWS: [char; N_A] = ['←', '↓', '→', '↑'];

pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];
pub const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF", "FFFHFFFG",
];

/// Gymnasium's FrozenLake, simulated in process.
///
/// `S`tart, `F`rozen, `H`ole and `G`oal cells. Reaching the goal pays 1, holes and the
/// goal end the episode. On a slippery lake the agent moves in the intended direction or
/// in either perpendicular one, each with probability 1/3.
///
/// Refer: https://gymnasium.farama.org/environments/toy_text/frozen_lake/
pub struct FrozenLake {
    desc: Vec<Vec<u8>>,
    ncol: usize,
    transitions: Rc<Transitions>,
    starts: Vec<Discrete>,
    max_episode_steps: Option<usize>,
    rng: StdRng,
    s: Discrete,
    last_action: Option<Discrete>,
    elapsed: usize,
}

impl FrozenLake {
    /// One of the built-in maps, `"4x4"` or `"8x8"`.
    pub fn new(map_name: &str, is_slippery: bool) -> Result<Self> {
        match map_name {
            "4x4" => Self::from_desc(&MAP_4X4, is_slippery),
            "8x8" => Self::from_desc(&MAP_8X8, is_slippery),
            m => Err(SolverError::InvalidMap(format!("unknown map name '{m}'"))),
        }
    }

    pub fn from_desc<S: AsRef<str>>(desc: &[S], is_slippery: bool) -> Result<Self> {
        let desc = desc
            .iter()
            .map(|row| row.as_ref().as_bytes().to_vec())
            .collect::<Vec<_>>();

        let ncol = desc.first().map_or(0, Vec::len);
        if ncol == 0 {
            return Err(SolverError::InvalidMap("map is empty".to_string()));
        }
        if let Some(r) = desc.iter().position(|row| row.len() != ncol) {
            return Err(SolverError::InvalidMap(format!(
                "row {r} has {} cells, expected {ncol}",
                desc[r].len()
            )));
        }
        if let Some(c) = desc.iter().flatten().find(|&&c| !b"SFHG".contains(&c)) {
            return Err(SolverError::InvalidMap(format!(
                "unknown cell '{}'",
                *c as char
            )));
        }

        let starts = desc
            .iter()
            .flatten()
            .positions(|&c| c == b'S')
            .collect::<Vec<_>>();
        if starts.is_empty() {
            return Err(SolverError::InvalidMap("map has no start cell".to_string()));
        }

        let transitions = Transitions::from_fn(desc.len() * ncol, N_A, |s, a| {
            let (row, col) = (s / ncol, s % ncol);
            if b"GH".contains(&desc[row][col]) {
                vec![Transition::new(1., s, 0., true)]
            } else if is_slippery {
                [(a + N_A - 1) % N_A, a, (a + 1) % N_A]
                    .into_iter()
                    .map(|b| outcome(&desc, row, col, b, 1. / 3.))
                    .collect()
            } else {
                vec![outcome(&desc, row, col, a, 1.)]
            }
        });

        Ok(Self {
            s: starts[0],
            desc,
            ncol,
            transitions: Rc::new(transitions),
            starts,
            max_episode_steps: None,
            rng: StdRng::from_entropy(),
            last_action: None,
            elapsed: 0,
        })
    }

    /// Truncates episodes after `n` steps.
    pub fn with_max_episode_steps(mut self, n: usize) -> Self {
        self.max_episode_steps = Some(n);
        self
    }

    pub fn state(&self) -> Discrete {
        self.s
    }

    /// Draws `policy` onto the map: an arrow per frozen cell, holes and the goal as is.
    pub fn render_policy(&self, policy: &[Discrete]) -> String {
        self.desc
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, &cell)| match cell {
                        b'H' | b'G' => cell as char,
                        _ => ARROWS
                            .get(policy[r * self.ncol + c])
                            .copied()
                            .unwrap_or('?'),
                    })
                    .collect::<String>()
            })
            .join("\n")
    }
}

fn outcome(desc: &[Vec<u8>], row: usize, col: usize, a: Discrete, p: f64) -> Transition {
    let (nrow, ncol) = (desc.len(), desc[0].len());
    let (row, col) = match a {
        LEFT => (row, col.saturating_sub(1)),
        DOWN => ((row + 1).min(nrow - 1), col),
        RIGHT => (row, (col + 1).min(ncol - 1)),
        _ => (row.saturating_sub(1), col),
    };

    let letter = desc[row][col];
    Transition::new(
        p,
        row * ncol + col,
        if letter == b'G' { 1. } else { 0. },
        b"GH".contains(&letter),
    )
}

impl Mdp for FrozenLake {
    fn n_s(&self) -> usize {
        self.transitions.n_s()
    }

    fn n_a(&self) -> usize {
        N_A
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}

impl Env for FrozenLake {
    fn reset(&mut self, seed: Option<u64>) -> GymResult<Discrete> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        self.s = self.starts.choose(&mut self.rng).copied().unwrap_or(self.s);
        self.last_action = None;
        self.elapsed = 0;

        Ok(self.s)
    }

    fn step(&mut self, action: Discrete) -> GymResult<StepInfo> {
        if action >= N_A {
            return Err(GymError::InvalidAction { action, n: N_A });
        }

        let ts = &self.transitions[(self.s, action)];
        let t = pick_next(&mut self.rng, ts).copied().unwrap_or(ts[0]);

        self.s = t.next_state;
        self.last_action = Some(action);
        self.elapsed += 1;

        Ok(StepInfo {
            observation: t.next_state,
            reward: t.reward,
            truncated: self.max_episode_steps.is_some_and(|m| self.elapsed >= m),
            terminated: t.done,
            info: json!({ "prob": t.probability }),
        })
    }

    fn render(&self) -> GymResult<RenderFrame> {
        let mut out = match self.last_action {
            Some(a) => format!("  ({})\n", ACTION_NAMES[a]),
            None => "\n".to_string(),
        };

        for (r, row) in self.desc.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                if r * self.ncol + c == self.s {
                    out.push_str(&format!("\u{1b}[41m{}\u{1b}[0m", cell as char));
                } else {
                    out.push(cell as char);
                }
            }
            out.push('\n');
        }

        Ok(RenderFrame::Ansi(out))
    }
}
