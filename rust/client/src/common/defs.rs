use crate::GymResult;
use serde_json::Value;
use std::ops::Index;

pub type Discrete = usize;
pub type Continous = f64;

/// One outcome of taking an action in a state: `(probability, next_state, reward, done)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub probability: Continous,
    pub next_state: Discrete,
    pub reward: Continous,
    pub done: bool,
}

impl Transition {
    pub fn new(probability: Continous, next_state: Discrete, reward: Continous, done: bool) -> Self {
        Self {
            probability,
            next_state,
            reward,
            done,
        }
    }
}

/// Dynamics of a discrete environment as a dense `(state, action)` table of outcome lists.
///
/// Slots are stored row-major, so `len()` is always `n_s * n_a`. A slot may be empty,
/// probabilities within a slot are not checked to sum to one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transitions {
    n_s: usize,
    n_a: usize,
    table: Vec<Vec<Transition>>,
}

impl Transitions {
    pub fn new(n_s: usize, n_a: usize) -> Self {
        Self {
            n_s,
            n_a,
            table: vec![Vec::new(); n_s * n_a],
        }
    }

    pub fn from_fn<F>(n_s: usize, n_a: usize, mut f: F) -> Self
    where
        F: FnMut(Discrete, Discrete) -> Vec<Transition>,
    {
        let table = (0..n_s)
            .flat_map(|s| (0..n_a).map(move |a| (s, a)))
            .map(|(s, a)| f(s, a))
            .collect();

        Self { n_s, n_a, table }
    }

    pub fn n_s(&self) -> usize {
        self.n_s
    }

    pub fn n_a(&self) -> usize {
        self.n_a
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, s: Discrete, a: Discrete) -> Option<&[Transition]> {
        if s < self.n_s && a < self.n_a {
            Some(&self.table[self.slot(s, a)])
        } else {
            None
        }
    }

    /// Replaces the outcomes of `(s, a)`, returning the previous ones.
    pub fn insert(&mut self, s: Discrete, a: Discrete, ts: Vec<Transition>) -> Vec<Transition> {
        let slot = self.slot(s, a);
        std::mem::replace(&mut self.table[slot], ts)
    }

    pub fn iter(&self) -> impl Iterator<Item = ((Discrete, Discrete), &[Transition])> {
        self.table
            .iter()
            .enumerate()
            .map(|(i, ts)| ((i / self.n_a, i % self.n_a), ts.as_slice()))
    }

    fn slot(&self, s: Discrete, a: Discrete) -> usize {
        assert!(
            s < self.n_s && a < self.n_a,
            "({s}, {a}) is outside of a {}x{} transition table",
            self.n_s,
            self.n_a
        );
        s * self.n_a + a
    }
}

impl Index<(Discrete, Discrete)> for Transitions {
    type Output = [Transition];

    fn index(&self, (s, a): (Discrete, Discrete)) -> &[Transition] {
        &self.table[self.slot(s, a)]
    }
}

#[derive(Debug, Clone)]
pub struct StepInfo {
    pub observation: Discrete,
    pub reward: Continous,
    pub truncated: bool,
    pub terminated: bool,
    pub info: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderFrame {
    Ansi(String),
    Rgb(usize, usize, String),
}

impl RenderFrame {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RenderFrame::Ansi(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rgb(&self) -> Option<(&usize, &usize, &String)> {
        match self {
            RenderFrame::Rgb(r, c, d) => Some((r, c, d)),
            _ => None,
        }
    }
}

/// An environment with discrete observations and actions, in the gymnasium sense.
pub trait Env {
    /// Starts a new episode. A seed re-seeds the environment's random source.
    fn reset(&mut self, seed: Option<u64>) -> GymResult<Discrete>;

    fn step(&mut self, action: Discrete) -> GymResult<StepInfo>;

    fn render(&self) -> GymResult<RenderFrame>;
}
