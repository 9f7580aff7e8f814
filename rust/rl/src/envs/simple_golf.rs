use crate::algos::mbased::mdp::Mdp;
use gymnasium::*;
use std::rc::Rc;

/// Three states (fairway, green, in the hole) and three actions (hit to green, hit in
/// the hole, hit in the hole from the green). Pairs without outcomes are left empty.
///
/// https://towardsdatascience.com/reinforcement-learning-an-easy-introduction-to-value-iteration-e4cfe0731fd5
pub struct SimpleGolf {
    transitions: Rc<Transitions>,
}

impl SimpleGolf {
    pub fn new() -> Self {
        let mut transitions = Transitions::new(3, 3);
        transitions.insert(
            0,
            0,
            vec![Transition::new(0.9, 1, 0., false), Transition::new(0.1, 0, 0., false)],
        );
        transitions.insert(
            1,
            1,
            vec![Transition::new(0.9, 0, 0., false), Transition::new(0.1, 1, 0., false)],
        );
        transitions.insert(
            1,
            2,
            vec![Transition::new(0.9, 2, 10., true), Transition::new(0.1, 1, 0., false)],
        );

        Self {
            transitions: Rc::new(transitions),
        }
    }
}

impl Default for SimpleGolf {
    fn default() -> Self {
        Self::new()
    }
}

impl Mdp for SimpleGolf {
    fn n_s(&self) -> usize {
        self.transitions.n_s()
    }

    fn n_a(&self) -> usize {
        self.transitions.n_a()
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}
