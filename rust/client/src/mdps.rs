use crate::Discrete;

pub trait Policy {
    fn policy(&self, s: Discrete) -> Discrete;
}

/// A tabular policy, indexed by the observed state.
impl Policy for [Discrete] {
    fn policy(&self, s: Discrete) -> Discrete {
        self[s]
    }
}

impl Policy for Vec<Discrete> {
    fn policy(&self, s: Discrete) -> Discrete {
        self[s]
    }
}

impl<P: Policy + ?Sized> Policy for &P {
    fn policy(&self, s: Discrete) -> Discrete {
        (**self).policy(s)
    }
}
