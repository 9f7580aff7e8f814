pub mod frozen_lake;
pub mod mdp_simulator;
pub mod simple_golf;
