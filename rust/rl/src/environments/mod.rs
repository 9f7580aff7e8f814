pub mod gym_adapter;
