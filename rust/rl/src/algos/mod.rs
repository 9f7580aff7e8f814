pub mod mbased;
