pub mod dashboard;
pub mod simulator;
pub mod types;
