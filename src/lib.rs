//! Simulated OTC market dashboard engine: a random-walk market simulator
//! with synthetic indicators and an on-demand trading signal generator.

pub mod ai;
pub mod config;
pub mod data;
pub mod execution;
pub mod monitoring;
pub mod strategies;
