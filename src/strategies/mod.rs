pub mod signal_rules;
pub mod types;
