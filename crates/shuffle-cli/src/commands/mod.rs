//! Command implementations for shuffle-cli

pub mod replay;
pub mod rules;

pub use replay::run_replay;
pub use rules::{run_check, run_default_rules, run_scenarios};
