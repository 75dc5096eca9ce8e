//! Rules configuration
//!
//! Scenarios are configured from a TOML rules file:
//!
//! ```toml
//! [session]
//! capacity = 64
//!
//! [[scenario]]
//! kind = "create-shuffle"
//! pattern = '~WRD.*\.TMP'
//! ranking = "high"
//! timeout_secs = 30
//! ```
//!
//! Entries are evaluated in file order, which also breaks ties between
//! instances of equal ranking.

mod rules;

pub use rules::{RulesConfig, ScenarioConfig, SessionConfig};
