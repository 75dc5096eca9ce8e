//! Save-shuffle detection for a versioned document repository
//!
//! Desktop applications rarely save a file in place. They write a temp file,
//! rename the original aside, rename the temp file into place and delete the
//! backup. Applied literally, that sequence destroys the original node and
//! with it the file's version history and properties.
//!
//! This crate watches the operation stream of each session and recognizes
//! those patterns:
//!
//! - **Scenarios**: stateless recognizers, one per save pattern, configured
//!   from a TOML rules file
//! - **Instances**: per-shuffle state machines spawned by scenarios
//! - **RuleEvaluator**: arbitrates between instances by ranking and returns
//!   exactly one command per operation
//!
//! # Example
//!
//! ```
//! use shuffle_model::{NodeRef, Operation};
//! use shuffle_rules::{RuleEvaluator, SessionContext};
//!
//! let evaluator = RuleEvaluator::builtin().unwrap();
//! let context = evaluator.create_context(&SessionContext::new());
//!
//! let root = NodeRef::new("root");
//! let command = evaluator.evaluate(&context, &Operation::create(root, r"\docs\~WRD0001.TMP"));
//! assert_eq!(command.label(), "compound");
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod pattern;
pub mod registry;
pub mod scenario;
pub mod session;

pub use config::{RulesConfig, ScenarioConfig, SessionConfig};
pub use context::{EvaluatorContext, InstanceSummary, ScenarioContext};
pub use error::{Error, Result};
pub use evaluator::RuleEvaluator;
pub use pattern::FilePattern;
pub use scenario::{
    DependentInstance, Ranking, RenameObserver, Scenario, ScenarioInstance, ScenarioKind,
    ScenarioSettings,
};
pub use session::{SessionContext, SessionStore};
