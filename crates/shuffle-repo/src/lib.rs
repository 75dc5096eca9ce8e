//! Reference repository and trace replay for the save-shuffle engine
//!
//! - [`MemoryRepository`]: an in-memory node store implementing
//!   [`shuffle_model::OperationExecutor`], with an archive for deleted nodes
//!   and transactional compound commands
//! - [`Trace`]: recorded client operations with expected end state
//! - [`Replayer`]: runs traces through a [`shuffle_rules::RuleEvaluator`]
//!   and the repository, the way a file-sharing front end would

pub mod error;
pub mod replay;
pub mod repository;
pub mod trace;

pub use error::{Error, Result};
pub use replay::{Applied, ReplayReport, Replayer, StepRecord};
pub use repository::{Entry, MemoryFile, MemoryRepository, canonical_path, compute_checksum};
pub use trace::{Expectation, SeedFile, Trace, TraceStep};
