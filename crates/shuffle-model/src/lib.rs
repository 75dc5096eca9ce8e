//! Operation and command models for the save-shuffle rule engine
//!
//! This is the Layer 0 crate of the workspace. It holds the pure data that
//! flows through the engine:
//!
//! - **Operations**: filesystem events as reported by the file-sharing protocol layer
//! - **Commands**: repository instructions produced by the rule engine
//! - **Executor contract**: how a repository applies commands and threads
//!   captured results back into the engine
//!
//! ```text
//!   protocol layer --Operation--> shuffle-rules --Command--> OperationExecutor
//!                                      ^                          |
//!                                      +------- ResultSink -------+
//! ```

pub mod command;
pub mod error;
pub mod executor;
pub mod file;
pub mod node;
pub mod operation;
pub mod path;

pub use command::{
    CaptureSlot, Command, CommandResult, CompoundCommand, InstanceTicket, ResultCapture,
    TransactionKind,
};
pub use error::{Error, Result};
pub use executor::{DiscardResults, OperationExecutor, ResultSink};
pub use file::{FileHandle, NetworkFile, OpenFileMode};
pub use node::NodeRef;
pub use operation::{
    CloseFileOperation, CreateFileOperation, DeleteFileOperation, MoveFileOperation,
    OpenFileOperation, Operation, OperationKind, RenameFileOperation,
};
pub use path::{file_name, join_path, names_match, parent_path, paths_match};
