//! Operation builders addressed to [`root`].

use shuffle_model::{FileHandle, NodeRef, OpenFileMode, Operation};

/// The share root every builder uses.
pub fn root() -> NodeRef {
    NodeRef::new("share-root")
}

pub fn create(path: &str) -> Operation {
    Operation::create(root(), path)
}

pub fn delete(path: &str) -> Operation {
    Operation::delete(root(), path)
}

pub fn rename(from: &str, to: &str) -> Operation {
    Operation::rename(root(), from, to)
}

pub fn move_file(from: &str, to: &str) -> Operation {
    Operation::move_file(root(), from, to)
}

pub fn open(path: &str, mode: OpenFileMode) -> Operation {
    Operation::open(root(), path, mode)
}

pub fn close(path: &str, file: FileHandle) -> Operation {
    Operation::close(root(), path, file)
}
