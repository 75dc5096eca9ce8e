//! In-memory versioned repository
//!
//! A small stand-in for the document repository behind the file-sharing
//! protocol. Nodes keep a stable identity across renames, deletes go to an
//! archive they can be restored from, and every compound command runs as one
//! transaction that is rolled back on failure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use shuffle_model::{
    Command, CommandResult, Error, FileHandle, NetworkFile, NodeRef, OpenFileMode,
    OperationExecutor, Result, ResultSink, file_name,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Canonical display form: backslash separators and one leading separator
pub fn canonical_path(path: &str) -> String {
    format!("\\{}", path.replace('/', "\\").trim_matches('\\'))
}

pub(crate) fn path_key(path: &str) -> String {
    canonical_path(path).to_lowercase()
}

/// Hex SHA-256 of `content`
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
struct StoredNode {
    id: NodeRef,
    path: String,
    content: Vec<u8>,
    properties: BTreeMap<String, String>,
    allocation_size: u64,
    hidden: bool,
    version: u32,
    modified: DateTime<Utc>,
}

impl StoredNode {
    fn new(path: &str, allocation_size: u64, hidden: bool) -> Self {
        Self {
            id: NodeRef::new(Uuid::new_v4().to_string()),
            path: canonical_path(path),
            content: Vec::new(),
            properties: BTreeMap::new(),
            allocation_size,
            hidden,
            version: 1,
            modified: Utc::now(),
        }
    }

    fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.version += 1;
        self.modified = Utc::now();
    }
}

/// An open file handed out by the repository
#[derive(Debug)]
pub struct MemoryFile {
    path: String,
    read_only: bool,
    delete_on_close: bool,
}

impl NetworkFile for MemoryFile {
    fn name(&self) -> &str {
        file_name(&self.path)
    }

    fn full_path(&self) -> &str {
        &self.path
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn has_delete_on_close(&self) -> bool {
        self.delete_on_close
    }
}

#[derive(Debug, Clone)]
struct HandleEntry {
    handle: FileHandle,
    node: NodeRef,
    open: bool,
}

#[derive(Debug, Clone, Default)]
struct RepoState {
    nodes: HashMap<NodeRef, StoredNode>,
    index: HashMap<String, NodeRef>,
    archive: HashMap<NodeRef, StoredNode>,
    handles: Vec<HandleEntry>,
}

impl RepoState {
    fn lookup(&self, path: &str) -> Result<NodeRef> {
        self.index
            .get(&path_key(path))
            .cloned()
            .ok_or_else(|| Error::not_found(path))
    }

    fn node(&self, path: &str) -> Result<&StoredNode> {
        let id = self.lookup(path)?;
        self.nodes.get(&id).ok_or_else(|| Error::not_found(path))
    }

    fn node_mut(&mut self, path: &str) -> Result<&mut StoredNode> {
        let id = self.lookup(path)?;
        self.nodes.get_mut(&id).ok_or_else(|| Error::not_found(path))
    }

    fn ensure_free(&self, path: &str) -> Result<()> {
        if self.index.contains_key(&path_key(path)) {
            return Err(Error::already_exists(path));
        }
        Ok(())
    }

    fn link(&mut self, node: StoredNode) -> NodeRef {
        let id = node.id.clone();
        self.index.insert(path_key(&node.path), id.clone());
        self.nodes.insert(id.clone(), node);
        id
    }

    fn unlink(&mut self, path: &str) -> Result<StoredNode> {
        let id = self
            .index
            .remove(&path_key(path))
            .ok_or_else(|| Error::not_found(path))?;
        self.nodes.remove(&id).ok_or_else(|| Error::not_found(path))
    }

    fn relocate(&mut self, from_path: &str, to_path: &str) -> Result<NodeRef> {
        if path_key(from_path) != path_key(to_path) {
            self.ensure_free(to_path)?;
        }
        let mut node = self.unlink(from_path)?;
        node.path = canonical_path(to_path);
        Ok(self.link(node))
    }

    fn open_handle(&mut self, node: NodeRef, path: &str, read_only: bool, delete_on_close: bool) -> FileHandle {
        let handle = FileHandle::new(MemoryFile {
            path: canonical_path(path),
            read_only,
            delete_on_close,
        });
        self.handles.push(HandleEntry {
            handle: handle.clone(),
            node,
            open: true,
        });
        handle
    }

    fn handle_node(&self, file: &FileHandle) -> Result<NodeRef> {
        self.handles
            .iter()
            .find(|entry| entry.handle == *file)
            .map(|entry| entry.node.clone())
            .ok_or_else(|| Error::StaleHandle {
                path: file.full_path().to_string(),
            })
    }

    fn apply(&mut self, command: &Command) -> Result<CommandResult> {
        debug!(command = command.label(), "applying");
        match command {
            Command::CreateFile {
                path,
                allocation_size,
                hidden,
                ..
            } => {
                self.ensure_free(path)?;
                let id = self.link(StoredNode::new(path, *allocation_size, *hidden));
                Ok(CommandResult::File(self.open_handle(id, path, false, false)))
            }
            Command::DeleteFile { path, .. } => {
                let node = self.unlink(path)?;
                let id = node.id.clone();
                self.archive.insert(id.clone(), node);
                Ok(CommandResult::Node(id))
            }
            Command::RenameFile {
                from_path, to_path, ..
            }
            | Command::SoftRename {
                from_path, to_path, ..
            }
            | Command::MoveFile {
                from_path, to_path, ..
            } => Ok(CommandResult::Node(self.relocate(from_path, to_path)?)),
            Command::OpenFile {
                path,
                mode,
                truncate,
                ..
            } => {
                let node = self.node_mut(path)?;
                if *truncate {
                    node.set_content(Vec::new());
                }
                let id = node.id.clone();
                let delete_on_close = *mode == OpenFileMode::Delete;
                Ok(CommandResult::File(self.open_handle(id, path, !mode.is_write(), delete_on_close)))
            }
            Command::CloseFile { file, path, .. } => {
                let entry = self
                    .handles
                    .iter_mut()
                    .find(|entry| entry.handle == *file && entry.open)
                    .ok_or_else(|| Error::StaleHandle { path: path.clone() })?;
                entry.open = false;
                Ok(CommandResult::None)
            }
            Command::CopyContent {
                from_path, to_path, ..
            } => {
                let content = self.node(from_path)?.content.clone();
                self.node_mut(to_path)?.set_content(content);
                Ok(CommandResult::None)
            }
            Command::RestoreFromArchive {
                path,
                allocation_size,
                archived,
                ..
            } => {
                self.ensure_free(path)?;
                let mut node = self.archive.remove(archived).ok_or_else(|| Error::NotArchived {
                    node: archived.to_string(),
                })?;
                node.path = canonical_path(path);
                node.allocation_size = *allocation_size;
                node.set_content(Vec::new());
                let id = self.link(node);
                Ok(CommandResult::File(self.open_handle(id, path, false, false)))
            }
            Command::ReduceQuota { file } => {
                let id = self.handle_node(file)?;
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.allocation_size = node.content.len() as u64;
                }
                Ok(CommandResult::None)
            }
            Command::RemoveTempFile { file } => {
                if file.has_delete_on_close() {
                    let id = self.handle_node(file)?;
                    if let Some(node) = self.nodes.remove(&id) {
                        self.index.remove(&path_key(&node.path));
                        self.archive.insert(id, node);
                    }
                }
                self.handles.retain(|entry| entry.handle != *file);
                Ok(CommandResult::None)
            }
            Command::RemoveNoContentFile { path, .. } => {
                let empty = self.node(path).map(|node| node.content.is_empty()).unwrap_or(false);
                if empty {
                    self.unlink(path)?;
                }
                Ok(CommandResult::None)
            }
            Command::DoNothing => Ok(CommandResult::None),
            Command::ReturnValue(result) => Ok(result.clone()),
            Command::Compound(_) | Command::Capture(_) => Err(Error::InvalidCommand {
                message: format!("{} cannot be nested", command.label()),
            }),
        }
    }
}

/// One node as shown in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub path: String,
    pub node: NodeRef,
    pub size: u64,
    pub version: u32,
    pub checksum: String,
    pub properties: BTreeMap<String, String>,
    pub modified: DateTime<Utc>,
}

/// Thread-safe in-memory repository
#[derive(Debug)]
pub struct MemoryRepository {
    root: NodeRef,
    state: Mutex<RepoState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            root: NodeRef::new(Uuid::new_v4().to_string()),
            state: Mutex::new(RepoState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RepoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reference of the share root that operations are addressed to
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Create a file with initial content outside of any command
    pub fn seed(&self, path: &str, content: &[u8]) -> Result<NodeRef> {
        let mut state = self.lock();
        state.ensure_free(path)?;
        let mut node = StoredNode::new(path, content.len() as u64, false);
        node.content = content.to_vec();
        Ok(state.link(node))
    }

    /// Replace the content of a file, as a client writing through a handle would
    pub fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        self.lock().node_mut(path)?.set_content(content.to_vec());
        Ok(())
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().node(path).ok().map(|node| node.content.clone())
    }

    pub fn node_at(&self, path: &str) -> Option<NodeRef> {
        self.lock().lookup(path).ok()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.node_at(path).is_some()
    }

    pub fn version(&self, path: &str) -> Option<u32> {
        self.lock().node(path).ok().map(|node| node.version)
    }

    pub fn is_hidden(&self, path: &str) -> Option<bool> {
        self.lock().node(path).ok().map(|node| node.hidden)
    }

    pub fn property(&self, path: &str, key: &str) -> Option<String> {
        self.lock()
            .node(path)
            .ok()
            .and_then(|node| node.properties.get(key).cloned())
    }

    pub fn set_property(&self, path: &str, key: &str, value: &str) -> Result<()> {
        self.lock()
            .node_mut(path)?
            .properties
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn is_archived(&self, node: &NodeRef) -> bool {
        self.lock().archive.contains_key(node)
    }

    pub fn archived_count(&self) -> usize {
        self.lock().archive.len()
    }

    pub fn open_handles(&self) -> usize {
        self.lock().handles.iter().filter(|entry| entry.open).count()
    }

    /// Every live node, sorted by path
    pub fn listing(&self) -> Vec<Entry> {
        let state = self.lock();
        let mut entries: Vec<Entry> = state
            .nodes
            .values()
            .map(|node| Entry {
                path: node.path.clone(),
                node: node.id.clone(),
                size: node.content.len() as u64,
                version: node.version,
                checksum: compute_checksum(&node.content),
                properties: node.properties.clone(),
                modified: node.modified,
            })
            .collect();
        entries.sort_by(|a, b| a.path.to_lowercase().cmp(&b.path.to_lowercase()));
        entries
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationExecutor for MemoryRepository {
    fn execute(&self, command: &Command, sink: &dyn ResultSink) -> Result<CommandResult> {
        let (primary, post_commit, post_error): (&[Command], &[Command], &[Command]) = match command {
            Command::Compound(compound) => {
                (&compound.commands, &compound.post_commit, &compound.post_error)
            }
            single => (std::slice::from_ref(single), &[], &[]),
        };
        debug!(
            command = command.label(),
            transaction = ?command.transaction(),
            "executing"
        );

        let outcome = {
            let mut state = self.lock();
            let snapshot = state.clone();
            let mut last = CommandResult::None;
            let mut failure = None;
            for step in primary {
                match state.apply(step) {
                    Ok(result) => last = result,
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }
            match failure {
                None => Ok(last),
                Some(err) => {
                    warn!(command = command.label(), error = %err, "transaction rolled back");
                    *state = snapshot;
                    for step in post_error {
                        if let Err(cleanup) = state.apply(step) {
                            warn!(command = step.label(), error = %cleanup, "post-error command failed");
                        }
                    }
                    Err(err)
                }
            }
        };
        let last = outcome?;

        for step in post_commit {
            match step {
                Command::Capture(capture) => sink.accept(capture, &last),
                other => {
                    if let Err(err) = self.lock().apply(other) {
                        warn!(command = other.label(), error = %err, "post-commit command failed");
                    }
                }
            }
        }
        Ok(last)
    }
}
