//! # Storage Backends
//!
//! The event log only needs four things from non-volatile storage: append to a
//! named file (creating it), list the files in the storage root, read a whole
//! file back, and a mount check. [`EventStorage`] captures exactly that.
//!
//! - [`FsStorage`]: a directory on the local filesystem (the SD card mount on
//!   the controller)
//! - [`InMemoryStorage`]: map-backed storage with fault injection, for tests
//!   and simulation
//!
//! Storage is single-writer: the log never issues concurrent appends.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::StorageError;

/// Narrow interface to the storage driver
pub trait EventStorage {
    /// Append `bytes` to `file_name`, creating the file if needed
    fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Names of all files in the storage root
    fn list_files(&self) -> Result<Vec<String>, StorageError>;

    /// Full contents of `file_name`
    fn read_all(&self, file_name: &str) -> Result<Vec<u8>, StorageError>;

    /// Check that the storage root is mounted and listable
    fn probe(&self) -> Result<(), StorageError> {
        self.list_files().map(|_| ())
    }
}

impl<S: EventStorage + ?Sized> EventStorage for &S {
    fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).append(file_name, bytes)
    }

    fn list_files(&self) -> Result<Vec<String>, StorageError> {
        (**self).list_files()
    }

    fn read_all(&self, file_name: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read_all(file_name)
    }

    fn probe(&self) -> Result<(), StorageError> {
        (**self).probe()
    }
}

impl<S: EventStorage + ?Sized> EventStorage for Arc<S> {
    fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).append(file_name, bytes)
    }

    fn list_files(&self) -> Result<Vec<String>, StorageError> {
        (**self).list_files()
    }

    fn read_all(&self, file_name: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read_all(file_name)
    }

    fn probe(&self) -> Result<(), StorageError> {
        (**self).probe()
    }
}

/// Files in a single directory on the local filesystem
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Use `root` as the storage root. The directory is not created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use `root`, creating it (and its parents) if missing
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::unavailable(format!("{}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        // Flat namespace: never escape the root
        if file_name.is_empty()
            || file_name.contains(['/', '\\'])
            || file_name == "."
            || file_name == ".."
        {
            return Err(StorageError::io(format!("invalid file name: {:?}", file_name)));
        }
        Ok(self.root.join(file_name))
    }
}

impl EventStorage for FsStorage {
    fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(file_name)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(bytes)?;
        trace!(path = %path.display(), bytes = bytes.len(), "Appended to file");
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            StorageError::unavailable(format!("{}: {}", self.root.display(), e))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!(name = ?raw, "Skipping non UTF-8 file name"),
            }
        }
        Ok(names)
    }

    fn read_all(&self, file_name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(file_name)?;
        Ok(fs::read(path)?)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    appends: usize,
    failing_appends: BTreeSet<usize>,
    unreadable: BTreeSet<String>,
    unavailable: bool,
}

/// In-memory storage with fault injection.
///
/// Appends are numbered from zero in the order they arrive; individual appends
/// can be made to fail, files can be made unreadable, and the whole store can
/// be taken offline.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    state: Mutex<MemoryState>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the append with sequence number `index` (0-based) fail
    pub fn fail_append(&self, index: usize) {
        self.state.lock().failing_appends.insert(index);
    }

    /// Make reads of `file_name` fail
    pub fn make_unreadable(&self, file_name: impl Into<String>) {
        self.state.lock().unreadable.insert(file_name.into());
    }

    /// Simulate an unmounted or removed medium
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Store a file directly, replacing any existing contents
    pub fn insert_file(&self, file_name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.state.lock().files.insert(file_name.into(), contents.into());
    }

    /// Current contents of `file_name`, bypassing fault injection
    pub fn contents(&self, file_name: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(file_name).cloned()
    }

    /// Number of files stored
    pub fn file_count(&self) -> usize {
        self.state.lock().files.len()
    }

    /// Number of append calls received, failed ones included
    pub fn append_count(&self) -> usize {
        self.state.lock().appends
    }
}

impl EventStorage for InMemoryStorage {
    fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        let index = state.appends;
        state.appends += 1;

        if state.unavailable {
            return Err(StorageError::unavailable("medium not mounted"));
        }
        if state.failing_appends.contains(&index) {
            return Err(StorageError::io(format!("injected failure on append {}", index)));
        }

        state
            .files
            .entry(file_name.to_string())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>, StorageError> {
        let state = self.state.lock();
        if state.unavailable {
            return Err(StorageError::unavailable("medium not mounted"));
        }
        Ok(state.files.keys().cloned().collect())
    }

    fn read_all(&self, file_name: &str) -> Result<Vec<u8>, StorageError> {
        let state = self.state.lock();
        if state.unavailable {
            return Err(StorageError::unavailable("medium not mounted"));
        }
        if state.unreadable.contains(file_name) {
            return Err(StorageError::io(format!("cannot open {}", file_name)));
        }
        state
            .files
            .get(file_name)
            .cloned()
            .ok_or_else(|| StorageError::not_found(file_name))
    }
}
