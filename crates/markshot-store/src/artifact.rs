// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact store — where original and display rasters live.
//
// The store is always an explicit handle passed into the renderer, ingest, and
// the accountant. Nothing in Markshot reads a process-wide storage directory.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use markshot_core::error::{MarkshotError, Result};
use tracing::{debug, instrument};

/// Keyed byte storage for raster artifacts.
///
/// "Not found" is an ordinary answer (`Ok(None)` / `Ok(false)`), never an
/// error; errors are reserved for I/O failures and malformed keys.
pub trait ArtifactStore: Send + Sync {
    /// Read the full contents of an artifact.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Size of an artifact in bytes, without loading its contents.
    fn size(&self, key: &str) -> Result<Option<u64>>;

    /// Create or replace an artifact.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Delete an artifact. Returns whether anything was removed.
    fn remove(&self, key: &str) -> Result<bool>;
}

/// Keys are flat names; anything that could escape the store root is refused.
fn check_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');
    if bad {
        return Err(MarkshotError::InvalidInput(format!(
            "invalid artifact key {key:?}"
        )));
    }
    Ok(())
}

// -- Filesystem ---------------------------------------------------------------

/// Artifact store backed by a single flat directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Artifact store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

impl ArtifactStore for FsArtifactStore {
    #[instrument(skip(self))]
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn size(&self, key: &str) -> Result<Option<u64>> {
        let path = self.path_for(key)?;
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), "Artifact written");
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

// -- In-memory ----------------------------------------------------------------

/// Artifact store held entirely in memory. Used by tests and previews.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.files.lock().expect("artifact lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        check_key(key)?;
        let files = self.files.lock().expect("artifact lock poisoned");
        Ok(files.get(key).cloned())
    }

    fn size(&self, key: &str) -> Result<Option<u64>> {
        check_key(key)?;
        let files = self.files.lock().expect("artifact lock poisoned");
        Ok(files.get(key).map(|bytes| bytes.len() as u64))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        check_key(key)?;
        let mut files = self.files.lock().expect("artifact lock poisoned");
        files.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        let mut files = self.files.lock().expect("artifact lock poisoned");
        Ok(files.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_round_trips_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::open(dir.path()).unwrap();

        assert_eq!(store.read("a.png").unwrap(), None);
        assert_eq!(store.size("a.png").unwrap(), None);

        store.write("a.png", b"12345").unwrap();
        assert_eq!(store.read("a.png").unwrap().as_deref(), Some(&b"12345"[..]));
        assert_eq!(store.size("a.png").unwrap(), Some(5));

        assert!(store.remove("a.png").unwrap());
        assert!(!store.remove("a.png").unwrap());
    }

    #[test]
    fn fs_store_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("shots");
        let store = FsArtifactStore::open(&nested).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let store = MemoryArtifactStore::new();
        for key in ["", "..", "../etc/passwd", "a/b.png", "a\\b.png"] {
            assert!(
                matches!(store.write(key, b"x"), Err(MarkshotError::InvalidInput(_))),
                "key {key:?} accepted"
            );
        }
    }

    #[test]
    fn memory_store_tracks_sizes() {
        let store = MemoryArtifactStore::new();
        assert!(store.is_empty());
        store.write("one", &[0u8; 10]).unwrap();
        store.write("two", &[0u8; 3]).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.size("one").unwrap(), Some(10));
        store.write("one", &[0u8; 4]).unwrap();
        assert_eq!(store.size("one").unwrap(), Some(4));
    }
}
