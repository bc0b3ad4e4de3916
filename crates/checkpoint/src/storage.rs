//! Where checkpoint blobs and the index live.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use montage_common::error::{MontageError, MontageResult};

use crate::checkpoint::{CheckpointId, CheckpointIndex};

/// Persistence for the checkpoint index and snapshot blobs.
pub trait SnapshotStorage {
    /// Read the stored index; an empty index when nothing was stored yet.
    fn load_index(&self) -> MontageResult<CheckpointIndex>;

    fn save_index(&mut self, index: &CheckpointIndex) -> MontageResult<()>;

    fn write_blob(&mut self, id: CheckpointId, blob: &[u8]) -> MontageResult<()>;

    /// Read a blob. `NotFound` when it is missing.
    fn read_blob(&self, id: CheckpointId) -> MontageResult<Vec<u8>>;

    fn delete_blob(&mut self, id: CheckpointId) -> MontageResult<()>;
}

/// Checkpoints that live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    index: CheckpointIndex,
    blobs: HashMap<CheckpointId, Vec<u8>>,
}

impl SnapshotStorage for MemoryStorage {
    fn load_index(&self) -> MontageResult<CheckpointIndex> {
        Ok(self.index.clone())
    }

    fn save_index(&mut self, index: &CheckpointIndex) -> MontageResult<()> {
        self.index = index.clone();
        Ok(())
    }

    fn write_blob(&mut self, id: CheckpointId, blob: &[u8]) -> MontageResult<()> {
        self.blobs.insert(id, blob.to_vec());
        Ok(())
    }

    fn read_blob(&self, id: CheckpointId) -> MontageResult<Vec<u8>> {
        self.blobs
            .get(&id)
            .cloned()
            .ok_or_else(|| MontageError::not_found("checkpoint snapshot", id))
    }

    fn delete_blob(&mut self, id: CheckpointId) -> MontageResult<()> {
        self.blobs.remove(&id);
        Ok(())
    }
}

/// Checkpoints in a directory: `index.json` plus one `<id>.snapshot` per checkpoint.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    /// Use `root`, creating it if needed.
    pub fn open(root: impl AsRef<Path>) -> MontageResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn blob_path(&self, id: CheckpointId) -> PathBuf {
        self.root.join(format!("{id}.snapshot"))
    }
}

impl SnapshotStorage for DirectoryStorage {
    fn load_index(&self) -> MontageResult<CheckpointIndex> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(CheckpointIndex::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| {
            MontageError::config(format!("checkpoint index {} is corrupt: {e}", path.display()))
        })
    }

    fn save_index(&mut self, index: &CheckpointIndex) -> MontageResult<()> {
        let path = self.index_path();
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(index)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn write_blob(&mut self, id: CheckpointId, blob: &[u8]) -> MontageResult<()> {
        std::fs::write(self.blob_path(id), blob)?;
        Ok(())
    }

    fn read_blob(&self, id: CheckpointId) -> MontageResult<Vec<u8>> {
        let path = self.blob_path(id);
        match std::fs::read(&path) {
            Ok(blob) => Ok(blob),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MontageError::not_found("checkpoint snapshot", id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete_blob(&mut self, id: CheckpointId) -> MontageResult<()> {
        match std::fs::remove_file(self.blob_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
