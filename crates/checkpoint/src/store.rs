//! Save and restore whole-project snapshots.
//!
//! A snapshot is whatever the editor hands back from `save_project`; the
//! store never looks inside it. Restoring goes through `load_project`,
//! which either applies the whole snapshot or leaves the project alone.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use montage_common::error::{MontageError, MontageResult};
use montage_editor::{AtomicClient, EditorBackend};

use crate::checkpoint::{Checkpoint, CheckpointId, CheckpointIndex};
use crate::storage::{DirectoryStorage, MemoryStorage, SnapshotStorage};

/// What a restore brought back.
///
/// The counts come from a read after the load. They are `None` when that
/// read failed; the restore itself still happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreResult {
    pub checkpoint: Checkpoint,
    pub clips: Option<usize>,
    pub transitions: Option<usize>,
    pub markers: Option<usize>,
}

/// Labelled snapshots of one project.
#[derive(Debug)]
pub struct CheckpointStore<S> {
    storage: S,
    index: CheckpointIndex,
}

impl CheckpointStore<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self {
            storage: MemoryStorage::default(),
            index: CheckpointIndex::default(),
        }
    }
}

impl CheckpointStore<DirectoryStorage> {
    /// Open (or start) the checkpoint directory at `root`.
    pub fn open_dir(root: impl AsRef<std::path::Path>) -> MontageResult<Self> {
        Self::open(DirectoryStorage::open(root)?)
    }
}

impl<S: SnapshotStorage> CheckpointStore<S> {
    pub fn open(storage: S) -> MontageResult<Self> {
        let index = storage.load_index()?;
        Ok(Self { storage, index })
    }

    /// Snapshot the live project under `label`.
    ///
    /// Labels need not be unique; an empty label becomes `ckpt-<unix seconds>`.
    pub fn save<B: EditorBackend>(
        &mut self,
        client: &mut AtomicClient<B>,
        label: &str,
    ) -> MontageResult<Checkpoint> {
        let created_at = Utc::now();
        let label = match label.trim() {
            "" => format!("ckpt-{}", created_at.timestamp()),
            trimmed => trimmed.to_string(),
        };

        let snapshot = client.save_project()?;

        let mut index = self.index.clone();
        let id = index.next_id();
        self.storage.write_blob(id, &snapshot)?;
        let checkpoint = Checkpoint {
            id,
            label,
            created_at,
            size_bytes: snapshot.len() as u64,
        };
        index.checkpoints.push(checkpoint.clone());
        if let Err(err) = self.storage.save_index(&index) {
            if let Err(cleanup) = self.storage.delete_blob(id) {
                tracing::warn!(checkpoint = %id, error = %cleanup, "Failed to clean up orphaned snapshot");
            }
            return Err(err);
        }
        self.index = index;

        tracing::info!(
            checkpoint = %checkpoint.id,
            label = %checkpoint.label,
            bytes = checkpoint.size_bytes,
            "Checkpoint saved"
        );
        Ok(checkpoint)
    }

    /// Replace the live project with checkpoint `id`.
    pub fn restore<B: EditorBackend>(
        &self,
        client: &mut AtomicClient<B>,
        id: CheckpointId,
    ) -> MontageResult<RestoreResult> {
        let checkpoint = self
            .index
            .get(id)
            .cloned()
            .ok_or_else(|| MontageError::not_found("checkpoint", id))?;
        let snapshot = self.storage.read_blob(id)?;

        client.load_project(&snapshot)?;

        let info = match client.project_info() {
            Ok(info) => Some(info),
            Err(err) => {
                tracing::warn!(
                    checkpoint = %checkpoint.id,
                    error = %err,
                    "Checkpoint restored but the project could not be read back"
                );
                None
            }
        };
        tracing::info!(
            checkpoint = %checkpoint.id,
            label = %checkpoint.label,
            clips = ?info.as_ref().map(|i| i.clips.len()),
            "Checkpoint restored"
        );
        Ok(RestoreResult {
            checkpoint,
            clips: info.as_ref().map(|i| i.clips.len()),
            transitions: info.as_ref().map(|i| i.transitions.len()),
            markers: info.as_ref().map(|i| i.markers.len()),
        })
    }

    /// Restore the newest checkpoint carrying `label`.
    pub fn restore_label<B: EditorBackend>(
        &self,
        client: &mut AtomicClient<B>,
        label: &str,
    ) -> MontageResult<RestoreResult> {
        let id = self
            .index
            .latest_with_label(label)
            .map(|c| c.id)
            .ok_or_else(|| MontageError::not_found("checkpoint labelled", label))?;
        self.restore(client, id)
    }

    /// Restore the most recently saved checkpoint.
    pub fn restore_latest<B: EditorBackend>(
        &self,
        client: &mut AtomicClient<B>,
    ) -> MontageResult<RestoreResult> {
        let id = self
            .index
            .latest()
            .map(|c| c.id)
            .ok_or_else(|| MontageError::not_found("checkpoint", "latest"))?;
        self.restore(client, id)
    }

    /// Checkpoints in creation order.
    pub fn list(&self) -> &[Checkpoint] {
        &self.index.checkpoints
    }

    pub fn get(&self, id: CheckpointId) -> Option<&Checkpoint> {
        self.index.get(id)
    }

    /// Forget checkpoint `id` and drop its snapshot. Its id is not reused.
    pub fn remove(&mut self, id: CheckpointId) -> MontageResult<Checkpoint> {
        let mut index = self.index.clone();
        let position = index
            .checkpoints
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| MontageError::not_found("checkpoint", id))?;
        let removed = index.checkpoints.remove(position);
        self.storage.save_index(&index)?;
        self.index = index;
        self.storage.delete_blob(id)?;
        tracing::info!(checkpoint = %id, "Checkpoint removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_common::error::ErrorKind;
    use montage_editor::{ImportMedia, InMemoryEditor, InsertClip, NewMarker};
    use montage_project_model::{MarkerCategory, ProjectSettings, TrackKind};

    fn client() -> AtomicClient<InMemoryEditor> {
        AtomicClient::with_defaults(InMemoryEditor::with_standard_tracks(
            ProjectSettings::default(),
        ))
    }

    fn add_clip(client: &mut AtomicClient<InMemoryEditor>, source: &str, position: u64) {
        let media = client
            .import_media(&ImportMedia {
                source: source.to_string(),
                kind: None,
                duration: Some(50),
            })
            .unwrap()
            .media
            .id;
        let track = client
            .project_info()
            .unwrap()
            .first_track(TrackKind::Video)
            .unwrap()
            .id;
        client
            .insert_clip(&InsertClip {
                media,
                track,
                position,
                source_in: 0,
                duration: None,
                scene: Some(1),
            })
            .unwrap();
    }

    #[test]
    fn test_restore_reproduces_saved_state() {
        let mut client = client();
        let mut store = CheckpointStore::in_memory();
        add_clip(&mut client, "/clips/a.mp4", 0);
        let saved = client.project_info().unwrap();
        let checkpoint = store.save(&mut client, "first cut").unwrap();

        add_clip(&mut client, "/clips/b.mp4", 50);
        client
            .add_marker(&NewMarker {
                position: 10,
                category: MarkerCategory::Red,
                label: "oops".to_string(),
                note: String::new(),
            })
            .unwrap();
        assert_ne!(client.project_info().unwrap(), saved);

        let restored = store.restore(&mut client, checkpoint.id).unwrap();
        assert_eq!(client.project_info().unwrap(), saved);
        assert_eq!(restored.clips, Some(1));
        assert_eq!(restored.markers, Some(0));
    }

    #[test]
    fn test_unknown_checkpoint_is_not_found() {
        let mut client = client();
        let store = CheckpointStore::in_memory();
        let err = store.restore(&mut client, CheckpointId(9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            store.restore_latest(&mut client).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_ids_are_unique_and_never_reused() {
        let mut client = client();
        let mut store = CheckpointStore::in_memory();
        let a = store.save(&mut client, "same").unwrap();
        let b = store.save(&mut client, "same").unwrap();
        assert_ne!(a.id, b.id);

        store.remove(b.id).unwrap();
        let c = store.save(&mut client, "").unwrap();
        assert!(c.id > b.id);
        assert!(c.label.starts_with("ckpt-"));
        assert_eq!(store.list().len(), 2);

        let err = store.restore(&mut client, b.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_restore_label_picks_newest() {
        let mut client = client();
        let mut store = CheckpointStore::in_memory();
        store.save(&mut client, "draft").unwrap();
        add_clip(&mut client, "/clips/a.mp4", 0);
        store.save(&mut client, "draft").unwrap();
        add_clip(&mut client, "/clips/b.mp4", 50);

        let restored = store.restore_label(&mut client, "draft").unwrap();
        assert_eq!(restored.clips, Some(1));
        assert_eq!(
            store.restore_label(&mut client, "final").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_failed_load_leaves_project_unchanged() {
        let mut client = client();
        let mut store = CheckpointStore::in_memory();
        let checkpoint = store.save(&mut client, "empty").unwrap();
        add_clip(&mut client, "/clips/a.mp4", 0);
        let before = client.project_info().unwrap();

        client
            .backend_mut()
            .fail_mutation(1, montage_editor::Fault::Reject("busy".to_string()));
        let err = store.restore(&mut client, checkpoint.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendRejected);
        assert_eq!(client.project_info().unwrap(), before);
    }

    #[test]
    fn test_directory_store_survives_reopen() {
        let dir = std::env::temp_dir().join("montage_test_checkpoint_dir");
        let _ = std::fs::remove_dir_all(&dir);

        let mut client = client();
        add_clip(&mut client, "/clips/a.mp4", 0);
        let saved = client.project_info().unwrap();
        let id = {
            let mut store = CheckpointStore::open_dir(&dir).unwrap();
            store.save(&mut client, "on disk").unwrap().id
        };
        add_clip(&mut client, "/clips/b.mp4", 50);

        let store = CheckpointStore::open_dir(&dir).unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get(id).unwrap().label, "on disk");
        store.restore(&mut client, id).unwrap();
        assert_eq!(client.project_info().unwrap(), saved);

        std::fs::remove_file(dir.join(format!("{id}.snapshot"))).unwrap();
        let err = store.restore(&mut client, id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        std::fs::remove_dir_all(&dir).ok();
    }
}
