//! On-disk project layout for the command-line tool.
//!
//! ```text
//! <root>/
//!   meta/editor.json     editor state
//!   checkpoints/         index.json + <id>.snapshot
//! ```

use std::path::{Path, PathBuf};

use montage_checkpoint::{CheckpointStore, DirectoryStorage};
use montage_common::config::AppConfig;
use montage_common::error::{MontageError, MontageResult};
use montage_editor::InMemoryEditor;
use montage_project_model::ProjectSettings;

use crate::facade::Facade;

/// Façade over a project directory.
pub type DiskFacade = Facade<InMemoryEditor, DirectoryStorage>;

/// A project directory on disk.
#[derive(Debug, Clone)]
pub struct ProjectDir {
    /// Filesystem path to the project directory.
    pub root: PathBuf,
}

impl ProjectDir {
    /// Create a project with one video and one audio track.
    pub fn create(root: impl AsRef<Path>, name: &str, fps: f64) -> MontageResult<Self> {
        let dir = Self {
            root: root.as_ref().to_path_buf(),
        };
        if dir.editor_path().exists() {
            return Err(MontageError::conflict(format!(
                "a project already exists at {}",
                dir.root.display()
            )));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(MontageError::invalid_argument(format!(
                "frame rate must be positive, got {fps}"
            )));
        }

        std::fs::create_dir_all(dir.root.join("meta"))?;
        std::fs::create_dir_all(dir.checkpoints_path())?;
        InMemoryEditor::with_standard_tracks(ProjectSettings {
            name: name.to_string(),
            fps,
        })
        .persist(dir.editor_path())?;

        tracing::info!(root = %dir.root.display(), name, "Project created");
        Ok(dir)
    }

    pub fn open(root: impl AsRef<Path>) -> MontageResult<Self> {
        let dir = Self {
            root: root.as_ref().to_path_buf(),
        };
        if !dir.editor_path().exists() {
            return Err(MontageError::not_found("project", dir.root.display()));
        }
        Ok(dir)
    }

    pub fn editor_path(&self) -> PathBuf {
        self.root.join("meta").join("editor.json")
    }

    pub fn checkpoints_path(&self) -> PathBuf {
        self.root.join("checkpoints")
    }

    /// Load the editor state and checkpoint index behind a façade.
    pub fn load(&self, config: &AppConfig) -> MontageResult<DiskFacade> {
        let editor = InMemoryEditor::open(self.editor_path())?
            .with_fallback_clip_frames(config.editor.fallback_clip_frames);
        let checkpoints = CheckpointStore::open_dir(self.checkpoints_path())?;
        Ok(Facade::new(editor, checkpoints, config))
    }

    /// Write the editor state back.
    pub fn persist(&self, facade: &DiskFacade) -> MontageResult<()> {
        facade.client().backend().persist(self.editor_path())
    }
}
