//! The external editor contract.
//!
//! An [`EditorBackend`] is a thin adapter over one running editor instance
//! (a D-Bus scripting session, a test double, the in-memory reference
//! editor). Each method maps to exactly one editor call; none of them
//! retries, batches, or caches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use montage_project_model::{
    ClipId, Frames, Marker, MarkerCategory, MarkerId, MediaClip, MediaId, MediaKind, ProjectInfo,
    SceneNumber, TimelineClip, Track, TrackId, TrackKind, Transition, TransitionId,
    TransitionKind,
};

/// Failure reported by the editor itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The editor process could not be reached at all.
    #[error("editor unreachable: {0}")]
    Unreachable(String),

    /// The editor did not answer within the call timeout.
    #[error("editor did not answer within {0:?}")]
    Timeout(Duration),

    /// The editor answered and refused the request.
    #[error("{0}")]
    Rejected(String),

    /// The request referenced something the editor does not know.
    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: String },
}

impl BackendError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn missing(entity: &'static str, id: impl ToString) -> Self {
        Self::Missing {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Which edge of a clip a trim moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrimEdge {
    /// Keep the start fixed, move the end.
    #[default]
    End,
    /// Keep the end fixed, move the start (and the source in-point with it).
    Start,
}

/// Import a file into the media pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMedia {
    /// Source path or URI.
    pub source: String,
    /// Media kind; guessed from the extension when absent.
    #[serde(default)]
    pub kind: Option<MediaKind>,
    /// Known duration; the editor probes (or falls back) when absent.
    #[serde(default)]
    pub duration: Option<Frames>,
}

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imported {
    pub media: MediaClip,
    /// False when the source was already in the pool and the existing clip was returned.
    pub newly_added: bool,
}

/// Place a media clip on a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertClip {
    pub media: MediaId,
    pub track: TrackId,
    pub position: Frames,
    /// Source frames to skip.
    #[serde(default)]
    pub source_in: Frames,
    /// Timeline length; the rest of the media from `source_in` when absent.
    #[serde(default)]
    pub duration: Option<Frames>,
    /// Scene tag stored with the placed clip.
    #[serde(default)]
    pub scene: Option<SceneNumber>,
}

/// Add a transition between two overlapping clips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTransition {
    pub from: ClipId,
    pub to: ClipId,
    #[serde(default)]
    pub kind: TransitionKind,
    pub duration: Frames,
}

/// Add a timeline marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMarker {
    pub position: Frames,
    #[serde(default)]
    pub category: MarkerCategory,
    pub label: String,
    #[serde(default)]
    pub note: String,
}

/// Result of an edit that may invalidate transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipEdit {
    /// The clip after the edit.
    pub clip: TimelineClip,
    /// Transitions the editor removed because they no longer fit.
    pub dropped_transitions: Vec<TransitionId>,
}

/// Position in the editor's undo stack.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UndoStatus {
    /// Commands currently applied.
    pub index: usize,
    /// Commands on the stack, undone ones included.
    pub count: usize,
    /// Command the next undo reverts.
    pub undo_text: Option<String>,
    /// Command the next redo reapplies.
    pub redo_text: Option<String>,
}

impl UndoStatus {
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.count
    }
}

/// One running editor instance.
///
/// Implementations bound every call by the timeout handed to
/// [`EditorBackend::set_call_timeout`] and report an overrun as
/// [`BackendError::Timeout`] instead of blocking the caller.
pub trait EditorBackend: Send {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Bound on a single call.
    fn set_call_timeout(&mut self, _timeout: Duration) {}

    fn import_media(&mut self, request: &ImportMedia) -> BackendResult<Imported>;

    fn add_track(&mut self, kind: TrackKind, name: &str) -> BackendResult<Track>;

    fn insert_clip(&mut self, request: &InsertClip) -> BackendResult<TimelineClip>;

    fn move_clip(&mut self, clip: ClipId, track: TrackId, position: Frames)
        -> BackendResult<ClipEdit>;

    fn trim_clip(&mut self, clip: ClipId, duration: Frames, edge: TrimEdge)
        -> BackendResult<ClipEdit>;

    /// Delete a clip. Returns the transitions removed along with it.
    fn delete_clip(&mut self, clip: ClipId) -> BackendResult<Vec<TransitionId>>;

    fn add_transition(&mut self, request: &AddTransition) -> BackendResult<Transition>;

    fn remove_transition(&mut self, id: TransitionId) -> BackendResult<()>;

    fn add_marker(&mut self, request: &NewMarker) -> BackendResult<Marker>;

    fn delete_marker(&mut self, id: MarkerId) -> BackendResult<()>;

    /// Delete every marker of one color. Returns how many were removed.
    fn delete_markers_by_category(&mut self, category: MarkerCategory) -> BackendResult<usize>;

    /// Point a media pool clip at a different source file. Every placed
    /// instance keeps its position, length, and transitions.
    fn relink_media(&mut self, media: MediaId, source: &str) -> BackendResult<MediaClip> {
        Err(unsupported(self.name(), &format!("relinking {media} to {source}")))
    }

    /// Read the full observable project state.
    fn project_info(&self) -> BackendResult<ProjectInfo>;

    /// Encode the complete project into an opaque snapshot.
    fn save_project(&mut self) -> BackendResult<Vec<u8>>;

    /// Replace the live project with a snapshot. Either the whole snapshot
    /// is applied or the live project is left untouched.
    fn load_project(&mut self, snapshot: &[u8]) -> BackendResult<()>;

    /// Revert up to `steps` commands. Returns how many were reverted.
    fn undo(&mut self, _steps: usize) -> BackendResult<usize> {
        Err(unsupported(self.name(), "undo"))
    }

    /// Reapply up to `steps` undone commands. Returns how many were reapplied.
    fn redo(&mut self, _steps: usize) -> BackendResult<usize> {
        Err(unsupported(self.name(), "redo"))
    }

    fn undo_status(&self) -> BackendResult<UndoStatus> {
        Err(unsupported(self.name(), "undo history"))
    }
}

fn unsupported(backend: &str, what: &str) -> BackendError {
    BackendError::rejected(format!("{backend} editor does not support {what}"))
}
