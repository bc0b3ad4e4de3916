//! Validating client over an [`EditorBackend`].
//!
//! Every method checks what it can before the editor sees the request.
//! A request that fails validation returns `InvalidArgument` or `NotFound`
//! without any editor call that could mutate state. Backend failures come
//! back wrapped with the operation and its arguments so they can be shown
//! to the caller verbatim.

use std::time::{Duration, Instant};

use montage_common::error::{MontageError, MontageResult};
use montage_project_model::{
    ClipId, Frames, Marker, MarkerCategory, MarkerId, MediaClip, MediaId, MediaKind, ProjectInfo,
    TimelineClip, Track, TrackId, TrackKind, Transition, TransitionId,
};

use crate::backend::{
    AddTransition, BackendError, BackendResult, ClipEdit, EditorBackend, ImportMedia, Imported,
    InsertClip, NewMarker, TrimEdge, UndoStatus,
};

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on one editor call.
    pub call_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// Typed, validating access to the editor's editing primitives.
pub struct AtomicClient<B> {
    backend: B,
    config: ClientConfig,
}

impl<B: EditorBackend> AtomicClient<B> {
    /// Wrap a backend, handing it the configured call timeout.
    pub fn new(mut backend: B, config: ClientConfig) -> Self {
        backend.set_call_timeout(config.call_timeout);
        Self { backend, config }
    }

    pub fn with_defaults(backend: B) -> Self {
        Self::new(backend, ClientConfig::default())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Import a file into the media pool.
    pub fn import_media(&mut self, request: &ImportMedia) -> MontageResult<Imported> {
        if request.source.trim().is_empty() {
            return Err(MontageError::invalid_argument("import source must not be empty"));
        }
        if request.duration == Some(0) {
            return Err(MontageError::invalid_argument(format!(
                "import of {} declares a zero duration",
                request.source
            )));
        }
        let mut request = request.clone();
        if request.kind.is_none() {
            request.kind = Some(MediaKind::from_extension(&request.source).ok_or_else(|| {
                MontageError::invalid_argument(format!(
                    "cannot tell the media kind of {}; pass it explicitly",
                    request.source
                ))
            })?);
        }
        let op = format!("import_media(source={})", request.source);
        self.call(op, |b| b.import_media(&request))
    }

    pub fn add_track(&mut self, kind: TrackKind, name: &str) -> MontageResult<Track> {
        let op = format!("add_track(kind={kind:?}, name={name:?})");
        self.call(op, |b| b.add_track(kind, name))
    }

    /// Place a media clip on a track.
    ///
    /// Checks against a fresh project read that the track and media exist,
    /// that the track accepts the media kind, and that the requested source
    /// range lies inside the media.
    pub fn insert_clip(&mut self, request: &InsertClip) -> MontageResult<TimelineClip> {
        if request.duration == Some(0) {
            return Err(MontageError::invalid_argument("clip duration must be positive"));
        }
        let info = self.project_info()?;
        let track = info
            .track(request.track)
            .ok_or_else(|| MontageError::not_found("track", request.track))?;
        let media = info
            .media(request.media)
            .ok_or_else(|| MontageError::not_found("media", request.media))?;
        if !track.kind.accepts(media.kind) {
            return Err(MontageError::invalid_argument(format!(
                "{} is {:?} media and cannot go on {:?} track {}",
                media.id, media.kind, track.kind, track.id
            )));
        }
        let available = media.available_from(request.source_in);
        if available == 0 {
            return Err(MontageError::invalid_argument(format!(
                "in-point {} is past the end of {} ({} frames)",
                request.source_in, media.id, media.duration
            )));
        }
        if let Some(duration) = request.duration {
            if duration > available && !media.kind.is_still() {
                return Err(MontageError::invalid_argument(format!(
                    "{} has {} frames after in-point {}, {} requested",
                    media.id, available, request.source_in, duration
                )));
            }
        }
        let duration = request.duration.unwrap_or(available);
        if request.position.checked_add(duration).is_none() {
            return Err(past_last_frame(request.position, duration));
        }

        let op = format!(
            "insert_clip(media={}, track={}, position={})",
            request.media, request.track, request.position
        );
        self.call(op, |b| b.insert_clip(request))
    }

    pub fn move_clip(
        &mut self,
        clip: ClipId,
        track: TrackId,
        position: Frames,
    ) -> MontageResult<ClipEdit> {
        let info = self.project_info()?;
        let placed = info
            .clip(clip)
            .ok_or_else(|| MontageError::not_found("clip", clip))?;
        let target = info
            .track(track)
            .ok_or_else(|| MontageError::not_found("track", track))?;
        if let Some(media) = info.media(placed.media) {
            if !target.kind.accepts(media.kind) {
                return Err(MontageError::invalid_argument(format!(
                    "{clip} holds {:?} media and cannot move to {:?} track {track}",
                    media.kind, target.kind
                )));
            }
        }
        if position.checked_add(placed.duration).is_none() {
            return Err(past_last_frame(position, placed.duration));
        }

        let op = format!("move_clip(clip={clip}, track={track}, position={position})");
        self.call(op, |b| b.move_clip(clip, track, position))
    }

    pub fn trim_clip(
        &mut self,
        clip: ClipId,
        duration: Frames,
        edge: TrimEdge,
    ) -> MontageResult<ClipEdit> {
        if duration == 0 {
            return Err(MontageError::invalid_argument(
                "trim would leave a zero-length clip; delete it instead",
            ));
        }
        if edge == TrimEdge::End {
            let info = self.project_info()?;
            let placed = info
                .clip(clip)
                .ok_or_else(|| MontageError::not_found("clip", clip))?;
            if placed.start.checked_add(duration).is_none() {
                return Err(past_last_frame(placed.start, duration));
            }
        }
        let op = format!("trim_clip(clip={clip}, duration={duration}, edge={edge:?})");
        self.call(op, |b| b.trim_clip(clip, duration, edge))
    }

    pub fn delete_clip(&mut self, clip: ClipId) -> MontageResult<Vec<TransitionId>> {
        let op = format!("delete_clip(clip={clip})");
        self.call(op, |b| b.delete_clip(clip))
    }

    pub fn add_transition(&mut self, request: &AddTransition) -> MontageResult<Transition> {
        if request.duration == 0 {
            return Err(MontageError::invalid_argument(
                "transition duration must be positive",
            ));
        }
        if request.from == request.to {
            return Err(MontageError::invalid_argument(format!(
                "a transition needs two different clips, got {} twice",
                request.from
            )));
        }
        let op = format!(
            "add_transition(from={}, to={}, kind={}, duration={})",
            request.from, request.to, request.kind, request.duration
        );
        self.call(op, |b| b.add_transition(request))
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> MontageResult<()> {
        let op = format!("remove_transition(id={id})");
        self.call(op, |b| b.remove_transition(id))
    }

    pub fn add_marker(&mut self, request: &NewMarker) -> MontageResult<Marker> {
        let op = format!(
            "add_marker(position={}, category={}, label={:?})",
            request.position, request.category, request.label
        );
        self.call(op, |b| b.add_marker(request))
    }

    pub fn delete_marker(&mut self, id: MarkerId) -> MontageResult<()> {
        let op = format!("delete_marker(id={id})");
        self.call(op, |b| b.delete_marker(id))
    }

    pub fn delete_markers_by_category(&mut self, category: MarkerCategory) -> MontageResult<usize> {
        let op = format!("delete_markers_by_category(category={category})");
        self.call(op, |b| b.delete_markers_by_category(category))
    }

    /// Point a media pool clip at another file. The source must be an
    /// absolute path of the same media kind.
    pub fn relink_media(&mut self, media: MediaId, source: &str) -> MontageResult<MediaClip> {
        if !std::path::Path::new(source).is_absolute() {
            return Err(MontageError::invalid_argument(format!(
                "relink source must be an absolute path, got {source:?}"
            )));
        }
        let info = self.project_info()?;
        let current = info
            .media(media)
            .ok_or_else(|| MontageError::not_found("media", media))?;
        if let Some(other) = info.media_by_source(source).filter(|m| m.id != media) {
            return Err(MontageError::conflict(format!(
                "{source} is already in the pool as {}",
                other.id
            )));
        }
        if let Some(kind) = MediaKind::from_extension(source) {
            if kind != current.kind {
                return Err(MontageError::invalid_argument(format!(
                    "{media} is {:?} media and cannot point at {:?} file {source}",
                    current.kind, kind
                )));
            }
        }
        let op = format!("relink_media(media={media}, source={source})");
        self.call(op, |b| b.relink_media(media, source))
    }

    pub fn undo(&mut self, steps: usize) -> MontageResult<usize> {
        if steps == 0 {
            return Err(MontageError::invalid_argument("undo needs at least one step"));
        }
        self.call(format!("undo(steps={steps})"), |b| b.undo(steps))
    }

    pub fn redo(&mut self, steps: usize) -> MontageResult<usize> {
        if steps == 0 {
            return Err(MontageError::invalid_argument("redo needs at least one step"));
        }
        self.call(format!("redo(steps={steps})"), |b| b.redo(steps))
    }

    pub fn undo_status(&mut self) -> MontageResult<UndoStatus> {
        self.call("undo_status()".to_string(), |b| b.undo_status())
    }

    /// Read the full project state. Always a fresh read.
    pub fn project_info(&mut self) -> MontageResult<ProjectInfo> {
        self.call("project_info()".to_string(), |b| b.project_info())
    }

    /// Capture the whole project as an opaque snapshot.
    pub fn save_project(&mut self) -> MontageResult<Vec<u8>> {
        self.call("save_project()".to_string(), |b| b.save_project())
    }

    /// Replace the live project with a snapshot.
    pub fn load_project(&mut self, snapshot: &[u8]) -> MontageResult<()> {
        if snapshot.is_empty() {
            return Err(MontageError::invalid_argument("project snapshot is empty"));
        }
        let op = format!("load_project(bytes={})", snapshot.len());
        self.call(op, |b| b.load_project(snapshot))
    }

    fn call<T>(
        &mut self,
        operation: String,
        f: impl FnOnce(&mut B) -> BackendResult<T>,
    ) -> MontageResult<T> {
        let started = Instant::now();
        let result = f(&mut self.backend);
        let elapsed = started.elapsed();

        if elapsed > self.config.call_timeout {
            tracing::warn!(
                backend = self.backend.name(),
                op = %operation,
                elapsed_ms = elapsed.as_millis() as u64,
                "Editor call overran its timeout"
            );
        }

        match result {
            Ok(value) => {
                tracing::debug!(backend = self.backend.name(), op = %operation, "Editor call ok");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    op = %operation,
                    error = %err,
                    "Editor call failed"
                );
                Err(wrap_backend_error(operation, err))
            }
        }
    }
}

fn past_last_frame(position: Frames, duration: Frames) -> MontageError {
    MontageError::invalid_argument(format!(
        "{duration} frames at {position} would run past the last representable frame"
    ))
}

fn wrap_backend_error(operation: String, err: BackendError) -> MontageError {
    match err {
        BackendError::Unreachable(_) | BackendError::Timeout(_) => {
            MontageError::backend_unavailable(operation, err.to_string())
        }
        BackendError::Rejected(reason) => MontageError::backend_rejected(operation, reason),
        BackendError::Missing { entity, id } => MontageError::not_found(entity, id),
    }
}
