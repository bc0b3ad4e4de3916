//! In-memory reference editor.
//!
//! A complete [`EditorBackend`] that keeps the project in process memory.
//! It enforces the same rules a real editor does, so composition logic can
//! be exercised without one:
//! - ids are unique and never reissued, not even after a snapshot restore
//! - clips only land on tracks that accept their media kind
//! - on one track no clip may cover another completely, and no frame may be
//!   covered by more than two clips
//! - a transition's span stays inside the overlap of its two clips; edits
//!   that break this drop the transition
//!
//! Every command that changes the project goes on an undo stack, which
//! undo and redo walk the way an editor's history panel does.
//!
//! Snapshots are the JSON encoding of [`EditorState`]. The state can also be
//! persisted to a file, undo stack included, so a sandbox project survives
//! between processes.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use montage_common::error::{MontageError, MontageResult};
use montage_project_model::{
    source_name, transition_span, ClipId, Frames, Marker, MarkerCategory, MarkerId, MediaClip,
    MediaId, MediaKind, ProjectInfo, ProjectSettings, Span, TimelineClip, Track, TrackId, TrackKind,
    Transition, TransitionId,
};

use crate::backend::{
    AddTransition, BackendError, BackendResult, ClipEdit, EditorBackend, ImportMedia, Imported,
    InsertClip, NewMarker, TrimEdge, UndoStatus,
};

/// Last id issued per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdCounters {
    pub media: u64,
    pub track: u64,
    pub clip: u64,
    pub transition: u64,
    pub marker: u64,
}

impl IdCounters {
    fn merge_max(self, other: IdCounters) -> IdCounters {
        IdCounters {
            media: self.media.max(other.media),
            track: self.track.max(other.track),
            clip: self.clip.max(other.clip),
            transition: self.transition.max(other.transition),
            marker: self.marker.max(other.marker),
        }
    }
}

/// Complete editor state, including what callers cannot observe.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorState {
    pub settings: ProjectSettings,
    pub media: Vec<MediaClip>,
    pub tracks: Vec<Track>,
    pub clips: Vec<TimelineClip>,
    pub transitions: Vec<Transition>,
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub counters: IdCounters,
}

/// Commands kept on the undo stack.
const UNDO_LIMIT: usize = 100;

/// One command on the undo stack and the state on its other side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UndoEntry {
    label: String,
    state: EditorState,
}

/// The editor's undo stack. Loading a project clears it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UndoHistory {
    /// Applied commands, oldest first, each with the state before it.
    done: Vec<UndoEntry>,
    /// Undone commands, most recently undone last, each with the state after it.
    undone: Vec<UndoEntry>,
}

impl UndoHistory {
    pub fn is_empty(&self) -> bool {
        self.done.is_empty() && self.undone.is_empty()
    }
}

/// On-disk form of a sandbox project: the state plus its undo stack.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    #[serde(flatten)]
    state: EditorState,
    #[serde(default, skip_serializing_if = "UndoHistory::is_empty")]
    history: UndoHistory,
}

/// Failure the editor can be told to produce on a future call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Unreachable,
    Timeout,
    Reject(String),
}

/// The in-memory editor.
#[derive(Debug)]
pub struct InMemoryEditor {
    state: EditorState,
    history: UndoHistory,
    fallback_clip_frames: Frames,
    call_timeout: Duration,
    unavailable: bool,
    mutations: u64,
    scheduled: BTreeMap<u64, Fault>,
}

impl InMemoryEditor {
    /// Empty project without tracks.
    pub fn new(settings: ProjectSettings) -> Self {
        Self::from_state(EditorState {
            settings,
            ..Default::default()
        })
    }

    /// Empty project with one video track (`V1`) and one audio track (`A1`).
    pub fn with_standard_tracks(settings: ProjectSettings) -> Self {
        let mut editor = Self::new(settings);
        editor.push_track(TrackKind::Video, "V1");
        editor.push_track(TrackKind::Audio, "A1");
        editor
    }

    pub fn from_state(state: EditorState) -> Self {
        Self {
            state,
            history: UndoHistory::default(),
            fallback_clip_frames: 125,
            call_timeout: Duration::from_secs(5),
            unavailable: false,
            mutations: 0,
            scheduled: BTreeMap::new(),
        }
    }

    /// Duration given to media that arrives without one.
    pub fn with_fallback_clip_frames(mut self, frames: Frames) -> Self {
        self.fallback_clip_frames = frames.max(1);
        self
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// Load a persisted state file, undo stack included.
    pub fn open(path: impl AsRef<Path>) -> MontageResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let session: SessionFile = serde_json::from_str(&content)?;
        let mut editor = Self::from_state(session.state);
        editor.history = session.history;
        Ok(editor)
    }

    /// Write the state and undo stack to a file, creating parent directories.
    pub fn persist(&self, path: impl AsRef<Path>) -> MontageResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let session = SessionFile {
            state: self.state.clone(),
            history: self.history.clone(),
        };
        let json = serde_json::to_string_pretty(&session)?;
        std::fs::write(path, json).map_err(MontageError::from)
    }

    /// Make every call fail as unreachable until switched back.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Fail the `nth` mutating call from now (1 = the next one).
    pub fn fail_mutation(&mut self, nth: u64, fault: Fault) {
        self.scheduled.insert(self.mutations + nth.max(1), fault);
    }

    /// Number of mutating calls received so far, failed ones included.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    fn check_reachable(&self) -> BackendResult<()> {
        if self.unavailable {
            return Err(BackendError::Unreachable("editor is not running".to_string()));
        }
        Ok(())
    }

    fn begin_mutation(&mut self) -> BackendResult<()> {
        self.check_reachable()?;
        self.mutations += 1;
        match self.scheduled.remove(&self.mutations) {
            None => Ok(()),
            Some(Fault::Unreachable) => Err(BackendError::Unreachable(
                "connection to editor lost".to_string(),
            )),
            Some(Fault::Timeout) => Err(BackendError::Timeout(self.call_timeout)),
            Some(Fault::Reject(reason)) => Err(BackendError::Rejected(reason)),
        }
    }

    /// Run one mutating command. A command that changed the state goes on
    /// the undo stack and clears the redo side.
    fn edit<T>(
        &mut self,
        label: &str,
        apply: impl FnOnce(&mut Self) -> BackendResult<T>,
    ) -> BackendResult<T> {
        self.begin_mutation()?;
        let before = self.state.clone();
        let out = apply(self)?;
        if self.state != before {
            self.history.done.push(UndoEntry {
                label: label.to_string(),
                state: before,
            });
            if self.history.done.len() > UNDO_LIMIT {
                self.history.done.remove(0);
            }
            self.history.undone.clear();
        }
        Ok(out)
    }

    /// Put `state` in place and return the one it replaced. Id counters
    /// only move forward.
    fn swap_state(&mut self, mut state: EditorState) -> EditorState {
        state.counters = state.counters.merge_max(self.state.counters);
        std::mem::replace(&mut self.state, state)
    }

    fn push_track(&mut self, kind: TrackKind, name: &str) -> Track {
        self.state.counters.track += 1;
        let index = self
            .state
            .tracks
            .iter()
            .map(|t| t.index + 1)
            .max()
            .unwrap_or(0);
        let name = if name.trim().is_empty() {
            let same_kind = self.state.tracks.iter().filter(|t| t.kind == kind).count();
            format!("{}{}", kind.letter(), same_kind + 1)
        } else {
            name.to_string()
        };
        let track = Track {
            id: TrackId(self.state.counters.track),
            kind,
            name,
            index,
        };
        self.state.tracks.push(track.clone());
        track
    }

    fn media(&self, id: MediaId) -> BackendResult<&MediaClip> {
        self.state
            .media
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| BackendError::missing("media", id))
    }

    fn track(&self, id: TrackId) -> BackendResult<&Track> {
        self.state
            .tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| BackendError::missing("track", id))
    }

    fn clip_index(&self, id: ClipId) -> BackendResult<usize> {
        self.state
            .clips
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| BackendError::missing("clip", id))
    }

    /// Check that `span` can be occupied on `track`, ignoring clip `moving`.
    fn check_placement(
        &self,
        track: TrackId,
        span: Span,
        moving: Option<ClipId>,
    ) -> BackendResult<()> {
        let neighbours: Vec<&TimelineClip> = self
            .state
            .clips
            .iter()
            .filter(|c| c.track == track && Some(c.id) != moving && c.span().overlaps(&span))
            .collect();

        for other in &neighbours {
            let other_span = other.span();
            if other_span.contains_span(&span) || span.contains_span(&other_span) {
                return Err(BackendError::rejected(format!(
                    "{span} on {track} would stack on top of {} at {other_span}",
                    other.id
                )));
            }
        }
        for (i, a) in neighbours.iter().enumerate() {
            for b in &neighbours[i + 1..] {
                let triple = a
                    .span()
                    .intersect(&b.span())
                    .and_then(|ab| ab.intersect(&span));
                if let Some(region) = triple {
                    return Err(BackendError::rejected(format!(
                        "{region} on {track} would be covered by three clips"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Refresh transition spans and drop the ones that no longer fit.
    fn reconcile_transitions(&mut self) -> Vec<TransitionId> {
        let clips = &self.state.clips;
        let mut dropped = Vec::new();
        self.state.transitions.retain_mut(|t| {
            let from = clips.iter().find(|c| c.id == t.from);
            let to = clips.iter().find(|c| c.id == t.to);
            match (from, to) {
                (Some(from), Some(to)) => match transition_span(from, to, t.duration) {
                    Some(span) => {
                        t.span = span;
                        true
                    }
                    None => {
                        dropped.push(t.id);
                        false
                    }
                },
                _ => {
                    dropped.push(t.id);
                    false
                }
            }
        });
        if !dropped.is_empty() {
            tracing::debug!(dropped = ?dropped, "Dropped transitions that no longer fit");
        }
        dropped
    }

    fn finish_clip_edit(&mut self, index: usize) -> ClipEdit {
        let dropped_transitions = self.reconcile_transitions();
        ClipEdit {
            clip: self.state.clips[index].clone(),
            dropped_transitions,
        }
    }
}

/// Commands applied directly to the state, without the mutation
/// bookkeeping [`InMemoryEditor::edit`] wraps around them.
impl InMemoryEditor {
    fn apply_import_media(&mut self, request: &ImportMedia) -> BackendResult<Imported> {
        if let Some(existing) = self.state.media.iter().find(|m| m.source == request.source) {
            return Ok(Imported {
                media: existing.clone(),
                newly_added: false,
            });
        }

        let kind = request
            .kind
            .or_else(|| MediaKind::from_extension(&request.source))
            .ok_or_else(|| {
                BackendError::rejected(format!("unsupported media type: {}", request.source))
            })?;
        let duration = request.duration.unwrap_or(self.fallback_clip_frames);
        if duration == 0 {
            return Err(BackendError::rejected(format!(
                "{} has no frames",
                request.source
            )));
        }

        self.state.counters.media += 1;
        let media = MediaClip {
            id: MediaId(self.state.counters.media),
            name: source_name(&request.source),
            source: request.source.clone(),
            kind,
            duration,
        };
        self.state.media.push(media.clone());
        Ok(Imported {
            media,
            newly_added: true,
        })
    }

    fn apply_add_track(&mut self, kind: TrackKind, name: &str) -> BackendResult<Track> {
        Ok(self.push_track(kind, name))
    }

    fn apply_insert_clip(&mut self, request: &InsertClip) -> BackendResult<TimelineClip> {
        let track = self.track(request.track)?;
        let media = self.media(request.media)?;
        if !track.kind.accepts(media.kind) {
            return Err(BackendError::rejected(format!(
                "{:?} track {} does not accept {:?} media",
                track.kind, track.id, media.kind
            )));
        }
        let available = media.available_from(request.source_in);
        let duration = request.duration.unwrap_or(available);
        if duration == 0 {
            return Err(BackendError::rejected(format!(
                "nothing left of {} after in-point {}",
                media.id, request.source_in
            )));
        }
        if !media.kind.is_still() && duration > available {
            return Err(BackendError::rejected(format!(
                "{} is {} frames, cannot place {} frames from {}",
                media.id, media.duration, duration, request.source_in
            )));
        }
        let source_in = if media.kind.is_still() {
            0
        } else {
            request.source_in
        };

        let span = Span::checked_at(request.position, duration).ok_or_else(|| {
            BackendError::rejected(format!(
                "{duration} frames at {} run past the last frame",
                request.position
            ))
        })?;
        self.check_placement(request.track, span, None)?;

        self.state.counters.clip += 1;
        let clip = TimelineClip {
            id: ClipId(self.state.counters.clip),
            media: request.media,
            track: request.track,
            start: request.position,
            duration,
            source_in,
            scene: request.scene,
        };
        self.state.clips.push(clip.clone());
        Ok(clip)
    }

    fn apply_move_clip(
        &mut self,
        clip: ClipId,
        track: TrackId,
        position: Frames,
    ) -> BackendResult<ClipEdit> {
        let index = self.clip_index(clip)?;
        let current = &self.state.clips[index];
        let target = self.track(track)?;
        let media = self.media(current.media)?;
        if !target.kind.accepts(media.kind) {
            return Err(BackendError::rejected(format!(
                "{:?} track {} does not accept {:?} media",
                target.kind, target.id, media.kind
            )));
        }
        let span = Span::checked_at(position, current.duration).ok_or_else(|| {
            BackendError::rejected(format!("{clip} at {position} runs past the last frame"))
        })?;
        self.check_placement(track, span, Some(clip))?;

        let placed = &mut self.state.clips[index];
        placed.track = track;
        placed.start = position;
        Ok(self.finish_clip_edit(index))
    }

    fn apply_trim_clip(
        &mut self,
        clip: ClipId,
        duration: Frames,
        edge: TrimEdge,
    ) -> BackendResult<ClipEdit> {
        let index = self.clip_index(clip)?;
        let current = self.state.clips[index].clone();
        let media = self.media(current.media)?;
        let still = media.kind.is_still();

        let (start, source_in) = match edge {
            TrimEdge::End => {
                let source_end = current.source_in.checked_add(duration);
                if !still && source_end.map_or(true, |end| end > media.duration) {
                    return Err(BackendError::rejected(format!(
                        "{clip} cannot grow to {duration} frames: media ends after {} frames",
                        media.duration - current.source_in
                    )));
                }
                (current.start, current.source_in)
            }
            TrimEdge::Start if duration <= current.duration => {
                let shrink = current.duration - duration;
                let source_in = if still { 0 } else { current.source_in + shrink };
                (current.start + shrink, source_in)
            }
            TrimEdge::Start => {
                let grow = duration - current.duration;
                if grow > current.start || (!still && grow > current.source_in) {
                    return Err(BackendError::rejected(format!(
                        "{clip} cannot extend {grow} frames to the left"
                    )));
                }
                let source_in = if still { 0 } else { current.source_in - grow };
                (current.start - grow, source_in)
            }
        };

        let span = Span::checked_at(start, duration).ok_or_else(|| {
            BackendError::rejected(format!("{clip} cannot grow to {duration} frames at {start}"))
        })?;
        self.check_placement(current.track, span, Some(clip))?;

        let placed = &mut self.state.clips[index];
        placed.start = start;
        placed.duration = duration;
        placed.source_in = source_in;
        Ok(self.finish_clip_edit(index))
    }

    fn apply_delete_clip(&mut self, clip: ClipId) -> BackendResult<Vec<TransitionId>> {
        let index = self.clip_index(clip)?;
        self.state.clips.remove(index);
        Ok(self.reconcile_transitions())
    }

    fn apply_add_transition(&mut self, request: &AddTransition) -> BackendResult<Transition> {
        let from = &self.state.clips[self.clip_index(request.from)?];
        let to = &self.state.clips[self.clip_index(request.to)?];
        if self
            .state
            .transitions
            .iter()
            .any(|t| t.from == request.from && t.to == request.to)
        {
            return Err(BackendError::rejected(format!(
                "{} and {} already share a transition",
                request.from, request.to
            )));
        }
        let span = transition_span(from, to, request.duration).ok_or_else(|| {
            BackendError::rejected(format!(
                "{} ({}) and {} ({}) do not overlap by {} frames",
                from.id,
                from.span(),
                to.id,
                to.span(),
                request.duration
            ))
        })?;

        self.state.counters.transition += 1;
        let transition = Transition {
            id: TransitionId(self.state.counters.transition),
            from: request.from,
            to: request.to,
            kind: request.kind,
            duration: request.duration,
            span,
        };
        self.state.transitions.push(transition.clone());
        Ok(transition)
    }

    fn apply_remove_transition(&mut self, id: TransitionId) -> BackendResult<()> {
        let index = self
            .state
            .transitions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| BackendError::missing("transition", id))?;
        self.state.transitions.remove(index);
        Ok(())
    }

    fn apply_add_marker(&mut self, request: &NewMarker) -> BackendResult<Marker> {
        self.state.counters.marker += 1;
        let marker = Marker {
            id: MarkerId(self.state.counters.marker),
            position: request.position,
            category: request.category,
            label: request.label.clone(),
            note: request.note.clone(),
        };
        self.state.markers.push(marker.clone());
        Ok(marker)
    }

    fn apply_delete_marker(&mut self, id: MarkerId) -> BackendResult<()> {
        let index = self
            .state
            .markers
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| BackendError::missing("marker", id))?;
        self.state.markers.remove(index);
        Ok(())
    }

    fn apply_delete_markers_by_category(&mut self, category: MarkerCategory) -> BackendResult<usize> {
        let before = self.state.markers.len();
        self.state.markers.retain(|m| m.category != category);
        Ok(before - self.state.markers.len())
    }

    fn apply_relink_media(&mut self, id: MediaId, source: &str) -> BackendResult<MediaClip> {
        if let Some(other) = self.state.media.iter().find(|m| m.source == source && m.id != id) {
            return Err(BackendError::rejected(format!(
                "{source} is already in the pool as {}",
                other.id
            )));
        }
        let index = self
            .state
            .media
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| BackendError::missing("media", id))?;
        let current = &self.state.media[index];
        if let Some(kind) = MediaKind::from_extension(source) {
            if kind != current.kind {
                return Err(BackendError::rejected(format!(
                    "{id} is {:?} media and cannot be relinked to {:?} file {source}",
                    current.kind, kind
                )));
            }
        }
        let media = &mut self.state.media[index];
        media.source = source.to_string();
        media.name = source_name(source);
        Ok(media.clone())
    }
}

impl EditorBackend for InMemoryEditor {
    fn name(&self) -> &str {
        "memory"
    }

    fn set_call_timeout(&mut self, timeout: Duration) {
        self.call_timeout = timeout;
    }

    fn import_media(&mut self, request: &ImportMedia) -> BackendResult<Imported> {
        self.edit("Import media", |ed| ed.apply_import_media(request))
    }

    fn add_track(&mut self, kind: TrackKind, name: &str) -> BackendResult<Track> {
        self.edit("Add track", |ed| ed.apply_add_track(kind, name))
    }

    fn insert_clip(&mut self, request: &InsertClip) -> BackendResult<TimelineClip> {
        self.edit("Insert clip", |ed| ed.apply_insert_clip(request))
    }

    fn move_clip(
        &mut self,
        clip: ClipId,
        track: TrackId,
        position: Frames,
    ) -> BackendResult<ClipEdit> {
        self.edit("Move clip", |ed| ed.apply_move_clip(clip, track, position))
    }

    fn trim_clip(
        &mut self,
        clip: ClipId,
        duration: Frames,
        edge: TrimEdge,
    ) -> BackendResult<ClipEdit> {
        self.edit("Resize clip", |ed| ed.apply_trim_clip(clip, duration, edge))
    }

    fn delete_clip(&mut self, clip: ClipId) -> BackendResult<Vec<TransitionId>> {
        self.edit("Delete clip", |ed| ed.apply_delete_clip(clip))
    }

    fn add_transition(&mut self, request: &AddTransition) -> BackendResult<Transition> {
        self.edit("Add mix", |ed| ed.apply_add_transition(request))
    }

    fn remove_transition(&mut self, id: TransitionId) -> BackendResult<()> {
        self.edit("Remove mix", |ed| ed.apply_remove_transition(id))
    }

    fn add_marker(&mut self, request: &NewMarker) -> BackendResult<Marker> {
        self.edit("Add marker", |ed| ed.apply_add_marker(request))
    }

    fn delete_marker(&mut self, id: MarkerId) -> BackendResult<()> {
        self.edit("Delete marker", |ed| ed.apply_delete_marker(id))
    }

    fn delete_markers_by_category(&mut self, category: MarkerCategory) -> BackendResult<usize> {
        self.edit("Delete markers", |ed| {
            ed.apply_delete_markers_by_category(category)
        })
    }

    fn relink_media(&mut self, media: MediaId, source: &str) -> BackendResult<MediaClip> {
        self.edit("Relink clip", |ed| ed.apply_relink_media(media, source))
    }

    fn project_info(&self) -> BackendResult<ProjectInfo> {
        self.check_reachable()?;
        let state = &self.state;
        Ok(ProjectInfo {
            settings: state.settings.clone(),
            media: state.media.clone(),
            tracks: state.tracks.clone(),
            clips: state.clips.clone(),
            transitions: state.transitions.clone(),
            markers: state.markers.clone(),
        })
    }

    fn save_project(&mut self) -> BackendResult<Vec<u8>> {
        self.check_reachable()?;
        serde_json::to_vec(&self.state)
            .map_err(|e| BackendError::rejected(format!("cannot encode project: {e}")))
    }

    fn load_project(&mut self, snapshot: &[u8]) -> BackendResult<()> {
        self.begin_mutation()?;
        let mut restored: EditorState = serde_json::from_slice(snapshot)
            .map_err(|e| BackendError::rejected(format!("not a project snapshot: {e}")))?;
        restored.counters = restored.counters.merge_max(self.state.counters);
        self.state = restored;
        self.history = UndoHistory::default();
        Ok(())
    }

    fn undo(&mut self, steps: usize) -> BackendResult<usize> {
        self.begin_mutation()?;
        let mut undone = 0;
        while undone < steps {
            let Some(entry) = self.history.done.pop() else {
                break;
            };
            let current = self.swap_state(entry.state);
            self.history.undone.push(UndoEntry {
                label: entry.label,
                state: current,
            });
            undone += 1;
        }
        Ok(undone)
    }

    fn redo(&mut self, steps: usize) -> BackendResult<usize> {
        self.begin_mutation()?;
        let mut redone = 0;
        while redone < steps {
            let Some(entry) = self.history.undone.pop() else {
                break;
            };
            let current = self.swap_state(entry.state);
            self.history.done.push(UndoEntry {
                label: entry.label,
                state: current,
            });
            redone += 1;
        }
        Ok(redone)
    }

    fn undo_status(&self) -> BackendResult<UndoStatus> {
        self.check_reachable()?;
        let history = &self.history;
        Ok(UndoStatus {
            index: history.done.len(),
            count: history.done.len() + history.undone.len(),
            undo_text: history.done.last().map(|e| e.label.clone()),
            redo_text: history.undone.last().map(|e| e.label.clone()),
        })
    }
}
