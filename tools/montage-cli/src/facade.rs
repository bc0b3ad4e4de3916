//! Named tools over the composer, the editor client, and the checkpoint store.
//!
//! One [`Facade`] serves one project. Requests are handled one at a time
//! (`&mut self`), each to completion or to its first failure, which is the
//! serialization the composer and checkpoint store rely on.
//!
//! Wire shape: requests are `{"tool": "<name>", "args": {...}}`; responses
//! are `{"ok": true, "result": ...}` or
//! `{"ok": false, "error": {"kind", "message", "committed"?, "failed_step"?}}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use montage_checkpoint::{
    CheckpointId, CheckpointStore, MemoryStorage, RestoreResult, SnapshotStorage,
};
use montage_common::config::{AppConfig, CompositionDefaults};
use montage_common::error::{ErrorKind, MontageError, MontageResult};
use montage_common::timecode::format_timecode;
use montage_composer::{
    default_policies, ComposeError, Composer, ComposerConfig, CompositionRequest, Plan,
    ReplaceError, ReplaceRequest, ReplaceTarget, SceneReplacer, TrackPlan, TransitionPolicy,
};
use montage_editor::{
    AddTransition, AtomicClient, ClientConfig, EditorBackend, ImportMedia, InsertClip, NewMarker,
    TrimEdge,
};
use crate::scan;
use montage_project_model::{
    ClipId, Frames, MarkerCategory, MarkerId, MediaId, SceneNumber, SceneSpec, TrackId, TrackKind,
    TransitionId, TransitionKind, TransitionSpec,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTrackArgs {
    pub kind: TrackKind,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveClipArgs {
    pub clip: ClipId,
    pub track: TrackId,
    pub position: Frames,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimClipArgs {
    pub clip: ClipId,
    pub duration: Frames,
    #[serde(default)]
    pub edge: TrimEdge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipArgs {
    pub clip: ClipId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionArgs {
    pub id: TransitionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionBatchArgs {
    pub transitions: Vec<AddTransition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerArgs {
    pub id: MarkerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerColorArgs {
    /// Color name, case-insensitive.
    pub color: String,
}

/// Import files and compose them as one scene each.
///
/// The files are either `files` or the matches of `pattern` in `directory`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildTimelineArgs {
    #[serde(default)]
    pub files: Vec<String>,
    /// Directory to take scene files from, in file-name order.
    #[serde(default)]
    pub directory: Option<String>,
    /// File-name pattern for `directory`; `*.mp4` when absent.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Uniform transition length; the configured default when absent, 0 for cuts.
    #[serde(default)]
    pub transition_frames: Option<Frames>,
    #[serde(default)]
    pub transition_kind: TransitionKind,
    /// Audio file laid under the whole timeline.
    #[serde(default)]
    pub audio_file: Option<String>,
    /// Scene markers; the configured default when absent.
    #[serde(default)]
    pub scene_markers: Option<bool>,
    /// Frames between scenes joined by a cut; the configured default when absent.
    #[serde(default)]
    pub gap_frames: Option<Frames>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceSceneArgs {
    pub scene: SceneNumber,
    /// Media already in the pool.
    #[serde(default)]
    pub media: Option<MediaId>,
    /// File to import and use instead of `media`.
    #[serde(default)]
    pub new_file: Option<String>,
    #[serde(default)]
    pub source_in: Frames,
}

/// Swap one timeline clip for other media, keeping its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceClipArgs {
    pub clip: ClipId,
    #[serde(default)]
    pub media: Option<MediaId>,
    #[serde(default)]
    pub new_file: Option<String>,
    #[serde(default)]
    pub source_in: Frames,
}

/// Point a media pool clip at another file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelinkClipArgs {
    pub media: MediaId,
    pub new_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsArgs {
    #[serde(default = "one_step")]
    pub steps: usize,
}

impl Default for StepsArgs {
    fn default() -> Self {
        Self { steps: one_step() }
    }
}

fn one_step() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointSaveArgs {
    #[serde(default)]
    pub label: String,
}

/// Restore by id, else by label, else the latest checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointRestoreArgs {
    #[serde(default)]
    pub id: Option<CheckpointId>,
    #[serde(default)]
    pub label: Option<String>,
}

/// One tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case")]
pub enum ToolRequest {
    GetProjectInfo,
    GetTimelineSummary,
    ImportMedia(ImportMedia),
    AddTrack(AddTrackArgs),
    InsertClip(InsertClip),
    MoveClip(MoveClipArgs),
    TrimClip(TrimClipArgs),
    DeleteClip(ClipArgs),
    AddTransition(AddTransition),
    RemoveTransition(TransitionArgs),
    AddTransitionsBatch(TransitionBatchArgs),
    AddMarker(NewMarker),
    DeleteMarker(MarkerArgs),
    DeleteMarkersByColor(MarkerColorArgs),
    ComposeTimeline(CompositionRequest),
    BuildTimeline(BuildTimelineArgs),
    ReplaceScene(ReplaceSceneArgs),
    ReplaceClip(ReplaceClipArgs),
    RelinkClip(RelinkClipArgs),
    CheckpointSave(CheckpointSaveArgs),
    CheckpointRestore(CheckpointRestoreArgs),
    CheckpointList,
    Undo(StepsArgs),
    Redo(StepsArgs),
    UndoStatus,
}

impl ToolRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::GetProjectInfo => "get_project_info",
            ToolRequest::GetTimelineSummary => "get_timeline_summary",
            ToolRequest::ImportMedia(_) => "import_media",
            ToolRequest::AddTrack(_) => "add_track",
            ToolRequest::InsertClip(_) => "insert_clip",
            ToolRequest::MoveClip(_) => "move_clip",
            ToolRequest::TrimClip(_) => "trim_clip",
            ToolRequest::DeleteClip(_) => "delete_clip",
            ToolRequest::AddTransition(_) => "add_transition",
            ToolRequest::RemoveTransition(_) => "remove_transition",
            ToolRequest::AddTransitionsBatch(_) => "add_transitions_batch",
            ToolRequest::AddMarker(_) => "add_marker",
            ToolRequest::DeleteMarker(_) => "delete_marker",
            ToolRequest::DeleteMarkersByColor(_) => "delete_markers_by_color",
            ToolRequest::ComposeTimeline(_) => "compose_timeline",
            ToolRequest::BuildTimeline(_) => "build_timeline",
            ToolRequest::ReplaceScene(_) => "replace_scene",
            ToolRequest::ReplaceClip(_) => "replace_clip",
            ToolRequest::RelinkClip(_) => "relink_clip",
            ToolRequest::CheckpointSave(_) => "checkpoint_save",
            ToolRequest::CheckpointRestore(_) => "checkpoint_restore",
            ToolRequest::CheckpointList => "checkpoint_list",
            ToolRequest::Undo(_) => "undo",
            ToolRequest::Redo(_) => "redo",
            ToolRequest::UndoStatus => "undo_status",
        }
    }
}

/// Structured failure of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
    /// Steps a composite operation committed before failing. Tools that
    /// import media report `{"imports": [...], "ops": [...]}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed: Option<Value>,
    /// The step that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<Value>,
}

impl From<MontageError> for ToolError {
    fn from(err: MontageError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            committed: None,
            failed_step: None,
        }
    }
}

impl From<ComposeError> for ToolError {
    fn from(err: ComposeError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            ComposeError::Preflight(_) => Self {
                kind,
                message,
                committed: None,
                failed_step: None,
            },
            ComposeError::Halted {
                committed,
                failed,
                index,
                ..
            } => Self {
                kind,
                message,
                committed: serde_json::to_value(committed).ok(),
                failed_step: Some(json!({ "index": index, "op": failed })),
            },
        }
    }
}

impl From<ReplaceError> for ToolError {
    fn from(err: ReplaceError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            ReplaceError::Preflight(_) => Self {
                kind,
                message,
                committed: None,
                failed_step: None,
            },
            ReplaceError::Halted {
                completed, failed, ..
            } => Self {
                kind,
                message,
                committed: serde_json::to_value(completed).ok(),
                failed_step: serde_json::to_value(failed).ok(),
            },
            ReplaceError::Incomplete { completed, .. } => Self {
                kind,
                message,
                committed: serde_json::to_value(completed).ok(),
                failed_step: None,
            },
        }
    }
}

impl ToolError {
    /// Report media imported earlier in the same call alongside whatever
    /// editing steps the failure already carries.
    fn with_imports(mut self, imports: &[MediaId]) -> Self {
        let ops = self.committed.take().unwrap_or_else(|| json!([]));
        let nothing = imports.is_empty() && ops.as_array().map_or(false, |a| a.is_empty());
        if !nothing {
            self.committed = Some(json!({ "imports": imports, "ops": ops }));
        }
        self
    }

    fn failed_at(mut self, step: Value) -> Self {
        self.failed_step = Some(step);
        self
    }
}

/// Reply to one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolResponse {
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: ToolError) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error),
        }
    }
}

/// One placed clip in a timeline summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipSummary {
    pub id: ClipId,
    pub media: String,
    pub scene: Option<SceneNumber>,
    pub start: Frames,
    pub end: Frames,
    pub timecode_in: String,
    pub timecode_out: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    pub clips: Vec<ClipSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSummary {
    pub id: MarkerId,
    pub position: Frames,
    pub timecode: String,
    pub category: MarkerCategory,
    pub label: String,
}

/// Human-oriented view of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub name: String,
    pub fps: f64,
    pub end: Frames,
    pub duration: String,
    pub tracks: Vec<TrackSummary>,
    pub transitions: usize,
    pub markers: Vec<MarkerSummary>,
}

/// Name, summary, and argument schema of one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescription {
    pub name: &'static str,
    pub summary: &'static str,
    pub args: Value,
}

/// Serialized access to one project.
pub struct Facade<B, S = MemoryStorage> {
    client: AtomicClient<B>,
    composer: Composer,
    replacer: SceneReplacer,
    checkpoints: CheckpointStore<S>,
    defaults: CompositionDefaults,
}

impl<B: EditorBackend> Facade<B, MemoryStorage> {
    /// Façade with in-memory checkpoints and default settings.
    pub fn in_memory(backend: B) -> Self {
        Self::new(
            backend,
            CheckpointStore::in_memory(),
            &AppConfig::default(),
        )
    }
}

impl<B: EditorBackend, S: SnapshotStorage> Facade<B, S> {
    pub fn new(backend: B, checkpoints: CheckpointStore<S>, config: &AppConfig) -> Self {
        let composer_config = ComposerConfig::from(&config.composition);
        Self {
            client: AtomicClient::new(
                backend,
                ClientConfig {
                    call_timeout: config.editor.call_timeout(),
                },
            ),
            composer: Composer::new(composer_config.clone()),
            replacer: SceneReplacer::new(composer_config),
            checkpoints,
            defaults: config.composition.clone(),
        }
    }

    pub fn client(&self) -> &AtomicClient<B> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut AtomicClient<B> {
        &mut self.client
    }

    pub fn checkpoints(&self) -> &CheckpointStore<S> {
        &self.checkpoints
    }

    /// Parse and run a JSON request.
    pub fn call_json(&mut self, request: &str) -> ToolResponse {
        match serde_json::from_str::<ToolRequest>(request) {
            Ok(request) => self.call(request),
            Err(e) => ToolResponse::failure(ToolError::from(MontageError::invalid_argument(
                format!("malformed tool request: {e}"),
            ))),
        }
    }

    pub fn call(&mut self, request: ToolRequest) -> ToolResponse {
        let tool = request.name();
        tracing::debug!(tool, "Tool call");
        match self.dispatch(request) {
            Ok(result) => ToolResponse::success(result),
            Err(error) => {
                if error.kind.is_caller_error() {
                    tracing::info!(tool, kind = ?error.kind, message = %error.message, "Tool call refused");
                } else {
                    tracing::warn!(tool, kind = ?error.kind, message = %error.message, "Tool call failed");
                }
                ToolResponse::failure(error)
            }
        }
    }

    /// Plan a composition against the live project without running it.
    pub fn plan(&mut self, request: &CompositionRequest) -> MontageResult<Plan> {
        self.composer.plan(&mut self.client, request)
    }

    pub fn timeline_summary(&mut self) -> MontageResult<TimelineSummary> {
        let info = self.client.project_info()?;
        let fps = info.settings.fps;
        let tracks = info
            .ordered_tracks()
            .into_iter()
            .map(|track| TrackSummary {
                id: track.id,
                name: track.name.clone(),
                kind: track.kind,
                clips: info
                    .clips_on_track(track.id)
                    .into_iter()
                    .map(|clip| ClipSummary {
                        id: clip.id,
                        media: info
                            .media(clip.media)
                            .map(|m| m.name.clone())
                            .unwrap_or_else(|| clip.media.to_string()),
                        scene: clip.scene,
                        start: clip.start,
                        end: clip.end(),
                        timecode_in: format_timecode(clip.start, fps),
                        timecode_out: format_timecode(clip.end(), fps),
                    })
                    .collect(),
            })
            .collect();
        let mut markers: Vec<MarkerSummary> = info
            .markers
            .iter()
            .map(|m| MarkerSummary {
                id: m.id,
                position: m.position,
                timecode: format_timecode(m.position, fps),
                category: m.category,
                label: m.label.clone(),
            })
            .collect();
        markers.sort_by_key(|m| (m.position, m.id));
        let end = info.timeline_end();
        Ok(TimelineSummary {
            name: info.settings.name.clone(),
            fps,
            end,
            duration: format_timecode(end, fps),
            tracks,
            transitions: info.transitions.len(),
            markers,
        })
    }

    fn dispatch(&mut self, request: ToolRequest) -> Result<Value, ToolError> {
        match request {
            ToolRequest::GetProjectInfo => to_result(self.client.project_info()?),
            ToolRequest::GetTimelineSummary => to_result(self.timeline_summary()?),
            ToolRequest::ImportMedia(args) => to_result(self.client.import_media(&args)?),
            ToolRequest::AddTrack(args) => to_result(self.client.add_track(args.kind, &args.name)?),
            ToolRequest::InsertClip(args) => to_result(self.client.insert_clip(&args)?),
            ToolRequest::MoveClip(args) => {
                to_result(self.client.move_clip(args.clip, args.track, args.position)?)
            }
            ToolRequest::TrimClip(args) => {
                to_result(self.client.trim_clip(args.clip, args.duration, args.edge)?)
            }
            ToolRequest::DeleteClip(args) => {
                let dropped = self.client.delete_clip(args.clip)?;
                Ok(json!({ "deleted": args.clip, "dropped_transitions": dropped }))
            }
            ToolRequest::AddTransition(args) => to_result(self.client.add_transition(&args)?),
            ToolRequest::RemoveTransition(args) => {
                self.client.remove_transition(args.id)?;
                Ok(json!({ "removed": args.id }))
            }
            ToolRequest::AddTransitionsBatch(args) => self.add_transitions_batch(&args),
            ToolRequest::AddMarker(args) => to_result(self.client.add_marker(&args)?),
            ToolRequest::DeleteMarker(args) => {
                self.client.delete_marker(args.id)?;
                Ok(json!({ "removed": args.id }))
            }
            ToolRequest::DeleteMarkersByColor(args) => {
                let category = args
                    .color
                    .parse::<MarkerCategory>()
                    .map_err(|e| MontageError::invalid_argument(e.to_string()))?;
                let removed = self.client.delete_markers_by_category(category)?;
                Ok(json!({ "color": category, "removed": removed }))
            }
            ToolRequest::ComposeTimeline(request) => {
                to_result(self.composer.compose(&mut self.client, &request)?)
            }
            ToolRequest::BuildTimeline(args) => self.build_timeline(&args),
            ToolRequest::ReplaceScene(args) => self.replace(
                ReplaceTarget::Scene(args.scene),
                args.media,
                args.new_file.as_deref(),
                args.source_in,
            ),
            ToolRequest::ReplaceClip(args) => self.replace(
                ReplaceTarget::Clip(args.clip),
                args.media,
                args.new_file.as_deref(),
                args.source_in,
            ),
            ToolRequest::RelinkClip(args) => {
                to_result(self.client.relink_media(args.media, &args.new_file)?)
            }
            ToolRequest::CheckpointSave(args) => {
                to_result(self.checkpoints.save(&mut self.client, &args.label)?)
            }
            ToolRequest::CheckpointRestore(args) => to_result(self.restore(&args)?),
            ToolRequest::CheckpointList => to_result(self.checkpoints.list()),
            ToolRequest::Undo(args) => {
                let undone = self.client.undo(args.steps)?;
                let status = self.client.undo_status()?;
                Ok(json!({ "undone": undone, "status": status }))
            }
            ToolRequest::Redo(args) => {
                let redone = self.client.redo(args.steps)?;
                let status = self.client.undo_status()?;
                Ok(json!({ "redone": redone, "status": status }))
            }
            ToolRequest::UndoStatus => to_result(self.client.undo_status()?),
        }
    }

    /// Add transitions in order, stopping at the first failure.
    fn add_transitions_batch(&mut self, args: &TransitionBatchArgs) -> Result<Value, ToolError> {
        if args.transitions.is_empty() {
            return Err(MontageError::invalid_argument("transition batch is empty").into());
        }
        let mut added = Vec::with_capacity(args.transitions.len());
        for (index, request) in args.transitions.iter().enumerate() {
            match self.client.add_transition(request) {
                Ok(transition) => added.push(transition),
                Err(err) => {
                    let mut error = ToolError::from(err);
                    error.committed = serde_json::to_value(&added).ok();
                    error.failed_step = Some(json!({ "index": index, "request": request }));
                    return Err(error);
                }
            }
        }
        to_result(added)
    }

    fn build_timeline(&mut self, args: &BuildTimelineArgs) -> Result<Value, ToolError> {
        let files = match (&args.directory, args.files.is_empty()) {
            (None, false) => args.files.clone(),
            (Some(_), false) => {
                return Err(MontageError::invalid_argument(
                    "build_timeline takes files or a directory, not both",
                )
                .into())
            }
            (Some(dir), true) => {
                scan::scene_files(dir, args.pattern.as_deref().unwrap_or(scan::DEFAULT_PATTERN))?
            }
            (None, true) => {
                return Err(MontageError::invalid_argument(
                    "build_timeline needs files or a directory",
                )
                .into())
            }
        };

        let mut imported = Vec::with_capacity(files.len() + 1);
        for file in &files {
            let media = self.import(file).map_err(|err| {
                ToolError::from(err)
                    .with_imports(&imported)
                    .failed_at(json!({ "import": file }))
            })?;
            imported.push(media);
        }
        let scene_media = imported.clone();
        let audio_bed = match &args.audio_file {
            Some(file) => {
                let media = self.import(file).map_err(|err| {
                    ToolError::from(err)
                        .with_imports(&imported)
                        .failed_at(json!({ "import": file }))
                })?;
                imported.push(media);
                Some(media)
            }
            None => None,
        };

        let (default_transitions, default_markers) = default_policies(&self.defaults);
        let transitions = match args.transition_frames {
            Some(0) => TransitionPolicy::cuts(),
            Some(frames) => TransitionPolicy::uniform(TransitionSpec {
                kind: args.transition_kind,
                duration: frames,
            }),
            None => match default_transitions.default {
                Some(spec) => TransitionPolicy::uniform(TransitionSpec {
                    kind: args.transition_kind,
                    ..spec
                }),
                None => TransitionPolicy::cuts(),
            },
        };
        let markers = match args.scene_markers {
            Some(false) => Default::default(),
            Some(true) if default_markers.scene_boundaries.is_none() => {
                montage_composer::MarkerPolicy::scene_boundaries(MarkerCategory::Purple)
            }
            _ => default_markers,
        };
        let scenes = scene_media
            .iter()
            .enumerate()
            .map(|(i, media)| SceneSpec::single(i as SceneNumber + 1, *media))
            .collect();
        let request = CompositionRequest::new(scenes)
            .with_transitions(transitions)
            .with_markers(markers)
            .with_track_plan(TrackPlan {
                audio_bed,
                gap: args.gap_frames.unwrap_or(self.defaults.gap_frames),
                ..Default::default()
            });

        let result = self
            .composer
            .compose(&mut self.client, &request)
            .map_err(|err| ToolError::from(err).with_imports(&imported))?;
        Ok(json!({ "media": scene_media, "composition": result }))
    }

    /// Replace a scene or a clip with pool media or a file imported first.
    fn replace(
        &mut self,
        target: ReplaceTarget,
        media: Option<MediaId>,
        new_file: Option<&str>,
        source_in: Frames,
    ) -> Result<Value, ToolError> {
        let mut imported = Vec::new();
        let media = match (new_file, media) {
            (Some(file), _) => {
                let media = self
                    .import(file)
                    .map_err(|err| ToolError::from(err).failed_at(json!({ "import": file })))?;
                imported.push(media);
                media
            }
            (None, Some(media)) => media,
            (None, None) => {
                return Err(MontageError::invalid_argument(format!(
                    "replacing {target} needs either media or new_file"
                ))
                .into())
            }
        };
        let request = ReplaceRequest {
            target,
            media,
            source_in,
        };
        let result = self
            .replacer
            .replace(&mut self.client, &request)
            .map_err(|err| ToolError::from(err).with_imports(&imported))?;
        to_result(result)
    }

    fn restore(&mut self, args: &CheckpointRestoreArgs) -> MontageResult<RestoreResult> {
        match (&args.id, &args.label) {
            (Some(id), _) => self.checkpoints.restore(&mut self.client, *id),
            (None, Some(label)) => self.checkpoints.restore_label(&mut self.client, label),
            (None, None) => self.checkpoints.restore_latest(&mut self.client),
        }
    }

    fn import(&mut self, source: &str) -> MontageResult<MediaId> {
        let imported = self.client.import_media(&ImportMedia {
            source: source.to_string(),
            kind: None,
            duration: None,
        })?;
        Ok(imported.media.id)
    }
}

fn to_result<T: Serialize>(value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::from(MontageError::from(e)))
}

/// Every tool with a one-line summary and its argument schema.
pub fn describe_tools() -> Vec<ToolDescription> {
    let tool = |name, summary, args| ToolDescription {
        name,
        summary,
        args,
    };
    vec![
        tool("get_project_info", "Full project state: media, tracks, clips, transitions, markers", json!({})),
        tool("get_timeline_summary", "Tracks and markers with timecodes", json!({})),
        tool(
            "import_media",
            "Add a file to the media pool; returns the existing clip for a known source",
            json!({ "source": "string", "kind": "video|audio|image?", "duration": "frames?" }),
        ),
        tool("add_track", "Add a video or audio track", json!({ "kind": "video|audio", "name": "string?" })),
        tool(
            "insert_clip",
            "Place media on a track",
            json!({
                "media": "media id", "track": "track id", "position": "frames",
                "source_in": "frames?", "duration": "frames?", "scene": "scene number?"
            }),
        ),
        tool("move_clip", "Move a clip to a track and position", json!({ "clip": "clip id", "track": "track id", "position": "frames" })),
        tool(
            "trim_clip",
            "Set a clip's length from its start or end edge",
            json!({ "clip": "clip id", "duration": "frames", "edge": "end|start?" }),
        ),
        tool("delete_clip", "Delete a clip and any transitions anchored to it", json!({ "clip": "clip id" })),
        tool(
            "add_transition",
            "Add a transition over the overlap of two clips",
            json!({ "from": "clip id", "to": "clip id", "kind": "cross_dissolve|wipe|slide?", "duration": "frames" }),
        ),
        tool("remove_transition", "Remove a transition", json!({ "id": "transition id" })),
        tool(
            "add_transitions_batch",
            "Add several transitions in order, stopping at the first failure",
            json!({ "transitions": "[add_transition args]" }),
        ),
        tool(
            "add_marker",
            "Add a timeline marker",
            json!({ "position": "frames", "category": "Purple|Blue|Cyan|Green|Yellow|Orange|Red?", "label": "string", "note": "string?" }),
        ),
        tool("delete_marker", "Delete one marker", json!({ "id": "marker id" })),
        tool("delete_markers_by_color", "Delete every marker of one color", json!({ "color": "string" })),
        tool(
            "compose_timeline",
            "Compose scenes into the timeline with transition and marker policies",
            json!({
                "scenes": "[{number, clips: [{media, source_in?, source_out?}], transition?}]",
                "track_plan": "{video_track?, audio_bed?, start?, gap?}?",
                "transitions": "{default?: {kind?, duration}}?",
                "markers": "{scene_boundaries?: color, extra?: [{position, category?, label?, note?}]}?"
            }),
        ),
        tool(
            "build_timeline",
            "Import files (or a directory's matches) and compose them as one scene each",
            json!({
                "files": "[string]?", "directory": "string?", "pattern": "string? (*.mp4)",
                "transition_frames": "frames?", "transition_kind": "string?",
                "audio_file": "string?", "scene_markers": "bool?", "gap_frames": "frames?"
            }),
        ),
        tool(
            "replace_scene",
            "Swap a scene's media, keeping its position, length, and transitions",
            json!({ "scene": "scene number", "media": "media id?", "new_file": "string?", "source_in": "frames?" }),
        ),
        tool(
            "replace_clip",
            "Swap one timeline clip's media, keeping its position, length, and transitions",
            json!({ "clip": "clip id", "media": "media id?", "new_file": "string?", "source_in": "frames?" }),
        ),
        tool(
            "relink_clip",
            "Point a media pool clip at another file; every placed instance stays as it is",
            json!({ "media": "media id", "new_file": "absolute path" }),
        ),
        tool("checkpoint_save", "Snapshot the whole project", json!({ "label": "string?" })),
        tool(
            "checkpoint_restore",
            "Restore a checkpoint by id, by label, or the latest",
            json!({ "id": "cp-NNNN?", "label": "string?" }),
        ),
        tool("checkpoint_list", "List checkpoints", json!({})),
        tool("undo", "Undo the editor's last command(s)", json!({ "steps": "count? (1)" })),
        tool("redo", "Redo undone command(s)", json!({ "steps": "count? (1)" })),
        tool("undo_status", "Undo stack position and the next undo and redo", json!({})),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_editor::InMemoryEditor;
    use montage_project_model::ProjectSettings;

    fn facade() -> Facade<InMemoryEditor> {
        Facade::in_memory(InMemoryEditor::with_standard_tracks(ProjectSettings::default()))
    }

    #[test]
    fn test_every_request_has_a_description() {
        let names: Vec<&str> = describe_tools().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 25);
        let request: ToolRequest = serde_json::from_str(r#"{"tool": "checkpoint_list"}"#).unwrap();
        assert!(names.contains(&request.name()));
    }

    #[test]
    fn test_malformed_request_is_invalid_argument() {
        let mut facade = facade();
        let response = facade.call_json(r#"{"tool": "explode"}"#);
        assert!(!response.ok);
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_unknown_marker_color() {
        let mut facade = facade();
        let response = facade.call(ToolRequest::DeleteMarkersByColor(MarkerColorArgs {
            color: "magenta".to_string(),
        }));
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_replace_needs_media_or_file() {
        let mut facade = facade();
        let response = facade.call(ToolRequest::ReplaceScene(ReplaceSceneArgs {
            scene: 1,
            media: None,
            new_file: None,
            source_in: 0,
        }));
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_imports_fold_into_committed() {
        let bare = ToolError::from(MontageError::invalid_argument("nope")).with_imports(&[]);
        assert!(bare.committed.is_none());

        let mut error = ToolError::from(MontageError::invalid_argument("nope"));
        error.committed = Some(json!([{ "op": "insert_clip" }]));
        let error = error.with_imports(&[MediaId(4)]);
        let committed = error.committed.unwrap();
        assert_eq!(committed["imports"], json!([4]));
        assert_eq!(committed["ops"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_build_needs_exactly_one_file_source() {
        let mut facade = facade();
        let response = facade.call(ToolRequest::BuildTimeline(BuildTimelineArgs::default()));
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidArgument);

        let response = facade.call(ToolRequest::BuildTimeline(BuildTimelineArgs {
            files: vec!["/footage/a.mp4".to_string()],
            directory: Some("/footage".to_string()),
            ..Default::default()
        }));
        assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidArgument);
        assert_eq!(facade.client().backend().mutation_count(), 0);
    }
}
