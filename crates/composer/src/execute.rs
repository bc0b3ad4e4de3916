//! Sequential plan execution.

use serde::{Deserialize, Serialize};

use montage_common::config::CompositionDefaults;
use montage_common::error::{ErrorKind, MontageError, MontageResult};
use montage_editor::{AddTransition, AtomicClient, EditorBackend, InsertClip, NewMarker};
use montage_project_model::{
    ClipId, MarkerId, ProjectInfo, SceneNumber, TrackId, TrackKind, TransitionId,
};

use crate::error::ComposeError;
use crate::plan::{plan, Plan, PlannedOp, TrackRef};
use crate::policy::CompositionRequest;

/// Composer settings.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Extra attempts for the initial project read when the editor is unavailable.
    pub read_retries: u32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self { read_retries: 2 }
    }
}

impl From<&CompositionDefaults> for ComposerConfig {
    fn from(defaults: &CompositionDefaults) -> Self {
        Self {
            read_retries: defaults.read_retries,
        }
    }
}

/// What a committed op created in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "created", content = "id", rename_all = "snake_case")]
pub enum OpOutcome {
    Track(TrackId),
    Clip(ClipId),
    Transition(TransitionId),
    Marker(MarkerId),
}

/// A plan step the editor accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedOp {
    /// Position in the plan.
    pub index: usize,
    pub op: PlannedOp,
    pub outcome: OpOutcome,
}

/// A fully executed composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionResult {
    pub plan: Plan,
    pub committed: Vec<CommittedOp>,
    /// Placed scene clips, by slot.
    pub clips: Vec<ClipId>,
}

impl CompositionResult {
    pub fn transitions(&self) -> Vec<TransitionId> {
        self.committed
            .iter()
            .filter_map(|c| match c.outcome {
                OpOutcome::Transition(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn markers(&self) -> Vec<MarkerId> {
        self.committed
            .iter()
            .filter_map(|c| match c.outcome {
                OpOutcome::Marker(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Placed clips of one scene.
    pub fn scene_clips(&self, scene: SceneNumber) -> Vec<ClipId> {
        self.plan
            .scenes
            .iter()
            .filter(|p| p.number == scene)
            .flat_map(|p| p.slots.iter().filter_map(|&slot| self.clips.get(slot).copied()))
            .collect()
    }
}

/// Timeline composer.
///
/// Reads the project, plans, then runs the plan one op at a time through
/// the client. The first failing op halts the run; nothing is undone.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    config: ComposerConfig,
}

impl Composer {
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Plan against the live project without executing anything.
    pub fn plan<B: EditorBackend>(
        &self,
        client: &mut AtomicClient<B>,
        request: &CompositionRequest,
    ) -> MontageResult<Plan> {
        let info = read_project(client, self.config.read_retries)?;
        plan(&info, request)
    }

    pub fn compose<B: EditorBackend>(
        &self,
        client: &mut AtomicClient<B>,
        request: &CompositionRequest,
    ) -> Result<CompositionResult, ComposeError> {
        let info =
            read_project(client, self.config.read_retries).map_err(ComposeError::Preflight)?;
        let plan = plan(&info, request).map_err(|err| {
            tracing::warn!(error = %err, "Composition rejected before execution");
            ComposeError::Preflight(err)
        })?;

        tracing::info!(
            scenes = request.scenes.len(),
            ops = plan.len(),
            end = plan.end,
            "Composing timeline"
        );

        let total = plan.len();
        let mut run = Execution::default();
        let mut committed = Vec::with_capacity(total);
        for (index, op) in plan.ops.iter().enumerate() {
            match run.apply(client, op) {
                Ok(outcome) => {
                    tracing::debug!(step = index + 1, total, op = %op, "Committed");
                    committed.push(CommittedOp {
                        index,
                        op: op.clone(),
                        outcome,
                    });
                }
                Err(cause) => {
                    tracing::warn!(
                        step = index + 1,
                        total,
                        op = %op,
                        committed = committed.len(),
                        error = %cause,
                        "Composition halted"
                    );
                    return Err(ComposeError::Halted {
                        committed,
                        failed: op.clone(),
                        index,
                        total,
                        cause,
                    });
                }
            }
        }

        tracing::info!(clips = run.slots.len(), end = plan.end, "Composition complete");
        Ok(CompositionResult {
            clips: run.slots,
            plan,
            committed,
        })
    }
}

/// Ids created so far by a running plan.
#[derive(Debug, Default)]
struct Execution {
    slots: Vec<ClipId>,
    tracks: Vec<(TrackKind, TrackId)>,
}

impl Execution {
    fn track(&self, track: TrackRef) -> MontageResult<TrackId> {
        match track {
            TrackRef::Existing(id) => Ok(id),
            TrackRef::Created(kind) => self
                .tracks
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, id)| *id)
                .ok_or_else(|| {
                    MontageError::not_found("track", format!("new {} track", kind.letter()))
                }),
        }
    }

    fn slot(&self, slot: usize) -> MontageResult<ClipId> {
        self.slots
            .get(slot)
            .copied()
            .ok_or_else(|| MontageError::not_found("clip slot", slot))
    }

    fn apply<B: EditorBackend>(
        &mut self,
        client: &mut AtomicClient<B>,
        op: &PlannedOp,
    ) -> MontageResult<OpOutcome> {
        match op {
            PlannedOp::AddTrack { kind, name } => {
                let track = client.add_track(*kind, name)?;
                self.tracks.push((*kind, track.id));
                Ok(OpOutcome::Track(track.id))
            }
            PlannedOp::InsertClip {
                scene,
                media,
                track,
                position,
                source_in,
                duration,
                ..
            } => {
                let clip = client.insert_clip(&InsertClip {
                    media: *media,
                    track: self.track(*track)?,
                    position: *position,
                    source_in: *source_in,
                    duration: Some(*duration),
                    scene: Some(*scene),
                })?;
                self.slots.push(clip.id);
                Ok(OpOutcome::Clip(clip.id))
            }
            PlannedOp::AddTransition {
                from_slot,
                to_slot,
                kind,
                duration,
                ..
            } => {
                let transition = client.add_transition(&AddTransition {
                    from: self.slot(*from_slot)?,
                    to: self.slot(*to_slot)?,
                    kind: *kind,
                    duration: *duration,
                })?;
                Ok(OpOutcome::Transition(transition.id))
            }
            PlannedOp::InsertAudioBed {
                media,
                track,
                position,
                duration,
            } => {
                let clip = client.insert_clip(&InsertClip {
                    media: *media,
                    track: self.track(*track)?,
                    position: *position,
                    source_in: 0,
                    duration: Some(*duration),
                    scene: None,
                })?;
                Ok(OpOutcome::Clip(clip.id))
            }
            PlannedOp::AddMarker {
                position,
                category,
                label,
                note,
            } => {
                let marker = client.add_marker(&NewMarker {
                    position: *position,
                    category: *category,
                    label: label.clone(),
                    note: note.clone(),
                })?;
                Ok(OpOutcome::Marker(marker.id))
            }
        }
    }
}

/// Fresh project read, retried while the editor reports itself unavailable.
pub(crate) fn read_project<B: EditorBackend>(
    client: &mut AtomicClient<B>,
    retries: u32,
) -> MontageResult<ProjectInfo> {
    let mut attempt = 0;
    loop {
        match client.project_info() {
            Err(err) if err.kind() == ErrorKind::BackendUnavailable && attempt < retries => {
                attempt += 1;
                tracing::warn!(attempt, retries, error = %err, "Project read failed, retrying");
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_editor::{Fault, ImportMedia, InMemoryEditor};
    use montage_project_model::{MediaId, ProjectSettings, SceneSpec, TransitionSpec};

    use crate::policy::TransitionPolicy;

    fn setup(durations: &[u64]) -> (AtomicClient<InMemoryEditor>, Vec<MediaId>) {
        let mut client = AtomicClient::with_defaults(InMemoryEditor::with_standard_tracks(
            ProjectSettings::default(),
        ));
        let media = durations
            .iter()
            .enumerate()
            .map(|(i, frames)| {
                client
                    .import_media(&ImportMedia {
                        source: format!("/clips/scene{}.mp4", i + 1),
                        kind: None,
                        duration: Some(*frames),
                    })
                    .unwrap()
                    .media
                    .id
            })
            .collect();
        (client, media)
    }

    fn scenes(media: &[MediaId]) -> Vec<SceneSpec> {
        media
            .iter()
            .enumerate()
            .map(|(i, m)| SceneSpec::single(i as u32 + 1, *m))
            .collect()
    }

    #[test]
    fn test_compose_tags_clips_with_scene_numbers() {
        let (mut client, media) = setup(&[50, 60]);
        let result = Composer::default()
            .compose(&mut client, &CompositionRequest::new(scenes(&media)))
            .unwrap();

        let info = client.project_info().unwrap();
        assert_eq!(info.scene_clips(1)[0].id, result.clips[0]);
        assert_eq!(info.scene_clips(2)[0].start, 50);
        assert_eq!(result.scene_clips(2), vec![result.clips[1]]);
    }

    #[test]
    fn test_preflight_failure_touches_nothing() {
        let (mut client, media) = setup(&[50, 60]);
        let before = client.project_info().unwrap();
        let request = CompositionRequest::new(scenes(&media))
            .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(55)));

        let err = Composer::default().compose(&mut client, &request).unwrap_err();
        assert!(matches!(err, ComposeError::Preflight(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(client.project_info().unwrap(), before);
    }

    #[test]
    fn test_halt_reports_failing_step() {
        let (mut client, media) = setup(&[50, 60, 70]);
        client
            .backend_mut()
            .fail_mutation(3, Fault::Reject("disk full".to_string()));

        let err = Composer::default()
            .compose(&mut client, &CompositionRequest::new(scenes(&media)))
            .unwrap_err();
        match &err {
            ComposeError::Halted {
                committed,
                index,
                total,
                ..
            } => {
                assert_eq!(committed.len(), 2);
                assert_eq!((*index, *total), (2, 3));
            }
            other => panic!("expected a halt, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::BackendRejected);
        assert!(err.to_string().contains("step 3 of 3"));
    }

    #[test]
    fn test_unavailable_editor_is_preflight() {
        let (mut client, media) = setup(&[50]);
        client.backend_mut().set_unavailable(true);
        let err = Composer::new(ComposerConfig { read_retries: 1 })
            .compose(&mut client, &CompositionRequest::new(scenes(&media)))
            .unwrap_err();
        assert!(matches!(err, ComposeError::Preflight(_)));
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }
}
