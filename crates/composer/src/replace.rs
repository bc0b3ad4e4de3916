//! Scene and clip replacement.
//!
//! Swaps the clip(s) of one composed scene, or a single timeline clip, for
//! a new media clip while the slot stays where it is on the timeline. The new clip starts where the
//! scene started and never runs past where it ended: longer media is cut
//! to fit, shorter media leaves a gap that is reported, not filled.
//!
//! Transitions anchored to the scene are taken off, the old clips deleted,
//! the new clip inserted, and the transitions put back against the new
//! clip with their original kind and duration. Any transition that would
//! not fit the new clip makes the whole replacement a conflict before the
//! editor is touched.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use montage_common::error::{MontageError, MontageResult};
use montage_editor::{AddTransition, AtomicClient, EditorBackend, InsertClip};
use montage_project_model::{
    transition_span, ClipId, Frames, MarkerId, MediaId, ProjectInfo, SceneNumber, Span,
    TimelineClip, TrackId, Transition, TransitionId, TransitionKind,
};

use crate::error::ReplaceError;
use crate::execute::{read_project, ComposerConfig};

/// Which end of the new clip a transition attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// From a clip before the scene into it.
    Incoming,
    /// From the scene into a clip after it.
    Outgoing,
}

/// The slot being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceTarget {
    /// Every clip tagged with the scene.
    Scene(SceneNumber),
    /// One timeline clip.
    Clip(ClipId),
}

impl fmt::Display for ReplaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceTarget::Scene(scene) => write!(f, "scene {scene}"),
            ReplaceTarget::Clip(clip) => write!(f, "{clip}"),
        }
    }
}

/// What to put in the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRequest {
    pub target: ReplaceTarget,
    pub media: MediaId,
    /// Source frames to skip.
    #[serde(default)]
    pub source_in: Frames,
}

impl ReplaceRequest {
    pub fn scene(scene: SceneNumber, media: MediaId) -> Self {
        Self {
            target: ReplaceTarget::Scene(scene),
            media,
            source_in: 0,
        }
    }

    pub fn clip(clip: ClipId, media: MediaId) -> Self {
        Self {
            target: ReplaceTarget::Clip(clip),
            media,
            source_in: 0,
        }
    }

    pub fn with_source_in(mut self, source_in: Frames) -> Self {
        self.source_in = source_in;
        self
    }
}

/// One editor call of a replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplaceStep {
    RemoveTransition {
        id: TransitionId,
    },
    DeleteClip {
        clip: ClipId,
    },
    InsertClip {
        media: MediaId,
        track: TrackId,
        position: Frames,
        source_in: Frames,
        duration: Frames,
        scene: Option<SceneNumber>,
    },
    AddTransition {
        other: ClipId,
        side: Side,
        kind: TransitionKind,
        duration: Frames,
    },
}

impl fmt::Display for ReplaceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceStep::RemoveTransition { id } => write!(f, "remove transition {id}"),
            ReplaceStep::DeleteClip { clip } => write!(f, "delete {clip}"),
            ReplaceStep::InsertClip {
                media,
                track,
                position,
                duration,
                scene,
                ..
            } => {
                write!(f, "insert {media} at {} on {track}", Span::at(*position, *duration))?;
                match scene {
                    Some(scene) => write!(f, " for scene {scene}"),
                    None => Ok(()),
                }
            }
            ReplaceStep::AddTransition {
                other,
                side,
                kind,
                duration,
            } => {
                let direction = match side {
                    Side::Incoming => "from",
                    Side::Outgoing => "into",
                };
                write!(f, "re-add {kind} of {duration} frames {direction} {other}")
            }
        }
    }
}

/// Checked replacement, ready to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacePlan {
    pub target: ReplaceTarget,
    /// Scene tag the new clip carries.
    pub scene: Option<SceneNumber>,
    pub track: TrackId,
    /// Slot the old clips occupy: first clip start to last clip end.
    pub envelope: Span,
    pub old_clips: Vec<ClipId>,
    /// Length of the new clip.
    pub duration: Frames,
    /// Envelope frames the new clip leaves empty at its end.
    pub gap: Frames,
    pub steps: Vec<ReplaceStep>,
    /// Markers inside the envelope; they are left where they are.
    pub markers: Vec<MarkerId>,
}

/// A completed replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceResult {
    pub plan: ReplacePlan,
    pub clip: TimelineClip,
    /// Transitions re-attached to the new clip.
    pub transitions: Vec<Transition>,
}

impl ReplaceResult {
    pub fn gap(&self) -> Frames {
        self.plan.gap
    }
}

/// Replaces composed scenes and single clips in place.
#[derive(Debug, Clone, Default)]
pub struct SceneReplacer {
    config: ComposerConfig,
}

impl SceneReplacer {
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    /// Check a replacement against the live project without executing it.
    pub fn prepare<B: EditorBackend>(
        &self,
        client: &mut AtomicClient<B>,
        request: &ReplaceRequest,
    ) -> MontageResult<ReplacePlan> {
        let info = read_project(client, self.config.read_retries)?;
        prepare(&info, request)
    }

    pub fn replace<B: EditorBackend>(
        &self,
        client: &mut AtomicClient<B>,
        request: &ReplaceRequest,
    ) -> Result<ReplaceResult, ReplaceError> {
        let info =
            read_project(client, self.config.read_retries).map_err(ReplaceError::Preflight)?;
        let plan = prepare(&info, request).map_err(|err| {
            tracing::warn!(slot = %request.target, error = %err, "Replacement rejected");
            ReplaceError::Preflight(err)
        })?;
        self.execute(client, plan)
    }

    /// Run a prepared plan step by step, stopping at the first failure.
    pub fn execute<B: EditorBackend>(
        &self,
        client: &mut AtomicClient<B>,
        plan: ReplacePlan,
    ) -> Result<ReplaceResult, ReplaceError> {
        tracing::info!(
            slot = %plan.target,
            envelope = %plan.envelope,
            gap = plan.gap,
            steps = plan.steps.len(),
            "Replacing"
        );

        let mut run = Run::default();
        let mut completed = Vec::with_capacity(plan.steps.len());
        for step in &plan.steps {
            if let Err(cause) = run.apply(client, step) {
                tracing::warn!(
                    slot = %plan.target,
                    step = %step,
                    completed = completed.len(),
                    error = %cause,
                    "Replacement halted"
                );
                return Err(ReplaceError::Halted {
                    completed,
                    failed: step.clone(),
                    cause,
                });
            }
            completed.push(step.clone());
        }

        let Some(clip) = run.clip else {
            tracing::warn!(slot = %plan.target, completed = completed.len(), "No clip placed");
            return Err(ReplaceError::Incomplete {
                completed,
                cause: MontageError::conflict(format!(
                    "replacing {} ran every step without placing a clip",
                    plan.target
                )),
            });
        };
        tracing::info!(slot = %plan.target, clip = %clip.id, "Replaced");
        Ok(ReplaceResult {
            plan,
            clip,
            transitions: run.transitions,
        })
    }
}

#[derive(Debug, Default)]
struct Run {
    clip: Option<TimelineClip>,
    transitions: Vec<Transition>,
}

impl Run {
    fn apply<B: EditorBackend>(
        &mut self,
        client: &mut AtomicClient<B>,
        step: &ReplaceStep,
    ) -> MontageResult<()> {
        match step {
            ReplaceStep::RemoveTransition { id } => client.remove_transition(*id),
            ReplaceStep::DeleteClip { clip } => {
                let dropped = client.delete_clip(*clip)?;
                if !dropped.is_empty() {
                    tracing::debug!(clip = %clip, dropped = ?dropped, "Editor dropped transitions");
                }
                Ok(())
            }
            ReplaceStep::InsertClip {
                media,
                track,
                position,
                source_in,
                duration,
                scene,
            } => {
                let clip = client.insert_clip(&InsertClip {
                    media: *media,
                    track: *track,
                    position: *position,
                    source_in: *source_in,
                    duration: Some(*duration),
                    scene: *scene,
                })?;
                self.clip = Some(clip);
                Ok(())
            }
            ReplaceStep::AddTransition {
                other,
                side,
                kind,
                duration,
            } => {
                let new = self
                    .clip
                    .as_ref()
                    .map(|c| c.id)
                    .ok_or_else(|| MontageError::not_found("clip", "replacement"))?;
                let (from, to) = match side {
                    Side::Incoming => (*other, new),
                    Side::Outgoing => (new, *other),
                };
                let transition = client.add_transition(&AddTransition {
                    from,
                    to,
                    kind: *kind,
                    duration: *duration,
                })?;
                self.transitions.push(transition);
                Ok(())
            }
        }
    }
}

/// Check a replacement against `info` and lay out its steps.
pub fn prepare(info: &ProjectInfo, request: &ReplaceRequest) -> MontageResult<ReplacePlan> {
    let target = request.target;
    let old = match target {
        ReplaceTarget::Scene(scene) => info.scene_clips(scene),
        ReplaceTarget::Clip(clip) => info.clip(clip).into_iter().collect(),
    };
    let (Some(first), Some(last)) = (old.first(), old.iter().max_by_key(|c| c.end())) else {
        return Err(match target {
            ReplaceTarget::Scene(scene) => MontageError::not_found("scene", scene),
            ReplaceTarget::Clip(clip) => MontageError::not_found("clip", clip),
        });
    };
    let scene = match target {
        ReplaceTarget::Scene(scene) => Some(scene),
        ReplaceTarget::Clip(_) => first.scene,
    };
    let track = first.track;
    if old.iter().any(|c| c.track != track) {
        return Err(MontageError::conflict(format!(
            "{target} is spread over several tracks"
        )));
    }
    let envelope = Span {
        start: first.start,
        end: last.end(),
    };

    let media = info
        .media(request.media)
        .ok_or_else(|| MontageError::not_found("media", request.media))?;
    let track_kind = info
        .track(track)
        .map(|t| t.kind)
        .ok_or_else(|| MontageError::not_found("track", track))?;
    if !track_kind.accepts(media.kind) {
        return Err(MontageError::invalid_argument(format!(
            "{} is {:?} media and cannot replace a clip on {:?} track {track}",
            media.id, media.kind, track_kind
        )));
    }
    let available = if media.kind.is_still() {
        envelope.len()
    } else {
        media.available_from(request.source_in)
    };
    if available == 0 {
        return Err(MontageError::invalid_argument(format!(
            "in-point {} is past the end of {} ({} frames)",
            request.source_in, media.id, media.duration
        )));
    }
    let duration = available.min(envelope.len());
    let gap = envelope.len() - duration;
    let source_in = if media.kind.is_still() {
        0
    } else {
        request.source_in
    };

    let old_ids: HashSet<ClipId> = old.iter().map(|c| c.id).collect();
    let replacement = TimelineClip {
        id: first.id,
        media: media.id,
        track,
        start: envelope.start,
        duration,
        source_in,
        scene,
    };

    for neighbour in info
        .clips_on_track(track)
        .into_iter()
        .filter(|c| !old_ids.contains(&c.id) && c.span().overlaps(&replacement.span()))
    {
        let (theirs, ours) = (neighbour.span(), replacement.span());
        if theirs.contains_span(&ours) || ours.contains_span(&theirs) {
            return Err(MontageError::conflict(format!(
                "a {duration}-frame clip at {ours} would sit entirely inside {} at {theirs}",
                neighbour.id
            )));
        }
    }

    let mut anchored = Vec::new();
    for transition in &info.transitions {
        let from_old = old_ids.contains(&transition.from);
        let to_old = old_ids.contains(&transition.to);
        let (other_id, side) = match (from_old, to_old) {
            (false, false) => continue,
            (true, true) => {
                return Err(MontageError::conflict(format!(
                    "{} joins two clips of {target}; replace the clips individually",
                    transition.id
                )))
            }
            (true, false) => (transition.to, Side::Outgoing),
            (false, true) => (transition.from, Side::Incoming),
        };
        let other = info
            .clip(other_id)
            .ok_or_else(|| MontageError::not_found("clip", other_id))?;
        let fits = match side {
            Side::Incoming => transition_span(other, &replacement, transition.duration),
            Side::Outgoing => transition_span(&replacement, other, transition.duration),
        };
        if fits.is_none() {
            return Err(MontageError::conflict(format!(
                "{} ({}, {} frames, {}) does not fit a {duration}-frame clip at {}",
                transition.id,
                transition.kind,
                transition.duration,
                transition.span,
                replacement.span()
            )));
        }
        anchored.push((transition, other_id, side));
    }

    let mut steps = Vec::new();
    steps.extend(
        anchored
            .iter()
            .map(|(t, _, _)| ReplaceStep::RemoveTransition { id: t.id }),
    );
    steps.extend(old.iter().map(|c| ReplaceStep::DeleteClip { clip: c.id }));
    steps.push(ReplaceStep::InsertClip {
        media: media.id,
        track,
        position: envelope.start,
        source_in,
        duration,
        scene,
    });
    steps.extend(
        anchored
            .iter()
            .map(|(t, other, side)| ReplaceStep::AddTransition {
                other: *other,
                side: *side,
                kind: t.kind,
                duration: t.duration,
            }),
    );

    let markers = info
        .markers
        .iter()
        .filter(|m| envelope.start <= m.position && m.position < envelope.end)
        .map(|m| m.id)
        .collect();

    Ok(ReplacePlan {
        target,
        scene,
        track,
        envelope,
        old_clips: old.iter().map(|c| c.id).collect(),
        duration,
        gap,
        steps,
        markers,
    })
}
