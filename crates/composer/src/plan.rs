//! Composition planning.
//!
//! Turns a [`CompositionRequest`] and a project read into an ordered list of
//! atomic operations. Planning is pure: it reads the [`ProjectInfo`] it is
//! given and nothing else, so the same inputs always yield the same plan.
//!
//! # Placement
//!
//! 1. **Resolve** every scene clip to its media and an effective duration
//!    (trim-adjusted, or the rest of the media).
//! 2. **Prefix sum**: scene clips are laid back to back from the plan start.
//! 3. **Overlap**: an edge joined by a transition of `D` frames pulls the
//!    next scene `D` frames earlier, and the transition spans that overlap.
//!    Edges joined by a cut get the plan gap instead.
//! 4. **Markers** go at scene starts and caller positions.
//!
//! Clips placed by the plan are referred to by slot (their insertion
//! order), since editor ids only exist once the plan runs.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use montage_common::error::{MontageError, MontageResult};
use montage_project_model::{
    Frames, MarkerCategory, MediaClip, MediaId, ProjectInfo, SceneClip, SceneNumber, SceneSpec,
    Span, TrackId, TrackKind, TransitionKind, TransitionSpec,
};

use crate::policy::{CompositionRequest, TrackSelector};

/// A track an op lands on: one that exists, or the one the plan creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRef {
    Existing(TrackId),
    Created(TrackKind),
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackRef::Existing(id) => write!(f, "{id}"),
            TrackRef::Created(kind) => write!(f, "new {} track", kind.letter()),
        }
    }
}

/// One atomic step of a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlannedOp {
    AddTrack {
        kind: TrackKind,
        name: String,
    },
    InsertClip {
        slot: usize,
        scene: SceneNumber,
        media: MediaId,
        track: TrackRef,
        position: Frames,
        source_in: Frames,
        duration: Frames,
    },
    AddTransition {
        from_slot: usize,
        to_slot: usize,
        kind: TransitionKind,
        duration: Frames,
        span: Span,
    },
    InsertAudioBed {
        media: MediaId,
        track: TrackRef,
        position: Frames,
        duration: Frames,
    },
    AddMarker {
        position: Frames,
        category: MarkerCategory,
        label: String,
        note: String,
    },
}

impl PlannedOp {
    /// Short op name, as used in logs and failure reports.
    pub fn name(&self) -> &'static str {
        match self {
            PlannedOp::AddTrack { .. } => "add_track",
            PlannedOp::InsertClip { .. } => "insert_clip",
            PlannedOp::AddTransition { .. } => "add_transition",
            PlannedOp::InsertAudioBed { .. } => "insert_audio_bed",
            PlannedOp::AddMarker { .. } => "add_marker",
        }
    }
}

impl fmt::Display for PlannedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedOp::AddTrack { kind, name } => write!(f, "add {kind:?} track {name}"),
            PlannedOp::InsertClip {
                scene,
                media,
                track,
                position,
                duration,
                ..
            } => write!(
                f,
                "insert scene {scene} ({media}) at {} on {track}",
                Span::at(*position, *duration)
            ),
            PlannedOp::AddTransition {
                from_slot,
                to_slot,
                kind,
                span,
                ..
            } => write!(f, "{kind} {span} between slots {from_slot} and {to_slot}"),
            PlannedOp::InsertAudioBed {
                media,
                track,
                position,
                duration,
            } => write!(
                f,
                "audio bed {media} at {} on {track}",
                Span::at(*position, *duration)
            ),
            PlannedOp::AddMarker {
                position,
                category,
                label,
                ..
            } => write!(f, "{category} marker {label:?} at {position}"),
        }
    }
}

/// Where one scene ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePlacement {
    pub number: SceneNumber,
    /// From the first clip's start to the last clip's end.
    pub span: Span,
    /// Slots of the scene's clips, in order.
    pub slots: Vec<usize>,
}

/// An ordered, fully resolved composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub ops: Vec<PlannedOp>,
    pub scenes: Vec<ScenePlacement>,
    /// Track receiving the scene clips.
    pub video_track: TrackRef,
    /// End of the last scene clip.
    pub end: Frames,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Span of every scene clip, by slot.
    pub fn slot_spans(&self) -> Vec<Span> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PlannedOp::InsertClip {
                    position, duration, ..
                } => Some(Span::at(*position, *duration)),
                _ => None,
            })
            .collect()
    }

    /// Transition spans in scene order.
    pub fn transition_spans(&self) -> Vec<Span> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PlannedOp::AddTransition { span, .. } => Some(*span),
                _ => None,
            })
            .collect()
    }
}

/// A scene clip with its trim resolved.
#[derive(Debug, Clone, Copy)]
struct ResolvedClip {
    media: MediaId,
    source_in: Frames,
    duration: Frames,
}

/// Compute the plan for `request` against the project as read in `info`.
///
/// Fails without side effects: `InvalidArgument` for malformed input,
/// `NotFound` for unknown media or tracks, `Conflict` when the requested
/// transitions cannot fit the clips or the target range is occupied.
pub fn plan(info: &ProjectInfo, request: &CompositionRequest) -> MontageResult<Plan> {
    let scenes = &request.scenes;
    validate_scenes(scenes)?;

    let mut ops = Vec::new();

    let video_track = match request.track_plan.video_track {
        TrackSelector::Id(id) => {
            let track = info
                .track(id)
                .ok_or_else(|| MontageError::not_found("track", id))?;
            if track.kind != TrackKind::Video {
                return Err(MontageError::invalid_argument(format!(
                    "scenes need a video track, {id} is {:?}",
                    track.kind
                )));
            }
            TrackRef::Existing(id)
        }
        TrackSelector::FirstVideo => match info.first_track(TrackKind::Video) {
            Some(track) => TrackRef::Existing(track.id),
            None => {
                ops.push(PlannedOp::AddTrack {
                    kind: TrackKind::Video,
                    name: "V1".to_string(),
                });
                TrackRef::Created(TrackKind::Video)
            }
        },
    };

    let resolved: Vec<Vec<ResolvedClip>> = scenes
        .iter()
        .map(|scene| {
            scene
                .clips
                .iter()
                .map(|clip| resolve_clip(info, scene.number, clip))
                .collect::<MontageResult<Vec<_>>>()
        })
        .collect::<MontageResult<_>>()?;

    // Edge i joins scene i to scene i + 1.
    let edges: Vec<Option<TransitionSpec>> = scenes
        .windows(2)
        .map(|pair| request.transitions.edge_after(&pair[0]))
        .collect();
    if let Some(spec) = request.transitions.default {
        if spec.duration == 0 {
            return Err(MontageError::invalid_argument(
                "default transition duration must be positive",
            ));
        }
    }
    for (i, edge) in edges.iter().enumerate() {
        if let Some(spec) = edge {
            if spec.duration == 0 {
                return Err(MontageError::invalid_argument(format!(
                    "transition after scene {} has zero duration",
                    scenes[i].number
                )));
            }
        }
    }
    check_transition_fit(scenes, &resolved, &edges)?;

    // Placement.
    let mut placements = Vec::with_capacity(scenes.len());
    let mut inserts = Vec::new();
    let mut cursor = request.track_plan.start;
    let mut slot = 0usize;
    for (i, scene) in scenes.iter().enumerate() {
        if i > 0 {
            cursor = match edges[i - 1] {
                Some(spec) => cursor.checked_sub(spec.duration),
                None => cursor.checked_add(request.track_plan.gap),
            }
            .ok_or_else(|| past_last_frame(scene.number))?;
        }
        let scene_start = cursor;
        let mut slots = Vec::with_capacity(resolved[i].len());
        for clip in &resolved[i] {
            inserts.push(PlannedOp::InsertClip {
                slot,
                scene: scene.number,
                media: clip.media,
                track: video_track,
                position: cursor,
                source_in: clip.source_in,
                duration: clip.duration,
            });
            slots.push(slot);
            slot += 1;
            cursor = cursor
                .checked_add(clip.duration)
                .ok_or_else(|| past_last_frame(scene.number))?;
        }
        placements.push(ScenePlacement {
            number: scene.number,
            span: Span {
                start: scene_start,
                end: cursor,
            },
            slots,
        });
    }
    let start = request.track_plan.start;
    let end = cursor;

    if let TrackRef::Existing(track) = video_track {
        check_range_free(info, track, Span { start, end })?;
    }

    let mut transitions = Vec::new();
    for (i, edge) in edges.iter().enumerate() {
        let Some(spec) = edge else { continue };
        let from_slot = *placements[i].slots.last().unwrap_or(&0);
        let to_slot = placements[i + 1].slots[0];
        let to_start = placements[i + 1].span.start;
        transitions.push(PlannedOp::AddTransition {
            from_slot,
            to_slot,
            kind: spec.kind,
            duration: spec.duration,
            span: Span::at(to_start, spec.duration),
        });
    }

    let mut bed = None;
    if let Some(media_id) = request.track_plan.audio_bed {
        let media = info
            .media(media_id)
            .ok_or_else(|| MontageError::not_found("media", media_id))?;
        if !TrackKind::Audio.accepts(media.kind) {
            return Err(MontageError::invalid_argument(format!(
                "audio bed {media_id} is {:?} media",
                media.kind
            )));
        }
        let duration = media.duration.min(end - start);
        let track = match info.first_track(TrackKind::Audio) {
            Some(track) => {
                check_range_free(info, track.id, Span::at(start, duration))?;
                TrackRef::Existing(track.id)
            }
            None => {
                ops.push(PlannedOp::AddTrack {
                    kind: TrackKind::Audio,
                    name: "A1".to_string(),
                });
                TrackRef::Created(TrackKind::Audio)
            }
        };
        bed = Some(PlannedOp::InsertAudioBed {
            media: media_id,
            track,
            position: start,
            duration,
        });
    }

    let mut markers: Vec<PlannedOp> = Vec::new();
    if let Some(category) = request.markers.scene_boundaries {
        for placement in &placements {
            markers.push(PlannedOp::AddMarker {
                position: placement.span.start,
                category,
                label: format!("Scene {}", placement.number),
                note: String::new(),
            });
        }
    }
    for extra in &request.markers.extra {
        markers.push(PlannedOp::AddMarker {
            position: extra.position,
            category: extra.category,
            label: extra.label.clone(),
            note: extra.note.clone(),
        });
    }
    markers.sort_by_key(|op| match op {
        PlannedOp::AddMarker { position, .. } => *position,
        _ => 0,
    });

    ops.extend(inserts);
    ops.extend(transitions);
    ops.extend(bed);
    ops.extend(markers);

    Ok(Plan {
        ops,
        scenes: placements,
        video_track,
        end,
    })
}

fn past_last_frame(scene: SceneNumber) -> MontageError {
    MontageError::invalid_argument(format!(
        "scene {scene} would run past the last representable frame"
    ))
}

fn validate_scenes(scenes: &[SceneSpec]) -> MontageResult<()> {
    if scenes.is_empty() {
        return Err(MontageError::invalid_argument("scene list is empty"));
    }
    let mut seen = HashSet::new();
    for scene in scenes {
        if scene.number == 0 {
            return Err(MontageError::invalid_argument("scene numbers start at 1"));
        }
        if !seen.insert(scene.number) {
            return Err(MontageError::invalid_argument(format!(
                "scene {} appears more than once",
                scene.number
            )));
        }
        if scene.clips.is_empty() {
            return Err(MontageError::invalid_argument(format!(
                "scene {} has no clips",
                scene.number
            )));
        }
    }
    Ok(())
}

fn resolve_clip(
    info: &ProjectInfo,
    scene: SceneNumber,
    clip: &SceneClip,
) -> MontageResult<ResolvedClip> {
    let media = info
        .media(clip.media)
        .ok_or_else(|| MontageError::not_found("media", clip.media))?;
    if !TrackKind::Video.accepts(media.kind) {
        return Err(MontageError::invalid_argument(format!(
            "scene {scene} uses {} which is {:?} media",
            media.id, media.kind
        )));
    }
    let (source_in, duration) = effective_range(media, clip).ok_or_else(|| {
        MontageError::invalid_argument(format!(
            "scene {scene}: trim {:?}..{:?} does not fit {} ({} frames)",
            clip.source_in, clip.source_out, media.id, media.duration
        ))
    })?;
    Ok(ResolvedClip {
        media: media.id,
        source_in,
        duration,
    })
}

/// Source in-point and placed length, or `None` for an unusable trim.
///
/// Stills have no source timing: their trim only sets the length.
fn effective_range(media: &MediaClip, clip: &SceneClip) -> Option<(Frames, Frames)> {
    let source_in = clip.source_in.unwrap_or(0);
    if media.kind.is_still() {
        let length = match clip.source_out {
            Some(out) => out.checked_sub(source_in)?,
            None => media.duration,
        };
        return (length > 0).then_some((0, length));
    }
    let source_out = clip.source_out.unwrap_or(media.duration);
    if source_out > media.duration || source_out <= source_in {
        return None;
    }
    Some((source_in, source_out - source_in))
}

fn check_transition_fit(
    scenes: &[SceneSpec],
    resolved: &[Vec<ResolvedClip>],
    edges: &[Option<TransitionSpec>],
) -> MontageResult<()> {
    for (i, edge) in edges.iter().enumerate() {
        let Some(spec) = edge else { continue };
        let outgoing = resolved[i].last().map(|c| c.duration).unwrap_or(0);
        let incoming = resolved[i + 1].first().map(|c| c.duration).unwrap_or(0);
        let shortest = outgoing.min(incoming);
        if spec.duration >= shortest {
            return Err(MontageError::conflict(format!(
                "{} of {} frames between scenes {} and {} needs both clips longer than that \
                 (they are {} and {} frames)",
                spec.kind,
                spec.duration,
                scenes[i].number,
                scenes[i + 1].number,
                outgoing,
                incoming
            )));
        }
    }

    // A single-clip scene carries both its incoming and outgoing overlap.
    for i in 1..scenes.len().saturating_sub(1) {
        if resolved[i].len() != 1 {
            continue;
        }
        let (Some(incoming), Some(outgoing)) = (edges[i - 1], edges[i]) else {
            continue;
        };
        let length = resolved[i][0].duration;
        if incoming.duration + outgoing.duration > length {
            return Err(MontageError::conflict(format!(
                "scene {} is {} frames but its transitions need {} + {}",
                scenes[i].number, length, incoming.duration, outgoing.duration
            )));
        }
    }
    Ok(())
}

fn check_range_free(info: &ProjectInfo, track: TrackId, range: Span) -> MontageResult<()> {
    if let Some(clip) = info
        .clips_on_track(track)
        .into_iter()
        .find(|c| c.span().overlaps(&range))
    {
        return Err(MontageError::conflict(format!(
            "{range} on {track} is occupied by {} at {}",
            clip.id,
            clip.span()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_common::error::ErrorKind;
    use montage_project_model::{
        ClipId, MediaKind, ProjectSettings, TimelineClip, Track, TransitionHint,
    };

    use crate::policy::{MarkerPolicy, MarkerSpec, TrackPlan, TransitionPolicy};

    fn media(id: u64, kind: MediaKind, duration: Frames) -> MediaClip {
        MediaClip {
            id: MediaId(id),
            name: format!("m{id}"),
            source: format!("/clips/m{id}"),
            kind,
            duration,
        }
    }

    fn project() -> ProjectInfo {
        ProjectInfo {
            settings: ProjectSettings::default(),
            media: vec![
                media(1, MediaKind::Video, 125),
                media(2, MediaKind::Video, 75),
                media(3, MediaKind::Video, 100),
                media(4, MediaKind::Audio, 1000),
                media(5, MediaKind::Image, 50),
            ],
            tracks: vec![
                Track {
                    id: TrackId(1),
                    kind: TrackKind::Video,
                    name: "V1".to_string(),
                    index: 0,
                },
                Track {
                    id: TrackId(2),
                    kind: TrackKind::Audio,
                    name: "A1".to_string(),
                    index: 1,
                },
            ],
            ..Default::default()
        }
    }

    fn three_scenes() -> Vec<SceneSpec> {
        vec![
            SceneSpec::single(1, MediaId(1)),
            SceneSpec::single(2, MediaId(2)),
            SceneSpec::single(3, MediaId(3)),
        ]
    }

    fn span(start: Frames, end: Frames) -> Span {
        Span { start, end }
    }

    #[test]
    fn test_cuts_place_scenes_back_to_back() {
        let plan = plan(&project(), &CompositionRequest::new(three_scenes())).unwrap();
        assert_eq!(
            plan.slot_spans(),
            vec![span(0, 125), span(125, 200), span(200, 300)]
        );
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.end, 300);
    }

    #[test]
    fn test_dissolves_pull_scenes_into_overlap() {
        let request = CompositionRequest::new(three_scenes())
            .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(25)));
        let plan = plan(&project(), &request).unwrap();
        assert_eq!(
            plan.slot_spans(),
            vec![span(0, 125), span(100, 175), span(150, 250)]
        );
        assert_eq!(plan.transition_spans(), vec![span(100, 125), span(150, 175)]);
    }

    #[test]
    fn test_ops_are_ordered_inserts_transitions_bed_markers() {
        let request = CompositionRequest::new(three_scenes())
            .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(10)))
            .with_markers(MarkerPolicy {
                scene_boundaries: Some(MarkerCategory::Blue),
                extra: vec![MarkerSpec {
                    position: 5,
                    category: MarkerCategory::Red,
                    label: "hook".to_string(),
                    note: String::new(),
                }],
            })
            .with_track_plan(TrackPlan {
                audio_bed: Some(MediaId(4)),
                ..Default::default()
            });
        let plan = plan(&project(), &request).unwrap();
        let names: Vec<&str> = plan.ops.iter().map(PlannedOp::name).collect();
        assert_eq!(
            names,
            vec![
                "insert_clip",
                "insert_clip",
                "insert_clip",
                "add_transition",
                "add_transition",
                "insert_audio_bed",
                "add_marker",
                "add_marker",
                "add_marker",
                "add_marker",
            ]
        );
        let positions: Vec<Frames> = plan.ops[6..]
            .iter()
            .map(|op| match op {
                PlannedOp::AddMarker { position, .. } => *position,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(positions, vec![0, 5, 115, 180]);
        assert_eq!(
            plan.ops[5],
            PlannedOp::InsertAudioBed {
                media: MediaId(4),
                track: TrackRef::Existing(TrackId(2)),
                position: 0,
                duration: 280,
            }
        );
    }

    #[test]
    fn test_gap_only_applies_at_cuts() {
        let scenes = vec![
            SceneSpec::single(1, MediaId(1)).with_transition(TransitionHint::Cut),
            SceneSpec::single(2, MediaId(2)),
            SceneSpec::single(3, MediaId(3)),
        ];
        let request = CompositionRequest::new(scenes)
            .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(5)))
            .with_track_plan(TrackPlan {
                start: 10,
                gap: 20,
                ..Default::default()
            });
        let plan = plan(&project(), &request).unwrap();
        assert_eq!(
            plan.slot_spans(),
            vec![span(10, 135), span(155, 230), span(225, 325)]
        );
        assert_eq!(plan.transition_spans(), vec![span(225, 230)]);
    }

    #[test]
    fn test_placement_past_last_frame_is_invalid() {
        let near_end = CompositionRequest::new(three_scenes()).with_track_plan(TrackPlan {
            start: u64::MAX - 10,
            ..Default::default()
        });
        let err = plan(&project(), &near_end).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("scene 1"));

        let huge_gap = CompositionRequest::new(three_scenes()).with_track_plan(TrackPlan {
            gap: u64::MAX - 100,
            ..Default::default()
        });
        let err = plan(&project(), &huge_gap).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("scene 2"));
    }

    #[test]
    fn test_multi_clip_scene_and_trims() {
        let scenes = vec![
            SceneSpec {
                number: 1,
                clips: vec![
                    SceneClip::trimmed(MediaId(1), 25, 75),
                    SceneClip::new(MediaId(5)),
                ],
                transition: None,
            },
            SceneSpec::single(2, MediaId(2)),
        ];
        let request = CompositionRequest::new(scenes)
            .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(10)));
        let plan = plan(&project(), &request).unwrap();
        assert_eq!(
            plan.slot_spans(),
            vec![span(0, 50), span(50, 100), span(90, 165)]
        );
        match &plan.ops[3] {
            PlannedOp::AddTransition {
                from_slot, to_slot, ..
            } => assert_eq!((*from_slot, *to_slot), (1, 2)),
            other => panic!("unexpected op {other:?}"),
        }
        match &plan.ops[0] {
            PlannedOp::InsertClip { source_in, .. } => assert_eq!(*source_in, 25),
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn test_missing_video_track_is_created_first() {
        let mut info = project();
        info.tracks.retain(|t| t.kind == TrackKind::Audio);
        let plan = plan(&info, &CompositionRequest::new(three_scenes())).unwrap();
        assert_eq!(plan.video_track, TrackRef::Created(TrackKind::Video));
        assert!(matches!(plan.ops[0], PlannedOp::AddTrack { kind: TrackKind::Video, .. }));
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn test_validation_errors() {
        let info = project();
        let kind = |request: CompositionRequest| plan(&info, &request).unwrap_err().kind();

        assert_eq!(kind(CompositionRequest::new(vec![])), ErrorKind::InvalidArgument);
        assert_eq!(
            kind(CompositionRequest::new(vec![
                SceneSpec::single(1, MediaId(1)),
                SceneSpec::single(1, MediaId(2)),
            ])),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(CompositionRequest::new(vec![SceneSpec::single(0, MediaId(1))])),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(CompositionRequest::new(vec![SceneSpec::single(1, MediaId(99))])),
            ErrorKind::NotFound
        );
        assert_eq!(
            kind(CompositionRequest::new(vec![SceneSpec::single(1, MediaId(4))])),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(CompositionRequest::new(vec![SceneSpec {
                number: 1,
                clips: vec![SceneClip::trimmed(MediaId(1), 100, 200)],
                transition: None,
            }])),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(
                CompositionRequest::new(three_scenes())
                    .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(0)))
            ),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(
                CompositionRequest::new(three_scenes()).with_track_plan(TrackPlan {
                    video_track: TrackSelector::Id(TrackId(2)),
                    ..Default::default()
                })
            ),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_transition_longer_than_clip_conflicts() {
        let request = CompositionRequest::new(three_scenes())
            .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(75)));
        let err = plan(&project(), &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_incoming_plus_outgoing_conflicts() {
        let request = CompositionRequest::new(three_scenes())
            .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(40)));
        let err = plan(&project(), &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("scene 2"));
    }

    #[test]
    fn test_occupied_range_conflicts() {
        let mut info = project();
        info.clips.push(TimelineClip {
            id: ClipId(1),
            media: MediaId(1),
            track: TrackId(1),
            start: 250,
            duration: 10,
            source_in: 0,
            scene: None,
        });
        let err = plan(&info, &CompositionRequest::new(three_scenes())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let appended = CompositionRequest::new(three_scenes()).with_track_plan(TrackPlan {
            start: 260,
            ..Default::default()
        });
        assert!(plan(&info, &appended).is_ok());
    }
}
