use std::cell::Cell;
use std::time::Duration;

use montage_common::error::ErrorKind;
use montage_composer::{
    ComposeError, Composer, ComposerConfig, CompositionRequest, MarkerPolicy, OpOutcome,
    TrackPlan, TransitionPolicy,
};
use montage_editor::{
    AddTransition, AtomicClient, BackendError, BackendResult, ClipEdit, EditorBackend, Fault,
    ImportMedia, Imported, InMemoryEditor, InsertClip, NewMarker, TrimEdge,
};
use montage_project_model::{
    ClipId, Frames, Marker, MarkerCategory, MarkerId, MediaId, ProjectInfo, ProjectSettings,
    SceneSpec, Span, TimelineClip, Track, TrackId, TrackKind, Transition, TransitionId,
    TransitionSpec,
};

const FPS: u64 = 25;

fn client_with_media(seconds: &[u64]) -> (AtomicClient<InMemoryEditor>, Vec<MediaId>) {
    let mut client = AtomicClient::with_defaults(InMemoryEditor::with_standard_tracks(
        ProjectSettings::default(),
    ));
    let media = seconds
        .iter()
        .enumerate()
        .map(|(i, secs)| {
            client
                .import_media(&ImportMedia {
                    source: format!("/footage/scene{:02}.mp4", i + 1),
                    kind: None,
                    duration: Some(secs * FPS),
                })
                .expect("import should succeed")
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

fn video_spans(info: &ProjectInfo) -> Vec<Span> {
    let track = info.first_track(TrackKind::Video).expect("video track").id;
    info.clips_on_track(track).iter().map(|c| c.span()).collect()
}

fn secs(start: u64, end: u64) -> Span {
    Span {
        start: start * FPS,
        end: end * FPS,
    }
}

#[test]
fn three_scenes_with_cuts_are_contiguous() {
    let (mut client, media) = client_with_media(&[5, 3, 4]);
    let result = Composer::default()
        .compose(&mut client, &CompositionRequest::new(scenes(&media)))
        .expect("composition should succeed");

    let info = client.project_info().unwrap();
    assert_eq!(
        video_spans(&info),
        vec![secs(0, 5), secs(5, 8), secs(8, 12)]
    );
    assert!(info.transitions.is_empty());
    assert_eq!(result.clips.len(), 3);
    for (n, clip) in result.clips.iter().enumerate() {
        assert_eq!(info.clip(*clip).unwrap().scene, Some(n as u32 + 1));
    }
}

#[test]
fn three_scenes_with_one_second_dissolves_overlap() {
    let (mut client, media) = client_with_media(&[5, 3, 4]);
    let request = CompositionRequest::new(scenes(&media))
        .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(FPS)));
    let result = Composer::default()
        .compose(&mut client, &request)
        .expect("composition should succeed");

    let info = client.project_info().unwrap();
    assert_eq!(
        video_spans(&info),
        vec![secs(0, 5), secs(4, 7), secs(6, 10)]
    );
    let mut spans: Vec<Span> = info.transitions.iter().map(|t| t.span).collect();
    spans.sort_by_key(|s| s.start);
    assert_eq!(spans, vec![secs(4, 5), secs(6, 7)]);
    assert!(info.transitions.iter().all(|t| t.duration == FPS));
    assert_eq!(result.transitions().len(), 2);
}

#[test]
fn build_failing_on_second_of_five_ops_reports_one_committed() {
    let (mut client, media) = client_with_media(&[5, 3, 4]);
    let request = CompositionRequest::new(scenes(&media))
        .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(FPS)));
    let plan = Composer::default().plan(&mut client, &request).unwrap();
    assert_eq!(plan.len(), 5);

    client
        .backend_mut()
        .fail_mutation(2, Fault::Reject("track is locked".to_string()));
    let err = Composer::default()
        .compose(&mut client, &request)
        .expect_err("second op should fail");

    match &err {
        ComposeError::Halted {
            committed,
            failed,
            index,
            cause,
            ..
        } => {
            assert_eq!(committed.len(), 1);
            assert!(matches!(committed[0].outcome, OpOutcome::Clip(_)));
            assert_eq!(*index, 1);
            assert_eq!(failed, &plan.ops[1]);
            assert_eq!(cause.kind(), ErrorKind::BackendRejected);
            assert!(cause.to_string().contains("track is locked"));
        }
        other => panic!("expected a halted composition, got {other:?}"),
    }

    let info = client.project_info().unwrap();
    assert_eq!(video_spans(&info), vec![secs(0, 5)]);
    assert!(info.transitions.is_empty());
}

#[test]
fn timeout_mid_plan_surfaces_as_backend_unavailable() {
    let (mut client, media) = client_with_media(&[5, 3]);
    client.backend_mut().fail_mutation(2, Fault::Timeout);
    let err = Composer::default()
        .compose(&mut client, &CompositionRequest::new(scenes(&media)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    assert_eq!(err.committed().len(), 1);
}

#[test]
fn markers_and_audio_bed_follow_the_scenes() {
    let (mut client, mut media) = client_with_media(&[5, 3, 4]);
    let bed = client
        .import_media(&ImportMedia {
            source: "/music/bed.wav".to_string(),
            kind: None,
            duration: Some(60 * FPS),
        })
        .unwrap()
        .media
        .id;

    let request = CompositionRequest::new(scenes(&media))
        .with_transitions(TransitionPolicy::uniform(TransitionSpec::dissolve(FPS)))
        .with_markers(MarkerPolicy::scene_boundaries(MarkerCategory::Green))
        .with_track_plan(TrackPlan {
            audio_bed: Some(bed),
            ..Default::default()
        });
    let result = Composer::default().compose(&mut client, &request).unwrap();
    assert_eq!(result.markers().len(), 3);

    let info = client.project_info().unwrap();
    let mut markers: Vec<(Frames, &str)> = info
        .markers
        .iter()
        .map(|m| (m.position, m.label.as_str()))
        .collect();
    markers.sort();
    assert_eq!(
        markers,
        vec![
            (0, "Scene 1"),
            (4 * FPS, "Scene 2"),
            (6 * FPS, "Scene 3")
        ]
    );
    assert!(info.markers.iter().all(|m| m.category == MarkerCategory::Green));

    let audio = info.first_track(TrackKind::Audio).unwrap().id;
    let bed_clips = info.clips_on_track(audio);
    assert_eq!(bed_clips.len(), 1);
    assert_eq!(bed_clips[0].span(), secs(0, 10));
    assert_eq!(bed_clips[0].scene, None);

    media.push(bed);
    assert_eq!(info.media.len(), media.len());
}

#[test]
fn composing_into_an_empty_project_creates_the_video_track() {
    let mut client = AtomicClient::with_defaults(InMemoryEditor::new(ProjectSettings::default()));
    let clip = client
        .import_media(&ImportMedia {
            source: "/footage/only.mov".to_string(),
            kind: None,
            duration: Some(50),
        })
        .unwrap()
        .media
        .id;

    let result = Composer::default()
        .compose(&mut client, &CompositionRequest::new(vec![SceneSpec::single(1, clip)]))
        .unwrap();
    assert!(matches!(result.committed[0].outcome, OpOutcome::Track(_)));

    let info = client.project_info().unwrap();
    assert_eq!(info.tracks.len(), 1);
    assert_eq!(video_spans(&info), vec![Span { start: 0, end: 50 }]);
}

/// Editor whose first reads fail as if it were still starting up.
struct SlowStart {
    inner: InMemoryEditor,
    failing_reads: Cell<u32>,
}

impl EditorBackend for SlowStart {
    fn name(&self) -> &str {
        "slow-start"
    }

    fn set_call_timeout(&mut self, timeout: Duration) {
        self.inner.set_call_timeout(timeout);
    }

    fn import_media(&mut self, request: &ImportMedia) -> BackendResult<Imported> {
        self.inner.import_media(request)
    }

    fn add_track(&mut self, kind: TrackKind, name: &str) -> BackendResult<Track> {
        self.inner.add_track(kind, name)
    }

    fn insert_clip(&mut self, request: &InsertClip) -> BackendResult<TimelineClip> {
        self.inner.insert_clip(request)
    }

    fn move_clip(
        &mut self,
        clip: ClipId,
        track: TrackId,
        position: Frames,
    ) -> BackendResult<ClipEdit> {
        self.inner.move_clip(clip, track, position)
    }

    fn trim_clip(
        &mut self,
        clip: ClipId,
        duration: Frames,
        edge: TrimEdge,
    ) -> BackendResult<ClipEdit> {
        self.inner.trim_clip(clip, duration, edge)
    }

    fn delete_clip(&mut self, clip: ClipId) -> BackendResult<Vec<TransitionId>> {
        self.inner.delete_clip(clip)
    }

    fn add_transition(&mut self, request: &AddTransition) -> BackendResult<Transition> {
        self.inner.add_transition(request)
    }

    fn remove_transition(&mut self, id: TransitionId) -> BackendResult<()> {
        self.inner.remove_transition(id)
    }

    fn add_marker(&mut self, request: &NewMarker) -> BackendResult<Marker> {
        self.inner.add_marker(request)
    }

    fn delete_marker(&mut self, id: MarkerId) -> BackendResult<()> {
        self.inner.delete_marker(id)
    }

    fn delete_markers_by_category(&mut self, category: MarkerCategory) -> BackendResult<usize> {
        self.inner.delete_markers_by_category(category)
    }

    fn project_info(&self) -> BackendResult<ProjectInfo> {
        let remaining = self.failing_reads.get();
        if remaining > 0 {
            self.failing_reads.set(remaining - 1);
            return Err(BackendError::Unreachable("editor is starting".to_string()));
        }
        self.inner.project_info()
    }

    fn save_project(&mut self) -> BackendResult<Vec<u8>> {
        self.inner.save_project()
    }

    fn load_project(&mut self, snapshot: &[u8]) -> BackendResult<()> {
        self.inner.load_project(snapshot)
    }
}

fn slow_start_client(failing_reads: u32) -> (AtomicClient<SlowStart>, MediaId) {
    let mut inner = InMemoryEditor::with_standard_tracks(ProjectSettings::default());
    let media = inner
        .import_media(&ImportMedia {
            source: "/footage/a.mp4".to_string(),
            kind: None,
            duration: Some(40),
        })
        .unwrap()
        .media
        .id;
    let client = AtomicClient::with_defaults(SlowStart {
        inner,
        failing_reads: Cell::new(failing_reads),
    });
    (client, media)
}

#[test]
fn initial_read_is_retried_while_editor_is_unavailable() {
    let (mut client, media) = slow_start_client(2);
    let composer = Composer::new(ComposerConfig { read_retries: 2 });
    let result = composer
        .compose(&mut client, &CompositionRequest::new(vec![SceneSpec::single(1, media)]))
        .expect("third read should succeed");
    assert_eq!(result.clips.len(), 1);
}

#[test]
fn retries_are_bounded() {
    let (mut client, media) = slow_start_client(3);
    let composer = Composer::new(ComposerConfig { read_retries: 2 });
    let err = composer
        .compose(&mut client, &CompositionRequest::new(vec![SceneSpec::single(1, media)]))
        .unwrap_err();
    assert!(matches!(err, ComposeError::Preflight(_)));
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    assert!(client.backend().inner.state().clips.is_empty());
}
