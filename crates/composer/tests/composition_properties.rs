use proptest::prelude::*;

use montage_composer::{Composer, CompositionRequest, TransitionPolicy};
use montage_editor::{AtomicClient, ImportMedia, InMemoryEditor};
use montage_project_model::{
    Frames, MediaId, ProjectInfo, ProjectSettings, SceneSpec, Span, TimelineClip, TrackKind,
    TransitionSpec,
};

fn compose(durations: &[Frames], transitions: TransitionPolicy) -> ProjectInfo {
    let mut client = AtomicClient::with_defaults(InMemoryEditor::with_standard_tracks(
        ProjectSettings::default(),
    ));
    let media: Vec<MediaId> = durations
        .iter()
        .enumerate()
        .map(|(i, frames)| {
            client
                .import_media(&ImportMedia {
                    source: format!("/footage/{i}.mp4"),
                    kind: None,
                    duration: Some(*frames),
                })
                .unwrap()
                .media
                .id
        })
        .collect();
    let scenes = media
        .iter()
        .enumerate()
        .map(|(i, m)| SceneSpec::single(i as u32 + 1, *m))
        .collect();
    Composer::default()
        .compose(
            &mut client,
            &CompositionRequest::new(scenes).with_transitions(transitions),
        )
        .unwrap();
    client.project_info().unwrap()
}

fn scene_clips(info: &ProjectInfo, count: usize) -> Vec<TimelineClip> {
    (1..=count as u32)
        .map(|n| info.scene_clips(n)[0].clone())
        .collect()
}

proptest! {
    #[test]
    fn cuts_place_scenes_at_prefix_sums(durations in prop::collection::vec(1u64..500, 1..8)) {
        let info = compose(&durations, TransitionPolicy::cuts());
        let clips = scene_clips(&info, durations.len());

        let mut expected_start = 0;
        for (clip, duration) in clips.iter().zip(&durations) {
            prop_assert_eq!(clip.start, expected_start);
            prop_assert_eq!(clip.duration, *duration);
            expected_start += duration;
        }
        for pair in clips.windows(2) {
            prop_assert_eq!(pair[0].end(), pair[1].start);
        }
        prop_assert!(info.transitions.is_empty());
    }

    #[test]
    fn dissolves_overlap_by_exactly_their_duration(
        (d, durations) in (1u64..40).prop_flat_map(|d| {
            (Just(d), prop::collection::vec((2 * d + 1)..(2 * d + 300), 2..8))
        })
    ) {
        let info = compose(&durations, TransitionPolicy::uniform(TransitionSpec::dissolve(d)));
        let clips = scene_clips(&info, durations.len());
        prop_assert_eq!(info.transitions.len(), durations.len() - 1);

        for pair in clips.windows(2) {
            let overlap = pair[0].span().intersect(&pair[1].span());
            prop_assert_eq!(overlap, Some(Span::at(pair[1].start, d)));

            let transition = info
                .transitions
                .iter()
                .find(|t| t.from == pair[0].id && t.to == pair[1].id);
            prop_assert!(transition.is_some());
            let transition = transition.unwrap();
            prop_assert_eq!(transition.duration, d);
            prop_assert_eq!(Some(transition.span), overlap);
        }

        let track = info.first_track(TrackKind::Video).unwrap().id;
        prop_assert_eq!(info.clips_on_track(track).len(), durations.len());
    }
}
