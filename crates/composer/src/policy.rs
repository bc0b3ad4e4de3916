//! Composition request and the policies that shape it.

use serde::{Deserialize, Serialize};

use montage_common::config::CompositionDefaults;
use montage_project_model::{
    Frames, MarkerCategory, MediaId, SceneSpec, TrackId, TransitionHint, TransitionSpec,
};

/// Which video track receives the scene clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackSelector {
    /// A specific existing track.
    Id(TrackId),
    /// The lowest-index video track, created if the project has none.
    #[default]
    FirstVideo,
}

/// Where the composition lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrackPlan {
    #[serde(default)]
    pub video_track: TrackSelector,

    /// Audio media laid under the scenes from `start` on the first audio track.
    #[serde(default)]
    pub audio_bed: Option<MediaId>,

    /// Timeline position of the first scene.
    #[serde(default)]
    pub start: Frames,

    /// Frames left empty between two scenes joined by a cut.
    #[serde(default)]
    pub gap: Frames,
}

/// Transitions between adjacent scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransitionPolicy {
    /// Transition used for every scene edge without a hint; `None` cuts.
    #[serde(default)]
    pub default: Option<TransitionSpec>,
}

impl TransitionPolicy {
    pub fn cuts() -> Self {
        Self { default: None }
    }

    pub fn uniform(spec: TransitionSpec) -> Self {
        Self {
            default: Some(spec),
        }
    }

    /// Transition joining `scene` to the one after it.
    pub fn edge_after(&self, scene: &SceneSpec) -> Option<TransitionSpec> {
        match scene.transition {
            Some(TransitionHint::Cut) => None,
            Some(TransitionHint::Transition(spec)) => Some(spec),
            None => self.default,
        }
    }
}

/// A caller-placed marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub position: Frames,
    #[serde(default)]
    pub category: MarkerCategory,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub note: String,
}

/// Markers emitted with a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MarkerPolicy {
    /// Color of the `Scene N` marker placed at each scene start; `None` skips them.
    #[serde(default)]
    pub scene_boundaries: Option<MarkerCategory>,

    #[serde(default)]
    pub extra: Vec<MarkerSpec>,
}

impl MarkerPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn scene_boundaries(category: MarkerCategory) -> Self {
        Self {
            scene_boundaries: Some(category),
            extra: Vec::new(),
        }
    }
}

/// Everything one composition needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRequest {
    #[serde(default)]
    pub track_plan: TrackPlan,
    pub scenes: Vec<SceneSpec>,
    #[serde(default)]
    pub transitions: TransitionPolicy,
    #[serde(default)]
    pub markers: MarkerPolicy,
}

impl CompositionRequest {
    /// Scenes with cuts, no markers, on the first video track at frame 0.
    pub fn new(scenes: Vec<SceneSpec>) -> Self {
        Self {
            track_plan: TrackPlan::default(),
            scenes,
            transitions: TransitionPolicy::default(),
            markers: MarkerPolicy::default(),
        }
    }

    pub fn with_transitions(mut self, transitions: TransitionPolicy) -> Self {
        self.transitions = transitions;
        self
    }

    pub fn with_markers(mut self, markers: MarkerPolicy) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_track_plan(mut self, track_plan: TrackPlan) -> Self {
        self.track_plan = track_plan;
        self
    }
}

/// Policies derived from the configured composition defaults.
///
/// An unknown marker color in the config falls back to Purple.
pub fn default_policies(defaults: &CompositionDefaults) -> (TransitionPolicy, MarkerPolicy) {
    let transitions = if defaults.transition_frames == 0 {
        TransitionPolicy::cuts()
    } else {
        TransitionPolicy::uniform(TransitionSpec::dissolve(defaults.transition_frames))
    };
    let markers = if defaults.scene_markers {
        let category = defaults.marker_color.parse().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Falling back to Purple scene markers");
            MarkerCategory::Purple
        });
        MarkerPolicy::scene_boundaries(category)
    } else {
        MarkerPolicy::none()
    };
    (transitions, markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_project_model::TransitionKind;

    #[test]
    fn test_hint_overrides_default() {
        let policy = TransitionPolicy::uniform(TransitionSpec::dissolve(10));
        let plain = SceneSpec::single(1, MediaId(1));
        let cut = SceneSpec::single(2, MediaId(1)).with_transition(TransitionHint::Cut);
        let wipe = SceneSpec::single(3, MediaId(1)).with_transition(TransitionHint::Transition(
            TransitionSpec {
                kind: TransitionKind::Wipe,
                duration: 4,
            },
        ));

        assert_eq!(policy.edge_after(&plain), Some(TransitionSpec::dissolve(10)));
        assert_eq!(policy.edge_after(&cut), None);
        assert_eq!(policy.edge_after(&wipe).unwrap().kind, TransitionKind::Wipe);
        assert_eq!(TransitionPolicy::cuts().edge_after(&plain), None);
    }

    #[test]
    fn test_default_policies_follow_config() {
        let defaults = CompositionDefaults::default();
        let (transitions, markers) = default_policies(&defaults);
        assert_eq!(transitions.default, Some(TransitionSpec::dissolve(13)));
        assert_eq!(markers.scene_boundaries, Some(MarkerCategory::Purple));

        let defaults = CompositionDefaults {
            transition_frames: 0,
            scene_markers: true,
            marker_color: "nonsense".to_string(),
            ..Default::default()
        };
        let (transitions, markers) = default_policies(&defaults);
        assert_eq!(transitions, TransitionPolicy::cuts());
        assert_eq!(markers.scene_boundaries, Some(MarkerCategory::Purple));
    }

    #[test]
    fn test_request_json_defaults() {
        let request: CompositionRequest =
            serde_json::from_str(r#"{"scenes": [{"number": 1, "clips": [{"media": 4}]}]}"#)
                .unwrap();
        assert_eq!(request.track_plan.video_track, TrackSelector::FirstVideo);
        assert_eq!(request.transitions.default, None);
        assert!(request.markers.extra.is_empty());
    }
}
