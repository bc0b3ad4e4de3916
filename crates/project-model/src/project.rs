//! Project-level state.
//!
//! [`ProjectInfo`] is everything an outside observer can read back from the
//! editor in one call: the media pool, the tracks, and everything placed on
//! them. Two projects with equal `ProjectInfo` are indistinguishable to a
//! caller, which is the yardstick checkpoint restores are measured against.

use serde::{Deserialize, Serialize};

use crate::ids::{ClipId, Frames, MarkerId, MediaId, SceneNumber, TrackId, TransitionId};
use crate::media::MediaClip;
use crate::timeline::{Marker, TimelineClip, Track, TrackKind, Transition};

/// Project-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Human-readable project name.
    pub name: String,

    /// Timeline frame rate.
    pub fps: f64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            fps: 25.0,
        }
    }
}

/// Snapshot of the externally observable editor state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub settings: ProjectSettings,
    pub media: Vec<MediaClip>,
    pub tracks: Vec<Track>,
    pub clips: Vec<TimelineClip>,
    pub transitions: Vec<Transition>,
    pub markers: Vec<Marker>,
}

impl ProjectInfo {
    pub fn media(&self, id: MediaId) -> Option<&MediaClip> {
        self.media.iter().find(|m| m.id == id)
    }

    /// Media clip imported from `source`, if any.
    pub fn media_by_source(&self, source: &str) -> Option<&MediaClip> {
        self.media.iter().find(|m| m.source == source)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Lowest-index track of the given kind.
    pub fn first_track(&self, kind: TrackKind) -> Option<&Track> {
        self.tracks
            .iter()
            .filter(|t| t.kind == kind)
            .min_by_key(|t| (t.index, t.id))
    }

    /// Tracks in stacking order.
    pub fn ordered_tracks(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.tracks.iter().collect();
        tracks.sort_by_key(|t| (t.index, t.id));
        tracks
    }

    pub fn clip(&self, id: ClipId) -> Option<&TimelineClip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Clips on `track`, ordered by start.
    pub fn clips_on_track(&self, track: TrackId) -> Vec<&TimelineClip> {
        let mut clips: Vec<&TimelineClip> = self.clips.iter().filter(|c| c.track == track).collect();
        clips.sort_by_key(|c| (c.start, c.id));
        clips
    }

    /// Clips tagged with `scene`, ordered by start.
    pub fn scene_clips(&self, scene: SceneNumber) -> Vec<&TimelineClip> {
        let mut clips: Vec<&TimelineClip> = self
            .clips
            .iter()
            .filter(|c| c.scene == Some(scene))
            .collect();
        clips.sort_by_key(|c| (c.start, c.id));
        clips
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    /// Transitions anchored to `clip` at either end.
    pub fn transitions_touching(&self, clip: ClipId) -> Vec<&Transition> {
        self.transitions.iter().filter(|t| t.touches(clip)).collect()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// End of the last clip on any track.
    pub fn timeline_end(&self) -> Frames {
        self.clips.iter().map(TimelineClip::end).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use crate::timeline::{MarkerCategory, Span, TransitionKind};

    fn sample() -> ProjectInfo {
        ProjectInfo {
            settings: ProjectSettings::default(),
            media: vec![MediaClip {
                id: MediaId(1),
                name: "a.mp4".to_string(),
                source: "/clips/a.mp4".to_string(),
                kind: MediaKind::Video,
                duration: 100,
            }],
            tracks: vec![
                Track {
                    id: TrackId(2),
                    kind: TrackKind::Video,
                    name: "V2".to_string(),
                    index: 1,
                },
                Track {
                    id: TrackId(1),
                    kind: TrackKind::Video,
                    name: "V1".to_string(),
                    index: 0,
                },
                Track {
                    id: TrackId(3),
                    kind: TrackKind::Audio,
                    name: "A1".to_string(),
                    index: 2,
                },
            ],
            clips: vec![
                TimelineClip {
                    id: ClipId(11),
                    media: MediaId(1),
                    track: TrackId(1),
                    start: 40,
                    duration: 20,
                    source_in: 0,
                    scene: Some(2),
                },
                TimelineClip {
                    id: ClipId(10),
                    media: MediaId(1),
                    track: TrackId(1),
                    start: 0,
                    duration: 45,
                    source_in: 0,
                    scene: Some(1),
                },
            ],
            transitions: vec![Transition {
                id: TransitionId(1),
                from: ClipId(10),
                to: ClipId(11),
                kind: TransitionKind::CrossDissolve,
                duration: 5,
                span: Span { start: 40, end: 45 },
            }],
            markers: vec![Marker {
                id: MarkerId(1),
                position: 40,
                category: MarkerCategory::Purple,
                label: "Scene 2".to_string(),
                note: String::new(),
            }],
        }
    }

    #[test]
    fn test_first_track_uses_lowest_index() {
        let info = sample();
        assert_eq!(info.first_track(TrackKind::Video).unwrap().id, TrackId(1));
        assert_eq!(info.first_track(TrackKind::Audio).unwrap().id, TrackId(3));
        let order: Vec<TrackId> = info.ordered_tracks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![TrackId(1), TrackId(2), TrackId(3)]);
    }

    #[test]
    fn test_clip_lookups_are_sorted() {
        let info = sample();
        let ids: Vec<ClipId> = info.clips_on_track(TrackId(1)).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ClipId(10), ClipId(11)]);
        assert_eq!(info.scene_clips(2)[0].id, ClipId(11));
        assert!(info.scene_clips(3).is_empty());
        assert_eq!(info.timeline_end(), 60);
    }

    #[test]
    fn test_transitions_touching() {
        let info = sample();
        assert_eq!(info.transitions_touching(ClipId(10)).len(), 1);
        assert_eq!(info.transitions_touching(ClipId(11)).len(), 1);
        assert!(info.transitions_touching(ClipId(99)).is_empty());
    }

    #[test]
    fn test_project_info_round_trips_through_json() {
        let info = sample();
        let json = serde_json::to_string_pretty(&info).unwrap();
        let parsed: ProjectInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, info);
    }
}
