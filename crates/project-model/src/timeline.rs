//! Timeline types: tracks, placed clips, transitions, and markers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{ClipId, Frames, MarkerId, MediaId, SceneNumber, TrackId, TransitionId};
use crate::media::MediaKind;

/// Half-open frame interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Frames,
    pub end: Frames,
}

impl Span {
    /// Span starting at `start` lasting `duration` frames. The end saturates
    /// at the last representable frame; use [`Span::checked_at`] where that
    /// must be an error.
    pub fn at(start: Frames, duration: Frames) -> Self {
        Self {
            start,
            end: start.saturating_add(duration),
        }
    }

    /// Like [`Span::at`], but `None` when the end does not fit in a frame count.
    pub fn checked_at(start: Frames, duration: Frames) -> Option<Self> {
        start.checked_add(duration).map(|end| Self { start, end })
    }

    pub fn len(&self) -> Frames {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Overlapping part of two spans, if any.
    pub fn intersect(&self, other: &Span) -> Option<Span> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Span { start, end })
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.intersect(other).is_some()
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Track lane type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    /// Whether media of `kind` may be placed on a track of this kind.
    pub fn accepts(self, kind: MediaKind) -> bool {
        match self {
            TrackKind::Video => matches!(kind, MediaKind::Video | MediaKind::Image),
            TrackKind::Audio => matches!(kind, MediaKind::Audio),
        }
    }

    /// Single-letter label used in track names (`V1`, `A1`).
    pub fn letter(self) -> char {
        match self {
            TrackKind::Video => 'V',
            TrackKind::Audio => 'A',
        }
    }
}

/// An ordered lane holding timeline clips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub kind: TrackKind,
    pub name: String,
    /// Stacking order; lower index is closer to the base of the timeline.
    pub index: u32,
}

/// A media clip placed on a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineClip {
    pub id: ClipId,
    pub media: MediaId,
    pub track: TrackId,
    /// Timeline position of the first frame.
    pub start: Frames,
    /// Length on the timeline.
    pub duration: Frames,
    /// Offset into the source media where playback begins.
    #[serde(default)]
    pub source_in: Frames,
    /// Scene this clip was placed for, when placed by the composer.
    #[serde(default)]
    pub scene: Option<SceneNumber>,
}

impl TimelineClip {
    pub fn span(&self) -> Span {
        Span::at(self.start, self.duration)
    }

    pub fn end(&self) -> Frames {
        self.start.saturating_add(self.duration)
    }
}

/// Transition style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    #[default]
    CrossDissolve,
    Wipe,
    Slide,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionKind::CrossDissolve => "dissolve",
            TransitionKind::Wipe => "wipe",
            TransitionKind::Slide => "slide",
        };
        f.write_str(name)
    }
}

/// A transition between two temporally overlapping clips.
///
/// The transition runs from the start of the incoming clip (`to`) for
/// `duration` frames, and that span must lie inside both clips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    /// Outgoing clip (earlier start).
    pub from: ClipId,
    /// Incoming clip (later start).
    pub to: ClipId,
    pub kind: TransitionKind,
    pub duration: Frames,
    /// Timeline span covered by the transition.
    pub span: Span,
}

impl Transition {
    /// Whether the transition is anchored to `clip` at either end.
    pub fn touches(&self, clip: ClipId) -> bool {
        self.from == clip || self.to == clip
    }
}

/// Compute the span a transition of `duration` frames would occupy between
/// `from` and `to`, or `None` when the clips cannot host it.
pub fn transition_span(from: &TimelineClip, to: &TimelineClip, duration: Frames) -> Option<Span> {
    if duration == 0 || from.id == to.id || to.start <= from.start {
        return None;
    }
    let span = Span::at(to.start, duration);
    let window = from.span().intersect(&to.span())?;
    window.contains_span(&span).then_some(span)
}

/// Marker color/category, matching the editor's guide palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MarkerCategory {
    #[default]
    Purple,
    Blue,
    Cyan,
    Green,
    Yellow,
    Orange,
    Red,
}

impl MarkerCategory {
    pub const ALL: [MarkerCategory; 7] = [
        MarkerCategory::Purple,
        MarkerCategory::Blue,
        MarkerCategory::Cyan,
        MarkerCategory::Green,
        MarkerCategory::Yellow,
        MarkerCategory::Orange,
        MarkerCategory::Red,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkerCategory::Purple => "Purple",
            MarkerCategory::Blue => "Blue",
            MarkerCategory::Cyan => "Cyan",
            MarkerCategory::Green => "Green",
            MarkerCategory::Yellow => "Yellow",
            MarkerCategory::Orange => "Orange",
            MarkerCategory::Red => "Red",
        }
    }
}

impl fmt::Display for MarkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MarkerCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Unrecognized marker color name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown marker color {0:?} (expected Purple, Blue, Cyan, Green, Yellow, Orange or Red)")]
pub struct UnknownCategory(pub String);

/// A point-in-time annotation on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub position: Frames,
    pub category: MarkerCategory,
    pub label: String,
    #[serde(default)]
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: u64, start: Frames, duration: Frames) -> TimelineClip {
        TimelineClip {
            id: ClipId(id),
            media: MediaId(1),
            track: TrackId(1),
            start,
            duration,
            source_in: 0,
            scene: None,
        }
    }

    #[test]
    fn test_span_intersection() {
        let a = Span::at(0, 5);
        let b = Span::at(4, 3);
        assert_eq!(a.intersect(&b), Some(Span { start: 4, end: 5 }));
        assert_eq!(Span::at(0, 5).intersect(&Span::at(5, 2)), None);
        assert!(Span::at(0, 10).contains_span(&Span::at(2, 3)));
        assert_eq!(Span::at(3, 0).len(), 0);
        assert!(Span::at(3, 0).is_empty());
    }

    #[test]
    fn test_span_end_near_frame_limit() {
        assert_eq!(Span::checked_at(u64::MAX - 5, 10), None);
        assert_eq!(
            Span::checked_at(u64::MAX - 5, 5),
            Some(Span { start: u64::MAX - 5, end: u64::MAX })
        );
        assert_eq!(Span::at(u64::MAX - 5, 10).end, u64::MAX);
    }

    #[test]
    fn test_transition_span_inside_overlap() {
        let a = clip(1, 0, 5);
        let b = clip(2, 4, 3);
        assert_eq!(transition_span(&a, &b, 1), Some(Span { start: 4, end: 5 }));
        assert_eq!(transition_span(&a, &b, 2), None);
        assert_eq!(transition_span(&b, &a, 1), None);
        assert_eq!(transition_span(&a, &b, 0), None);
    }

    #[test]
    fn test_transition_span_rejects_adjacent_clips() {
        let a = clip(1, 0, 5);
        let b = clip(2, 5, 3);
        assert_eq!(transition_span(&a, &b, 1), None);
    }

    #[test]
    fn test_track_kind_compatibility() {
        assert!(TrackKind::Video.accepts(MediaKind::Video));
        assert!(TrackKind::Video.accepts(MediaKind::Image));
        assert!(!TrackKind::Video.accepts(MediaKind::Audio));
        assert!(TrackKind::Audio.accepts(MediaKind::Audio));
        assert!(!TrackKind::Audio.accepts(MediaKind::Video));
    }

    #[test]
    fn test_marker_category_parse() {
        assert_eq!("purple".parse::<MarkerCategory>(), Ok(MarkerCategory::Purple));
        assert_eq!(" Red ".parse::<MarkerCategory>(), Ok(MarkerCategory::Red));
        assert!("magenta".parse::<MarkerCategory>().is_err());
    }

    proptest::proptest! {
        #[test]
        fn transition_span_always_fits_both_clips(
            a_start in 0u64..200,
            a_len in 1u64..100,
            b_start in 0u64..300,
            b_len in 1u64..100,
            duration in 0u64..60,
        ) {
            let a = clip(1, a_start, a_len);
            let b = clip(2, b_start, b_len);
            if let Some(span) = transition_span(&a, &b, duration) {
                proptest::prop_assert_eq!(span.start, b.start);
                proptest::prop_assert_eq!(span.len(), duration);
                proptest::prop_assert!(a.span().contains_span(&span));
                proptest::prop_assert!(b.span().contains_span(&span));
            }
        }
    }
}
