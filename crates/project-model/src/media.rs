//! Media pool types.

use serde::{Deserialize, Serialize};

use crate::ids::{Frames, MediaId};

/// What kind of material a media clip holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    /// Guess the kind from a file extension. Returns `None` for unknown types.
    pub fn from_extension(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "mp4" | "mov" | "mkv" | "webm" | "avi" | "m4v" | "mxf" | "mts" => Some(Self::Video),
            "wav" | "mp3" | "flac" | "ogg" | "opus" | "m4a" | "aac" => Some(Self::Audio),
            "png" | "jpg" | "jpeg" | "webp" | "bmp" | "tif" | "tiff" | "svg" => Some(Self::Image),
            _ => None,
        }
    }

    /// Stills have no intrinsic length and can be stretched freely.
    pub fn is_still(self) -> bool {
        matches!(self, Self::Image)
    }
}

/// A clip in the media pool. Immutable once imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaClip {
    /// Editor-assigned bin id.
    pub id: MediaId,

    /// Display name (usually the file name).
    pub name: String,

    /// Source path or URI.
    pub source: String,

    /// Media kind.
    pub kind: MediaKind,

    /// Intrinsic duration in frames.
    pub duration: Frames,
}

impl MediaClip {
    /// Frames available after skipping `source_in` frames of the source.
    pub fn available_from(&self, source_in: Frames) -> Frames {
        if self.kind.is_still() {
            return self.duration;
        }
        self.duration.saturating_sub(source_in)
    }
}

/// File name component of a source path, falling back to the full string.
pub fn source_name(source: &str) -> String {
    std::path::Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("scene_01A.MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("/music/bed.flac"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_extension("title.png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("notes.txt"), None);
        assert_eq!(MediaKind::from_extension("no_extension"), None);
    }

    #[test]
    fn test_available_from_respects_in_point() {
        let clip = MediaClip {
            id: MediaId(1),
            name: "a.mp4".to_string(),
            source: "/clips/a.mp4".to_string(),
            kind: MediaKind::Video,
            duration: 100,
        };
        assert_eq!(clip.available_from(30), 70);
        assert_eq!(clip.available_from(150), 0);
    }

    #[test]
    fn test_source_name() {
        assert_eq!(source_name("/clips/scene_02.mp4"), "scene_02.mp4");
        assert_eq!(source_name("scene.mp4"), "scene.mp4");
    }
}
