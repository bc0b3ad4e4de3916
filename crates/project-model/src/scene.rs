//! Declarative composition input.
//!
//! A scene list is created by the caller for one composition request and
//! is never persisted; what survives in the project is the scene tag on
//! each placed [`crate::TimelineClip`].

use serde::{Deserialize, Serialize};

use crate::ids::{Frames, MediaId, SceneNumber};
use crate::timeline::TransitionKind;

/// Kind and length of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionSpec {
    #[serde(default)]
    pub kind: TransitionKind,
    pub duration: Frames,
}

impl TransitionSpec {
    pub fn dissolve(duration: Frames) -> Self {
        Self {
            kind: TransitionKind::CrossDissolve,
            duration,
        }
    }
}

/// Per-scene override for the edge into the following scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransitionHint {
    /// Hard cut, even when the policy asks for transitions.
    Cut,
    /// Use this transition instead of the policy default.
    Transition(TransitionSpec),
}

/// One media reference inside a scene, with optional trim points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneClip {
    pub media: MediaId,

    /// First source frame to use (default: start of media).
    #[serde(default)]
    pub source_in: Option<Frames>,

    /// Source frame to stop before (default: end of media).
    #[serde(default)]
    pub source_out: Option<Frames>,
}

impl SceneClip {
    pub fn new(media: MediaId) -> Self {
        Self {
            media,
            source_in: None,
            source_out: None,
        }
    }

    pub fn trimmed(media: MediaId, source_in: Frames, source_out: Frames) -> Self {
        Self {
            media,
            source_in: Some(source_in),
            source_out: Some(source_out),
        }
    }
}

/// One scene of a composition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSpec {
    /// Scene number used to tag placed clips.
    pub number: SceneNumber,

    /// Media placed back to back for this scene.
    pub clips: Vec<SceneClip>,

    /// Override for the transition into the next scene.
    #[serde(default)]
    pub transition: Option<TransitionHint>,
}

impl SceneSpec {
    /// Scene consisting of a single untrimmed media clip.
    pub fn single(number: SceneNumber, media: MediaId) -> Self {
        Self {
            number,
            clips: vec![SceneClip::new(media)],
            transition: None,
        }
    }

    pub fn with_transition(mut self, hint: TransitionHint) -> Self {
        self.transition = Some(hint);
        self
    }
}
