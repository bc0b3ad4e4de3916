//! Identifier types.
//!
//! Every entity the editor owns is addressed by a numeric id wrapped in its
//! own type, so a clip id can never be passed where a track id is expected.
//! Ids are issued by the editor, unique within a project, and never reused
//! after deletion: a stale reference fails lookup instead of silently
//! addressing a newer entity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Integer frame count or frame position.
pub type Frames = u64;

/// Caller-assigned scene number (1-based by convention).
pub type SceneNumber = u32;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Short prefix used in the display form.
            pub const PREFIX: &'static str = $prefix;

            /// Raw numeric value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            /// Accepts both the bare number (`7`) and the display form (`clip-7`).
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                let digits = trimmed
                    .strip_prefix($prefix)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .unwrap_or(trimmed);
                digits.parse::<u64>().map($name).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                    input: s.to_string(),
                })
            }
        }
    };
}

entity_id!(
    /// Media pool clip identifier (the editor's bin id).
    MediaId,
    "bin"
);
entity_id!(
    /// Placed timeline clip identifier.
    ClipId,
    "clip"
);
entity_id!(
    /// Timeline track identifier.
    TrackId,
    "track"
);
entity_id!(
    /// Transition (mix) identifier.
    TransitionId,
    "mix"
);
entity_id!(
    /// Timeline marker (guide) identifier.
    MarkerId,
    "guide"
);

/// Failure to parse an id from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {input:?}")]
pub struct ParseIdError {
    kind: &'static str,
    input: String,
}
