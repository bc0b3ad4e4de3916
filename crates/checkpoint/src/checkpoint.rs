//! Checkpoint records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque checkpoint handle, displayed as `cp-0007`. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckpointId(pub u64);

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cp-{:04}", self.0)
    }
}

/// A string that is not a checkpoint id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid checkpoint id {0:?} (expected cp-NNNN)")]
pub struct ParseCheckpointIdError(pub String);

impl FromStr for CheckpointId {
    type Err = ParseCheckpointIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("cp-").unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(CheckpointId)
            .map_err(|_| ParseCheckpointIdError(s.to_string()))
    }
}

impl TryFrom<String> for CheckpointId {
    type Error = ParseCheckpointIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CheckpointId> for String {
    fn from(id: CheckpointId) -> Self {
        id.to_string()
    }
}

/// Metadata of one saved snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// All checkpoints of a project plus the id counter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointIndex {
    /// Last id handed out.
    #[serde(default)]
    pub last_id: u64,
    /// In creation order.
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

impl CheckpointIndex {
    pub fn get(&self, id: CheckpointId) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.id == id)
    }

    /// Newest checkpoint carrying `label`.
    pub fn latest_with_label(&self, label: &str) -> Option<&Checkpoint> {
        self.checkpoints.iter().rev().find(|c| c.label == label)
    }

    pub fn latest(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }

    pub(crate) fn next_id(&mut self) -> CheckpointId {
        self.last_id += 1;
        CheckpointId(self.last_id)
    }
}
