//! Montage Checkpoints
//!
//! Labelled, restorable snapshots of the whole editor project. Checkpoints
//! know nothing about scenes or compositions: restoring one brings back
//! everything the editor stored, scene tags included.

pub mod checkpoint;
pub mod storage;
pub mod store;

pub use checkpoint::{Checkpoint, CheckpointId, CheckpointIndex, ParseCheckpointIdError};
pub use storage::{DirectoryStorage, MemoryStorage, SnapshotStorage};
pub use store::{CheckpointStore, RestoreResult};
