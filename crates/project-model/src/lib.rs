//! Montage Project Model
//!
//! Defines the core data contracts shared by the editor client, the
//! composer, and the checkpoint store:
//! - **Media:** Clips in the editor's media pool
//! - **Timeline:** Tracks, placed clips, transitions, and markers
//! - **Project:** The externally observable editor state as one value
//! - **Scenes:** Declarative composition input
//!
//! All positions and durations are integer frames.

pub mod ids;
pub mod media;
pub mod project;
pub mod scene;
pub mod timeline;

pub use ids::*;
pub use media::*;
pub use project::*;
pub use scene::*;
pub use timeline::*;
