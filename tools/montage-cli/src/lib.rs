//! Montage tool surface
//!
//! Named, JSON-shaped tools over one editor project, plus the on-disk
//! project layout the `montage` binary works against.

pub mod facade;
pub mod project_dir;
pub mod scan;

pub use facade::{
    describe_tools, Facade, TimelineSummary, ToolDescription, ToolError, ToolRequest,
    ToolResponse,
};
pub use project_dir::{DiskFacade, ProjectDir};
