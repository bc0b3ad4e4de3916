//! Montage Composer
//!
//! Turns declarative scene lists into editor timelines:
//! - **Planning:** Scene list + policies to an ordered list of atomic ops
//! - **Execution:** Ops run one at a time; the first failure halts the run
//! - **Replacement:** Swap one scene's media in place, keeping its slot
//!   and its transitions
//!
//! Planning is pure computation. Execution talks to the editor only
//! through [`montage_editor::AtomicClient`], and never undoes committed
//! work: rolling back is what checkpoints are for.

pub mod error;
pub mod execute;
pub mod plan;
pub mod policy;
pub mod replace;

pub use error::{ComposeError, ReplaceError};
pub use execute::{CommittedOp, Composer, ComposerConfig, CompositionResult, OpOutcome};
pub use plan::{plan, Plan, PlannedOp, ScenePlacement, TrackRef};
pub use policy::{
    default_policies, CompositionRequest, MarkerPolicy, MarkerSpec, TrackPlan, TrackSelector,
    TransitionPolicy,
};
pub use replace::{
    ReplacePlan, ReplaceRequest, ReplaceResult, ReplaceStep, ReplaceTarget, SceneReplacer, Side,
};
