//! Failures of composite operations.
//!
//! A composite either fails before touching the editor (`Preflight`, the
//! project is exactly as it was) or halts part-way (`Halted`), in which case
//! the steps already committed stay committed and are listed.

use montage_common::error::{ErrorKind, MontageError};

use crate::execute::CommittedOp;
use crate::plan::PlannedOp;
use crate::replace::ReplaceStep;

/// Failure of [`crate::Composer::compose`].
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Nothing was sent to the editor.
    #[error("composition rejected: {0}")]
    Preflight(#[source] MontageError),

    /// Execution stopped at `failed` (plan position `index`); `committed`
    /// remain applied.
    #[error("composition halted at step {} of {total} ({failed}): {cause}", .index + 1)]
    Halted {
        committed: Vec<CommittedOp>,
        failed: PlannedOp,
        index: usize,
        total: usize,
        #[source]
        cause: MontageError,
    },
}

impl ComposeError {
    /// Kind of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        self.cause().kind()
    }

    pub fn cause(&self) -> &MontageError {
        match self {
            ComposeError::Preflight(cause) | ComposeError::Halted { cause, .. } => cause,
        }
    }

    /// Steps that were committed before the failure.
    pub fn committed(&self) -> &[CommittedOp] {
        match self {
            ComposeError::Preflight(_) => &[],
            ComposeError::Halted { committed, .. } => committed,
        }
    }
}

/// Failure of [`crate::SceneReplacer::replace`].
#[derive(Debug, thiserror::Error)]
pub enum ReplaceError {
    /// Nothing was sent to the editor.
    #[error("replacement rejected: {0}")]
    Preflight(#[source] MontageError),

    /// Execution stopped at `failed`; `completed` remain applied.
    #[error("replacement halted at {failed}: {cause}")]
    Halted {
        completed: Vec<ReplaceStep>,
        failed: ReplaceStep,
        #[source]
        cause: MontageError,
    },

    /// Every step ran but none of them placed the new clip.
    #[error("replacement incomplete after {} steps: {cause}", completed.len())]
    Incomplete {
        completed: Vec<ReplaceStep>,
        #[source]
        cause: MontageError,
    },
}

impl ReplaceError {
    pub fn kind(&self) -> ErrorKind {
        self.cause().kind()
    }

    pub fn cause(&self) -> &MontageError {
        match self {
            ReplaceError::Preflight(cause)
            | ReplaceError::Halted { cause, .. }
            | ReplaceError::Incomplete { cause, .. } => cause,
        }
    }

    pub fn completed(&self) -> &[ReplaceStep] {
        match self {
            ReplaceError::Preflight(_) => &[],
            ReplaceError::Halted { completed, .. } | ReplaceError::Incomplete { completed, .. } => {
                completed
            }
        }
    }
}
