//! Deferred confirmation protocol for destructive catalog operations.
//!
//! Category, comic, episode, season, and premium-package deletion all
//! fan out to dependent rows and unrecoverable blob objects. The
//! protocol forces a review step: `initiate` returns the dependent
//! snapshot behind a single-use, TTL-bound key; `confirm` presents that
//! key plus the issuer's token to execute the deletion.

mod coordinator;
mod key;

pub use coordinator::{
    ConfirmationCoordinator, DeletionReport, InitiateOutcome, DEFAULT_CONFIRM_TTL,
};
pub use key::{OperationKey, Subject, SubjectKind};

use serde::{Deserialize, Serialize};

/// One row that would be removed alongside the subject. Shown to the
/// caller at initiation, frozen into the pending operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    /// Entity name of the referencing row.
    pub entity: String,
    pub id: String,
    /// Human-readable hint for review ("episode 3", "comic 0f2c…").
    pub label: String,
}
