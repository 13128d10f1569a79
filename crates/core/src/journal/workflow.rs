//! Forward-only entry workflow.
//!
//! Transitions are computed here and applied by the store as a
//! compare-and-swap on `EntryAction::from_status`.

use chrono::{DateTime, Utc};
use comptable_shared::types::UserId;
use serde::{Deserialize, Serialize};

use super::error::JournalError;
use super::types::{EntryStatus, JournalEntry};

/// A status transition with its audit data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryAction {
    /// DRAFT → VALIDATED.
    Validate {
        /// Validator.
        validated_by: UserId,
        /// Validation time.
        validated_at: DateTime<Utc>,
    },
    /// DRAFT → REJECTED.
    Reject {
        /// Rejecting actor.
        rejected_by: UserId,
        /// Rejection time.
        rejected_at: DateTime<Utc>,
        /// Reason, never empty.
        reason: String,
    },
    /// VALIDATED → POSTED.
    Post {
        /// Poster.
        posted_by: UserId,
        /// Posting time.
        posted_at: DateTime<Utc>,
    },
    /// VALIDATED → CANCELLED.
    Cancel {
        /// Cancelling actor.
        cancelled_by: UserId,
        /// Cancellation time.
        cancelled_at: DateTime<Utc>,
        /// Reason, never empty.
        reason: String,
    },
}

impl EntryAction {
    /// Status the entry must be in for the action to apply.
    #[must_use]
    pub fn from_status(&self) -> EntryStatus {
        match self {
            Self::Validate { .. } | Self::Reject { .. } => EntryStatus::Draft,
            Self::Post { .. } | Self::Cancel { .. } => EntryStatus::Validated,
        }
    }

    /// Status after the action.
    #[must_use]
    pub fn new_status(&self) -> EntryStatus {
        match self {
            Self::Validate { .. } => EntryStatus::Validated,
            Self::Reject { .. } => EntryStatus::Rejected,
            Self::Post { .. } => EntryStatus::Posted,
            Self::Cancel { .. } => EntryStatus::Cancelled,
        }
    }

    /// Applies status and audit fields to `entry`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the entry is not in `from_status`.
    pub fn apply(&self, entry: &mut JournalEntry) -> Result<(), JournalError> {
        if entry.status != self.from_status() {
            return Err(JournalError::InvalidTransition {
                from: entry.status,
                to: self.new_status(),
            });
        }

        let audit = &mut entry.audit;
        match self {
            Self::Validate {
                validated_by,
                validated_at,
            } => {
                audit.validated_by = Some(*validated_by);
                audit.validated_at = Some(*validated_at);
            }
            Self::Reject {
                rejected_by,
                rejected_at,
                reason,
            } => {
                audit.rejected_by = Some(*rejected_by);
                audit.rejected_at = Some(*rejected_at);
                audit.rejection_reason = Some(reason.clone());
            }
            Self::Post {
                posted_by,
                posted_at,
            } => {
                audit.posted_by = Some(*posted_by);
                audit.posted_at = Some(*posted_at);
            }
            Self::Cancel {
                cancelled_by,
                cancelled_at,
                reason,
            } => {
                audit.cancelled_by = Some(*cancelled_by);
                audit.cancelled_at = Some(*cancelled_at);
                audit.cancellation_reason = Some(reason.clone());
            }
        }
        entry.status = self.new_status();
        Ok(())
    }
}

/// Stateless service computing entry transitions.
pub struct EntryWorkflow;

impl EntryWorkflow {
    /// Validate a draft entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the entry is DRAFT.
    pub fn validate(current: EntryStatus, actor: UserId) -> Result<EntryAction, JournalError> {
        Self::guard(current, EntryStatus::Draft, EntryStatus::Validated)?;
        Ok(EntryAction::Validate {
            validated_by: actor,
            validated_at: Utc::now(),
        })
    }

    /// Reject a draft entry.
    ///
    /// # Errors
    ///
    /// Returns `MissingReason` for a blank reason, `InvalidTransition`
    /// unless the entry is DRAFT.
    pub fn reject(
        current: EntryStatus,
        reason: &str,
        actor: UserId,
    ) -> Result<EntryAction, JournalError> {
        let reason = Self::require_reason(reason, "reject")?;
        Self::guard(current, EntryStatus::Draft, EntryStatus::Rejected)?;
        Ok(EntryAction::Reject {
            rejected_by: actor,
            rejected_at: Utc::now(),
            reason,
        })
    }

    /// Post a validated entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the entry is VALIDATED.
    pub fn post(current: EntryStatus, actor: UserId) -> Result<EntryAction, JournalError> {
        Self::guard(current, EntryStatus::Validated, EntryStatus::Posted)?;
        Ok(EntryAction::Post {
            posted_by: actor,
            posted_at: Utc::now(),
        })
    }

    /// Cancel a validated entry.
    ///
    /// # Errors
    ///
    /// Returns `MissingReason` for a blank reason, `InvalidTransition`
    /// unless the entry is VALIDATED.
    pub fn cancel(
        current: EntryStatus,
        reason: &str,
        actor: UserId,
    ) -> Result<EntryAction, JournalError> {
        let reason = Self::require_reason(reason, "cancel")?;
        Self::guard(current, EntryStatus::Validated, EntryStatus::Cancelled)?;
        Ok(EntryAction::Cancel {
            cancelled_by: actor,
            cancelled_at: Utc::now(),
            reason,
        })
    }

    fn guard(current: EntryStatus, from: EntryStatus, to: EntryStatus) -> Result<(), JournalError> {
        if current == from {
            Ok(())
        } else {
            Err(JournalError::InvalidTransition { from: current, to })
        }
    }

    fn require_reason(reason: &str, verb: &'static str) -> Result<String, JournalError> {
        let reason = reason.trim();
        if reason.is_empty() {
            Err(JournalError::MissingReason(verb))
        } else {
            Ok(reason.to_string())
        }
    }
}
