//! Journal entries: types, resolution, and the forward-only workflow.

pub mod error;
pub mod service;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod workflow_props;

pub use error::JournalError;
pub use service::{AccountRef, JournalService};
pub use types::{
    EntryAudit, EntryInput, EntryLine, EntrySide, EntryStatus, EntryTotals, EntryType,
    JournalEntry, LineInput, NewJournalEntry,
};
pub use workflow::{EntryAction, EntryWorkflow};
