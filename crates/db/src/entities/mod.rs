//! `SeaORM` entities for the ledger tables.

pub mod accounts;
pub mod anomalies;
pub mod carry_forwards;
pub mod entry_lines;
pub mod exercises;
pub mod journal_entries;
pub mod period_closures;

pub mod prelude {
    //! Entity aliases.

    pub use super::accounts::Entity as Accounts;
    pub use super::anomalies::Entity as Anomalies;
    pub use super::carry_forwards::Entity as CarryForwards;
    pub use super::entry_lines::Entity as EntryLines;
    pub use super::exercises::Entity as Exercises;
    pub use super::journal_entries::Entity as JournalEntries;
    pub use super::period_closures::Entity as PeriodClosures;
}
