//! Journal entry and line types.

use chrono::{DateTime, NaiveDate, Utc};
use comptable_shared::types::{EntryLineId, ExerciseId, JournalEntryId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::exercise::PeriodLabel;

/// Side of an entry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntrySide {
    /// Debit.
    Debit,
    /// Credit.
    Credit,
}

impl EntrySide {
    /// Returns the string representation of the side.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    /// Parses a side from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEBIT" => Some(Self::Debit),
            "CREDIT" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for EntrySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Day-to-day operation.
    Operation,
    /// Generated by the annual close.
    Closing,
    /// Generated by the carry-forward (à-nouveaux).
    CarryForward,
}

impl EntryType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operation => "OPERATION",
            Self::Closing => "CLOSING",
            Self::CarryForward => "CARRY_FORWARD",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPERATION" => Some(Self::Operation),
            "CLOSING" => Some(Self::Closing),
            "CARRY_FORWARD" => Some(Self::CarryForward),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry status in the forward-only workflow.
///
/// The valid transitions are:
/// - Draft → Validated (validate)
/// - Draft → Rejected (reject)
/// - Validated → Posted (post)
/// - Validated → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Created, editable by the workflow only.
    Draft,
    /// Passed the anomaly battery, immutable.
    Validated,
    /// Applied to account balances.
    Posted,
    /// Refused before validation.
    Rejected,
    /// Withdrawn after validation.
    Cancelled,
}

impl EntryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Validated => "VALIDATED",
            Self::Posted => "POSTED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "VALIDATED" => Some(Self::Validated),
            "POSTED" => Some(Self::Posted),
            "REJECTED" => Some(Self::Rejected),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Posted | Self::Rejected | Self::Cancelled)
    }

    /// Returns true if the entry no longer counts towards controls.
    #[must_use]
    pub fn is_withdrawn(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    /// Account number in the exercise's chart.
    pub account_number: String,
    /// Line label.
    pub label: Option<String>,
    /// Debit or credit.
    pub side: EntrySide,
    /// Amount in the line currency, must be > 0.
    pub amount: Decimal,
    /// Line currency; the base currency when absent.
    pub currency: Option<String>,
    /// Rate to base currency, required for foreign lines.
    pub exchange_rate: Option<Decimal>,
    /// Base amount precomputed by the caller, cross-checked.
    pub base_amount: Option<Decimal>,
    /// Lettering or reconciliation tag.
    pub lettering: Option<String>,
    /// Analytical cost center.
    pub cost_center: Option<String>,
    /// Analytical project.
    pub project: Option<String>,
}

impl LineInput {
    /// Creates a base-currency line.
    pub fn new(account_number: impl Into<String>, side: EntrySide, amount: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            label: None,
            side,
            amount,
            currency: None,
            exchange_rate: None,
            base_amount: None,
            lettering: None,
            cost_center: None,
            project: None,
        }
    }

    /// Creates a base-currency debit line.
    pub fn debit(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self::new(account_number, EntrySide::Debit, amount)
    }

    /// Creates a base-currency credit line.
    pub fn credit(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self::new(account_number, EntrySide::Credit, amount)
    }

    /// Sets the line label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Expresses the line in a foreign currency.
    #[must_use]
    pub fn in_currency(mut self, currency: impl Into<String>, rate: Decimal) -> Self {
        self.currency = Some(currency.into());
        self.exchange_rate = Some(rate);
        self
    }

    /// Sets the lettering / reconciliation tag.
    #[must_use]
    pub fn with_lettering(mut self, tag: impl Into<String>) -> Self {
        self.lettering = Some(tag.into());
        self
    }
}

/// Input for creating an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInput {
    /// Target exercise.
    pub exercise_id: ExerciseId,
    /// Journal code (e.g. "ACH", "VTE", "BQ").
    pub journal_code: String,
    /// Journal label.
    pub journal_label: Option<String>,
    /// Entry type.
    pub entry_type: EntryType,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Date of the source document.
    pub document_date: Option<NaiveDate>,
    /// Entry label.
    pub label: String,
    /// Source document reference.
    pub document_reference: Option<String>,
    /// Budget line checked against the budget oracle.
    pub budget_line: Option<String>,
    /// Ordered lines.
    pub lines: Vec<LineInput>,
    /// Author.
    pub created_by: UserId,
}

impl EntryInput {
    /// Starts an operation entry without lines.
    pub fn new(
        exercise_id: ExerciseId,
        journal_code: impl Into<String>,
        entry_date: NaiveDate,
        label: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            exercise_id,
            journal_code: journal_code.into(),
            journal_label: None,
            entry_type: EntryType::Operation,
            entry_date,
            document_date: None,
            label: label.into(),
            document_reference: None,
            budget_line: None,
            lines: Vec::new(),
            created_by,
        }
    }

    /// Appends a line.
    #[must_use]
    pub fn with_line(mut self, line: LineInput) -> Self {
        self.lines.push(line);
        self
    }

    /// Sets the entry type.
    #[must_use]
    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    /// Sets the source document.
    #[must_use]
    pub fn with_document(mut self, reference: impl Into<String>, date: NaiveDate) -> Self {
        self.document_reference = Some(reference.into());
        self.document_date = Some(date);
        self
    }

    /// Sets the budget line.
    #[must_use]
    pub fn with_budget_line(mut self, budget_line: impl Into<String>) -> Self {
        self.budget_line = Some(budget_line.into());
        self
    }
}

/// A resolved, persisted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLine {
    /// Unique identifier.
    pub id: EntryLineId,
    /// 1-based position in the entry.
    pub line_number: u32,
    /// Account number.
    pub account_number: String,
    /// Account label at creation time.
    pub account_label: String,
    /// Line label.
    pub label: Option<String>,
    /// Debit or credit.
    pub side: EntrySide,
    /// Amount in the line currency.
    pub amount: Decimal,
    /// Line currency.
    pub currency: String,
    /// Rate to base currency.
    pub exchange_rate: Decimal,
    /// Amount in base currency, 2 dp.
    pub base_amount: Decimal,
    /// Lettering or reconciliation tag.
    pub lettering: Option<String>,
    /// Analytical cost center.
    pub cost_center: Option<String>,
    /// Analytical project.
    pub project: Option<String>,
}

impl EntryLine {
    /// Base amount if on the debit side, zero otherwise.
    #[must_use]
    pub fn debit(&self) -> Decimal {
        match self.side {
            EntrySide::Debit => self.base_amount,
            EntrySide::Credit => Decimal::ZERO,
        }
    }

    /// Base amount if on the credit side, zero otherwise.
    #[must_use]
    pub fn credit(&self) -> Decimal {
        match self.side {
            EntrySide::Debit => Decimal::ZERO,
            EntrySide::Credit => self.base_amount,
        }
    }
}

/// Debit/credit sums of an entry in base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    /// Σ base debit.
    pub debit: Decimal,
    /// Σ base credit.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Sums the lines.
    #[must_use]
    pub fn of(lines: &[EntryLine]) -> Self {
        Self {
            debit: lines.iter().map(EntryLine::debit).sum(),
            credit: lines.iter().map(EntryLine::credit).sum(),
        }
    }

    /// Debit minus credit.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true if the sums differ by strictly less than `tolerance`.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.difference().abs() < tolerance
    }
}

/// Audit trail of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAudit {
    /// Author.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Validator.
    pub validated_by: Option<UserId>,
    /// Validation time.
    pub validated_at: Option<DateTime<Utc>>,
    /// Poster.
    pub posted_by: Option<UserId>,
    /// Posting time.
    pub posted_at: Option<DateTime<Utc>>,
    /// Rejecting actor.
    pub rejected_by: Option<UserId>,
    /// Rejection time.
    pub rejected_at: Option<DateTime<Utc>>,
    /// Rejection reason.
    pub rejection_reason: Option<String>,
    /// Cancelling actor.
    pub cancelled_by: Option<UserId>,
    /// Cancellation time.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Cancellation reason.
    pub cancellation_reason: Option<String>,
}

impl EntryAudit {
    /// Audit trail of a freshly created entry.
    #[must_use]
    pub fn created(created_by: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            created_by,
            created_at,
            validated_by: None,
            validated_at: None,
            posted_by: None,
            posted_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }
}

/// A checked entry waiting for its sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning exercise.
    pub exercise_id: ExerciseId,
    /// Journal code.
    pub journal_code: String,
    /// Journal label.
    pub journal_label: Option<String>,
    /// Entry type.
    pub entry_type: EntryType,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Source document date.
    pub document_date: Option<NaiveDate>,
    /// Period of `entry_date`.
    pub period: PeriodLabel,
    /// Entry label.
    pub label: String,
    /// Source document reference.
    pub document_reference: Option<String>,
    /// Budget line.
    pub budget_line: Option<String>,
    /// Σ base debit.
    pub total_amount: Decimal,
    /// Equilibrium flag.
    pub balanced: bool,
    /// Resolved lines.
    pub lines: Vec<EntryLine>,
    /// Author.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A persisted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Gap-free sequence within (exercise, journal code).
    pub sequence: u64,
    /// Owning exercise.
    pub exercise_id: ExerciseId,
    /// Journal code.
    pub journal_code: String,
    /// Journal label.
    pub journal_label: Option<String>,
    /// Entry type.
    pub entry_type: EntryType,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Source document date.
    pub document_date: Option<NaiveDate>,
    /// Period of `entry_date`.
    pub period: PeriodLabel,
    /// Entry label.
    pub label: String,
    /// Source document reference.
    pub document_reference: Option<String>,
    /// Budget line.
    pub budget_line: Option<String>,
    /// Σ base debit.
    pub total_amount: Decimal,
    /// Equilibrium flag.
    pub balanced: bool,
    /// Workflow status.
    pub status: EntryStatus,
    /// Audit trail.
    pub audit: EntryAudit,
    /// Ordered lines.
    pub lines: Vec<EntryLine>,
}

impl JournalEntry {
    /// Hydrates a new entry with its allocated sequence, in DRAFT.
    #[must_use]
    pub fn from_new(new: NewJournalEntry, sequence: u64) -> Self {
        Self {
            id: new.id,
            sequence,
            exercise_id: new.exercise_id,
            journal_code: new.journal_code,
            journal_label: new.journal_label,
            entry_type: new.entry_type,
            entry_date: new.entry_date,
            document_date: new.document_date,
            period: new.period,
            label: new.label,
            document_reference: new.document_reference,
            budget_line: new.budget_line,
            total_amount: new.total_amount,
            balanced: new.balanced,
            status: EntryStatus::Draft,
            audit: EntryAudit::created(new.created_by, new.created_at),
            lines: new.lines,
        }
    }

    /// Printable reference, e.g. `ACH-000042`.
    #[must_use]
    pub fn reference_label(&self) -> String {
        format!("{}-{:06}", self.journal_code, self.sequence)
    }

    /// Debit/credit sums in base currency.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals::of(&self.lines)
    }
}
