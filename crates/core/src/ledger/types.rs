//! Ledger row types.

use chrono::NaiveDate;
use comptable_shared::types::JournalEntryId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line of a POSTED entry, as read back for aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedLine {
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Entry sequence in its journal.
    pub sequence: u64,
    /// Journal code.
    pub journal_code: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Entry label.
    pub entry_label: String,
    /// Document reference, or the entry's printable reference.
    pub reference: String,
    /// 1-based line number.
    pub line_number: u32,
    /// Account number.
    pub account_number: String,
    /// Line label.
    pub label: Option<String>,
    /// Base debit.
    pub debit: Decimal,
    /// Base credit.
    pub credit: Decimal,
    /// Lettering or reconciliation tag.
    pub lettering: Option<String>,
}

impl PostedLine {
    /// Debit minus credit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Sort key: (date, journal, sequence, line).
    #[must_use]
    pub fn sort_key(&self) -> (NaiveDate, &str, u64, u32) {
        (
            self.entry_date,
            self.journal_code.as_str(),
            self.sequence,
            self.line_number,
        )
    }
}

/// One movement row of an account ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Accounting date.
    pub date: NaiveDate,
    /// Entry sequence.
    pub sequence: u64,
    /// Journal code.
    pub journal_code: String,
    /// Entry label.
    pub entry_label: String,
    /// Line label.
    pub line_label: Option<String>,
    /// Document reference.
    pub reference: String,
    /// Base debit.
    pub debit: Decimal,
    /// Base credit.
    pub credit: Decimal,
    /// Balance after this row.
    pub running_balance: Decimal,
    /// Lettering tag.
    pub lettering: Option<String>,
}

/// Ledger of one account over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedger {
    /// Account number.
    pub account_number: String,
    /// Account label.
    pub account_label: String,
    /// Window start.
    pub from: NaiveDate,
    /// Window end.
    pub to: NaiveDate,
    /// Σ(debit − credit) before `from`.
    pub opening: Decimal,
    /// Movements inside the window, ordered.
    pub rows: Vec<LedgerRow>,
    /// Σ debit inside the window.
    pub total_debit: Decimal,
    /// Σ credit inside the window.
    pub total_credit: Decimal,
    /// opening + debit − credit.
    pub closing: Decimal,
}

impl AccountLedger {
    /// Returns true if the account moved or carries an opening balance.
    #[must_use]
    pub fn has_activity(&self) -> bool {
        !self.rows.is_empty() || !self.opening.is_zero()
    }
}
