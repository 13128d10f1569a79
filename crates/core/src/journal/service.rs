//! Journal service for entry checking and resolution.
//!
//! Pure business logic: account lookups are passed in as closures so the
//! same code runs against any store.

use chrono::Utc;
use comptable_shared::types::{EntryLineId, JournalEntryId};
use rust_decimal::Decimal;

use super::error::JournalError;
use super::types::{EntryInput, EntryLine, EntrySide, EntryTotals, NewJournalEntry};
use crate::currency::{CurrencyIssue, CurrencyService};
use crate::exercise::PeriodLabel;

/// What the journal needs to know about an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    /// Account label, snapshotted on the line.
    pub label: String,
    /// Whether the account accepts entries.
    pub active: bool,
}

/// Journal service for entry checking and resolution.
pub struct JournalService;

impl JournalService {
    /// Structural checks: at least 2 lines, positive amounts, journal code.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation found.
    pub fn check_structure(input: &EntryInput) -> Result<(), JournalError> {
        if input.journal_code.trim().is_empty() {
            return Err(JournalError::MissingJournalCode);
        }
        if input.lines.len() < 2 {
            return Err(JournalError::InsufficientLines(input.lines.len()));
        }
        for (index, line) in input.lines.iter().enumerate() {
            if line.amount <= Decimal::ZERO {
                return Err(JournalError::NonPositiveAmount {
                    line: index + 1,
                    amount: line.amount,
                });
            }
        }
        Ok(())
    }

    /// Debit total presented to the budget oracle.
    ///
    /// Computed before currency checks, so a missing rate counts as 1.
    #[must_use]
    pub fn requested_amount(input: &EntryInput) -> Decimal {
        input
            .lines
            .iter()
            .filter(|line| line.side == EntrySide::Debit)
            .map(|line| {
                line.base_amount.unwrap_or_else(|| {
                    CurrencyService::to_base(line.amount, line.exchange_rate.unwrap_or(Decimal::ONE))
                })
            })
            .sum()
    }

    /// Resolve an entry before persisting.
    ///
    /// Steps, in order:
    /// 1. Structural checks
    /// 2. Currency resolution of every line
    /// 3. Equilibrium in base currency within `tolerance`
    /// 4. Account resolution (all unknown numbers are reported together)
    ///
    /// # Errors
    ///
    /// Returns the first failing step's `JournalError`.
    pub fn prepare<A>(
        input: &EntryInput,
        period: PeriodLabel,
        base_currency: &str,
        tolerance: Decimal,
        account_lookup: A,
    ) -> Result<NewJournalEntry, JournalError>
    where
        A: Fn(&str) -> Option<AccountRef>,
    {
        Self::check_structure(input)?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for (index, line) in input.lines.iter().enumerate() {
            let currency = line
                .currency
                .clone()
                .unwrap_or_else(|| base_currency.to_string());
            let resolved = CurrencyService::resolve(
                &currency,
                base_currency,
                line.amount,
                line.exchange_rate,
                line.base_amount,
                tolerance,
            )
            .map_err(|issue| match issue {
                CurrencyIssue::MissingRate => JournalError::MissingExchangeRate {
                    line: index + 1,
                    currency: currency.clone(),
                },
                CurrencyIssue::InconsistentBaseAmount { expected, supplied } => {
                    JournalError::InconsistentBaseAmount {
                        line: index + 1,
                        expected,
                        supplied,
                    }
                }
            })?;

            lines.push(EntryLine {
                id: EntryLineId::new(),
                line_number: u32::try_from(index + 1).unwrap_or(u32::MAX),
                account_number: line.account_number.clone(),
                account_label: String::new(),
                label: line.label.clone(),
                side: line.side,
                amount: line.amount,
                currency,
                exchange_rate: resolved.rate,
                base_amount: resolved.base_amount,
                lettering: line.lettering.clone(),
                cost_center: line.cost_center.clone(),
                project: line.project.clone(),
            });
        }

        let totals = EntryTotals::of(&lines);
        if !totals.is_balanced(tolerance) {
            return Err(JournalError::Unbalanced {
                debit: totals.debit,
                credit: totals.credit,
                discrepancy: totals.difference().abs().normalize(),
            });
        }

        let mut unknown: Vec<String> = Vec::new();
        let mut inactive: Option<String> = None;
        for line in &mut lines {
            match account_lookup(&line.account_number) {
                Some(account) => {
                    if !account.active && inactive.is_none() {
                        inactive = Some(line.account_number.clone());
                    }
                    line.account_label = account.label;
                }
                None => {
                    if !unknown.contains(&line.account_number) {
                        unknown.push(line.account_number.clone());
                    }
                }
            }
        }
        if !unknown.is_empty() {
            return Err(JournalError::UnknownAccounts(unknown));
        }
        if let Some(number) = inactive {
            return Err(JournalError::AccountInactive(number));
        }

        Ok(NewJournalEntry {
            id: JournalEntryId::new(),
            exercise_id: input.exercise_id,
            journal_code: input.journal_code.trim().to_string(),
            journal_label: input.journal_label.clone(),
            entry_type: input.entry_type,
            entry_date: input.entry_date,
            document_date: input.document_date,
            period,
            label: input.label.clone(),
            document_reference: input.document_reference.clone(),
            budget_line: input.budget_line.clone(),
            total_amount: totals.debit,
            balanced: true,
            lines,
            created_by: input.created_by,
            created_at: Utc::now(),
        })
    }
}
