//! Ledger aggregator: per-account history with running balance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::error::LedgerError;
use super::types::{AccountLedger, LedgerRow, PostedLine};

/// Stateless ledger builder over posted lines.
///
/// Callers pass POSTED lines only; anything else would leak into balances.
pub struct LedgerAggregator;

impl LedgerAggregator {
    /// Builds the ledger of one account over `[from, to]`.
    ///
    /// Lines of other accounts are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `from > to`.
    pub fn account_ledger(
        account_number: &str,
        account_label: &str,
        lines: &[PostedLine],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<AccountLedger, LedgerError> {
        Self::check_range(from, to)?;
        let own: Vec<&PostedLine> = lines
            .iter()
            .filter(|line| line.account_number == account_number)
            .collect();
        Ok(Self::fold(account_number, account_label, own, from, to))
    }

    /// Builds the ledger of every account with activity or nonzero opening.
    ///
    /// `accounts` is `(number, label)` in the order the result should follow.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `from > to`.
    pub fn general_ledger(
        accounts: &[(String, String)],
        lines: &[PostedLine],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AccountLedger>, LedgerError> {
        Self::check_range(from, to)?;

        let mut by_account: HashMap<&str, Vec<&PostedLine>> = HashMap::new();
        for line in lines {
            by_account
                .entry(line.account_number.as_str())
                .or_default()
                .push(line);
        }

        Ok(accounts
            .iter()
            .filter_map(|(number, label)| {
                let own = by_account.remove(number.as_str())?;
                let ledger = Self::fold(number, label, own, from, to);
                ledger.has_activity().then_some(ledger)
            })
            .collect())
    }

    fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), LedgerError> {
        if from > to {
            Err(LedgerError::InvalidDateRange { from, to })
        } else {
            Ok(())
        }
    }

    fn fold(
        account_number: &str,
        account_label: &str,
        mut lines: Vec<&PostedLine>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AccountLedger {
        lines.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let opening: Decimal = lines
            .iter()
            .filter(|line| line.entry_date < from)
            .map(|line| line.net())
            .sum();

        let mut running = opening;
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        let mut rows = Vec::new();

        for line in lines
            .iter()
            .filter(|line| line.entry_date >= from && line.entry_date <= to)
        {
            running += line.net();
            total_debit += line.debit;
            total_credit += line.credit;
            rows.push(LedgerRow {
                date: line.entry_date,
                sequence: line.sequence,
                journal_code: line.journal_code.clone(),
                entry_label: line.entry_label.clone(),
                line_label: line.label.clone(),
                reference: line.reference.clone(),
                debit: line.debit,
                credit: line.credit,
                running_balance: running,
                lettering: line.lettering.clone(),
            });
        }

        AccountLedger {
            account_number: account_number.to_string(),
            account_label: account_label.to_string(),
            from,
            to,
            opening,
            rows,
            total_debit,
            total_credit,
            closing: opening + total_debit - total_credit,
        }
    }
}
