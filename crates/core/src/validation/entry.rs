//! Entry-level anomaly battery.

use rust_decimal::Decimal;
use serde_json::json;

use super::types::{Anomaly, AnomalyRule, Severity, ValidationReport};
use crate::currency::{CurrencyIssue, CurrencyService};
use crate::journal::JournalEntry;

/// Runs the entry rules in a fixed order.
///
/// 1. EQUILIBRIUM (BLOCKING)
/// 2. ACCOUNT_EXISTENCE (BLOCKING, one per account)
/// 3. DATE_COHERENCE (WARNING)
/// 4. POSITIVE_AMOUNT (ERROR, one per line)
/// 5. REQUIRED_LABEL (WARNING)
/// 6. MULTI_CURRENCY (BLOCKING, one per line)
pub struct EntryValidator;

impl EntryValidator {
    /// Validates `entry` and aggregates every finding.
    pub fn validate<A>(
        entry: &JournalEntry,
        base_currency: &str,
        tolerance: Decimal,
        account_exists: A,
    ) -> ValidationReport
    where
        A: Fn(&str) -> bool,
    {
        let mut report = ValidationReport::new();
        let finding = |rule, severity, description: String, details| {
            Anomaly::new(entry.exercise_id, Some(entry.id), rule, severity, description, details)
        };

        let totals = entry.totals();
        if !totals.is_balanced(tolerance) {
            let discrepancy = totals.difference().abs().normalize();
            report.push(finding(
                AnomalyRule::Equilibrium,
                Severity::Blocking,
                format!("entry not balanced, discrepancy = {discrepancy}"),
                json!({
                    "debit": totals.debit,
                    "credit": totals.credit,
                    "discrepancy": discrepancy,
                }),
            ));
        }

        let mut missing: Vec<&str> = Vec::new();
        for line in &entry.lines {
            let number = line.account_number.as_str();
            if !missing.contains(&number) && !account_exists(number) {
                missing.push(number);
            }
        }
        for number in missing {
            report.push(finding(
                AnomalyRule::AccountExistence,
                Severity::Blocking,
                format!("account {number} does not exist in the exercise chart"),
                json!({ "account": number }),
            ));
        }

        if let Some(document_date) = entry.document_date
            && document_date > entry.entry_date
        {
            report.push(finding(
                AnomalyRule::DateCoherence,
                Severity::Warning,
                format!(
                    "document dated {document_date} is later than entry date {}",
                    entry.entry_date
                ),
                json!({
                    "document_date": document_date,
                    "entry_date": entry.entry_date,
                }),
            ));
        }

        for line in &entry.lines {
            if line.amount <= Decimal::ZERO {
                report.push(finding(
                    AnomalyRule::PositiveAmount,
                    Severity::Error,
                    format!("line {}: amount must be positive", line.line_number),
                    json!({ "line": line.line_number, "amount": line.amount }),
                ));
            }
        }

        if entry.label.trim().is_empty() {
            report.push(finding(
                AnomalyRule::RequiredLabel,
                Severity::Warning,
                "entry label is missing".to_string(),
                json!({ "entry": entry.reference_label() }),
            ));
        }
        for line in &entry.lines {
            if line.label.as_deref().is_none_or(|label| label.trim().is_empty()) {
                report.push(finding(
                    AnomalyRule::RequiredLabel,
                    Severity::Warning,
                    format!("line {}: label is missing", line.line_number),
                    json!({ "line": line.line_number }),
                ));
            }
        }

        for line in &entry.lines {
            let checked = CurrencyService::resolve(
                &line.currency,
                base_currency,
                line.amount,
                Some(line.exchange_rate),
                Some(line.base_amount),
                tolerance,
            );
            let description = match checked {
                Ok(_) => continue,
                Err(CurrencyIssue::MissingRate) => format!(
                    "line {}: no valid exchange rate for {}",
                    line.line_number, line.currency
                ),
                Err(CurrencyIssue::InconsistentBaseAmount { expected, supplied }) => format!(
                    "line {}: base amount {supplied} differs from amount × rate = {expected}",
                    line.line_number
                ),
            };
            report.push(finding(
                AnomalyRule::MultiCurrency,
                Severity::Blocking,
                description,
                json!({
                    "line": line.line_number,
                    "currency": line.currency,
                    "rate": line.exchange_rate,
                    "base_amount": line.base_amount,
                }),
            ));
        }

        report
    }
}
