//! Period closing controls.

use rust_decimal::Decimal;
use serde_json::json;

use super::types::ControlSnapshot;
use crate::chart::AccountClass;
use crate::exercise::PeriodLabel;
use crate::journal::{EntryStatus, JournalEntry};
use crate::trial_balance::TrialBalance;
use crate::validation::{
    Anomaly, AnomalyRule, BalanceValidator, Severity, ValidationReport,
};

/// Outcome of the controls of one period.
#[derive(Debug, Clone)]
pub struct ControlOutcome {
    /// Snapshot stored on the closure.
    pub snapshot: ControlSnapshot,
    /// Every finding, blocking and advisory.
    pub report: ValidationReport,
}

impl ControlOutcome {
    /// Problems refusing the close, one message each.
    #[must_use]
    pub fn blocking_problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .snapshot
            .unbalanced_entries
            .iter()
            .map(|reference| format!("entry {reference} is not balanced"))
            .collect();
        problems.extend(self.snapshot.trial_balance_diagnostics.iter().cloned());
        problems
    }
}

/// Stateless evaluator of closing controls.
pub struct PeriodControls;

impl PeriodControls {
    /// Evaluates the period controls.
    ///
    /// `entries` are the entries dated in the period; `trial_balance` is
    /// built over the period window.
    ///
    /// Blocking: entry equilibrium (rejected and cancelled entries
    /// excluded) and trial balance equilibrium. Advisory: lettering of
    /// class 4 lines and reconciliation of bank lines, posted only.
    #[must_use]
    pub fn evaluate(
        period: &PeriodLabel,
        entries: &[JournalEntry],
        trial_balance: &TrialBalance,
        tolerance: Decimal,
        bank_account_prefix: &str,
    ) -> ControlOutcome {
        let exercise_id = trial_balance.exercise_id;
        let mut report = ValidationReport::new();
        let mut snapshot = ControlSnapshot::default();

        for entry in entries.iter().filter(|e| !e.status.is_withdrawn()) {
            snapshot.entries_checked += 1;
            let totals = entry.totals();
            if !totals.is_balanced(tolerance) {
                let reference = entry.reference_label();
                let discrepancy = totals.difference().abs().normalize();
                report.push(Anomaly::new(
                    exercise_id,
                    Some(entry.id),
                    AnomalyRule::Equilibrium,
                    Severity::Blocking,
                    format!("entry {reference} not balanced, discrepancy = {discrepancy}"),
                    json!({ "entry": reference, "period": period.to_string(), "discrepancy": discrepancy }),
                ));
                snapshot.unbalanced_entries.push(reference);
            }
        }

        let balance_report = BalanceValidator::validate(trial_balance);
        snapshot.trial_balance_balanced = trial_balance.is_balanced();
        snapshot.trial_balance_diagnostics = trial_balance.diagnostics();
        report.merge(balance_report);

        let mut unlettered = Vec::new();
        let mut unreconciled = Vec::new();
        for entry in entries.iter().filter(|e| e.status == EntryStatus::Posted) {
            for line in &entry.lines {
                let untagged = line
                    .lettering
                    .as_deref()
                    .is_none_or(|tag| tag.trim().is_empty());
                if !untagged {
                    continue;
                }
                let lettrable = AccountClass::from_number(&line.account_number)
                    .is_ok_and(AccountClass::is_lettrable);
                if lettrable {
                    unlettered.push(format!("{}/{}", entry.reference_label(), line.line_number));
                }
                if line.account_number.starts_with(bank_account_prefix) {
                    unreconciled.push(format!("{}/{}", entry.reference_label(), line.line_number));
                }
            }
        }

        snapshot.unlettered_lines = unlettered.len();
        if !unlettered.is_empty() {
            report.push(Anomaly::new(
                exercise_id,
                None,
                AnomalyRule::Lettering,
                Severity::Warning,
                format!("{} third-party lines in {period} are not lettered", unlettered.len()),
                json!({ "period": period.to_string(), "lines": unlettered }),
            ));
        }

        snapshot.unreconciled_bank_lines = unreconciled.len();
        if !unreconciled.is_empty() {
            report.push(Anomaly::new(
                exercise_id,
                None,
                AnomalyRule::BankReconciliation,
                Severity::Warning,
                format!("{} bank lines in {period} are not reconciled", unreconciled.len()),
                json!({ "period": period.to_string(), "lines": unreconciled }),
            ));
        }

        ControlOutcome { snapshot, report }
    }
}
