//! Balance-level anomaly battery over a trial balance.

use rust_decimal::Decimal;
use serde_json::json;

use super::types::{Anomaly, AnomalyRule, Severity, ValidationReport};
use crate::chart::AccountNature;
use crate::trial_balance::TrialBalance;

/// Checks column equilibrium and balance signs.
pub struct BalanceValidator;

impl BalanceValidator {
    /// Runs BALANCE_EQUILIBRIUM then BALANCE_SIGN.
    ///
    /// Sign findings are reported, never corrected.
    #[must_use]
    pub fn validate(trial_balance: &TrialBalance) -> ValidationReport {
        let mut report = ValidationReport::new();
        let exercise_id = trial_balance.exercise_id;

        for check in trial_balance.checks.iter().filter(|c| !c.balanced) {
            report.push(Anomaly::new(
                exercise_id,
                None,
                AnomalyRule::BalanceEquilibrium,
                Severity::Blocking,
                format!(
                    "{} columns not balanced, difference = {}",
                    check.column,
                    check.difference.normalize()
                ),
                json!({
                    "column": check.column.as_str(),
                    "debit": check.debit,
                    "credit": check.credit,
                    "difference": check.difference,
                }),
            ));
        }

        for row in &trial_balance.rows {
            let net = row.closing_net();
            let expected = match row.class.nature() {
                AccountNature::Liability if net > Decimal::ZERO => Some("credit"),
                AccountNature::Asset if net < Decimal::ZERO => Some("debit"),
                _ => None,
            };
            if let Some(expected) = expected {
                report.push(Anomaly::new(
                    exercise_id,
                    None,
                    AnomalyRule::BalanceSign,
                    Severity::Warning,
                    format!(
                        "account {} (class {}) has an unexpected balance of {}, expected {expected}",
                        row.account_number,
                        row.class,
                        net.normalize()
                    ),
                    json!({
                        "account": row.account_number,
                        "class": row.class.digit(),
                        "closing_net": net,
                        "expected_side": expected,
                    }),
                ));
            }
        }

        report
    }
}
