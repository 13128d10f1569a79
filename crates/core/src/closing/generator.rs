//! Generation of closing and carry-forward lines.

use rust_decimal::Decimal;

use super::types::ReportedBalance;
use crate::journal::{EntrySide, LineInput};
use crate::trial_balance::TrialBalanceRow;

/// Stateless generator of year-end lines from closing balances.
pub struct ClosingGenerator;

impl ClosingGenerator {
    /// Lines zeroing every class 6 and 7 account into `net_result_account`.
    ///
    /// Each account receives the opposite of its closing balance. The net
    /// result line is a credit for a profit, a debit for a loss, and is
    /// omitted when the result is zero. Returns no line when nothing needs
    /// zeroing.
    #[must_use]
    pub fn closing_lines(rows: &[TrialBalanceRow], net_result_account: &str) -> Vec<LineInput> {
        let mut lines = Vec::new();
        let mut result = Decimal::ZERO;

        for row in rows.iter().filter(|r| matches!(r.class.digit(), 6 | 7)) {
            let net = row.closing_net();
            if net.is_zero() {
                continue;
            }
            result -= net;
            let side = if net > Decimal::ZERO {
                EntrySide::Credit
            } else {
                EntrySide::Debit
            };
            lines.push(
                LineInput::new(row.account_number.clone(), side, net.abs())
                    .with_label(format!("Solde du compte {}", row.account_number)),
            );
        }

        if lines.is_empty() {
            return lines;
        }

        if result > Decimal::ZERO {
            lines.push(
                LineInput::credit(net_result_account, result)
                    .with_label("Résultat net de l'exercice : bénéfice"),
            );
        } else if result < Decimal::ZERO {
            lines.push(
                LineInput::debit(net_result_account, -result)
                    .with_label("Résultat net de l'exercice : perte"),
            );
        }
        lines
    }

    /// Lines reopening every class 1-5 account with a nonzero balance.
    ///
    /// Returns the lines together with the balances they carry.
    #[must_use]
    pub fn carry_forward_lines(rows: &[TrialBalanceRow]) -> (Vec<LineInput>, Vec<ReportedBalance>) {
        let mut lines = Vec::new();
        let mut balances = Vec::new();

        for row in rows.iter().filter(|r| r.class.is_balance_sheet()) {
            let net = row.closing_net();
            if net.is_zero() {
                continue;
            }
            let (line, balance) = if net > Decimal::ZERO {
                (
                    LineInput::debit(row.account_number.clone(), net),
                    ReportedBalance {
                        account_number: row.account_number.clone(),
                        debit: net,
                        credit: Decimal::ZERO,
                    },
                )
            } else {
                (
                    LineInput::credit(row.account_number.clone(), -net),
                    ReportedBalance {
                        account_number: row.account_number.clone(),
                        debit: Decimal::ZERO,
                        credit: -net,
                    },
                )
            };
            lines.push(line.with_label(format!("Report à nouveau {}", row.account_number)));
            balances.push(balance);
        }

        (lines, balances)
    }
}
