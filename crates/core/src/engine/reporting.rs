//! Read side: ledgers, trial balance, exercise audit.

use chrono::NaiveDate;
use comptable_shared::types::{ExerciseId, JournalEntryId};
use tracing::{debug, info};

use super::{EngineResult, LedgerEngine};
use crate::exercise::Exercise;
use crate::ledger::{AccountLedger, LedgerAggregator};
use crate::store::{EntryFilter, LedgerStore};
use crate::trial_balance::TrialBalance;
use crate::validation::{Anomaly, BalanceValidator, EntryValidator, ValidationReport};

impl<S: LedgerStore> LedgerEngine<S> {
    /// Ledger of one account over `[from, to]`, POSTED lines only.
    pub async fn account_ledger(
        &self,
        exercise_id: ExerciseId,
        account_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<AccountLedger> {
        let account = self.account(exercise_id, account_number).await?;
        let lines = self
            .store
            .posted_lines(exercise_id, Some(account_number), Some(to))
            .await?;
        Ok(LedgerAggregator::account_ledger(
            &account.number,
            &account.label,
            &lines,
            from,
            to,
        )?)
    }

    /// Ledgers of every account with activity or an opening balance.
    ///
    /// Inactive accounts are included since they may still carry posted lines.
    pub async fn general_ledger(
        &self,
        exercise_id: ExerciseId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<AccountLedger>> {
        let accounts: Vec<(String, String)> = self
            .store
            .accounts(exercise_id)
            .await?
            .into_iter()
            .map(|a| (a.number, a.label))
            .collect();
        let lines = self.store.posted_lines(exercise_id, None, Some(to)).await?;
        debug!(accounts = accounts.len(), lines = lines.len(), "general ledger inputs loaded");
        Ok(LedgerAggregator::general_ledger(&accounts, &lines, from, to)?)
    }

    /// Trial balance over `[from, to]`.
    pub async fn trial_balance(
        &self,
        exercise_id: ExerciseId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<TrialBalance> {
        let ledgers = self.general_ledger(exercise_id, from, to).await?;
        Ok(TrialBalance::build(
            exercise_id,
            from,
            to,
            &ledgers,
            self.settings.tolerance,
        ))
    }

    /// Trial balance over the whole exercise.
    pub(super) async fn exercise_trial_balance(
        &self,
        exercise: &Exercise,
    ) -> EngineResult<TrialBalance> {
        self.trial_balance(exercise.id, exercise.start_date, exercise.end_date)
            .await
    }

    /// Runs the entry battery on every pending entry and the balance
    /// battery on the exercise trial balance. Findings are persisted.
    pub async fn audit_exercise(&self, exercise_id: ExerciseId) -> EngineResult<ValidationReport> {
        let exercise = self.exercise(exercise_id).await?;
        let known: Vec<String> = self
            .store
            .accounts(exercise.id)
            .await?
            .into_iter()
            .map(|a| a.number)
            .collect();

        let mut report = ValidationReport::new();
        let entries = self
            .store
            .entries(&EntryFilter::for_exercise(exercise.id))
            .await?;
        for entry in entries.iter().filter(|e| !e.status.is_terminal()) {
            report.merge(EntryValidator::validate(
                entry,
                &self.settings.base_currency,
                self.settings.tolerance,
                |number| known.iter().any(|k| k == number),
            ));
        }

        let trial_balance = self.exercise_trial_balance(&exercise).await?;
        report.merge(BalanceValidator::validate(&trial_balance));

        if !report.is_empty() {
            self.store.insert_anomalies(&report.anomalies).await?;
        }
        info!(
            exercise = %exercise.code,
            findings = report.len(),
            failing = report.failing().count(),
            "exercise audited"
        );
        Ok(report)
    }

    /// Persisted findings of an exercise, optionally for one entry.
    pub async fn anomalies(
        &self,
        exercise_id: ExerciseId,
        entry_id: Option<JournalEntryId>,
    ) -> EngineResult<Vec<Anomaly>> {
        Ok(self.store.anomalies(exercise_id, entry_id).await?)
    }
}
