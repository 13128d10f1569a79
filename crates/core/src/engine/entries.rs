//! Entry lifecycle: create, validate, reject, cancel, post.

use std::collections::{BTreeSet, HashMap};

use comptable_shared::types::{ExerciseId, JournalEntryId, UserId};
use tracing::{info, warn};

use super::{EngineError, EngineResult, LedgerEngine, ValidationOutcome};
use crate::closing::ClosingError;
use crate::exercise::{Exercise, PeriodLabel};
use crate::journal::{
    AccountRef, EntryInput, EntryType, EntryWorkflow, JournalEntry, JournalError, JournalService,
};
use crate::store::{EntryFilter, LedgerStore};
use crate::validation::EntryValidator;

impl<S: LedgerStore> LedgerEngine<S> {
    /// Creates an entry in DRAFT.
    ///
    /// Checks run in order: structure, exercise and period, budget,
    /// currency, equilibrium, accounts. The sequence number is allocated
    /// by the store only once every check passed.
    pub async fn create_entry(&self, input: EntryInput) -> EngineResult<JournalEntry> {
        let exercise = self.exercise(input.exercise_id).await?;
        exercise.ensure_open()?;
        self.create_in(&exercise, input).await
    }

    /// Creates an entry without the exercise status check.
    ///
    /// Used by annual closing, which runs while the exercise is CLOSING.
    pub(super) async fn create_in(
        &self,
        exercise: &Exercise,
        input: EntryInput,
    ) -> EngineResult<JournalEntry> {
        JournalService::check_structure(&input)?;
        exercise.ensure_contains(input.entry_date)?;
        let period = PeriodLabel::from_date(input.entry_date)?;

        if input.entry_type == EntryType::Operation && self.is_period_closed(exercise.id, period).await?
        {
            warn!(exercise = %exercise.code, %period, "entry refused: period closed");
            return Err(JournalError::PeriodClosed {
                period: period.to_string(),
                exercise: exercise.code.clone(),
            }
            .into());
        }

        if let (Some(budget_line), Some(oracle)) = (&input.budget_line, &self.budget) {
            let amount = JournalService::requested_amount(&input);
            if !oracle.has_sufficient_funds(budget_line, amount) {
                warn!(%budget_line, %amount, "entry refused: budget insufficient");
                return Err(JournalError::BudgetInsufficient {
                    budget_line: budget_line.clone(),
                    amount,
                }
                .into());
            }
        }

        let accounts = self.account_refs(exercise.id, &input).await?;
        let new_entry = JournalService::prepare(
            &input,
            period,
            &self.settings.base_currency,
            self.settings.tolerance,
            |number| accounts.get(number).cloned(),
        )
        .inspect_err(|err| warn!(journal = %input.journal_code, error = %err, "entry refused"))?;

        let entry = self.store.insert_entry(new_entry).await?;
        info!(
            exercise = %exercise.code,
            entry_id = %entry.id,
            journal = %entry.journal_code,
            sequence = entry.sequence,
            total = %entry.total_amount,
            "entry created"
        );
        Ok(entry)
    }

    /// Runs the entry battery and moves a DRAFT entry to VALIDATED.
    ///
    /// Findings are persisted either way. A BLOCKING or ERROR finding
    /// leaves the entry in DRAFT and returns `passed = false`.
    pub async fn validate_entry(
        &self,
        entry_id: JournalEntryId,
        actor: UserId,
    ) -> EngineResult<ValidationOutcome> {
        let entry = self.entry(entry_id).await?;
        let action = EntryWorkflow::validate(entry.status, actor)?;

        let mut known = BTreeSet::new();
        for line in &entry.lines {
            if !known.contains(&line.account_number)
                && self
                    .store
                    .account(entry.exercise_id, &line.account_number)
                    .await?
                    .is_some()
            {
                known.insert(line.account_number.clone());
            }
        }

        let report = EntryValidator::validate(
            &entry,
            &self.settings.base_currency,
            self.settings.tolerance,
            |number| known.contains(number),
        );
        if !report.is_empty() {
            self.store.insert_anomalies(&report.anomalies).await?;
        }

        if !report.is_valid() {
            warn!(
                entry_id = %entry.id,
                failing = report.failing().count(),
                "entry validation failed"
            );
            return Ok(ValidationOutcome {
                passed: false,
                report,
                entry,
            });
        }

        let entry = self.store.transition_entry(entry_id, &action).await?;
        info!(entry_id = %entry.id, sequence = entry.sequence, journal = %entry.journal_code, "entry validated");
        Ok(ValidationOutcome {
            passed: true,
            report,
            entry,
        })
    }

    /// Rejects a DRAFT entry. Terminal.
    pub async fn reject_entry(
        &self,
        entry_id: JournalEntryId,
        reason: &str,
        actor: UserId,
    ) -> EngineResult<JournalEntry> {
        let entry = self.entry(entry_id).await?;
        let action = EntryWorkflow::reject(entry.status, reason, actor)?;
        let entry = self.store.transition_entry(entry_id, &action).await?;
        info!(entry_id = %entry.id, reason = %reason.trim(), "entry rejected");
        Ok(entry)
    }

    /// Cancels a VALIDATED entry. Terminal.
    pub async fn cancel_entry(
        &self,
        entry_id: JournalEntryId,
        reason: &str,
        actor: UserId,
    ) -> EngineResult<JournalEntry> {
        let entry = self.entry(entry_id).await?;
        let action = EntryWorkflow::cancel(entry.status, reason, actor)?;
        let entry = self.store.transition_entry(entry_id, &action).await?;
        info!(entry_id = %entry.id, reason = %reason.trim(), "entry cancelled");
        Ok(entry)
    }

    /// Posts a VALIDATED entry, applying its balance deltas atomically.
    pub async fn post_entry(
        &self,
        entry_id: JournalEntryId,
        actor: UserId,
    ) -> EngineResult<JournalEntry> {
        let entry = self.entry(entry_id).await?;
        let action = EntryWorkflow::post(entry.status, actor)?;
        let entry = self
            .store
            .post_entry(entry_id, &action)
            .await
            .inspect_err(|err| warn!(entry_id = %entry_id, error = %err, "posting refused"))?;

        info!(
            entry_id = %entry.id,
            journal = %entry.journal_code,
            sequence = entry.sequence,
            total = %entry.total_amount,
            "entry posted"
        );
        Ok(entry)
    }

    /// Loads an entry with its lines.
    pub async fn entry(&self, entry_id: JournalEntryId) -> EngineResult<JournalEntry> {
        self.store
            .entry(entry_id)
            .await?
            .ok_or_else(|| JournalError::EntryNotFound(entry_id).into())
    }

    /// Lists entries matching `filter`.
    pub async fn entries(&self, filter: &EntryFilter) -> EngineResult<Vec<JournalEntry>> {
        Ok(self.store.entries(filter).await?)
    }

    /// Creates, validates and posts a generated entry.
    ///
    /// A generated entry failing validation is rejected; one failing to
    /// post is cancelled. Neither is left pending.
    pub(super) async fn record_generated(
        &self,
        exercise: &Exercise,
        input: EntryInput,
        actor: UserId,
    ) -> EngineResult<JournalEntry> {
        let entry = self.create_in(exercise, input).await?;

        let outcome = self.validate_entry(entry.id, actor).await?;
        if !outcome.passed {
            let problems: Vec<String> = outcome
                .report
                .failing()
                .map(|a| a.description.clone())
                .collect();
            self.reject_entry(entry.id, "generated entry failed validation", actor)
                .await?;
            return Err(ClosingError::ControlsFailed {
                period: entry.period.to_string(),
                problems,
            }
            .into());
        }

        match self.post_entry(entry.id, actor).await {
            Ok(posted) => Ok(posted),
            Err(err) => {
                self.cancel_entry(entry.id, "generated entry could not be posted", actor)
                    .await?;
                Err(err)
            }
        }
    }

    pub(super) async fn is_period_closed(
        &self,
        exercise_id: ExerciseId,
        period: PeriodLabel,
    ) -> Result<bool, EngineError> {
        Ok(self
            .store
            .period_closures(exercise_id)
            .await?
            .iter()
            .any(|c| c.period == period && c.is_closed()))
    }

    async fn account_refs(
        &self,
        exercise_id: ExerciseId,
        input: &EntryInput,
    ) -> EngineResult<HashMap<String, AccountRef>> {
        let mut refs = HashMap::new();
        for line in &input.lines {
            if refs.contains_key(&line.account_number) {
                continue;
            }
            if let Some(account) = self.store.account(exercise_id, &line.account_number).await? {
                refs.insert(
                    account.number.clone(),
                    AccountRef {
                        label: account.label,
                        active: account.active,
                    },
                );
            }
        }
        Ok(refs)
    }
}
