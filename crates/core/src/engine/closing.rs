//! Closing operations: period close, annual close, carry-forward, reopen.

use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use comptable_shared::types::{ClosureId, ExerciseId, UserId};
use tracing::{info, warn};

use super::{ClosingOutcome, EngineError, EngineResult, LedgerEngine};
use crate::chart::Account;
use crate::closing::{
    CarryForward, ClosingError, ClosingGenerator, ClosureType, PeriodClosure, PeriodControls,
};
use crate::exercise::{Exercise, ExerciseStatus, PeriodLabel};
use crate::journal::{EntryInput, EntrySide, EntryType, JournalEntry, LineInput};
use crate::store::{EntryFilter, LedgerStore, StoreError};

impl<S: LedgerStore> LedgerEngine<S> {
    /// Closes one period after its controls pass.
    ///
    /// Blocking failures (unbalanced entries, unbalanced trial balance)
    /// refuse the close. Lettering and bank findings are recorded only.
    pub async fn close_period(
        &self,
        exercise_id: ExerciseId,
        period: PeriodLabel,
        closure_type: ClosureType,
        actor: UserId,
    ) -> EngineResult<ClosingOutcome<PeriodClosure>> {
        let exercise = self.exercise(exercise_id).await?;
        exercise.ensure_open()?;
        let (from, to) = exercise.period_bounds(&period)?;

        if self.is_period_closed(exercise.id, period).await? {
            return Err(already_closed(&exercise, period));
        }

        let entries = self
            .store
            .entries(&EntryFilter::for_exercise(exercise.id).with_period(period))
            .await?;
        let trial_balance = self.trial_balance(exercise.id, from, to).await?;
        let outcome = PeriodControls::evaluate(
            &period,
            &entries,
            &trial_balance,
            self.settings.tolerance,
            &self.settings.bank_account_prefix,
        );
        if !outcome.report.is_empty() {
            self.store.insert_anomalies(&outcome.report.anomalies).await?;
        }

        let problems = outcome.blocking_problems();
        if !problems.is_empty() {
            warn!(exercise = %exercise.code, %period, problems = problems.len(), "period close refused");
            return Err(ClosingError::ControlsFailed {
                period: period.to_string(),
                problems,
            }
            .into());
        }

        let closure = PeriodClosure::closed(
            exercise.id,
            period,
            closure_type,
            actor,
            outcome.snapshot,
            outcome.report.len(),
        );
        self.store
            .insert_period_closure(&closure)
            .await
            .map_err(|err| match err {
                StoreError::Duplicate(_) => already_closed(&exercise, period),
                other => other.into(),
            })?;

        info!(
            exercise = %exercise.code,
            %period,
            closure_type = closure_type.as_str(),
            entries = closure.controls.entries_checked,
            anomalies = closure.anomaly_count,
            "period closed"
        );
        Ok(ClosingOutcome {
            message: format!("period {period} of exercise {} closed", exercise.code),
            record: closure,
        })
    }

    /// Closes the exercise: zeroes classes 6 and 7 into the net result
    /// account, then marks the exercise CLOSED.
    ///
    /// Every period must be closed. A failure after the claim releases
    /// the exercise back to OPEN; a posted closing entry is kept and the
    /// next attempt has nothing left to zero.
    pub async fn close_exercise(
        &self,
        exercise_id: ExerciseId,
        actor: UserId,
    ) -> EngineResult<ClosingOutcome<Exercise>> {
        let exercise = self.exercise(exercise_id).await?;
        ensure_closable(&exercise)?;

        let closed: BTreeSet<PeriodLabel> = self
            .store
            .period_closures(exercise.id)
            .await?
            .into_iter()
            .filter(PeriodClosure::is_closed)
            .map(|c| c.period)
            .collect();
        let open: Vec<String> = exercise
            .periods()
            .into_iter()
            .filter(|p| !closed.contains(p))
            .map(|p| p.to_string())
            .collect();
        if !open.is_empty() {
            warn!(exercise = %exercise.code, open = open.len(), "annual close refused");
            return Err(ClosingError::PeriodsNotClosed(open).into());
        }

        if let Err(err) = self.store.claim_exercise_closing(exercise.id).await {
            return Err(match err {
                StoreError::StatusMismatch { .. } => {
                    let current = self.exercise(exercise.id).await?;
                    match ensure_closable(&current) {
                        Err(refused) => refused,
                        Ok(()) => ClosingError::ExerciseClosingInProgress(exercise.code.clone()).into(),
                    }
                }
                other => other.into(),
            });
        }

        let entry = match self.generate_closing_entry(&exercise, actor).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(exercise = %exercise.code, error = %err, "annual close failed, releasing claim");
                self.store.release_exercise_closing(exercise.id).await?;
                return Err(err);
            }
        };

        // Classes 6 and 7 are already zeroed if the entry posted, so a retry
        // after release generates nothing and only finishes the close.
        let closed = match self
            .store
            .finish_exercise_closing(exercise.id, actor, Utc::now())
            .await
        {
            Ok(closed) => closed,
            Err(err) => {
                warn!(exercise = %exercise.code, error = %err, "annual close not recorded, releasing claim");
                self.store.release_exercise_closing(exercise.id).await?;
                return Err(err.into());
            }
        };

        let message = match &entry {
            Some(entry) => {
                let result = net_result(entry, &self.settings.net_result_account);
                format!(
                    "exercise {} closed, closing entry {}, net result {result}",
                    closed.code,
                    entry.reference_label()
                )
            }
            None => format!("exercise {} closed, nothing to zero", closed.code),
        };
        info!(
            exercise = %closed.code,
            entry_id = ?entry.as_ref().map(|e| e.id),
            "exercise closed"
        );
        Ok(ClosingOutcome {
            message,
            record: closed,
        })
    }

    /// Carries the balance-sheet balances of a closed exercise into the
    /// next one.
    pub async fn carry_forward(
        &self,
        source_id: ExerciseId,
        destination_id: ExerciseId,
        actor: UserId,
    ) -> EngineResult<ClosingOutcome<CarryForward>> {
        let source = self.exercise(source_id).await?;
        let destination = self.exercise(destination_id).await?;

        if source.status != ExerciseStatus::Closed {
            return Err(ClosingError::SourceNotClosed(source.code).into());
        }
        if !destination.is_open() {
            return Err(ClosingError::DestinationNotOpen(destination.code).into());
        }
        if destination.start_date <= source.end_date {
            return Err(ClosingError::DestinationNotAfterSource {
                source_code: source.code,
                destination: destination.code,
            }
            .into());
        }
        if self.store.carry_forward(source.id).await?.is_some() {
            return Err(ClosingError::CarryForwardAlreadyDone(source.code).into());
        }

        let trial_balance = self.exercise_trial_balance(&source).await?;
        let (lines, balances) = ClosingGenerator::carry_forward_lines(&trial_balance.rows);
        if lines.is_empty() {
            return Err(ClosingError::NothingToCarryForward(source.code).into());
        }

        let claim = CarryForward::claim(source.id, destination.id, actor);
        self.store
            .claim_carry_forward(&claim)
            .await
            .map_err(|err| match err {
                StoreError::Duplicate(_) => {
                    EngineError::from(ClosingError::CarryForwardAlreadyDone(source.code.clone()))
                }
                other => other.into(),
            })?;

        let entry = match self
            .post_carry_forward_entry(&source, &destination, lines, actor)
            .await
        {
            Ok(entry) => entry,
            Err(err) => {
                warn!(source = %source.code, error = %err, "carry-forward failed, abandoning claim");
                self.store.abandon_carry_forward(claim.id).await?;
                return Err(err);
            }
        };

        // The entry is posted: the claim stays in place so a retry cannot post it twice.
        let record = match self
            .store
            .complete_carry_forward(claim.id, entry.id, &balances)
            .await
        {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    source = %source.code,
                    entry_id = %entry.id,
                    error = %err,
                    "carry-forward entry posted but claim not completed, claim kept"
                );
                return Err(err.into());
            }
        };
        self.store
            .mark_opening_balances_validated(destination.id)
            .await?;

        info!(
            source = %source.code,
            destination = %destination.code,
            entry_id = ?record.entry_id,
            balances = record.balances.len(),
            "carry-forward generated"
        );
        Ok(ClosingOutcome {
            message: format!(
                "{} balances carried forward from exercise {} to {}",
                record.balances.len(),
                source.code,
                destination.code
            ),
            record,
        })
    }

    /// Reopens a closed period. Posted entries are untouched.
    pub async fn reopen_period(
        &self,
        closure_id: ClosureId,
        reason: &str,
        actor: UserId,
    ) -> EngineResult<ClosingOutcome<PeriodClosure>> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ClosingError::MissingReason.into());
        }

        let closure = self
            .store
            .period_closure(closure_id)
            .await?
            .ok_or(ClosingError::ClosureNotFound(closure_id))?;
        if !closure.is_closed() {
            return Err(ClosingError::ClosureNotClosed(closure_id).into());
        }
        let exercise = self.exercise(closure.exercise_id).await?;
        exercise.ensure_open()?;

        let reopened = self
            .store
            .reopen_period_closure(closure_id, reason, actor, Utc::now())
            .await
            .map_err(|err| match err {
                StoreError::StatusMismatch { .. } => {
                    EngineError::from(ClosingError::ClosureNotClosed(closure_id))
                }
                other => other.into(),
            })?;

        info!(exercise = %exercise.code, period = %reopened.period, %reason, "period reopened");
        Ok(ClosingOutcome {
            message: format!("period {} of exercise {} reopened", reopened.period, exercise.code),
            record: reopened,
        })
    }

    /// Every closure of an exercise, reopened ones included.
    pub async fn period_closures(&self, exercise_id: ExerciseId) -> EngineResult<Vec<PeriodClosure>> {
        Ok(self.store.period_closures(exercise_id).await?)
    }

    /// Carry-forward generated from a source exercise, if any.
    pub async fn carry_forward_of(&self, source_id: ExerciseId) -> EngineResult<Option<CarryForward>> {
        Ok(self.store.carry_forward(source_id).await?)
    }

    async fn generate_closing_entry(
        &self,
        exercise: &Exercise,
        actor: UserId,
    ) -> EngineResult<Option<JournalEntry>> {
        let trial_balance = self.exercise_trial_balance(exercise).await?;
        let lines = ClosingGenerator::closing_lines(&trial_balance.rows, &self.settings.net_result_account);
        if lines.is_empty() {
            return Ok(None);
        }

        let input = lines.into_iter().fold(
            EntryInput::new(
                exercise.id,
                self.settings.closing_journal.as_str(),
                exercise.end_date,
                format!("Clôture de l'exercice {}", exercise.code),
                actor,
            )
            .with_type(EntryType::Closing),
            EntryInput::with_line,
        );
        self.record_generated(exercise, input, actor).await.map(Some)
    }

    async fn post_carry_forward_entry(
        &self,
        source: &Exercise,
        destination: &Exercise,
        lines: Vec<LineInput>,
        actor: UserId,
    ) -> EngineResult<JournalEntry> {
        self.copy_missing_accounts(source, destination, &lines).await?;

        let input = lines.into_iter().fold(
            EntryInput::new(
                destination.id,
                self.settings.carry_forward_journal.as_str(),
                destination.start_date,
                format!("À-nouveaux de l'exercice {}", source.code),
                actor,
            )
            .with_type(EntryType::CarryForward),
            EntryInput::with_line,
        );
        self.record_generated(destination, input, actor).await
    }

    /// Copies the carried accounts, and their missing ancestors, from the
    /// source chart.
    async fn copy_missing_accounts(
        &self,
        source: &Exercise,
        destination: &Exercise,
        lines: &[LineInput],
    ) -> EngineResult<()> {
        let source_chart = self.store.accounts(source.id).await?;
        let carried: BTreeSet<&str> = lines.iter().map(|l| l.account_number.as_str()).collect();

        let mut wanted: Vec<&Account> = source_chart
            .iter()
            .filter(|a| {
                carried
                    .iter()
                    .any(|number| number.starts_with(a.number.as_str()))
            })
            .collect();
        wanted.sort_by_key(|a| a.number.len());

        for account in wanted {
            if self
                .store
                .account(destination.id, &account.number)
                .await?
                .is_none()
            {
                let mut definition = account.definition();
                if let Some(parent) = &definition.parent
                    && self.store.account(destination.id, parent).await?.is_none()
                {
                    definition.parent = None;
                }
                self.create_account(destination.id, definition).await?;
            }
        }
        Ok(())
    }
}

fn already_closed(exercise: &Exercise, period: PeriodLabel) -> EngineError {
    ClosingError::PeriodAlreadyClosed {
        period: period.to_string(),
        exercise: exercise.code.clone(),
    }
    .into()
}

fn ensure_closable(exercise: &Exercise) -> Result<(), EngineError> {
    match exercise.status {
        ExerciseStatus::Open => Ok(()),
        ExerciseStatus::Closing => {
            Err(ClosingError::ExerciseClosingInProgress(exercise.code.clone()).into())
        }
        ExerciseStatus::Closed => {
            Err(ClosingError::ExerciseAlreadyClosed(exercise.code.clone()).into())
        }
    }
}

/// Signed result booked on the net result account: positive for a profit.
fn net_result(entry: &JournalEntry, net_result_account: &str) -> Decimal {
    entry
        .lines
        .iter()
        .filter(|l| l.account_number == net_result_account)
        .map(|l| match l.side {
            EntrySide::Credit => l.base_amount,
            EntrySide::Debit => -l.base_amount,
        })
        .sum()
}
