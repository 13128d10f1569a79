//! Ledger engine: every operation, orchestrated against a `LedgerStore`.
//!
//! Domain rules live in the pure modules; the engine loads what they need,
//! calls them, and hands atomic units to the store.

mod closing;
mod entries;
pub mod error;
mod reporting;
pub mod settings;

#[cfg(test)]
mod failure_scenarios;
#[cfg(test)]
mod scenarios;

use std::sync::Arc;

use chrono::NaiveDate;
use comptable_shared::types::ExerciseId;
use serde::Serialize;
use tracing::{info, warn};

use crate::budget::BudgetOracle;
use crate::chart::{Account, AccountClass, AccountNature, ChartError, NewAccount};
use crate::exercise::{Exercise, ExerciseError};
use crate::journal::JournalEntry;
use crate::store::{LedgerStore, StoreError};
use crate::validation::ValidationReport;

pub use error::EngineError;
pub use settings::LedgerSettings;

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result of `validate_entry`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    /// True if the entry moved to VALIDATED.
    pub passed: bool,
    /// Every finding of the run.
    pub report: ValidationReport,
    /// The entry after the call.
    pub entry: JournalEntry,
}

/// Result of a closing operation.
#[derive(Debug, Clone, Serialize)]
pub struct ClosingOutcome<T> {
    /// Human-readable summary.
    pub message: String,
    /// Record produced by the operation.
    pub record: T,
}

/// Double-entry ledger engine.
pub struct LedgerEngine<S> {
    store: Arc<S>,
    settings: LedgerSettings,
    budget: Option<Arc<dyn BudgetOracle>>,
}

impl<S: LedgerStore> LedgerEngine<S> {
    /// Creates an engine without budget oracle.
    pub fn new(store: Arc<S>, settings: LedgerSettings) -> Self {
        Self {
            store,
            settings,
            budget: None,
        }
    }

    /// Enables the budget gate on entries carrying a budget line.
    #[must_use]
    pub fn with_budget(mut self, oracle: Arc<dyn BudgetOracle>) -> Self {
        self.budget = Some(oracle);
        self
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active settings.
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    // ========== Exercises ==========

    /// Opens a new exercise.
    pub async fn open_exercise(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<Exercise> {
        let exercise = Exercise::new(code, start_date, end_date)?;
        self.store
            .insert_exercise(&exercise)
            .await
            .map_err(|err| match err {
                StoreError::Duplicate(_) => {
                    EngineError::from(ExerciseError::DuplicateExercise(code.to_string()))
                }
                other => other.into(),
            })?;

        info!(exercise = %exercise.code, start = %start_date, end = %end_date, "exercise opened");
        Ok(exercise)
    }

    /// Loads an exercise.
    pub async fn exercise(&self, exercise_id: ExerciseId) -> EngineResult<Exercise> {
        self.store
            .exercise(exercise_id)
            .await?
            .ok_or_else(|| ExerciseError::ExerciseNotFound(exercise_id.to_string()).into())
    }

    // ========== Chart of accounts ==========

    /// Adds an account to the exercise chart.
    ///
    /// The parent, if any, must already exist in the exercise.
    pub async fn create_account(
        &self,
        exercise_id: ExerciseId,
        input: NewAccount,
    ) -> EngineResult<Account> {
        let exercise = self.exercise(exercise_id).await?;
        let account = Account::open(exercise.id, input)?;

        if let Some(parent) = &account.parent
            && self.store.account(exercise.id, parent).await?.is_none()
        {
            return Err(ChartError::ParentNotFound(parent.clone()).into());
        }

        self.store
            .insert_account(&account)
            .await
            .map_err(|err| match err {
                StoreError::Duplicate(_) => EngineError::from(ChartError::DuplicateAccount {
                    number: account.number.clone(),
                    exercise: exercise.code.clone(),
                }),
                other => other.into(),
            })?;

        info!(exercise = %exercise.code, account = %account.number, "account created");
        Ok(account)
    }

    /// Creates every template account missing from the exercise chart.
    ///
    /// Templates list parents before children. Existing numbers are kept
    /// as they are. Returns the accounts created.
    pub async fn initialize_chart(
        &self,
        exercise_id: ExerciseId,
        template: Vec<NewAccount>,
    ) -> EngineResult<Vec<Account>> {
        let exercise = self.exercise(exercise_id).await?;
        let mut created = Vec::new();

        for definition in template {
            if self.store.account(exercise.id, &definition.number).await?.is_some() {
                continue;
            }
            created.push(self.create_account(exercise.id, definition).await?);
        }

        info!(exercise = %exercise.code, created = created.len(), "chart initialized");
        Ok(created)
    }

    /// Loads an account by number.
    pub async fn account(&self, exercise_id: ExerciseId, number: &str) -> EngineResult<Account> {
        self.store
            .account(exercise_id, number)
            .await?
            .ok_or_else(|| ChartError::AccountNotFound(number.to_string()).into())
    }

    /// Lists the chart ordered by number.
    pub async fn accounts(&self, exercise_id: ExerciseId) -> EngineResult<Vec<Account>> {
        Ok(self.store.accounts(exercise_id).await?)
    }

    /// Lists the accounts of one class.
    pub async fn accounts_by_class(
        &self,
        exercise_id: ExerciseId,
        class: AccountClass,
    ) -> EngineResult<Vec<Account>> {
        let mut accounts = self.store.accounts(exercise_id).await?;
        accounts.retain(|a| a.class == class);
        Ok(accounts)
    }

    /// Lists the accounts of one nature.
    pub async fn accounts_by_nature(
        &self,
        exercise_id: ExerciseId,
        nature: AccountNature,
    ) -> EngineResult<Vec<Account>> {
        let mut accounts = self.store.accounts(exercise_id).await?;
        accounts.retain(|a| a.nature == nature);
        Ok(accounts)
    }

    /// Deactivates an account. Balances and history are kept.
    pub async fn deactivate_account(
        &self,
        exercise_id: ExerciseId,
        number: &str,
    ) -> EngineResult<Account> {
        let account = self
            .store
            .set_account_active(exercise_id, number, false)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => {
                    EngineError::from(ChartError::AccountNotFound(number.to_string()))
                }
                other => other.into(),
            })?;

        if !account.balance.net().is_zero() {
            warn!(account = %number, net = %account.balance.net(), "account deactivated with a balance");
        }
        info!(account = %number, "account deactivated");
        Ok(account)
    }
}
