//! PostgreSQL `LedgerStore`.
//!
//! Every write runs in one database transaction. Sequence numbers come
//! from an upsert on `journal_sequences`: its row lock serializes inserts
//! in the same journal, and a rolled-back insert releases its number.
//! Posting locks the entry, then its accounts in number order.

mod mapping;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use comptable_core::chart::Account;
use comptable_core::closing::{
    CarryForward, CarryForwardStatus, ClosureStatus, PeriodClosure, ReportedBalance,
};
use comptable_core::exercise::{Exercise, ExerciseStatus};
use comptable_core::journal::{
    EntryAction, EntrySide, EntryStatus, JournalEntry, NewJournalEntry,
};
use comptable_core::ledger::PostedLine;
use comptable_core::store::{EntryFilter, LedgerStore, StoreError};
use comptable_core::validation::Anomaly;
use comptable_shared::types::{CarryForwardId, ClosureId, ExerciseId, JournalEntryId, UserId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Statement,
    TransactionTrait, Value,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::{
    accounts, anomalies, carry_forwards, entry_lines, exercises, journal_entries, period_closures,
};
use mapping::{
    RowError, account_from_model, account_to_active, anomaly_from_model, anomaly_to_active,
    backend, carry_forward_from_model, carry_forward_to_active, closure_from_model,
    closure_to_active, entry_from_models, entry_to_active, exercise_from_model,
    exercise_to_active, line_to_active, unique_or_backend, workflow_changes,
};

const NEXT_SEQUENCE_SQL: &str = r"
INSERT INTO journal_sequences (exercise_id, journal_code, last_value)
VALUES ($1, $2, 1)
ON CONFLICT (exercise_id, journal_code)
DO UPDATE SET last_value = journal_sequences.last_value + 1
RETURNING last_value";

/// Line of a POSTED entry joined with its header.
#[derive(Debug, FromQueryResult)]
struct PostedLineRow {
    entry_id: Uuid,
    line_number: i32,
    account_number: String,
    label: Option<String>,
    side: String,
    base_amount: Decimal,
    lettering: Option<String>,
    sequence: i64,
    journal_code: String,
    entry_date: NaiveDate,
    entry_label: String,
    document_reference: Option<String>,
}

impl PostedLineRow {
    fn into_posted_line(self) -> Result<PostedLine, RowError> {
        let side = EntrySide::parse(&self.side).ok_or_else(|| RowError::InvalidValue {
            column: "entry_lines.side",
            value: self.side.clone(),
        })?;
        let sequence =
            u64::try_from(self.sequence).map_err(|_| RowError::OutOfRange("sequence"))?;
        let (debit, credit) = match side {
            EntrySide::Debit => (self.base_amount, Decimal::ZERO),
            EntrySide::Credit => (Decimal::ZERO, self.base_amount),
        };

        Ok(PostedLine {
            entry_id: JournalEntryId::from_uuid(self.entry_id),
            sequence,
            reference: self
                .document_reference
                .unwrap_or_else(|| format!("{}-{sequence:06}", self.journal_code)),
            journal_code: self.journal_code,
            entry_date: self.entry_date,
            entry_label: self.entry_label,
            line_number: u32::try_from(self.line_number)
                .map_err(|_| RowError::OutOfRange("line_number"))?,
            account_number: self.account_number,
            label: self.label,
            debit,
            credit,
            lettering: self.lettering,
        })
    }
}

fn entry_status_mismatch(id: JournalEntryId, expected: EntryStatus, actual: &str) -> StoreError {
    StoreError::StatusMismatch {
        entity: format!("entry {id}"),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    header: journal_entries::Model,
) -> Result<JournalEntry, StoreError> {
    let lines = entry_lines::Entity::find()
        .filter(entry_lines::Column::EntryId.eq(header.id))
        .all(conn)
        .await
        .map_err(backend)?;
    Ok(entry_from_models(header, lines)?)
}

async fn next_sequence(
    txn: &DatabaseTransaction,
    exercise_id: ExerciseId,
    journal_code: &str,
) -> Result<u64, StoreError> {
    let statement = Statement::from_sql_and_values(
        txn.get_database_backend(),
        NEXT_SEQUENCE_SQL,
        [Value::from(exercise_id.into_inner()), Value::from(journal_code)],
    );
    let row = txn
        .query_one(statement)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::Backend("sequence allocation returned no row".to_string()))?;
    let value: i64 = row.try_get("", "last_value").map_err(backend)?;
    Ok(u64::try_from(value).map_err(|_| RowError::OutOfRange("sequence"))?)
}

/// `LedgerStore` backed by PostgreSQL through `SeaORM`.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a store over an open connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Compare-and-swap on the exercise status.
    async fn swap_exercise_status(
        &self,
        id: ExerciseId,
        expected: ExerciseStatus,
        changes: exercises::ActiveModel,
    ) -> Result<(), StoreError> {
        let result = exercises::Entity::update_many()
            .set(changes)
            .filter(exercises::Column::Id.eq(id.into_inner()))
            .filter(exercises::Column::Status.eq(expected.as_str()))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            let current = exercises::Entity::find_by_id(id.into_inner())
                .one(&self.db)
                .await
                .map_err(backend)?
                .ok_or_else(|| StoreError::NotFound(format!("exercise {id}")))?;
            warn!(exercise = %current.code, expected = %expected, actual = %current.status, "exercise status changed concurrently");
            return Err(StoreError::StatusMismatch {
                entity: format!("exercise {}", current.code),
                expected: expected.to_string(),
                actual: current.status,
            });
        }
        Ok(())
    }

    async fn required_exercise(&self, id: ExerciseId) -> Result<Exercise, StoreError> {
        self.exercise(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("exercise {id}")))
    }

    async fn required_closure(&self, id: ClosureId) -> Result<PeriodClosure, StoreError> {
        self.period_closure(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("closure {id}")))
    }

    async fn required_carry_forward(&self, id: CarryForwardId) -> Result<CarryForward, StoreError> {
        let model = carry_forwards::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::NotFound(format!("carry-forward {id}")))?;
        Ok(carry_forward_from_model(model)?)
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    // ========== Exercises ==========

    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        exercise_to_active(exercise)
            .insert(&self.db)
            .await
            .map_err(|err| unique_or_backend(err, || format!("exercise {}", exercise.code)))?;
        Ok(())
    }

    async fn exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StoreError> {
        let model = exercises::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(exercise_from_model).transpose()?)
    }

    async fn claim_exercise_closing(&self, id: ExerciseId) -> Result<(), StoreError> {
        self.swap_exercise_status(
            id,
            ExerciseStatus::Open,
            exercises::ActiveModel {
                status: Set(ExerciseStatus::Closing.as_str().to_string()),
                ..Default::default()
            },
        )
        .await
    }

    async fn release_exercise_closing(&self, id: ExerciseId) -> Result<(), StoreError> {
        self.swap_exercise_status(
            id,
            ExerciseStatus::Closing,
            exercises::ActiveModel {
                status: Set(ExerciseStatus::Open.as_str().to_string()),
                ..Default::default()
            },
        )
        .await
    }

    async fn finish_exercise_closing(
        &self,
        id: ExerciseId,
        closed_by: UserId,
        closed_at: DateTime<Utc>,
    ) -> Result<Exercise, StoreError> {
        self.swap_exercise_status(
            id,
            ExerciseStatus::Closing,
            exercises::ActiveModel {
                status: Set(ExerciseStatus::Closed.as_str().to_string()),
                closed_by: Set(Some(closed_by.into_inner())),
                closed_at: Set(Some(closed_at.into())),
                ..Default::default()
            },
        )
        .await?;
        self.required_exercise(id).await
    }

    async fn mark_opening_balances_validated(&self, id: ExerciseId) -> Result<(), StoreError> {
        let result = exercises::Entity::update_many()
            .col_expr(exercises::Column::OpeningBalancesValidated, Expr::value(true))
            .filter(exercises::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("exercise {id}")));
        }
        Ok(())
    }

    // ========== Accounts ==========

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        account_to_active(account)
            .insert(&self.db)
            .await
            .map_err(|err| unique_or_backend(err, || format!("account {}", account.number)))?;
        Ok(())
    }

    async fn account(
        &self,
        exercise_id: ExerciseId,
        number: &str,
    ) -> Result<Option<Account>, StoreError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::ExerciseId.eq(exercise_id.into_inner()))
            .filter(accounts::Column::Number.eq(number))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(account_from_model).transpose()?)
    }

    async fn accounts(&self, exercise_id: ExerciseId) -> Result<Vec<Account>, StoreError> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::ExerciseId.eq(exercise_id.into_inner()))
            .order_by_asc(accounts::Column::Number)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(models
            .into_iter()
            .map(account_from_model)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn set_account_active(
        &self,
        exercise_id: ExerciseId,
        number: &str,
        active: bool,
    ) -> Result<Account, StoreError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Active, Expr::value(active))
            .filter(accounts::Column::ExerciseId.eq(exercise_id.into_inner()))
            .filter(accounts::Column::Number.eq(number))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("account {number}")));
        }
        self.account(exercise_id, number)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("account {number}")))
    }

    // ========== Entries ==========

    async fn insert_entry(&self, entry: NewJournalEntry) -> Result<JournalEntry, StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;

        let sequence = next_sequence(&txn, entry.exercise_id, &entry.journal_code).await?;
        let stored = JournalEntry::from_new(entry, sequence);

        entry_to_active(&stored)?
            .insert(&txn)
            .await
            .map_err(|err| unique_or_backend(err, || format!("entry {}", stored.id)))?;

        let lines = stored
            .lines
            .iter()
            .map(|line| line_to_active(stored.id, line))
            .collect::<Result<Vec<_>, _>>()?;
        if !lines.is_empty() {
            entry_lines::Entity::insert_many(lines)
                .exec(&txn)
                .await
                .map_err(backend)?;
        }

        txn.commit().await.map_err(backend)?;
        debug!(entry_id = %stored.id, reference = %stored.reference_label(), "entry stored");
        Ok(stored)
    }

    async fn entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        let header = journal_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?;
        match header {
            Some(header) => Ok(Some(load_entry(&self.db, header).await?)),
            None => Ok(None),
        }
    }

    async fn entries(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>, StoreError> {
        let mut query = journal_entries::Entity::find();
        if let Some(exercise_id) = filter.exercise_id {
            query = query.filter(journal_entries::Column::ExerciseId.eq(exercise_id.into_inner()));
        }
        if let Some(period) = filter.period {
            query = query.filter(journal_entries::Column::Period.eq(period.to_string()));
        }
        if let Some(status) = filter.status {
            query = query.filter(journal_entries::Column::Status.eq(status.as_str()));
        }
        if let Some(entry_type) = filter.entry_type {
            query = query.filter(journal_entries::Column::EntryType.eq(entry_type.as_str()));
        }
        if let Some(journal_code) = &filter.journal_code {
            query = query.filter(journal_entries::Column::JournalCode.eq(journal_code.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }

        let headers = query
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::JournalCode)
            .order_by_asc(journal_entries::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(backend)?;
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut lines_by_entry: HashMap<Uuid, Vec<entry_lines::Model>> = HashMap::new();
        for line in entry_lines::Entity::find()
            .filter(entry_lines::Column::EntryId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(backend)?
        {
            lines_by_entry.entry(line.entry_id).or_default().push(line);
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let lines = lines_by_entry.remove(&header.id).unwrap_or_default();
                entry_from_models(header, lines)
            })
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn transition_entry(
        &self,
        id: JournalEntryId,
        action: &EntryAction,
    ) -> Result<JournalEntry, StoreError> {
        if matches!(action, EntryAction::Post { .. }) {
            return Err(StoreError::Backend(
                "posting must go through post_entry".to_string(),
            ));
        }

        let current = self
            .entry(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("entry {id}")))?;
        let mut staged = current.clone();
        action.apply(&mut staged).map_err(|_| {
            entry_status_mismatch(id, action.from_status(), current.status.as_str())
        })?;

        let result = journal_entries::Entity::update_many()
            .set(workflow_changes(&staged))
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .filter(journal_entries::Column::Status.eq(action.from_status().as_str()))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            let actual = journal_entries::Entity::find_by_id(id.into_inner())
                .one(&self.db)
                .await
                .map_err(backend)?
                .map_or_else(|| "MISSING".to_string(), |m| m.status);
            warn!(entry_id = %id, actual = %actual, "entry status changed concurrently");
            return Err(entry_status_mismatch(id, action.from_status(), &actual));
        }
        Ok(staged)
    }

    async fn post_entry(
        &self,
        id: JournalEntryId,
        action: &EntryAction,
    ) -> Result<JournalEntry, StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;

        let header = journal_entries::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::NotFound(format!("entry {id}")))?;
        let entry = load_entry(&txn, header).await?;
        if entry.status != EntryStatus::Validated || !matches!(action, EntryAction::Post { .. }) {
            return Err(entry_status_mismatch(
                id,
                action.from_status(),
                entry.status.as_str(),
            ));
        }

        let mut staged = entry.clone();
        action.apply(&mut staged).map_err(|_| {
            entry_status_mismatch(id, action.from_status(), entry.status.as_str())
        })?;

        let numbers: BTreeSet<&str> = entry
            .lines
            .iter()
            .map(|line| line.account_number.as_str())
            .collect();
        let locked = accounts::Entity::find()
            .filter(accounts::Column::ExerciseId.eq(entry.exercise_id.into_inner()))
            .filter(accounts::Column::Number.is_in(numbers.iter().copied()))
            .order_by_asc(accounts::Column::Number)
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(backend)?;

        let mut staged_accounts: BTreeMap<String, Account> = BTreeMap::new();
        for model in locked {
            let account = account_from_model(model)?;
            if account.active {
                staged_accounts.insert(account.number.clone(), account);
            }
        }
        for line in &entry.lines {
            let account = staged_accounts
                .get_mut(&line.account_number)
                .ok_or_else(|| StoreError::AccountUnavailable(line.account_number.clone()))?;
            account.balance = account.balance.with_movement(line.side, line.base_amount);
        }

        for account in staged_accounts.values() {
            accounts::ActiveModel {
                id: Unchanged(account.id.into_inner()),
                total_debit: Set(account.balance.debit),
                total_credit: Set(account.balance.credit),
                ..Default::default()
            }
            .update(&txn)
            .await
            .map_err(backend)?;
        }

        journal_entries::Entity::update_many()
            .set(workflow_changes(&staged))
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(backend)?;

        txn.commit().await.map_err(backend)?;
        debug!(entry_id = %id, accounts = staged_accounts.len(), "entry posted");
        Ok(staged)
    }

    async fn posted_lines(
        &self,
        exercise_id: ExerciseId,
        account: Option<&str>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<PostedLine>, StoreError> {
        let mut query = entry_lines::Entity::find()
            .select_only()
            .columns([
                entry_lines::Column::EntryId,
                entry_lines::Column::LineNumber,
                entry_lines::Column::AccountNumber,
                entry_lines::Column::Label,
                entry_lines::Column::Side,
                entry_lines::Column::BaseAmount,
                entry_lines::Column::Lettering,
            ])
            .column_as(journal_entries::Column::Sequence, "sequence")
            .column_as(journal_entries::Column::JournalCode, "journal_code")
            .column_as(journal_entries::Column::EntryDate, "entry_date")
            .column_as(journal_entries::Column::Label, "entry_label")
            .column_as(journal_entries::Column::DocumentReference, "document_reference")
            .join(JoinType::InnerJoin, entry_lines::Relation::JournalEntries.def())
            .filter(journal_entries::Column::ExerciseId.eq(exercise_id.into_inner()))
            .filter(journal_entries::Column::Status.eq(EntryStatus::Posted.as_str()));
        if let Some(number) = account {
            query = query.filter(entry_lines::Column::AccountNumber.eq(number));
        }
        if let Some(until) = until {
            query = query.filter(journal_entries::Column::EntryDate.lte(until));
        }

        let rows = query
            .into_model::<PostedLineRow>()
            .all(&self.db)
            .await
            .map_err(backend)?;
        let mut lines = rows
            .into_iter()
            .map(PostedLineRow::into_posted_line)
            .collect::<Result<Vec<_>, _>>()?;
        lines.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(lines)
    }

    // ========== Anomalies ==========

    async fn insert_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), StoreError> {
        if anomalies.is_empty() {
            return Ok(());
        }
        anomalies::Entity::insert_many(anomalies.iter().map(anomaly_to_active))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn anomalies(
        &self,
        exercise_id: ExerciseId,
        entry_id: Option<JournalEntryId>,
    ) -> Result<Vec<Anomaly>, StoreError> {
        let mut query = anomalies::Entity::find()
            .filter(anomalies::Column::ExerciseId.eq(exercise_id.into_inner()));
        if let Some(entry_id) = entry_id {
            query = query.filter(anomalies::Column::EntryId.eq(entry_id.into_inner()));
        }
        let models = query
            .order_by_asc(anomalies::Column::DetectedAt)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(models
            .into_iter()
            .map(anomaly_from_model)
            .collect::<Result<Vec<_>, _>>()?)
    }

    // ========== Period closures ==========

    async fn insert_period_closure(&self, closure: &PeriodClosure) -> Result<(), StoreError> {
        closure_to_active(closure)?
            .insert(&self.db)
            .await
            .map_err(|err| unique_or_backend(err, || format!("closure of {}", closure.period)))?;
        debug!(closure_id = %closure.id, period = %closure.period, "period closure stored");
        Ok(())
    }

    async fn period_closure(&self, id: ClosureId) -> Result<Option<PeriodClosure>, StoreError> {
        let model = period_closures::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(closure_from_model).transpose()?)
    }

    async fn period_closures(
        &self,
        exercise_id: ExerciseId,
    ) -> Result<Vec<PeriodClosure>, StoreError> {
        let models = period_closures::Entity::find()
            .filter(period_closures::Column::ExerciseId.eq(exercise_id.into_inner()))
            .order_by_asc(period_closures::Column::ClosedAt)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(models
            .into_iter()
            .map(closure_from_model)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn reopen_period_closure(
        &self,
        id: ClosureId,
        reason: &str,
        reopened_by: UserId,
        reopened_at: DateTime<Utc>,
    ) -> Result<PeriodClosure, StoreError> {
        let result = period_closures::Entity::update_many()
            .set(period_closures::ActiveModel {
                status: Set(ClosureStatus::Reopened.as_str().to_string()),
                reopen_reason: Set(Some(reason.to_string())),
                reopened_by: Set(Some(reopened_by.into_inner())),
                reopened_at: Set(Some(reopened_at.into())),
                ..Default::default()
            })
            .filter(period_closures::Column::Id.eq(id.into_inner()))
            .filter(period_closures::Column::Status.eq(ClosureStatus::Closed.as_str()))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            let current = self.required_closure(id).await?;
            return Err(StoreError::StatusMismatch {
                entity: format!("closure {id}"),
                expected: ClosureStatus::Closed.as_str().to_string(),
                actual: current.status.as_str().to_string(),
            });
        }
        self.required_closure(id).await
    }

    // ========== Carry-forwards ==========

    async fn claim_carry_forward(&self, record: &CarryForward) -> Result<(), StoreError> {
        carry_forward_to_active(record)?
            .insert(&self.db)
            .await
            .map_err(|err| {
                unique_or_backend(err, || {
                    format!("carry-forward from {}", record.source_exercise_id)
                })
            })?;
        Ok(())
    }

    async fn complete_carry_forward(
        &self,
        id: CarryForwardId,
        entry_id: JournalEntryId,
        balances: &[ReportedBalance],
    ) -> Result<CarryForward, StoreError> {
        let balances = serde_json::to_value(balances).map_err(RowError::from)?;
        let result = carry_forwards::Entity::update_many()
            .set(carry_forwards::ActiveModel {
                entry_id: Set(Some(entry_id.into_inner())),
                balances: Set(balances),
                status: Set(CarryForwardStatus::Completed.as_str().to_string()),
                ..Default::default()
            })
            .filter(carry_forwards::Column::Id.eq(id.into_inner()))
            .filter(carry_forwards::Column::Status.eq(CarryForwardStatus::InProgress.as_str()))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            let current = self.required_carry_forward(id).await?;
            return Err(StoreError::StatusMismatch {
                entity: format!("carry-forward {id}"),
                expected: CarryForwardStatus::InProgress.as_str().to_string(),
                actual: current.status.as_str().to_string(),
            });
        }
        self.required_carry_forward(id).await
    }

    async fn abandon_carry_forward(&self, id: CarryForwardId) -> Result<(), StoreError> {
        carry_forwards::Entity::delete_many()
            .filter(carry_forwards::Column::Id.eq(id.into_inner()))
            .filter(carry_forwards::Column::Status.eq(CarryForwardStatus::InProgress.as_str()))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn carry_forward(
        &self,
        source_exercise_id: ExerciseId,
    ) -> Result<Option<CarryForward>, StoreError> {
        let model = carry_forwards::Entity::find()
            .filter(carry_forwards::Column::SourceExerciseId.eq(source_exercise_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(carry_forward_from_model).transpose()?)
    }
}
