//! Conversions between table rows and domain types.

use chrono::{DateTime, FixedOffset, Utc};
use comptable_core::chart::{Account, AccountBalance, AccountClass, AccountNature};
use comptable_core::closing::{
    CarryForward, CarryForwardStatus, ClosureStatus, ClosureType, PeriodClosure,
};
use comptable_core::exercise::{Exercise, ExerciseStatus};
use comptable_core::journal::{
    EntryAudit, EntryLine, EntrySide, EntryStatus, EntryType, JournalEntry,
};
use comptable_core::store::StoreError;
use comptable_core::validation::{Anomaly, AnomalyCategory, AnomalyRule, ResolutionStatus, Severity};
use comptable_shared::types::{
    AccountId, AnomalyId, CarryForwardId, ClosureId, EntryLineId, ExerciseId, JournalEntryId,
    UserId,
};
use sea_orm::{ActiveValue::Set, DbErr, SqlErr};
use tracing::error;

use crate::entities::{
    accounts, anomalies, carry_forwards, entry_lines, exercises, journal_entries, period_closures,
};

/// A stored row that does not map back to a domain value.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// Unknown code in a status or enum column.
    #[error("invalid {column} value '{value}'")]
    InvalidValue {
        /// Column name.
        column: &'static str,
        /// Stored value.
        value: String,
    },

    /// Integer that does not fit the domain type.
    #[error("{0} out of range")]
    OutOfRange(&'static str),

    /// JSON column that does not deserialize.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RowError> for StoreError {
    fn from(err: RowError) -> Self {
        error!(error = %err, "corrupt ledger row");
        StoreError::Backend(err.to_string())
    }
}

/// Maps a database error; unique violations become `Duplicate(what)`.
pub fn unique_or_backend(err: DbErr, what: impl FnOnce() -> String) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate(what()),
        _ => backend(err),
    }
}

/// Maps any other database error.
pub fn backend(err: DbErr) -> StoreError {
    error!(error = %err, "ledger database error");
    StoreError::Backend(err.to_string())
}

fn invalid(column: &'static str, value: &str) -> RowError {
    RowError::InvalidValue {
        column,
        value: value.to_string(),
    }
}

fn utc(value: DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn user(value: Option<uuid::Uuid>) -> Option<UserId> {
    value.map(UserId::from_uuid)
}

pub fn sequence_to_db(sequence: u64) -> Result<i64, RowError> {
    i64::try_from(sequence).map_err(|_| RowError::OutOfRange("sequence"))
}

// ========== Exercises ==========

pub fn exercise_from_model(model: exercises::Model) -> Result<Exercise, RowError> {
    Ok(Exercise {
        id: ExerciseId::from_uuid(model.id),
        status: ExerciseStatus::parse(&model.status)
            .ok_or_else(|| invalid("exercises.status", &model.status))?,
        code: model.code,
        start_date: model.start_date,
        end_date: model.end_date,
        closed_by: user(model.closed_by),
        closed_at: model.closed_at.map(utc),
        opening_balances_validated: model.opening_balances_validated,
        created_at: utc(model.created_at),
    })
}

pub fn exercise_to_active(exercise: &Exercise) -> exercises::ActiveModel {
    exercises::ActiveModel {
        id: Set(exercise.id.into_inner()),
        code: Set(exercise.code.clone()),
        start_date: Set(exercise.start_date),
        end_date: Set(exercise.end_date),
        status: Set(exercise.status.as_str().to_string()),
        closed_by: Set(exercise.closed_by.map(UserId::into_inner)),
        closed_at: Set(exercise.closed_at.map(Into::into)),
        opening_balances_validated: Set(exercise.opening_balances_validated),
        created_at: Set(exercise.created_at.into()),
    }
}

// ========== Accounts ==========

pub fn account_from_model(model: accounts::Model) -> Result<Account, RowError> {
    let class = u8::try_from(model.class)
        .ok()
        .and_then(|digit| AccountClass::try_from(digit).ok())
        .ok_or_else(|| invalid("accounts.class", &model.class.to_string()))?;

    Ok(Account {
        id: AccountId::from_uuid(model.id),
        exercise_id: ExerciseId::from_uuid(model.exercise_id),
        class,
        nature: AccountNature::parse(&model.nature)
            .ok_or_else(|| invalid("accounts.nature", &model.nature))?,
        number: model.number,
        label: model.label,
        parent: model.parent_number,
        lettrable: model.lettrable,
        active: model.active,
        balance: AccountBalance::new(model.total_debit, model.total_credit),
        created_at: utc(model.created_at),
    })
}

pub fn account_to_active(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        exercise_id: Set(account.exercise_id.into_inner()),
        number: Set(account.number.clone()),
        label: Set(account.label.clone()),
        class: Set(i16::from(account.class.digit())),
        nature: Set(account.nature.as_str().to_string()),
        parent_number: Set(account.parent.clone()),
        lettrable: Set(account.lettrable),
        active: Set(account.active),
        total_debit: Set(account.balance.debit),
        total_credit: Set(account.balance.credit),
        created_at: Set(account.created_at.into()),
    }
}

// ========== Entries ==========

pub fn line_from_model(model: entry_lines::Model) -> Result<EntryLine, RowError> {
    Ok(EntryLine {
        id: EntryLineId::from_uuid(model.id),
        line_number: u32::try_from(model.line_number)
            .map_err(|_| RowError::OutOfRange("line_number"))?,
        side: EntrySide::parse(&model.side).ok_or_else(|| invalid("entry_lines.side", &model.side))?,
        account_number: model.account_number,
        account_label: model.account_label,
        label: model.label,
        amount: model.amount,
        currency: model.currency,
        exchange_rate: model.exchange_rate,
        base_amount: model.base_amount,
        lettering: model.lettering,
        cost_center: model.cost_center,
        project: model.project,
    })
}

pub fn line_to_active(
    entry_id: JournalEntryId,
    line: &EntryLine,
) -> Result<entry_lines::ActiveModel, RowError> {
    Ok(entry_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        entry_id: Set(entry_id.into_inner()),
        line_number: Set(
            i32::try_from(line.line_number).map_err(|_| RowError::OutOfRange("line_number"))?
        ),
        account_number: Set(line.account_number.clone()),
        account_label: Set(line.account_label.clone()),
        label: Set(line.label.clone()),
        side: Set(line.side.as_str().to_string()),
        amount: Set(line.amount),
        currency: Set(line.currency.clone()),
        exchange_rate: Set(line.exchange_rate),
        base_amount: Set(line.base_amount),
        lettering: Set(line.lettering.clone()),
        cost_center: Set(line.cost_center.clone()),
        project: Set(line.project.clone()),
    })
}

/// Rebuilds an entry from its header and lines (lines in any order).
pub fn entry_from_models(
    model: journal_entries::Model,
    lines: Vec<entry_lines::Model>,
) -> Result<JournalEntry, RowError> {
    let mut lines = lines
        .into_iter()
        .map(line_from_model)
        .collect::<Result<Vec<_>, _>>()?;
    lines.sort_by_key(|l| l.line_number);

    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        sequence: u64::try_from(model.sequence).map_err(|_| RowError::OutOfRange("sequence"))?,
        exercise_id: ExerciseId::from_uuid(model.exercise_id),
        entry_type: EntryType::parse(&model.entry_type)
            .ok_or_else(|| invalid("journal_entries.entry_type", &model.entry_type))?,
        period: model
            .period
            .parse()
            .map_err(|_| invalid("journal_entries.period", &model.period))?,
        status: EntryStatus::parse(&model.status)
            .ok_or_else(|| invalid("journal_entries.status", &model.status))?,
        journal_code: model.journal_code,
        journal_label: model.journal_label,
        entry_date: model.entry_date,
        document_date: model.document_date,
        label: model.label,
        document_reference: model.document_reference,
        budget_line: model.budget_line,
        total_amount: model.total_amount,
        balanced: model.balanced,
        audit: EntryAudit {
            created_by: UserId::from_uuid(model.created_by),
            created_at: utc(model.created_at),
            validated_by: user(model.validated_by),
            validated_at: model.validated_at.map(utc),
            posted_by: user(model.posted_by),
            posted_at: model.posted_at.map(utc),
            rejected_by: user(model.rejected_by),
            rejected_at: model.rejected_at.map(utc),
            rejection_reason: model.rejection_reason,
            cancelled_by: user(model.cancelled_by),
            cancelled_at: model.cancelled_at.map(utc),
            cancellation_reason: model.cancellation_reason,
        },
        lines,
    })
}

pub fn entry_to_active(entry: &JournalEntry) -> Result<journal_entries::ActiveModel, RowError> {
    let audit = &entry.audit;
    Ok(journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        exercise_id: Set(entry.exercise_id.into_inner()),
        journal_code: Set(entry.journal_code.clone()),
        sequence: Set(sequence_to_db(entry.sequence)?),
        journal_label: Set(entry.journal_label.clone()),
        entry_type: Set(entry.entry_type.as_str().to_string()),
        entry_date: Set(entry.entry_date),
        document_date: Set(entry.document_date),
        period: Set(entry.period.to_string()),
        label: Set(entry.label.clone()),
        document_reference: Set(entry.document_reference.clone()),
        budget_line: Set(entry.budget_line.clone()),
        total_amount: Set(entry.total_amount),
        balanced: Set(entry.balanced),
        status: Set(entry.status.as_str().to_string()),
        created_by: Set(audit.created_by.into_inner()),
        created_at: Set(audit.created_at.into()),
        validated_by: Set(audit.validated_by.map(UserId::into_inner)),
        validated_at: Set(audit.validated_at.map(Into::into)),
        posted_by: Set(audit.posted_by.map(UserId::into_inner)),
        posted_at: Set(audit.posted_at.map(Into::into)),
        rejected_by: Set(audit.rejected_by.map(UserId::into_inner)),
        rejected_at: Set(audit.rejected_at.map(Into::into)),
        rejection_reason: Set(audit.rejection_reason.clone()),
        cancelled_by: Set(audit.cancelled_by.map(UserId::into_inner)),
        cancelled_at: Set(audit.cancelled_at.map(Into::into)),
        cancellation_reason: Set(audit.cancellation_reason.clone()),
    })
}

/// Status and audit columns only, for workflow updates.
pub fn workflow_changes(entry: &JournalEntry) -> journal_entries::ActiveModel {
    let audit = &entry.audit;
    journal_entries::ActiveModel {
        status: Set(entry.status.as_str().to_string()),
        validated_by: Set(audit.validated_by.map(UserId::into_inner)),
        validated_at: Set(audit.validated_at.map(Into::into)),
        posted_by: Set(audit.posted_by.map(UserId::into_inner)),
        posted_at: Set(audit.posted_at.map(Into::into)),
        rejected_by: Set(audit.rejected_by.map(UserId::into_inner)),
        rejected_at: Set(audit.rejected_at.map(Into::into)),
        rejection_reason: Set(audit.rejection_reason.clone()),
        cancelled_by: Set(audit.cancelled_by.map(UserId::into_inner)),
        cancelled_at: Set(audit.cancelled_at.map(Into::into)),
        cancellation_reason: Set(audit.cancellation_reason.clone()),
        ..Default::default()
    }
}

// ========== Anomalies ==========

pub fn anomaly_from_model(model: anomalies::Model) -> Result<Anomaly, RowError> {
    Ok(Anomaly {
        id: AnomalyId::from_uuid(model.id),
        exercise_id: ExerciseId::from_uuid(model.exercise_id),
        entry_id: model.entry_id.map(JournalEntryId::from_uuid),
        rule: AnomalyRule::parse(&model.rule).ok_or_else(|| invalid("anomalies.rule", &model.rule))?,
        category: AnomalyCategory::parse(&model.category)
            .ok_or_else(|| invalid("anomalies.category", &model.category))?,
        severity: Severity::parse(&model.severity)
            .ok_or_else(|| invalid("anomalies.severity", &model.severity))?,
        resolution: ResolutionStatus::parse(&model.resolution)
            .ok_or_else(|| invalid("anomalies.resolution", &model.resolution))?,
        description: model.description,
        details: model.details,
        detected_at: utc(model.detected_at),
    })
}

pub fn anomaly_to_active(anomaly: &Anomaly) -> anomalies::ActiveModel {
    anomalies::ActiveModel {
        id: Set(anomaly.id.into_inner()),
        exercise_id: Set(anomaly.exercise_id.into_inner()),
        entry_id: Set(anomaly.entry_id.map(JournalEntryId::into_inner)),
        rule: Set(anomaly.rule.as_str().to_string()),
        category: Set(anomaly.category.as_str().to_string()),
        severity: Set(anomaly.severity.as_str().to_string()),
        description: Set(anomaly.description.clone()),
        details: Set(anomaly.details.clone()),
        detected_at: Set(anomaly.detected_at.into()),
        resolution: Set(anomaly.resolution.as_str().to_string()),
    }
}

// ========== Closures ==========

pub fn closure_from_model(model: period_closures::Model) -> Result<PeriodClosure, RowError> {
    Ok(PeriodClosure {
        id: ClosureId::from_uuid(model.id),
        exercise_id: ExerciseId::from_uuid(model.exercise_id),
        period: model
            .period
            .parse()
            .map_err(|_| invalid("period_closures.period", &model.period))?,
        closure_type: ClosureType::parse(&model.closure_type)
            .ok_or_else(|| invalid("period_closures.closure_type", &model.closure_type))?,
        status: ClosureStatus::parse(&model.status)
            .ok_or_else(|| invalid("period_closures.status", &model.status))?,
        closed_by: UserId::from_uuid(model.closed_by),
        closed_at: utc(model.closed_at),
        controls: serde_json::from_value(model.controls)?,
        anomaly_count: usize::try_from(model.anomaly_count)
            .map_err(|_| RowError::OutOfRange("anomaly_count"))?,
        reopen_reason: model.reopen_reason,
        reopened_by: user(model.reopened_by),
        reopened_at: model.reopened_at.map(utc),
    })
}

pub fn closure_to_active(closure: &PeriodClosure) -> Result<period_closures::ActiveModel, RowError> {
    Ok(period_closures::ActiveModel {
        id: Set(closure.id.into_inner()),
        exercise_id: Set(closure.exercise_id.into_inner()),
        period: Set(closure.period.to_string()),
        closure_type: Set(closure.closure_type.as_str().to_string()),
        status: Set(closure.status.as_str().to_string()),
        closed_by: Set(closure.closed_by.into_inner()),
        closed_at: Set(closure.closed_at.into()),
        controls: Set(serde_json::to_value(&closure.controls)?),
        anomaly_count: Set(
            i32::try_from(closure.anomaly_count).map_err(|_| RowError::OutOfRange("anomaly_count"))?
        ),
        reopen_reason: Set(closure.reopen_reason.clone()),
        reopened_by: Set(closure.reopened_by.map(UserId::into_inner)),
        reopened_at: Set(closure.reopened_at.map(Into::into)),
    })
}

// ========== Carry-forwards ==========

pub fn carry_forward_from_model(model: carry_forwards::Model) -> Result<CarryForward, RowError> {
    Ok(CarryForward {
        id: CarryForwardId::from_uuid(model.id),
        source_exercise_id: ExerciseId::from_uuid(model.source_exercise_id),
        destination_exercise_id: ExerciseId::from_uuid(model.destination_exercise_id),
        generated_at: utc(model.generated_at),
        generated_by: UserId::from_uuid(model.generated_by),
        entry_id: model.entry_id.map(JournalEntryId::from_uuid),
        balances: serde_json::from_value(model.balances)?,
        status: CarryForwardStatus::parse(&model.status)
            .ok_or_else(|| invalid("carry_forwards.status", &model.status))?,
    })
}

pub fn carry_forward_to_active(
    record: &CarryForward,
) -> Result<carry_forwards::ActiveModel, RowError> {
    Ok(carry_forwards::ActiveModel {
        id: Set(record.id.into_inner()),
        source_exercise_id: Set(record.source_exercise_id.into_inner()),
        destination_exercise_id: Set(record.destination_exercise_id.into_inner()),
        generated_at: Set(record.generated_at.into()),
        generated_by: Set(record.generated_by.into_inner()),
        entry_id: Set(record.entry_id.map(JournalEntryId::into_inner)),
        balances: Set(serde_json::to_value(&record.balances)?),
        status: Set(record.status.as_str().to_string()),
    })
}
