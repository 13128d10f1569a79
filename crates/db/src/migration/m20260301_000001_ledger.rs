//! Ledger schema: exercises, chart, journal, anomalies, closures and
//! carry-forwards.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS carry_forwards, period_closures, anomalies, entry_lines, \
             journal_entries, journal_sequences, accounts, exercises CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const LEDGER_SQL: &str = r"
-- ============================================================
-- EXERCISES
-- ============================================================
CREATE TABLE exercises (
    id UUID PRIMARY KEY,
    code VARCHAR(32) NOT NULL UNIQUE,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'OPEN',
    closed_by UUID,
    closed_at TIMESTAMPTZ,
    opening_balances_validated BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_exercise_dates CHECK (start_date <= end_date),
    CONSTRAINT chk_exercise_status CHECK (status IN ('OPEN', 'CLOSING', 'CLOSED'))
);

-- ============================================================
-- CHART OF ACCOUNTS (per exercise)
-- ============================================================
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    exercise_id UUID NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    number VARCHAR(32) NOT NULL,
    label TEXT NOT NULL,
    class SMALLINT NOT NULL,
    nature VARCHAR(16) NOT NULL,
    parent_number VARCHAR(32),
    lettrable BOOLEAN NOT NULL DEFAULT false,
    active BOOLEAN NOT NULL DEFAULT true,
    total_debit NUMERIC NOT NULL DEFAULT 0,
    total_credit NUMERIC NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_account_number UNIQUE (exercise_id, number),
    CONSTRAINT chk_account_number CHECK (number ~ '^[1-9][0-9]*$'),
    CONSTRAINT chk_account_class CHECK (class BETWEEN 1 AND 9),
    CONSTRAINT chk_account_totals CHECK (total_debit >= 0 AND total_credit >= 0)
);

CREATE INDEX idx_accounts_class ON accounts(exercise_id, class);

-- ============================================================
-- JOURNAL SEQUENCES (gap-free, per exercise and journal)
-- ============================================================
CREATE TABLE journal_sequences (
    exercise_id UUID NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    journal_code VARCHAR(16) NOT NULL,
    last_value BIGINT NOT NULL,
    PRIMARY KEY (exercise_id, journal_code)
);

-- ============================================================
-- JOURNAL ENTRIES
-- ============================================================
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    exercise_id UUID NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    journal_code VARCHAR(16) NOT NULL,
    sequence BIGINT NOT NULL,
    journal_label TEXT,
    entry_type VARCHAR(16) NOT NULL,
    entry_date DATE NOT NULL,
    document_date DATE,
    period CHAR(7) NOT NULL,
    label TEXT NOT NULL,
    document_reference TEXT,
    budget_line TEXT,
    total_amount NUMERIC NOT NULL,
    balanced BOOLEAN NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'DRAFT',
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    validated_by UUID,
    validated_at TIMESTAMPTZ,
    posted_by UUID,
    posted_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    cancelled_by UUID,
    cancelled_at TIMESTAMPTZ,
    cancellation_reason TEXT,
    CONSTRAINT uq_entry_sequence UNIQUE (exercise_id, journal_code, sequence),
    CONSTRAINT chk_entry_status CHECK (
        status IN ('DRAFT', 'VALIDATED', 'POSTED', 'REJECTED', 'CANCELLED')
    ),
    CONSTRAINT chk_entry_type CHECK (entry_type IN ('OPERATION', 'CLOSING', 'CARRY_FORWARD'))
);

CREATE INDEX idx_entries_listing ON journal_entries(exercise_id, entry_date, journal_code, sequence);
CREATE INDEX idx_entries_posted ON journal_entries(exercise_id, entry_date) WHERE status = 'POSTED';

-- ============================================================
-- ENTRY LINES
-- ============================================================
CREATE TABLE entry_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    account_number VARCHAR(32) NOT NULL,
    account_label TEXT NOT NULL,
    label TEXT,
    side VARCHAR(6) NOT NULL,
    amount NUMERIC NOT NULL,
    currency CHAR(3) NOT NULL,
    exchange_rate NUMERIC NOT NULL,
    base_amount NUMERIC NOT NULL,
    lettering TEXT,
    cost_center TEXT,
    project TEXT,
    CONSTRAINT uq_line_number UNIQUE (entry_id, line_number),
    CONSTRAINT chk_line_side CHECK (side IN ('DEBIT', 'CREDIT')),
    CONSTRAINT chk_line_amounts CHECK (amount > 0 AND base_amount >= 0 AND exchange_rate > 0)
);

CREATE INDEX idx_lines_account ON entry_lines(account_number);

-- ============================================================
-- ANOMALIES
-- ============================================================
CREATE TABLE anomalies (
    id UUID PRIMARY KEY,
    exercise_id UUID NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    entry_id UUID REFERENCES journal_entries(id) ON DELETE CASCADE,
    rule VARCHAR(32) NOT NULL,
    category VARCHAR(16) NOT NULL,
    severity VARCHAR(16) NOT NULL,
    description TEXT NOT NULL,
    details JSONB NOT NULL DEFAULT '{}',
    detected_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    resolution VARCHAR(16) NOT NULL DEFAULT 'OPEN'
);

CREATE INDEX idx_anomalies_exercise ON anomalies(exercise_id, detected_at);
CREATE INDEX idx_anomalies_entry ON anomalies(entry_id) WHERE entry_id IS NOT NULL;

-- ============================================================
-- PERIOD CLOSURES
-- ============================================================
CREATE TABLE period_closures (
    id UUID PRIMARY KEY,
    exercise_id UUID NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    period CHAR(7) NOT NULL,
    closure_type VARCHAR(16) NOT NULL,
    status VARCHAR(16) NOT NULL,
    closed_by UUID NOT NULL,
    closed_at TIMESTAMPTZ NOT NULL,
    controls JSONB NOT NULL,
    anomaly_count INTEGER NOT NULL DEFAULT 0,
    reopen_reason TEXT,
    reopened_by UUID,
    reopened_at TIMESTAMPTZ,
    CONSTRAINT chk_closure_status CHECK (status IN ('CLOSED', 'REOPENED')),
    CONSTRAINT chk_reopen_reason CHECK (status = 'CLOSED' OR reopen_reason IS NOT NULL)
);

-- One closure in force per period; reopened ones are history
CREATE UNIQUE INDEX uq_closure_in_force ON period_closures(exercise_id, period)
    WHERE status = 'CLOSED';

-- ============================================================
-- CARRY-FORWARDS
-- ============================================================
CREATE TABLE carry_forwards (
    id UUID PRIMARY KEY,
    source_exercise_id UUID NOT NULL UNIQUE REFERENCES exercises(id) ON DELETE CASCADE,
    destination_exercise_id UUID NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    generated_at TIMESTAMPTZ NOT NULL,
    generated_by UUID NOT NULL,
    entry_id UUID REFERENCES journal_entries(id),
    balances JSONB NOT NULL DEFAULT '[]',
    status VARCHAR(16) NOT NULL,
    CONSTRAINT chk_carry_forward_status CHECK (status IN ('IN_PROGRESS', 'COMPLETED')),
    CONSTRAINT chk_carry_forward_direction CHECK (source_exercise_id <> destination_exercise_id)
);
";
