//! Triggers keeping posted and withdrawn entries immutable.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(GUARDS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TRIGGER IF EXISTS trg_freeze_entry_lines ON entry_lines;
DROP TRIGGER IF EXISTS trg_freeze_terminal_entries ON journal_entries;
DROP FUNCTION IF EXISTS freeze_entry_lines();
DROP FUNCTION IF EXISTS freeze_terminal_entries();
",
        )
        .await?;
        Ok(())
    }
}

const GUARDS_SQL: &str = r"
-- ============================================================
-- FUNCTION: freeze_terminal_entries
-- POSTED, REJECTED and CANCELLED entries never change again
-- ============================================================
CREATE OR REPLACE FUNCTION freeze_terminal_entries()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status IN ('POSTED', 'REJECTED', 'CANCELLED') THEN
        RAISE EXCEPTION 'Cannot modify % entry %-%', OLD.status, OLD.journal_code, OLD.sequence;
    END IF;

    IF NEW.sequence <> OLD.sequence OR NEW.journal_code <> OLD.journal_code THEN
        RAISE EXCEPTION 'Entry numbering is immutable';
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_freeze_terminal_entries
BEFORE UPDATE ON journal_entries
FOR EACH ROW
EXECUTE FUNCTION freeze_terminal_entries();

-- ============================================================
-- FUNCTION: freeze_entry_lines
-- Lines are written once, with their entry
-- ============================================================
CREATE OR REPLACE FUNCTION freeze_entry_lines()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Entry lines are immutable';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_freeze_entry_lines
BEFORE UPDATE ON entry_lines
FOR EACH ROW
EXECUTE FUNCTION freeze_entry_lines();
";
