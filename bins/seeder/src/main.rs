//! Database seeder for Comptable development and testing.
//!
//! Opens a calendar-year exercise, loads the SYSCOHADA chart and posts a
//! few sample entries. Re-running for an existing exercise does nothing.
//!
//! Usage: cargo run --bin seeder -- [YEAR]

use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate, Utc};
use comptable_core::chart::standard_chart;
use comptable_core::exercise::Exercise;
use comptable_core::journal::{EntryInput, LineInput};
use comptable_core::{LedgerEngine, LedgerSettings};
use comptable_db::PgLedgerStore;
use comptable_shared::AppConfig;
use comptable_shared::types::UserId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Actor recorded on seeded entries (consistent for all seeds)
const SEED_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

/// (journal, month, day, label, debit account, credit account, amount)
type SampleEntry = (&'static str, u32, u32, &'static str, &'static str, &'static str, Decimal);

fn sample_entries() -> [SampleEntry; 4] {
    [
        ("BQ", 1, 2, "Apport en capital", "521", "101", dec!(10000000)),
        ("ACH", 1, 15, "Achats de marchandises", "601", "401", dec!(2500000)),
        ("VTE", 1, 20, "Ventes de marchandises", "411", "701", dec!(4000000)),
        ("BQ", 1, 28, "Règlement client", "521", "411", dec!(4000000)),
    ]
}

fn day(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| anyhow!("invalid date {year}-{month}-{day}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comptable=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let year = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<i32>().with_context(|| format!("invalid year '{arg}'"))?,
        None => Utc::now().year(),
    };

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = comptable_db::connect_with(&config.database).await?;
    info!("Connected to database");

    let engine = LedgerEngine::new(
        Arc::new(PgLedgerStore::new(db)),
        LedgerSettings::from(&config.ledger),
    );
    let actor = UserId::from_uuid(SEED_USER_ID);

    let exercise = match engine
        .open_exercise(&year.to_string(), day(year, 1, 1)?, day(year, 12, 31)?)
        .await
    {
        Ok(exercise) => exercise,
        Err(err) if err.error_code() == "DUPLICATE_EXERCISE" => {
            info!(year, "exercise already seeded, skipping");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let accounts = engine
        .initialize_chart(exercise.id, standard_chart())
        .await?;
    info!(exercise = %exercise.code, accounts = accounts.len(), "chart loaded");

    seed_entries(&engine, &exercise, actor).await?;

    let trial_balance = engine
        .trial_balance(exercise.id, exercise.start_date, exercise.end_date)
        .await?;
    info!(
        exercise = %exercise.code,
        balanced = trial_balance.is_balanced(),
        rows = trial_balance.rows.len(),
        "seeding complete"
    );
    Ok(())
}

async fn seed_entries(
    engine: &LedgerEngine<PgLedgerStore>,
    exercise: &Exercise,
    actor: UserId,
) -> anyhow::Result<()> {
    let year = exercise.start_date.year();
    for (journal, month, on, label, debit, credit, amount) in sample_entries() {
        let input = EntryInput::new(exercise.id, journal, day(year, month, on)?, label, actor)
            .with_line(LineInput::debit(debit, amount))
            .with_line(LineInput::credit(credit, amount));

        let entry = engine.create_entry(input).await?;
        let outcome = engine.validate_entry(entry.id, actor).await?;
        if !outcome.passed {
            return Err(anyhow!(
                "sample entry {} failed validation",
                entry.reference_label()
            ));
        }
        let posted = engine.post_entry(entry.id, actor).await?;
        info!(reference = %posted.reference_label(), %amount, "sample entry posted");
    }
    Ok(())
}
