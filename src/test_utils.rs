//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating budgets and phases with sensible defaults.

use crate::{
    core::{
        budget::{self, Budget},
        phase::Phase,
        phase_kind::PhaseKind,
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a drafting budget with its nine default phases.
pub async fn create_test_budget(db: &DatabaseConnection, name: &str) -> Result<Budget> {
    budget::create_budget(db, name.to_string()).await
}

/// Sets up a complete test environment with one budget.
/// Returns (db, budget) for common test scenarios.
pub async fn setup_with_budget() -> Result<(DatabaseConnection, Budget)> {
    let db = setup_test_db().await?;
    let budget = create_test_budget(&db, "Test Budget").await?;
    Ok((db, budget))
}

/// Shorthand for a calendar date.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Unsaved enabled phase with the given date range.
#[must_use]
pub fn dated_phase(kind: PhaseKind, starts_at: NaiveDate, ends_at: NaiveDate) -> Phase {
    Phase {
        starts_at: Some(starts_at),
        ends_at: Some(ends_at),
        ..Phase::new(kind)
    }
}

/// Phase as if loaded from storage with the given id.
#[must_use]
pub fn stored_phase(id: i64, kind: PhaseKind, enabled: bool) -> Phase {
    Phase {
        id: Some(id),
        enabled,
        ..Phase::new(kind)
    }
}
