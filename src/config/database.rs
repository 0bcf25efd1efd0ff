//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::{Budget, BudgetPhase, BudgetPhaseTranslation, budget_phase};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};

const DEFAULT_DATABASE_URL: &str = "sqlite://budget_phases.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!(%database_url, "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Order matters: phases reference budgets and translations reference phases.
/// A unique index keeps one phase per (budget, kind).
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Budget).await?;
    create_table(db, &schema, BudgetPhase).await?;
    create_table(db, &schema, BudgetPhaseTranslation).await?;

    let unique_kind = Index::create()
        .name("idx_budget_phases_budget_id_kind")
        .table(BudgetPhase)
        .col(budget_phase::Column::BudgetId)
        .col(budget_phase::Column::Kind)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&unique_kind)).await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase_kind::PhaseKind;
    use crate::entities::{BudgetModel, BudgetPhaseModel, BudgetPhaseTranslationModel, budget};
    use sea_orm::{ActiveModelTrait, QuerySelect, Set};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<BudgetModel> = Budget::find().limit(1).all(&db).await?;
        let _: Vec<BudgetPhaseModel> = BudgetPhase::find().limit(1).all(&db).await?;
        let _: Vec<BudgetPhaseTranslationModel> =
            BudgetPhaseTranslation::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_rejects_second_phase_of_same_kind() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let now = chrono::Utc::now().naive_utc();
        let mut budget_ids = Vec::new();
        for name in ["First", "Second"] {
            let budget = budget::ActiveModel {
                name: Set(name.to_string()),
                phase: Set(PhaseKind::Informing),
                published: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&db)
            .await?;
            budget_ids.push(budget.id);
        }

        let row = |budget_id: i64| budget_phase::ActiveModel {
            budget_id: Set(budget_id),
            kind: Set(PhaseKind::Balloting),
            next_phase_id: Set(None),
            enabled: Set(true),
            starts_at: Set(None),
            ends_at: Set(None),
            main_button_text: Set(None),
            main_button_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        row(budget_ids[0]).insert(&db).await?;
        // Same kind under another budget is fine.
        row(budget_ids[1]).insert(&db).await?;
        assert!(row(budget_ids[0]).insert(&db).await.is_err());

        Ok(())
    }
}
