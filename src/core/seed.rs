//! Seeding budgets from configuration.
//!
//! Budgets already present (matched by name) are left alone, so seeding can run
//! on every start.

use crate::{
    config::budgets::{BudgetConfig, Config},
    core::{
        budget::{self, Budget},
        phase::{self, DEFAULT_LOCALE, PhaseTranslation},
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{debug, info};

/// Creates every configured budget that does not exist yet.
///
/// Returns the budgets that were created.
pub async fn seed_budgets(db: &DatabaseConnection, config: &Config) -> Result<Vec<Budget>> {
    let mut created = Vec::new();

    for budget_config in &config.budgets {
        if budget::get_budget_by_name(db, &budget_config.name).await?.is_some() {
            debug!(name = %budget_config.name, "Budget already exists, skipping seed");
            continue;
        }
        created.push(seed_budget(db, budget_config).await?);
    }

    info!(created = created.len(), "Seeded budgets");
    Ok(created)
}

async fn seed_budget(db: &DatabaseConnection, config: &BudgetConfig) -> Result<Budget> {
    let mut seeded = budget::create_budget(db, config.name.clone()).await?;

    for phase_config in &config.phases {
        let target = seeded
            .phases
            .phase_mut(phase_config.kind)
            .ok_or_else(|| Error::PhaseNotFound {
                budget_id: seeded.id,
                kind: phase_config.kind.to_string(),
            })?;

        target.enabled = phase_config.enabled;
        target.starts_at = Some(phase_config.starts_at);
        target.ends_at = Some(phase_config.ends_at);
        if phase_config.name.is_some()
            || phase_config.summary.is_some()
            || phase_config.description.is_some()
        {
            let name = phase_config
                .name
                .clone()
                .unwrap_or_else(|| target.name(DEFAULT_LOCALE).to_string());
            target.set_translation(PhaseTranslation {
                locale: DEFAULT_LOCALE.to_string(),
                name,
                summary: phase_config.summary.clone(),
                description: phase_config.description.clone(),
            });
        }

        phase::update_phase(db, seeded.id, target).await?;
    }

    if config.phase != seeded.phase {
        budget::set_current_phase(db, seeded.id, config.phase).await?;
    }
    if config.published {
        budget::set_published(db, seeded.id, true).await?;
    }

    budget::load_budget(db, seeded.id).await
}
