//! Budget business logic - current phase resolution and budget storage.
//!
//! The current phase of a budget is whatever an administrator selected. Phase
//! dates and enabled flags never move a budget forward on their own; they only
//! decide how the current phase is framed (countdown, live, history) and which
//! phases navigation visits.

use crate::{
    core::{
        phase::{self, Phase, PhaseTiming},
        phase_kind::PhaseKind,
        sequence::PhaseSequence,
    },
    entities::{BudgetPhase, BudgetPhaseTranslation, budget, budget_phase, budget_phase_translation},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, warn};

/// A budget together with all of its phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budget {
    /// Storage id
    pub id: i64,
    /// Public name
    pub name: String,
    /// Administrator-selected current phase
    pub phase: PhaseKind,
    /// False while the budget is being drafted
    pub published: bool,
    /// Phases in catalog order
    pub phases: PhaseSequence,
}

impl Budget {
    /// Drafting budgets are hidden from every public page.
    #[must_use]
    pub const fn is_drafting(&self) -> bool {
        !self.published
    }

    /// Current phase as seen by the public on `as_of`.
    ///
    /// Returns the administrator-selected phase for published budgets and None
    /// while drafting. Dates are not consulted to pick the phase; a selected
    /// phase that is not open on `as_of` is only logged.
    #[must_use]
    pub fn current_phase_kind(&self, as_of: NaiveDate) -> Option<PhaseKind> {
        if self.is_drafting() {
            return None;
        }
        if let Some(current) = self.current_phase() {
            if !current.open(as_of) || !current.started(as_of) {
                warn!(
                    budget_id = self.id,
                    phase = %self.phase,
                    %as_of,
                    "Selected phase is not open on this date"
                );
            }
        }
        Some(self.phase)
    }

    /// Record of the selected phase.
    #[must_use]
    pub fn current_phase(&self) -> Option<&Phase> {
        self.phases.phase(self.phase)
    }

    /// Framing of the selected phase on `as_of`, None while drafting.
    #[must_use]
    pub fn current_phase_timing(&self, as_of: NaiveDate) -> Option<PhaseTiming> {
        if self.is_drafting() {
            return None;
        }
        self.current_phase().map(|phase| phase.timing(as_of))
    }

    /// 1-based position of the current phase among enabled phases.
    #[must_use]
    pub fn current_enabled_phase_number(&self) -> Option<usize> {
        self.phases.enabled_phase_number(self.phase)
    }

    /// Number of enabled phases.
    #[must_use]
    pub fn enabled_phases_amount(&self) -> usize {
        self.phases.enabled_phases_amount()
    }

    /// Whether investment prices are public in the current phase.
    #[must_use]
    pub fn has_published_prices(&self) -> bool {
        self.phase.is_published_prices()
    }
}

/// Creates a budget in the drafting state with one enabled phase per kind,
/// linked in catalog order.
///
/// This is the only way phases come into existence. The budget stays hidden
/// until [`set_published`] is called, which leaves administrators time to adjust
/// phase dates and texts with [`phase::update_phase`]. Phases get consecutive
/// one-month ranges starting today.
///
/// Phases are inserted from last to first so every row can point at the row
/// after it. Everything happens in one transaction.
///
/// # Errors
///
/// Returns [`Error::Config`] for a blank name.
pub async fn create_budget(db: &DatabaseConnection, name: String) -> Result<Budget> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Budget name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;
    let now = Utc::now().naive_utc();

    let row = budget::ActiveModel {
        name: Set(name.trim().to_string()),
        phase: Set(PhaseKind::Informing),
        published: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let template = PhaseSequence::for_new_budget(row.id, now.date());
    let mut next_phase_id = None;
    for new_phase in template.phases().iter().rev() {
        next_phase_id = Some(phase::insert_phase(&txn, row.id, new_phase, next_phase_id).await?);
    }

    txn.commit().await?;
    info!(budget_id = row.id, name = %row.name, "Created budget");

    load_budget(db, row.id).await
}

/// Loads a budget and builds its phase sequence.
///
/// Every public page starts here. Stored links are checked on the way in, so a
/// broken chain surfaces as [`Error::CorruptPhaseChain`] at load time rather
/// than as a wrong neighbour later. Accepts a transaction as well as a plain
/// connection.
pub async fn load_budget<C>(db: &C, budget_id: i64) -> Result<Budget>
where
    C: ConnectionTrait,
{
    let model = budget::Entity::find_by_id(budget_id)
        .one(db)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })?;

    let rows = phase::find_phases_for_budget(db, budget_id).await?;
    let phases = PhaseSequence::from_rows(budget_id, rows)?;
    debug!(budget_id, phases = phases.len(), "Loaded budget");

    Ok(Budget {
        id: model.id,
        name: model.name,
        phase: model.phase,
        published: model.published,
        phases,
    })
}

/// Finds a budget row by exact name.
///
/// Seeding uses this to skip budgets that already exist. Returns the bare row
/// without phases.
pub async fn get_budget_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<budget::Model>> {
    budget::Entity::find()
        .filter(budget::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Administrator action moving the budget to `kind`.
///
/// Phase dates are not consulted and nothing advances on its own; this call is
/// the only way the current phase changes. Disabled phases can be selected too.
pub async fn set_current_phase(
    db: &DatabaseConnection,
    budget_id: i64,
    kind: PhaseKind,
) -> Result<budget::Model> {
    let model = find_budget_model(db, budget_id).await?;
    let previous = model.phase;

    let mut active: budget::ActiveModel = model.into();
    active.phase = Set(kind);
    active.updated_at = Set(Utc::now().naive_utc());
    let updated = active.update(db).await?;

    info!(budget_id, from = %previous, to = %kind, "Changed current phase");
    Ok(updated)
}

/// Publishes a drafted budget, or takes a published one back to drafting.
///
/// Drafting budgets are left out of every listing below and render with all
/// widgets hidden.
pub async fn set_published(
    db: &DatabaseConnection,
    budget_id: i64,
    published: bool,
) -> Result<budget::Model> {
    let mut active: budget::ActiveModel = find_budget_model(db, budget_id).await?.into();
    active.published = Set(published);
    active.updated_at = Set(Utc::now().naive_utc());
    let updated = active.update(db).await?;

    info!(budget_id, published, "Changed budget publication");
    Ok(updated)
}

/// Deletes a budget with its phases and their translations.
///
/// Rows are removed children first inside one transaction, so nothing is left
/// behind even when the database does not enforce foreign keys.
pub async fn delete_budget(db: &DatabaseConnection, budget_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    find_budget_model(&txn, budget_id).await?;

    let phase_ids: Vec<i64> = BudgetPhase::find()
        .filter(budget_phase::Column::BudgetId.eq(budget_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    BudgetPhaseTranslation::delete_many()
        .filter(budget_phase_translation::Column::BudgetPhaseId.is_in(phase_ids))
        .exec(&txn)
        .await?;
    BudgetPhase::delete_many()
        .filter(budget_phase::Column::BudgetId.eq(budget_id))
        .exec(&txn)
        .await?;
    budget::Entity::delete_by_id(budget_id).exec(&txn).await?;

    txn.commit().await?;
    info!(budget_id, "Deleted budget");
    Ok(())
}

/// Published budgets, ordered by creation.
pub async fn list_public_budgets(db: &DatabaseConnection) -> Result<Vec<budget::Model>> {
    budget::Entity::find()
        .filter(budget::Column::Published.eq(true))
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Published budgets that reached the finished phase.
pub async fn list_finished_budgets(db: &DatabaseConnection) -> Result<Vec<budget::Model>> {
    budget::Entity::find()
        .filter(budget::Column::Published.eq(true))
        .filter(budget::Column::Phase.eq(PhaseKind::Finished))
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Budgets shown on the welcome page feed.
///
/// Published budgets in valuating or finished are skipped, then at most
/// `limit` are returned in creation order.
pub async fn list_feed_budgets(db: &DatabaseConnection, limit: usize) -> Result<Vec<budget::Model>> {
    Ok(list_public_budgets(db)
        .await?
        .into_iter()
        .filter(|b| crate::core::visibility::shows_in_feed(b.phase))
        .take(limit)
        .collect())
}

async fn find_budget_model<C>(db: &C, budget_id: i64) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    budget::Entity::find_by_id(budget_id)
        .one(db)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::phase::update_phase;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_budget_links_phases_in_catalog_order() -> Result<()> {
        let (_db, budget) = setup_with_budget().await?;

        assert_eq!(budget.phase, PhaseKind::Informing);
        assert!(budget.is_drafting());
        assert_eq!(budget.phases.len(), PhaseKind::ALL.len());
        for pair in PhaseKind::ALL.windows(2) {
            let next = budget.phases.next_phase(pair[0]).unwrap();
            assert_eq!(next.kind, pair[1]);
        }
        assert_eq!(
            budget.phases.phase(PhaseKind::Balloting).unwrap().name("en"),
            "Voting projects"
        );
        for pair in budget.phases.phases().windows(2) {
            assert!(pair[0].starts_at.is_some());
            assert_eq!(pair[0].ends_at, pair[1].starts_at);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_create_budget_rejects_empty_name() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_budget(&db, "   ".to_string()).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_budget() -> Result<()> {
        let db = setup_test_db().await?;
        let result = load_budget(&db, 42).await;
        assert!(matches!(result, Err(Error::BudgetNotFound { id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_current_phase_is_selector_not_dates() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;
        let today = date(2024, 3, 5);

        assert_eq!(budget.current_phase_kind(today), None);

        set_published(&db, budget.id, true).await?;
        set_current_phase(&db, budget.id, PhaseKind::Selecting).await?;

        let mut accepting = budget.phases.phase(PhaseKind::Accepting).unwrap().clone();
        accepting.starts_at = Some(date(2024, 3, 1));
        accepting.ends_at = Some(date(2024, 3, 10));
        update_phase(&db, budget.id, &accepting).await?;
        let mut selecting = budget.phases.phase(PhaseKind::Selecting).unwrap().clone();
        selecting.starts_at = Some(date(2024, 3, 10));
        selecting.ends_at = Some(date(2024, 3, 20));
        update_phase(&db, budget.id, &selecting).await?;

        // Accepting is open on the day, yet the selector wins.
        let budget = load_budget(&db, budget.id).await?;
        assert_eq!(budget.current_phase_kind(today), Some(PhaseKind::Selecting));
        assert_eq!(budget.current_phase().unwrap().kind, PhaseKind::Selecting);
        assert_eq!(budget.current_phase_timing(today), Some(PhaseTiming::Upcoming));
        assert_eq!(
            budget.current_phase_timing(date(2024, 3, 15)),
            Some(PhaseTiming::Open)
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_enabled_phase_progress() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;

        for kind in [PhaseKind::Reviewing, PhaseKind::Valuating] {
            let mut phase = budget.phases.phase(kind).unwrap().clone();
            phase.enabled = false;
            phase.starts_at = Some(date(2024, 1, 1));
            phase.ends_at = Some(date(2024, 1, 2));
            update_phase(&db, budget.id, &phase).await?;
        }
        set_current_phase(&db, budget.id, PhaseKind::Balloting).await?;

        let budget = load_budget(&db, budget.id).await?;
        assert_eq!(budget.enabled_phases_amount(), 7);
        assert_eq!(budget.current_enabled_phase_number(), Some(5));
        assert!(budget.has_published_prices());

        let next = budget.phases.next_enabled_phase(PhaseKind::Accepting)?.unwrap();
        assert_eq!(next.kind, PhaseKind::Selecting);

        Ok(())
    }

    #[tokio::test]
    async fn test_listings() -> Result<()> {
        let db = setup_test_db().await?;

        let draft = create_test_budget(&db, "Draft").await?;
        let mut ids = Vec::new();
        for kind in [
            PhaseKind::Accepting,
            PhaseKind::Valuating,
            PhaseKind::Balloting,
            PhaseKind::Finished,
        ] {
            let budget = create_test_budget(&db, &format!("Budget {kind}")).await?;
            set_published(&db, budget.id, true).await?;
            set_current_phase(&db, budget.id, kind).await?;
            ids.push(budget.id);
        }

        let public = list_public_budgets(&db).await?;
        assert_eq!(public.len(), 4);
        assert!(public.iter().all(|b| b.id != draft.id));

        let finished = list_finished_budgets(&db).await?;
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].name, "Budget finished");

        let feed: Vec<_> = list_feed_budgets(&db, 10)
            .await?
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(feed, vec!["Budget accepting", "Budget balloting"]);

        let limited = list_feed_budgets(&db, 1).await?;
        assert_eq!(limited.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_budget_cascades() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;
        let other = create_test_budget(&db, "Other").await?;

        delete_budget(&db, budget.id).await?;

        assert!(matches!(
            load_budget(&db, budget.id).await,
            Err(Error::BudgetNotFound { .. })
        ));
        assert!(phase::find_phases_for_budget(&db, budget.id).await?.is_empty());
        assert_eq!(load_budget(&db, other.id).await?.phases.len(), PhaseKind::ALL.len());

        assert!(matches!(
            delete_budget(&db, budget.id).await,
            Err(Error::BudgetNotFound { .. })
        ));

        Ok(())
    }
}
