//! Phase business logic - A single dated stage of a budget.
//!
//! Covers the ordinal predicates ("is this phase at or after X"), the date-derived
//! started/open predicates, save-time validation and the storage functions for
//! phase rows. Phases are never inserted on their own outside of budget creation,
//! and their kind never changes after insertion.

use crate::{
    core::{
        phase_kind::PhaseKind,
        validation::{PhaseField, ValidationErrors},
    },
    entities::{BudgetPhase, BudgetPhaseTranslation, budget_phase, budget_phase_translation},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Maximum length of a translated summary, in characters.
pub const SUMMARY_MAX_LENGTH: usize = 1000;
/// Maximum length of a translated description, in characters.
pub const DESCRIPTION_MAX_LENGTH: usize = 4000;
/// Locale used for default phase names.
pub const DEFAULT_LOCALE: &str = "en";

/// Localized texts of a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTranslation {
    /// Locale code
    pub locale: String,
    /// Phase name
    pub name: String,
    /// Short summary
    pub summary: Option<String>,
    /// Long description
    pub description: Option<String>,
}

impl PhaseTranslation {
    /// Translation carrying only a name.
    #[must_use]
    pub fn named(locale: &str, name: &str) -> Self {
        Self {
            locale: locale.to_string(),
            name: name.to_string(),
            summary: None,
            description: None,
        }
    }
}

/// How the UI should frame a phase relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseTiming {
    /// Not started yet, or disabled; shown with a countdown
    Upcoming,
    /// Started and not past its end date
    Open,
    /// Started and past its end date; shown as history
    Closed,
}

/// One stage of a budget's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Storage id, None until persisted
    pub id: Option<i64>,
    /// Stage in the catalog
    pub kind: PhaseKind,
    /// Disabled phases are skipped by navigation
    pub enabled: bool,
    /// First day of the phase
    pub starts_at: Option<NaiveDate>,
    /// End date. [`Phase::open`] still counts it as open; pages print the day
    /// before as the last day.
    pub ends_at: Option<NaiveDate>,
    /// Texts per locale, first entry is the fallback
    pub translations: Vec<PhaseTranslation>,
    /// Label of the optional call-to-action button
    pub main_button_text: Option<String>,
    /// Target of the call-to-action button
    pub main_button_url: Option<String>,
}

impl Phase {
    /// Unsaved, enabled, undated phase carrying the kind's default name.
    #[must_use]
    pub fn new(kind: PhaseKind) -> Self {
        Self {
            id: None,
            kind,
            enabled: true,
            starts_at: None,
            ends_at: None,
            translations: vec![PhaseTranslation::named(DEFAULT_LOCALE, kind.default_name())],
            main_button_text: None,
            main_button_url: None,
        }
    }

    /// Builds the domain phase from a stored row and its translations.
    #[must_use]
    pub fn from_model(
        model: budget_phase::Model,
        translations: Vec<budget_phase_translation::Model>,
    ) -> Self {
        Self {
            id: Some(model.id),
            kind: model.kind,
            enabled: model.enabled,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            translations: translations
                .into_iter()
                .map(|t| PhaseTranslation {
                    locale: t.locale,
                    name: t.name,
                    summary: t.summary,
                    description: t.description,
                })
                .collect(),
            main_button_text: model.main_button_text,
            main_button_url: model.main_button_url,
        }
    }

    /// True iff this phase's kind is `kind` or comes after it in the catalog.
    #[must_use]
    pub fn is_at_or_later(&self, kind: PhaseKind) -> bool {
        self.kind.is_at_or_later(kind)
    }

    /// Valuating or any later phase.
    #[must_use]
    pub fn valuating_or_later(&self) -> bool {
        self.is_at_or_later(PhaseKind::Valuating)
    }

    /// Publishing prices or any later phase.
    #[must_use]
    pub fn publishing_prices_or_later(&self) -> bool {
        self.is_at_or_later(PhaseKind::PublishingPrices)
    }

    /// Balloting or any later phase.
    #[must_use]
    pub fn balloting_or_later(&self) -> bool {
        self.is_at_or_later(PhaseKind::Balloting)
    }

    /// Whether investment prices are visible during this phase.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.kind.is_published_prices()
    }

    /// A phase has started when it has no start date, or it is enabled and
    /// `as_of` is on or after the start date.
    #[must_use]
    pub fn started(&self, as_of: NaiveDate) -> bool {
        self.starts_at
            .is_none_or(|starts_at| self.enabled && as_of >= starts_at)
    }

    /// A phase is open when it has no end date, or it has started and `as_of`
    /// is on or before the end date.
    #[must_use]
    pub fn open(&self, as_of: NaiveDate) -> bool {
        self.ends_at
            .is_none_or(|ends_at| self.started(as_of) && as_of <= ends_at)
    }

    /// Countdown, live or historical framing for `as_of`.
    #[must_use]
    pub fn timing(&self, as_of: NaiveDate) -> PhaseTiming {
        if !self.started(as_of) {
            PhaseTiming::Upcoming
        } else if self.open(as_of) {
            PhaseTiming::Open
        } else {
            PhaseTiming::Closed
        }
    }

    /// Translation for `locale`, falling back to the first stored one.
    #[must_use]
    pub fn translation(&self, locale: &str) -> Option<&PhaseTranslation> {
        self.translations
            .iter()
            .find(|t| t.locale == locale)
            .or_else(|| self.translations.first())
    }

    /// Name for `locale`, falling back to the catalog label.
    #[must_use]
    pub fn name(&self, locale: &str) -> &str {
        self.translation(locale)
            .map_or_else(|| self.kind.default_name(), |t| t.name.as_str())
    }

    /// Replaces or adds the translation for its locale.
    pub fn set_translation(&mut self, translation: PhaseTranslation) {
        if let Some(existing) = self
            .translations
            .iter_mut()
            .find(|t| t.locale == translation.locale)
        {
            *existing = translation;
        } else {
            self.translations.push(translation);
        }
    }

    /// Attaches an error to `starts_at` when both dates are present and the
    /// range is empty or reversed.
    pub fn invalid_dates_range(&self, errors: &mut ValidationErrors) {
        if let (Some(starts_at), Some(ends_at)) = (self.starts_at, self.ends_at) {
            if starts_at >= ends_at {
                errors.add(
                    PhaseField::StartsAt,
                    "The start date must be earlier than the end date",
                );
            }
        }
    }

    /// Runs every save-time check and returns all failures at once.
    pub fn validate(&self) -> Result<()> {
        self.collect_errors().into_result()
    }

    fn collect_errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.starts_at.is_none() {
            errors.add(PhaseField::StartsAt, "can't be blank");
        }
        if self.ends_at.is_none() {
            errors.add(PhaseField::EndsAt, "can't be blank");
        }
        self.invalid_dates_range(&mut errors);

        if self.translations.is_empty() {
            errors.add(PhaseField::Name, "can't be blank");
        }
        for translation in &self.translations {
            if translation.name.trim().is_empty() {
                errors.add(
                    PhaseField::Name,
                    format!("can't be blank ({})", translation.locale),
                );
            }
            if exceeds(translation.summary.as_deref(), SUMMARY_MAX_LENGTH) {
                errors.add(
                    PhaseField::Summary,
                    format!(
                        "is too long (maximum is {SUMMARY_MAX_LENGTH} characters) ({})",
                        translation.locale
                    ),
                );
            }
            if exceeds(translation.description.as_deref(), DESCRIPTION_MAX_LENGTH) {
                errors.add(
                    PhaseField::Description,
                    format!(
                        "is too long (maximum is {DESCRIPTION_MAX_LENGTH} characters) ({})",
                        translation.locale
                    ),
                );
            }
        }

        if present(self.main_button_text.as_deref()) && !present(self.main_button_url.as_deref())
        {
            errors.add(PhaseField::MainButtonUrl, "can't be blank");
        }

        errors
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn exceeds(value: Option<&str>, max: usize) -> bool {
    value.is_some_and(|v| v.chars().count() > max)
}

/// Inserts a new phase row for `budget_id`, linked to `next_phase_id`.
///
/// Only budget creation calls this, once per kind and from the last phase to
/// the first, so that every row can point at a successor that already exists.
/// Takes any connection so the caller can run all nine inserts inside its own
/// transaction.
///
/// Fails validation when the phase itself is invalid (dates included) or the
/// budget already has a phase of the same kind. Returns the id of the new row.
pub async fn insert_phase<C>(
    db: &C,
    budget_id: i64,
    phase: &Phase,
    next_phase_id: Option<i64>,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    phase.validate()?;

    let duplicate = BudgetPhase::find()
        .filter(budget_phase::Column::BudgetId.eq(budget_id))
        .filter(budget_phase::Column::Kind.eq(phase.kind))
        .one(db)
        .await?;
    if duplicate.is_some() {
        return Err(ValidationErrors::single(PhaseField::Kind, "has already been taken").into());
    }

    let now = Utc::now().naive_utc();
    let row = budget_phase::ActiveModel {
        budget_id: Set(budget_id),
        kind: Set(phase.kind),
        next_phase_id: Set(next_phase_id),
        enabled: Set(phase.enabled),
        starts_at: Set(phase.starts_at),
        ends_at: Set(phase.ends_at),
        main_button_text: Set(phase.main_button_text.clone()),
        main_button_url: Set(phase.main_button_url.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    insert_translations(db, row.id, &phase.translations).await?;
    debug!(budget_id, phase_id = row.id, kind = %phase.kind, "Inserted phase");
    Ok(row.id)
}

/// Persists administrator edits of an existing phase: enabled flag, dates,
/// button and translations.
///
/// This is the save path for the admin phase form and for seed overrides. The
/// record is validated first and nothing is written when validation fails, so
/// callers can show the field errors next to the form inputs. Kind and chain
/// links are left untouched; the phase must belong to `budget_id`.
///
/// Translations are replaced wholesale. Returns the phase as stored.
pub async fn update_phase(db: &DatabaseConnection, budget_id: i64, phase: &Phase) -> Result<Phase> {
    let not_found = || Error::PhaseNotFound {
        budget_id,
        kind: phase.kind.to_string(),
    };
    let id = phase.id.ok_or_else(not_found)?;
    phase.validate()?;

    let txn = db.begin().await?;

    let existing = BudgetPhase::find_by_id(id)
        .filter(budget_phase::Column::BudgetId.eq(budget_id))
        .one(&txn)
        .await?
        .ok_or_else(not_found)?;

    let mut row: budget_phase::ActiveModel = existing.into();
    row.enabled = Set(phase.enabled);
    row.starts_at = Set(phase.starts_at);
    row.ends_at = Set(phase.ends_at);
    row.main_button_text = Set(phase.main_button_text.clone());
    row.main_button_url = Set(phase.main_button_url.clone());
    row.updated_at = Set(Utc::now().naive_utc());
    let row = row.update(&txn).await?;

    BudgetPhaseTranslation::delete_many()
        .filter(budget_phase_translation::Column::BudgetPhaseId.eq(id))
        .exec(&txn)
        .await?;
    insert_translations(&txn, id, &phase.translations).await?;

    txn.commit().await?;
    info!(budget_id, phase_id = id, kind = %phase.kind, enabled = phase.enabled, "Updated phase");

    find_phase(db, row.id).await?.ok_or_else(not_found)
}

/// Loads a single phase with its translations.
///
/// Returns None when no row has this id. Used after an update to hand back the
/// stored state.
pub async fn find_phase<C>(db: &C, phase_id: i64) -> Result<Option<Phase>>
where
    C: ConnectionTrait,
{
    let Some(model) = BudgetPhase::find_by_id(phase_id).one(db).await? else {
        return Ok(None);
    };
    let translations = model.find_related(BudgetPhaseTranslation).all(db).await?;
    Ok(Some(Phase::from_model(model, translations)))
}

/// Loads every phase row of a budget, paired with its `next_phase_id`.
///
/// Rows come back in storage order. Callers turn them into a
/// [`PhaseSequence`](crate::core::sequence::PhaseSequence), which sorts them
/// and checks the links.
pub async fn find_phases_for_budget<C>(db: &C, budget_id: i64) -> Result<Vec<(Phase, Option<i64>)>>
where
    C: ConnectionTrait,
{
    let rows = BudgetPhase::find()
        .filter(budget_phase::Column::BudgetId.eq(budget_id))
        .find_with_related(BudgetPhaseTranslation)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(model, translations)| {
            let next = model.next_phase_id;
            (Phase::from_model(model, translations), next)
        })
        .collect())
}

async fn insert_translations<C>(
    db: &C,
    phase_id: i64,
    translations: &[PhaseTranslation],
) -> Result<()>
where
    C: ConnectionTrait,
{
    for translation in translations {
        budget_phase_translation::ActiveModel {
            budget_phase_id: Set(phase_id),
            locale: Set(translation.locale.clone()),
            name: Set(translation.name.clone()),
            summary: Set(translation.summary.clone()),
            description: Set(translation.description.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::budget;
    use crate::test_utils::*;

    #[test]
    fn test_publishing_prices_or_later_matches_tail() {
        for kind in PhaseKind::ALL {
            let phase = Phase::new(kind);
            let expected = matches!(
                kind,
                PhaseKind::PublishingPrices
                    | PhaseKind::Balloting
                    | PhaseKind::ReviewingBallots
                    | PhaseKind::Finished
            );
            assert_eq!(phase.publishing_prices_or_later(), expected, "{kind}");
            assert_eq!(phase.is_published(), expected, "{kind}");
        }
    }

    #[test]
    fn test_named_predicates() {
        assert!(!Phase::new(PhaseKind::Selecting).valuating_or_later());
        assert!(Phase::new(PhaseKind::Valuating).valuating_or_later());
        assert!(Phase::new(PhaseKind::Finished).valuating_or_later());

        assert!(!Phase::new(PhaseKind::PublishingPrices).balloting_or_later());
        assert!(Phase::new(PhaseKind::Balloting).balloting_or_later());
        assert!(Phase::new(PhaseKind::ReviewingBallots).balloting_or_later());
    }

    #[test]
    fn test_reversed_dates_fail_on_starts_at() {
        let phase = dated_phase(PhaseKind::Accepting, date(2024, 3, 10), date(2024, 3, 1));

        let err = phase.validate().unwrap_err();
        let Error::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        assert!(errors.has(PhaseField::StartsAt));
        assert!(!errors.has(PhaseField::EndsAt));
    }

    #[test]
    fn test_ordered_dates_pass() {
        let phase = dated_phase(PhaseKind::Accepting, date(2024, 3, 1), date(2024, 3, 10));
        assert!(phase.validate().is_ok());
    }

    #[test]
    fn test_equal_dates_fail() {
        let phase = dated_phase(PhaseKind::Accepting, date(2024, 3, 1), date(2024, 3, 1));
        assert!(matches!(phase.validate(), Err(Error::Validation(e)) if e.has(PhaseField::StartsAt)));
    }

    #[test]
    fn test_missing_dates_fail_presence() {
        let phase = Phase::new(PhaseKind::Informing);
        let Err(Error::Validation(errors)) = phase.validate() else {
            panic!("expected validation failure");
        };
        assert!(errors.has(PhaseField::StartsAt));
        assert!(errors.has(PhaseField::EndsAt));
    }

    #[test]
    fn test_text_bounds_and_button_link() {
        let mut phase = dated_phase(PhaseKind::Selecting, date(2024, 1, 1), date(2024, 2, 1));
        phase.set_translation(PhaseTranslation {
            locale: "en".to_string(),
            name: "  ".to_string(),
            summary: Some("s".repeat(SUMMARY_MAX_LENGTH + 1)),
            description: Some("d".repeat(DESCRIPTION_MAX_LENGTH)),
        });
        phase.main_button_text = Some("Vote now".to_string());

        let Err(Error::Validation(errors)) = phase.validate() else {
            panic!("expected validation failure");
        };
        assert!(errors.has(PhaseField::Name));
        assert!(errors.has(PhaseField::Summary));
        assert!(!errors.has(PhaseField::Description));
        assert!(errors.has(PhaseField::MainButtonUrl));

        phase.set_translation(PhaseTranslation::named("en", "Selecting"));
        phase.main_button_url = Some("https://example.org/vote".to_string());
        assert!(phase.validate().is_ok());
    }

    #[test]
    fn test_started_and_open() {
        let mut phase = dated_phase(PhaseKind::Accepting, date(2024, 3, 1), date(2024, 3, 10));

        assert!(!phase.started(date(2024, 2, 29)));
        assert!(phase.started(date(2024, 3, 1)));
        assert!(phase.open(date(2024, 3, 10)));
        assert!(!phase.open(date(2024, 3, 11)));
        assert_eq!(phase.timing(date(2024, 2, 1)), PhaseTiming::Upcoming);
        assert_eq!(phase.timing(date(2024, 3, 5)), PhaseTiming::Open);
        assert_eq!(phase.timing(date(2024, 4, 1)), PhaseTiming::Closed);

        phase.enabled = false;
        assert!(!phase.started(date(2024, 3, 5)));
        assert!(!phase.open(date(2024, 3, 5)));
        assert_eq!(phase.timing(date(2024, 3, 5)), PhaseTiming::Upcoming);

        let undated = Phase::new(PhaseKind::Finished);
        assert!(undated.started(date(2000, 1, 1)));
        assert!(undated.open(date(2000, 1, 1)));
    }

    #[test]
    fn test_name_falls_back_to_first_translation() {
        let mut phase = Phase::new(PhaseKind::Informing);
        assert_eq!(phase.name("en"), "Information");
        assert_eq!(phase.name("nl"), "Information");

        phase.set_translation(PhaseTranslation::named("nl", "Informatie"));
        assert_eq!(phase.name("nl"), "Informatie");
        assert_eq!(phase.translations.len(), 2);

        phase.translations.clear();
        assert_eq!(phase.name("en"), "Information");
    }

    #[tokio::test]
    async fn test_update_phase_persists_valid_edit() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;

        let mut phase = budget.phases.phase(PhaseKind::Accepting).unwrap().clone();
        phase.enabled = false;
        phase.starts_at = Some(date(2024, 3, 1));
        phase.ends_at = Some(date(2024, 3, 10));
        phase.set_translation(PhaseTranslation::named("en", "Custom accepting"));

        let saved = update_phase(&db, budget.id, &phase).await?;
        assert!(!saved.enabled);
        assert_eq!(saved.starts_at, Some(date(2024, 3, 1)));
        assert_eq!(saved.name("en"), "Custom accepting");
        assert_eq!(saved.translations.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_phase_rejects_reversed_dates_without_writing() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;

        let mut phase = budget.phases.phase(PhaseKind::Reviewing).unwrap().clone();
        phase.starts_at = Some(date(2024, 3, 10));
        phase.ends_at = Some(date(2024, 3, 1));

        let result = update_phase(&db, budget.id, &phase).await;
        assert!(matches!(result, Err(Error::Validation(e)) if e.has(PhaseField::StartsAt)));

        let original = budget.phases.phase(PhaseKind::Reviewing).unwrap();
        let stored = find_phase(&db, phase.id.unwrap()).await?.unwrap();
        assert_eq!(stored.starts_at, original.starts_at);
        assert_eq!(stored.ends_at, original.ends_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_phase_rejects_duplicate_kind() -> Result<()> {
        let (db, budget) = setup_with_budget().await?;

        let balloting = dated_phase(PhaseKind::Balloting, date(2024, 5, 1), date(2024, 6, 1));
        let result = insert_phase(&db, budget.id, &balloting, None).await;
        assert!(matches!(result, Err(Error::Validation(e)) if e.has(PhaseField::Kind)));

        let phases = find_phases_for_budget(&db, budget.id).await?;
        assert_eq!(phases.len(), PhaseKind::ALL.len());

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_phase_rejects_undated_phase() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = budget::ActiveModel {
            name: Set("Bare budget".to_string()),
            phase: Set(PhaseKind::Informing),
            published: Set(false),
            created_at: Set(Utc::now().naive_utc()),
            updated_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let result = insert_phase(&db, draft.id, &Phase::new(PhaseKind::Finished), None).await;
        let Err(Error::Validation(errors)) = result else {
            panic!("expected validation failure");
        };
        assert!(errors.has(PhaseField::StartsAt));
        assert!(errors.has(PhaseField::EndsAt));
        assert!(find_phases_for_budget(&db, draft.id).await?.is_empty());

        let dated = dated_phase(PhaseKind::Finished, date(2024, 9, 1), date(2024, 10, 1));
        insert_phase(&db, draft.id, &dated, None).await?;
        assert_eq!(find_phases_for_budget(&db, draft.id).await?.len(), 1);

        Ok(())
    }
}
