//! Budget phase entity - One row per (budget, kind).
//!
//! The (budget, kind) pair is backed by a unique index created in
//! `config::database::create_tables`.
//!
//! Rows are linked through `next_phase_id`, a self reference pointing at the
//! following phase of the same budget. The previous phase is the row whose
//! `next_phase_id` points back here and is never stored.

use crate::core::phase_kind::PhaseKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget phase database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_phases")]
pub struct Model {
    /// Unique identifier for the phase
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning budget
    #[sea_orm(indexed)]
    pub budget_id: i64,
    /// Stage of the lifecycle this row describes
    pub kind: PhaseKind,
    /// Following phase, None for the last one
    pub next_phase_id: Option<i64>,
    /// Disabled phases are skipped by navigation
    pub enabled: bool,
    /// First day of the phase
    pub starts_at: Option<Date>,
    /// End date, shown to the public as the day before
    pub ends_at: Option<Date>,
    /// Label of the optional call-to-action button
    pub main_button_text: Option<String>,
    /// Target of the call-to-action button
    pub main_button_url: Option<String>,
    /// When the phase was created
    pub created_at: DateTime,
    /// When the phase was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between `BudgetPhase` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each phase belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id",
        on_delete = "Cascade"
    )]
    Budget,
    /// Link to the following phase of the same budget
    #[sea_orm(belongs_to = "Entity", from = "Column::NextPhaseId", to = "Column::Id")]
    NextPhase,
    /// Translated texts of the phase
    #[sea_orm(has_many = "super::budget_phase_translation::Entity")]
    Translations,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::budget_phase_translation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Translations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
