//! Budget entity - A participatory budget and its administrator-selected phase.
//!
//! `phase` is set by administrators and is never derived from phase dates.
//! An unpublished budget is still being drafted and is hidden from public listings.

use crate::core::phase_kind::PhaseKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Public name of the budget
    pub name: String,
    /// Current phase selected by an administrator
    pub phase: PhaseKind,
    /// False while the budget is being drafted
    pub published: bool,
    /// When the budget was created
    pub created_at: DateTime,
    /// When the budget was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One budget owns one phase per kind
    #[sea_orm(has_many = "super::budget_phase::Entity")]
    Phases,
}

impl Related<super::budget_phase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
