//! Budget phase translation entity - Localized texts of a phase.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget phase translation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_phase_translations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Translated phase
    #[sea_orm(indexed)]
    pub budget_phase_id: i64,
    /// Locale code, e.g. `"en"`
    pub locale: String,
    /// Phase name shown in headers and navigation
    pub name: String,
    /// Short summary
    pub summary: Option<String>,
    /// Long description
    pub description: Option<String>,
}

/// Defines relationships between `BudgetPhaseTranslation` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each translation belongs to one phase
    #[sea_orm(
        belongs_to = "super::budget_phase::Entity",
        from = "Column::BudgetPhaseId",
        to = "super::budget_phase::Column::Id",
        on_delete = "Cascade"
    )]
    Phase,
}

impl Related<super::budget_phase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
