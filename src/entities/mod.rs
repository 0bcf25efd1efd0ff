//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities are the storage shape of budgets and their phases.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod budget;
pub mod budget_phase;
pub mod budget_phase_translation;

// Re-export specific types to avoid conflicts
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use budget_phase::{Column as BudgetPhaseColumn, Entity as BudgetPhase, Model as BudgetPhaseModel};
pub use budget_phase_translation::{
    Column as BudgetPhaseTranslationColumn, Entity as BudgetPhaseTranslation,
    Model as BudgetPhaseTranslationModel,
};
