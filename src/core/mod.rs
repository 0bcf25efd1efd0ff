//! Core business logic - framework-agnostic phase sequencing, validation and
//! storage of budgets and their phases.

/// Budgets, current phase resolution and budget storage
pub mod budget;
/// Single phase predicates, validation and phase storage
pub mod phase;
/// The closed catalog of phase kinds
pub mod phase_kind;
/// Seeding budgets from configuration
pub mod seed;
/// Ordered arena of a budget's phases and enabled-only navigation
pub mod sequence;
/// Field-scoped validation errors
pub mod validation;
/// Visibility of page widgets per phase
pub mod visibility;
