//! Hand-authored runtime model: one static `EntityModel` per entity type.
//!
//! Field and association metadata here is the registry typed paths are
//! validated against; nothing is generated or discovered by reflection.

pub mod association;
pub mod entity;
pub mod field;

#[cfg(test)]
mod tests;

// re-exports
pub use association::{AssociationKind, AssociationModel};
pub use entity::EntityModel;
pub use field::{FieldModel, ScalarKind};
