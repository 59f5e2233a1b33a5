use crate::model::{association::AssociationModel, field::FieldModel, field::ScalarKind};
use std::fmt;

///
/// EntityModel
/// Minimal, hand-authored runtime model for one entity type.
///
/// Models are `static` items; associations may reference each other
/// cyclically (Member → Team → Member), so equality and `Debug` are by name.
///

pub struct EntityModel {
    /// Stable entity name used in diagnostics and store tables.
    pub name: &'static str,
    /// Name of the surrogate identity field (addressable as a `Key` path).
    pub key: &'static str,
    /// Ordered scalar field list, foreign-key columns included.
    pub fields: &'static [FieldModel],
    pub associations: &'static [AssociationModel],
}

impl EntityModel {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&AssociationModel> {
        self.associations.iter().find(|assoc| assoc.name == name)
    }

    /// Kind of a scalar path segment, including the identity field.
    #[must_use]
    pub fn field_kind(&self, name: &str) -> Option<ScalarKind> {
        if name == self.key {
            return Some(ScalarKind::Key);
        }

        self.field(name).map(|field| field.kind)
    }
}

impl PartialEq for EntityModel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for EntityModel {}

impl fmt::Debug for EntityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityModel")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("fields", &self.fields)
            .field("associations", &self.associations)
            .finish()
    }
}
