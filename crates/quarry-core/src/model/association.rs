use crate::{entity::Entity, model::entity::EntityModel, value::Value};
use std::fmt;

///
/// AssociationModel
///
/// A navigable reference from one entity type to another.
///

pub struct AssociationModel {
    pub name: &'static str,
    pub target: &'static EntityModel,
    pub kind: AssociationKind,
}

///
/// AssociationKind
///
/// `ManyToOne` owns a foreign-key column on the declaring entity.
/// `OneToMany` is the inverse side; `mapped_by` names the `ManyToOne`
/// association on the target that owns the column.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssociationKind {
    ManyToOne { foreign_key: &'static str },
    OneToMany { mapped_by: &'static str },
}

impl AssociationModel {
    #[must_use]
    pub const fn is_to_many(&self) -> bool {
        matches!(self.kind, AssociationKind::OneToMany { .. })
    }

    /// Whether `target` is related to `source` through this association.
    ///
    /// Transient entities (no key) never match.
    #[must_use]
    pub fn links(&self, source: &Entity, target: &Entity) -> bool {
        match self.kind {
            AssociationKind::ManyToOne { foreign_key } => {
                match (source.get(foreign_key), target.key()) {
                    (Some(Value::Key(fk)), Some(key)) => *fk == key,
                    _ => false,
                }
            }
            AssociationKind::OneToMany { mapped_by } => {
                let Some(inverse) = self.target.association(mapped_by) else {
                    return false;
                };
                let AssociationKind::ManyToOne { foreign_key } = inverse.kind else {
                    return false;
                };

                match (target.get(foreign_key), source.key()) {
                    (Some(Value::Key(fk)), Some(key)) => *fk == key,
                    _ => false,
                }
            }
        }
    }
}

impl fmt::Debug for AssociationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociationModel")
            .field("name", &self.name)
            .field("target", &self.target.name)
            .field("kind", &self.kind)
            .finish()
    }
}
