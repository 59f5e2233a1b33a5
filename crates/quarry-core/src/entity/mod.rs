//! Entity instances: scalar values plus a two-state reference per association.

mod key;

#[cfg(test)]
mod tests;

use crate::{
    db::store::RawRow,
    model::{AssociationKind, EntityModel, FieldModel, ScalarKind},
    value::Value,
};
use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
};
use thiserror::Error as ThisError;

// re-exports
pub use key::EntityKey;

///
/// EntityError
///
/// Invalid reads or writes against an entity instance.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EntityError {
    #[error("entity '{entity}' has no field '{field}'")]
    UnknownField {
        entity: &'static str,
        field: String,
    },

    #[error("entity '{entity}' has no association '{association}'")]
    UnknownAssociation {
        entity: &'static str,
        association: String,
    },

    #[error("field '{entity}.{field}' expects {expected}, found {found}")]
    KindMismatch {
        entity: &'static str,
        field: &'static str,
        expected: String,
        found: &'static str,
    },

    #[error("field '{entity}.{field}' is not nullable")]
    NullNotAllowed {
        entity: &'static str,
        field: &'static str,
    },

    #[error("identity of '{entity}' is assigned by the store and immutable once set")]
    KeyImmutable { entity: &'static str },

    #[error("'{entity}' must be persisted before it can be referenced")]
    Unpersisted { entity: &'static str },

    #[error("association '{entity}.{association}' is not a many-to-one reference")]
    NotManyToOne {
        entity: &'static str,
        association: &'static str,
    },

    #[error("association '{entity}.{association}' targets '{expected}', found '{found}'")]
    TargetMismatch {
        entity: &'static str,
        association: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

///
/// AssociationState
///
/// Observable load state of one association on one instance.
/// `NotLoaded` is never resolved implicitly on the instance itself; callers
/// resolve explicitly through the executor.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssociationState {
    Loaded(Related),
    NotLoaded,
}

impl AssociationState {
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

///
/// Related
/// Materialized association value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Related {
    One(Option<Box<Entity>>),
    Many(Vec<Entity>),
}

impl Related {
    /// The referenced entity of a to-one association.
    #[must_use]
    pub fn as_one(&self) -> Option<&Entity> {
        match self {
            Self::One(one) => one.as_deref(),
            Self::Many(_) => None,
        }
    }

    /// The entities of a to-many association; empty for to-one.
    #[must_use]
    pub fn as_many(&self) -> &[Entity] {
        match self {
            Self::One(_) => &[],
            Self::Many(many) => many,
        }
    }
}

///
/// Entity
///
/// One instance of an `EntityModel`. Identity is a surrogate key assigned
/// by the store on first persistence and immutable afterwards; instances
/// without a key are transient.
///
/// Equality and hashing cover entity type, key, and scalar values; the
/// load state of associations is not part of identity.
///

#[derive(Clone, Debug)]
pub struct Entity {
    model: &'static EntityModel,
    key: Option<EntityKey>,
    values: BTreeMap<&'static str, Value>,
    associations: BTreeMap<&'static str, AssociationState>,
}

impl Entity {
    /// Create a transient instance with every field null and every
    /// association not loaded.
    #[must_use]
    pub fn new(model: &'static EntityModel) -> Self {
        Self {
            model,
            key: None,
            values: model
                .fields
                .iter()
                .map(|field| (field.name, Value::Null))
                .collect(),
            associations: model
                .associations
                .iter()
                .map(|assoc| (assoc.name, AssociationState::NotLoaded))
                .collect(),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Result<Self, EntityError> {
        self.set(field, value)?;

        Ok(self)
    }

    /// Builder-style `set_reference`.
    pub fn with_reference(mut self, association: &str, target: &Self) -> Result<Self, EntityError> {
        self.set_reference(association, target)?;

        Ok(self)
    }

    /// Assign a scalar field. Ints widen into float fields.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), EntityError> {
        let entity_model: &'static EntityModel = self.model;
        let entity = entity_model.name;
        if field == entity_model.key {
            return Err(EntityError::KeyImmutable { entity });
        }

        let model = entity_model
            .field(field)
            .ok_or_else(|| EntityError::UnknownField {
                entity,
                field: field.to_string(),
            })?;

        let value = value.into();
        if value.is_null() && !model.nullable {
            return Err(EntityError::NullNotAllowed {
                entity,
                field: model.name,
            });
        }
        let value = coerce_field(entity, model, value)?;

        // a rewritten foreign key invalidates whatever was loaded through it
        for assoc in entity_model.associations {
            if let AssociationKind::ManyToOne { foreign_key } = assoc.kind
                && foreign_key == model.name
            {
                self.associations
                    .insert(assoc.name, AssociationState::NotLoaded);
            }
        }
        self.values.insert(model.name, value);

        Ok(())
    }

    /// Point a many-to-one association at `target`, writing the foreign key
    /// and marking the association loaded.
    pub fn set_reference(&mut self, association: &str, target: &Self) -> Result<(), EntityError> {
        let entity_model: &'static EntityModel = self.model;
        let entity = entity_model.name;
        let assoc = entity_model.association(association).ok_or_else(|| {
            EntityError::UnknownAssociation {
                entity,
                association: association.to_string(),
            }
        })?;
        let AssociationKind::ManyToOne { foreign_key } = assoc.kind else {
            return Err(EntityError::NotManyToOne {
                entity,
                association: assoc.name,
            });
        };
        if assoc.target != target.model {
            return Err(EntityError::TargetMismatch {
                entity,
                association: assoc.name,
                expected: assoc.target.name,
                found: target.model.name,
            });
        }
        let key = target.key.ok_or(EntityError::Unpersisted {
            entity: target.model.name,
        })?;

        self.values.insert(foreign_key, Value::Key(key));
        self.associations.insert(
            assoc.name,
            AssociationState::Loaded(Related::One(Some(Box::new(target.clone())))),
        );

        Ok(())
    }

    #[must_use]
    pub const fn model(&self) -> &'static EntityModel {
        self.model
    }

    #[must_use]
    pub const fn key(&self) -> Option<EntityKey> {
        self.key
    }

    /// Stored scalar value. The identity field is not stored; use `value`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Scalar value by path segment, including the identity field.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<Value> {
        if field == self.model.key {
            return Some(self.key.map_or(Value::Null, Value::Key));
        }

        self.values.get(field).cloned()
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&AssociationState> {
        self.associations.get(name)
    }

    /// Whether the association has been materialized on this instance.
    /// Unknown association names report `false`.
    #[must_use]
    pub fn is_loaded(&self, association: &str) -> bool {
        self.association(association)
            .is_some_and(AssociationState::is_loaded)
    }

    /// Loaded association value, if any.
    #[must_use]
    pub fn related(&self, association: &str) -> Option<&Related> {
        match self.association(association)? {
            AssociationState::Loaded(related) => Some(related),
            AssociationState::NotLoaded => None,
        }
    }

    pub(crate) fn assign_key(&mut self, key: EntityKey) -> Result<(), EntityError> {
        match self.key {
            Some(existing) if existing != key => Err(EntityError::KeyImmutable {
                entity: self.model.name,
            }),
            _ => {
                self.key = Some(key);
                Ok(())
            }
        }
    }

    pub(crate) fn load_association(
        &mut self,
        association: &str,
        related: Related,
    ) -> Result<(), EntityError> {
        let entity_model: &'static EntityModel = self.model;
        let assoc = entity_model.association(association).ok_or_else(|| {
            EntityError::UnknownAssociation {
                entity: entity_model.name,
                association: association.to_string(),
            }
        })?;
        self.associations
            .insert(assoc.name, AssociationState::Loaded(related));

        Ok(())
    }

    /// Materialize an instance from a raw store row. Columns missing from
    /// the row read as null; columns unknown to the model are ignored.
    /// Stored values pass through the same kind coercion as `set`, so an
    /// int column read into a float field compares and groups as a float.
    pub(crate) fn materialize(
        model: &'static EntityModel,
        mut row: RawRow,
    ) -> Result<Self, EntityError> {
        let mut entity = Self::new(model);
        entity.key = Some(row.key);
        for field in model.fields {
            if let Some(value) = row.values.remove(field.name) {
                let value = coerce_field(model.name, field, value)?;
                entity.values.insert(field.name, value);
            }
        }

        Ok(entity)
    }

    /// Raw row for a persisted instance.
    #[must_use]
    pub(crate) fn to_raw(&self) -> Option<RawRow> {
        Some(RawRow {
            key: self.key?,
            values: self
                .values
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
        })
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.key == other.key && self.values == other.values
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model.name.hash(state);
        self.key.hash(state);
        self.values.hash(state);
    }
}

// Ints widen into float fields; any other kind must match the field.
fn coerce_field(
    entity: &'static str,
    field: &FieldModel,
    value: Value,
) -> Result<Value, EntityError> {
    match value {
        Value::Int(v) if field.kind == ScalarKind::Float => Ok(int_to_float(v)),
        value
            if value.is_null()
                || value
                    .scalar_kind()
                    .is_some_and(|kind| field.kind.accepts(kind)) =>
        {
            Ok(value)
        }
        value => Err(EntityError::KindMismatch {
            entity,
            field: field.name,
            expected: field.kind.to_string(),
            found: value.type_name(),
        }),
    }
}

#[expect(clippy::cast_precision_loss)]
fn int_to_float(v: i64) -> Value {
    Value::float(v as f64)
}
