//! Module: store
//! Responsibility: the backing-store contract consumed by the executor.
//! Does not own: transactions, indexing, or physical storage formats.
//! Boundary: raw rows in, raw rows out; consistency and isolation are
//! documented by each implementation.

mod memory;

#[cfg(test)]
mod tests;

use crate::{
    db::query::{Alias, NullOrdering, OrderDirection, QueryDescriptor},
    entity::{Entity, EntityError, Related},
    model::{AssociationKind, EntityModel},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

// re-exports
pub use memory::MemoryStore;

///
/// RawRow
/// One stored record: surrogate key plus column values by field name.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RawRow {
    pub key: crate::entity::EntityKey,
    pub values: BTreeMap<String, Value>,
}

///
/// StoreError
///
/// Failures raised by a backing store. Surfaced to callers unchanged
/// inside `ExecutionError::Store`; this crate never retries them.
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("store corruption detected: {message}")]
    Corrupt { message: String },

    #[error("{0}")]
    Entity(#[from] EntityError),
}

///
/// Store
///
/// Backing-store collaborator contract.
///
/// `scan` and `resolve_association` are the only suspension points of an
/// execution; each either returns a complete answer or fails.
///

pub trait Store {
    /// Every row of one entity type, bound to `alias` in the calling query.
    fn scan(&self, model: &'static EntityModel, alias: &Alias) -> Result<Vec<RawRow>, StoreError>;

    /// Secondary fetch for an association that was not loaded by a fetch
    /// join. To-one associations yield `Related::One`, to-many `Related::Many`.
    fn resolve_association(
        &self,
        entity: &Entity,
        association: &str,
    ) -> Result<Related, StoreError>;

    /// Row count of an unpaginated descriptor when the store can answer it
    /// natively. `None` makes the executor run its own unlimited count pass.
    fn count(&self, _query: &QueryDescriptor) -> Result<Option<u64>, StoreError> {
        Ok(None)
    }

    /// Null placement used when neither the order key nor the executor
    /// config specifies one. Defaults to nulls-as-smallest.
    fn natural_null_ordering(&self, direction: OrderDirection) -> NullOrdering {
        match direction {
            OrderDirection::Asc => NullOrdering::First,
            OrderDirection::Desc => NullOrdering::Last,
        }
    }
}

/// Resolve an association by scanning the target table.
///
/// Shared by stores that have no cheaper lookup path.
pub fn resolve_by_scan<S: Store + ?Sized>(
    store: &S,
    entity: &Entity,
    association: &str,
) -> Result<Related, StoreError> {
    let owner = entity.model();
    let assoc = owner
        .association(association)
        .ok_or_else(|| EntityError::UnknownAssociation {
            entity: owner.name,
            association: association.to_string(),
        })?;
    let alias = Alias::new(assoc.name);

    match assoc.kind {
        AssociationKind::ManyToOne { foreign_key } => {
            let Some(Value::Key(fk)) = entity.get(foreign_key) else {
                return Ok(Related::One(None));
            };
            let row = store
                .scan(assoc.target, &alias)?
                .into_iter()
                .find(|row| row.key == *fk);

            let target = row
                .map(|row| Entity::materialize(assoc.target, row))
                .transpose()?;

            Ok(Related::One(target.map(Box::new)))
        }
        AssociationKind::OneToMany { .. } => {
            let mut related = Vec::new();
            for row in store.scan(assoc.target, &alias)? {
                let target = Entity::materialize(assoc.target, row)?;
                if assoc.links(entity, &target) {
                    related.push(target);
                }
            }

            Ok(Related::Many(related))
        }
    }
}
