use crate::{
    db::{
        query::Alias,
        store::{RawRow, Store, StoreError, resolve_by_scan},
    },
    entity::{Entity, EntityKey, Related},
    model::EntityModel,
};
use std::collections::BTreeMap;

///
/// MemoryStore
///
/// In-memory reference store. Tables are keyed by entity name and scanned
/// in key order; keys come from one store-wide sequence starting at 1.
///
/// Reads observe every completed `persist`; there is no isolation beyond
/// Rust's borrow rules.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<&'static str, BTreeMap<EntityKey, RawRow>>,
    last_key: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update an entity. Transient entities receive a fresh key;
    /// keyed entities are overwritten in place and keep their key.
    pub fn persist(&mut self, entity: &mut Entity) -> Result<EntityKey, StoreError> {
        let key = match entity.key() {
            Some(key) => key,
            None => {
                self.last_key += 1;
                let key = EntityKey::new(self.last_key);
                entity.assign_key(key)?;
                key
            }
        };
        let row = entity.to_raw().ok_or_else(|| StoreError::Corrupt {
            message: format!("persisted '{}' has no key", entity.model().name),
        })?;

        self.tables
            .entry(entity.model().name)
            .or_default()
            .insert(key, row);

        Ok(key)
    }

    /// Remove a row; returns whether it existed.
    pub fn remove(&mut self, model: &EntityModel, key: EntityKey) -> bool {
        self.tables
            .get_mut(model.name)
            .is_some_and(|table| table.remove(&key).is_some())
    }

    /// Number of stored rows of one entity type.
    #[must_use]
    pub fn len(&self, model: &EntityModel) -> usize {
        self.tables.get(model.name).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }
}

impl Store for MemoryStore {
    fn scan(&self, model: &'static EntityModel, _alias: &Alias) -> Result<Vec<RawRow>, StoreError> {
        Ok(self
            .tables
            .get(model.name)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }

    fn resolve_association(
        &self,
        entity: &Entity,
        association: &str,
    ) -> Result<Related, StoreError> {
        resolve_by_scan(self, entity, association)
    }
}
