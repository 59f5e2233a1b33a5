use crate::{
    db::query::{
        Alias, Predicate,
        expr::{AssociationPath, EntityPath},
    },
    model::EntityModel,
};

///
/// JoinKind
///
/// Inner    → rows without a match are dropped.
/// Left     → rows without a match keep a null right side.
/// Cartesian → every pairing; the join condition lives in the filter.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum JoinKind {
    Inner,
    Left,
    Cartesian,
}

///
/// JoinSpec
///
/// One join, applied in declaration order after the sources are scanned.
/// An association join matches through the association's key columns and
/// may additionally carry an `on` condition; an entity join matches only
/// through `on`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinSpec {
    kind: JoinKind,
    target: &'static EntityModel,
    alias: Alias,
    association: Option<AssociationPath>,
    on: Option<Predicate>,
    fetch: bool,
}

impl JoinSpec {
    /// Inner join along an association (`innerJoin(member.team, team)`).
    #[must_use]
    pub fn inner(association: &AssociationPath, target: &EntityPath) -> Self {
        Self::along(JoinKind::Inner, association, target)
    }

    #[must_use]
    pub fn left(association: &AssociationPath, target: &EntityPath) -> Self {
        Self::along(JoinKind::Left, association, target)
    }

    /// Inner join on an unrelated entity; requires `on`.
    #[must_use]
    pub fn inner_entity(target: &EntityPath) -> Self {
        Self::entity(JoinKind::Inner, target)
    }

    #[must_use]
    pub fn left_entity(target: &EntityPath) -> Self {
        Self::entity(JoinKind::Left, target)
    }

    /// Theta-style cross product; filter to correlate.
    #[must_use]
    pub fn cartesian(target: &EntityPath) -> Self {
        Self::entity(JoinKind::Cartesian, target)
    }

    /// Add a join condition, AND-ed with any existing one.
    #[must_use]
    pub fn on(mut self, condition: Predicate) -> Self {
        self.on = Some(match self.on.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Materialize the association on the owning instances.
    #[must_use]
    pub const fn fetch(mut self) -> Self {
        self.fetch = true;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> JoinKind {
        self.kind
    }

    #[must_use]
    pub const fn target(&self) -> &'static EntityModel {
        self.target
    }

    #[must_use]
    pub const fn alias(&self) -> &Alias {
        &self.alias
    }

    #[must_use]
    pub const fn association(&self) -> Option<&AssociationPath> {
        self.association.as_ref()
    }

    #[must_use]
    pub const fn condition(&self) -> Option<&Predicate> {
        self.on.as_ref()
    }

    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        self.fetch
    }

    fn along(kind: JoinKind, association: &AssociationPath, target: &EntityPath) -> Self {
        Self {
            kind,
            target: target.model(),
            alias: target.alias().clone(),
            association: Some(association.clone()),
            on: None,
            fetch: false,
        }
    }

    fn entity(kind: JoinKind, target: &EntityPath) -> Self {
        Self {
            kind,
            target: target.model(),
            alias: target.alias().clone(),
            association: None,
            on: None,
            fetch: false,
        }
    }
}
