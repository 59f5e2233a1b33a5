//! Module: query::descriptor
//! Responsibility: the immutable query descriptor and its functional builder.
//! Does not own: aggregation legality or subquery arity (plan time).
//! Boundary: `Query::build` is the last point where construction can fail
//! with a `BuildError`.

mod join;
mod order;
mod validate;

#[cfg(test)]
mod tests;

use crate::{
    db::query::{
        Alias, BuildError, Predicate,
        expr::{AssociationPath, EntityPath, Expr, KeyExpr, NumberExpr, StringExpr},
        fingerprint::{QueryFingerprint, fingerprint},
    },
    model::EntityModel,
};
use std::collections::BTreeSet;

// re-exports
pub use join::{JoinKind, JoinSpec};
pub use order::{NullOrdering, OrderDirection, OrderSpec};

///
/// Source
/// One root entity scanned by a query, bound to an alias.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Source {
    alias: Alias,
    model: &'static EntityModel,
}

impl Source {
    #[must_use]
    pub const fn alias(&self) -> &Alias {
        &self.alias
    }

    #[must_use]
    pub const fn model(&self) -> &'static EntityModel {
        self.model
    }
}

///
/// QueryDescriptor
///
/// Complete, side-effect-free description of one query. Two descriptors
/// built from the same calls compare equal and share a fingerprint.
///
/// More than one source with no join condition is a cartesian product;
/// correlate sources through the filter.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryDescriptor {
    projection: Vec<Expr>,
    sources: Vec<Source>,
    joins: Vec<JoinSpec>,
    filter: Option<Predicate>,
    group_by: Vec<Expr>,
    having: Option<Predicate>,
    order_by: Vec<OrderSpec>,
    offset: Option<u64>,
    limit: Option<u64>,
    distinct: bool,
}

impl QueryDescriptor {
    #[must_use]
    pub fn projection(&self) -> &[Expr] {
        &self.projection
    }

    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    #[must_use]
    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    #[must_use]
    pub const fn having(&self) -> Option<&Predicate> {
        self.having.as_ref()
    }

    #[must_use]
    pub fn order_by(&self) -> &[OrderSpec] {
        &self.order_by
    }

    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        self.offset
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }

    /// Same query with offset and limit cleared; used for totals.
    #[must_use]
    pub fn without_pagination(&self) -> Self {
        Self {
            offset: None,
            limit: None,
            ..self.clone()
        }
    }

    /// Re-run build validation; descriptors taken from `Query::descriptor`
    /// have not been checked yet.
    pub fn validate(&self) -> Result<(), BuildError> {
        validate::validate_query(self, None)
    }

    /// Same query with the limit capped at `limit`.
    pub(crate) fn with_limit_cap(&self, limit: u64) -> Self {
        Self {
            limit: Some(self.limit.map_or(limit, |current| current.min(limit))),
            ..self.clone()
        }
    }

    /// Stable structural hash of the descriptor.
    #[must_use]
    pub fn fingerprint(&self) -> QueryFingerprint {
        fingerprint(self)
    }

    /// Aliases bound by this query's sources and joins, in binding order.
    pub fn bound_aliases(&self) -> impl Iterator<Item = &Alias> {
        self.sources
            .iter()
            .map(Source::alias)
            .chain(self.joins.iter().map(JoinSpec::alias))
    }

    /// Aliases read anywhere in this query, nested subqueries included,
    /// that this query does not bind.
    #[must_use]
    pub fn free_aliases(&self) -> BTreeSet<Alias> {
        let bound: BTreeSet<&Alias> = self.bound_aliases().collect();

        let mut used = Vec::new();
        for expr in self.expressions() {
            expr.collect_aliases(&mut used);
        }
        used.extend(
            self.joins
                .iter()
                .filter_map(JoinSpec::association)
                .map(AssociationPath::alias),
        );

        let mut free: BTreeSet<Alias> = used
            .into_iter()
            .filter(|alias| !bound.contains(alias))
            .cloned()
            .collect();
        for subquery in self.expressions().flat_map(Expr::subqueries) {
            free.extend(
                subquery
                    .outer_references()
                    .into_iter()
                    .filter(|alias| !bound.contains(&alias)),
            );
        }

        free
    }

    /// Every top-level expression slot, in evaluation order.
    pub(crate) fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.joins
            .iter()
            .filter_map(|join| join.condition().map(Predicate::expr))
            .chain(self.filter.iter().map(Predicate::expr))
            .chain(self.group_by.iter())
            .chain(self.having.iter().map(Predicate::expr))
            .chain(self.order_by.iter().map(OrderSpec::expr))
            .chain(self.projection.iter())
    }
}

///
/// Query
///
/// Functional builder over a `QueryDescriptor`. Every call returns a new
/// `Query`; the receiver is left untouched, so a partially built query can
/// be reused as a base for several variants.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Query {
    descriptor: QueryDescriptor,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `select(path).from(path)`.
    #[must_use]
    pub fn select_from(path: &EntityPath) -> Self {
        Self::new().select(path).from(path)
    }

    /// Replace the projection.
    #[must_use]
    pub fn select(&self, projection: impl IntoProjection) -> Self {
        self.with(|d| d.projection = projection.into_projection())
    }

    /// Add a root source.
    #[must_use]
    pub fn from(&self, path: &EntityPath) -> Self {
        self.with(|d| {
            d.sources.push(Source {
                alias: path.alias().clone(),
                model: path.model(),
            });
        })
    }

    #[must_use]
    pub fn join(&self, join: JoinSpec) -> Self {
        self.with(|d| d.joins.push(join))
    }

    #[must_use]
    pub fn inner_join(&self, association: &AssociationPath, target: &EntityPath) -> Self {
        self.join(JoinSpec::inner(association, target))
    }

    #[must_use]
    pub fn left_join(&self, association: &AssociationPath, target: &EntityPath) -> Self {
        self.join(JoinSpec::left(association, target))
    }

    /// Add a filter, AND-ed with any existing filter.
    #[must_use]
    pub fn filter(&self, predicate: Predicate) -> Self {
        self.with(|d| d.filter = Some(conjoin(d.filter.take(), predicate)))
    }

    /// Add every present filter. Absent entries are skipped; the result is
    /// identical to chaining `filter` over the present ones.
    #[must_use]
    pub fn filter_all<I>(&self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Option<Predicate>>,
    {
        predicates
            .into_iter()
            .flatten()
            .fold(self.clone(), |query, predicate| query.filter(predicate))
    }

    #[must_use]
    pub fn group_by(&self, keys: impl IntoProjection) -> Self {
        self.with(|d| d.group_by = keys.into_projection())
    }

    /// Add a group filter, AND-ed with any existing one.
    #[must_use]
    pub fn having(&self, predicate: Predicate) -> Self {
        self.with(|d| d.having = Some(conjoin(d.having.take(), predicate)))
    }

    /// Append sort keys; earlier keys take precedence.
    #[must_use]
    pub fn order_by<I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = OrderSpec>,
    {
        self.with(|d| d.order_by.extend(keys))
    }

    #[must_use]
    pub fn offset(&self, offset: u64) -> Self {
        self.with(|d| d.offset = Some(offset))
    }

    #[must_use]
    pub fn limit(&self, limit: u64) -> Self {
        self.with(|d| d.limit = Some(limit))
    }

    #[must_use]
    pub fn distinct(&self) -> Self {
        self.with(|d| d.distinct = true)
    }

    /// The descriptor as built so far, unvalidated.
    #[must_use]
    pub const fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    /// Validate alias binding, paths, and join shapes, and return the
    /// finished descriptor.
    pub fn build(&self) -> Result<QueryDescriptor, BuildError> {
        self.descriptor.validate()?;

        Ok(self.descriptor.clone())
    }

    fn with(&self, edit: impl FnOnce(&mut QueryDescriptor)) -> Self {
        let mut descriptor = self.descriptor.clone();
        edit(&mut descriptor);

        Self { descriptor }
    }
}

fn conjoin(existing: Option<Predicate>, predicate: Predicate) -> Predicate {
    match existing {
        Some(existing) => existing.and(predicate),
        None => predicate,
    }
}

///
/// IntoProjection
///
/// Anything usable as a projection or group-by list: one expression, a
/// tuple of expressions, or a `Vec<Expr>`.
///

pub trait IntoProjection {
    fn into_projection(self) -> Vec<Expr>;
}

macro_rules! impl_into_projection_single {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoProjection for $ty {
                fn into_projection(self) -> Vec<Expr> {
                    vec![self.into()]
                }
            }
        )*
    };
}

impl_into_projection_single!(
    Expr,
    NumberExpr,
    &NumberExpr,
    StringExpr,
    &StringExpr,
    KeyExpr,
    &KeyExpr,
    Predicate,
    &Predicate,
    EntityPath,
    &EntityPath,
);

impl IntoProjection for Vec<Expr> {
    fn into_projection(self) -> Vec<Expr> {
        self
    }
}

macro_rules! impl_into_projection_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Expr>),+> IntoProjection for ($($name,)+) {
            #[expect(non_snake_case)]
            fn into_projection(self) -> Vec<Expr> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_projection_tuple!(A);
impl_into_projection_tuple!(A, B);
impl_into_projection_tuple!(A, B, C);
impl_into_projection_tuple!(A, B, C, D);
impl_into_projection_tuple!(A, B, C, D, E);
impl_into_projection_tuple!(A, B, C, D, E, F);
