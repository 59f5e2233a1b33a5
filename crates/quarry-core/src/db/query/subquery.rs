use crate::db::query::{
    Alias, BuildError, KeyExpr, NumberExpr, Predicate, Query, QueryDescriptor, StringExpr,
    expr::{Expr, ExprKind},
};
use std::{collections::BTreeSet, sync::Arc};

///
/// Subquery
///
/// A nested query descriptor used as a value, an `IN` set, or an `EXISTS`
/// test. It may read aliases of enclosing queries (correlation); those are
/// resolved against the outer row at execution time.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subquery {
    query: Arc<QueryDescriptor>,
}

impl Subquery {
    #[must_use]
    pub fn new(query: &Query) -> Self {
        Self {
            query: Arc::new(query.descriptor().clone()),
        }
    }

    #[must_use]
    pub fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    /// Number of projected columns.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.query.projection().len()
    }

    /// Kind of the first projected column.
    #[must_use]
    pub fn kind(&self) -> ExprKind {
        self.query
            .projection()
            .first()
            .map_or(ExprKind::Null, Expr::kind)
    }

    /// Aliases read by the subquery that it does not bind itself.
    #[must_use]
    pub fn outer_references(&self) -> BTreeSet<Alias> {
        self.query.free_aliases()
    }

    #[must_use]
    pub fn is_correlated(&self) -> bool {
        !self.outer_references().is_empty()
    }

    /// Scalar subquery as a number operand.
    pub fn as_number(&self) -> Result<NumberExpr, BuildError> {
        NumberExpr::try_from(Expr::Subquery(self.clone()))
    }

    pub fn as_string(&self) -> Result<StringExpr, BuildError> {
        StringExpr::try_from(Expr::Subquery(self.clone()))
    }

    pub fn as_key(&self) -> Result<KeyExpr, BuildError> {
        KeyExpr::try_from(Expr::Subquery(self.clone()))
    }

    #[must_use]
    pub fn exists(&self) -> Predicate {
        Predicate::from_expr_unchecked(Expr::Exists(self.clone()))
    }

    /// Identity of this subquery node within one descriptor tree.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.query).addr()
    }
}

impl From<&Query> for Subquery {
    fn from(query: &Query) -> Self {
        Self::new(query)
    }
}

impl From<Query> for Subquery {
    fn from(query: Query) -> Self {
        Self::new(&query)
    }
}

/// `EXISTS (subquery)`.
#[must_use]
pub fn exists(subquery: &Subquery) -> Predicate {
    subquery.exists()
}
