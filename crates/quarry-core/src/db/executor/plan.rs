//! Plan-time checks: aggregation legality and subquery arity.
//!
//! Alias binding and path checks already ran at build time; planning
//! re-runs them so descriptors that bypassed `Query::build` are covered.

use crate::{
    db::query::{Expr, OrderSpec, Predicate, QueryDescriptor, QueryFingerprint, Subquery},
    error::QueryError,
};
use thiserror::Error as ThisError;

///
/// PlanError
///
/// Structurally valid descriptors that still cannot be executed.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PlanError {
    #[error("invalid aggregation: '{expr}' {reason}")]
    InvalidAggregation { expr: String, reason: &'static str },

    #[error("{context} must project exactly {expected} column(s), found {found}")]
    ArityMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
}

///
/// QueryPlan
///
/// Result of planning one descriptor. Planning never touches the store.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QueryPlan {
    fingerprint: QueryFingerprint,
    grouped: bool,
}

impl QueryPlan {
    #[must_use]
    pub const fn fingerprint(&self) -> QueryFingerprint {
        self.fingerprint
    }

    /// Whether rows are partitioned into groups before projection.
    #[must_use]
    pub const fn is_grouped(&self) -> bool {
        self.grouped
    }
}

/// Validate and plan a top-level descriptor.
pub(crate) fn plan_query(query: &QueryDescriptor) -> Result<QueryPlan, QueryError> {
    query.validate()?;
    let grouped = plan_level(query)?;

    Ok(QueryPlan {
        fingerprint: query.fingerprint(),
        grouped,
    })
}

/// A query is grouped when it has group keys, a `having`, or aggregates in
/// its projection or ordering. Without group keys the whole input is one
/// group.
pub(crate) fn is_grouped(query: &QueryDescriptor) -> bool {
    !query.group_by().is_empty()
        || query.having().is_some()
        || query.projection().iter().any(Expr::contains_aggregate)
        || query
            .order_by()
            .iter()
            .any(|order| order.expr().contains_aggregate())
}

// Plan one level and every nested subquery; returns whether it is grouped.
fn plan_level(query: &QueryDescriptor) -> Result<bool, PlanError> {
    let row_slots = query
        .joins()
        .iter()
        .filter_map(|join| join.condition().map(Predicate::expr))
        .map(|expr| (expr, "is not allowed in a join condition"))
        .chain(
            query
                .filter()
                .map(|filter| (filter.expr(), "is not allowed in a filter; use having")),
        )
        .chain(
            query
                .group_by()
                .iter()
                .map(|expr| (expr, "is not allowed as a group key")),
        );
    for (expr, reason) in row_slots {
        if expr.contains_aggregate() {
            return Err(invalid(expr, reason));
        }
    }

    for expr in query.expressions() {
        check_nesting(expr)?;
        check_subqueries(expr)?;
    }

    let grouped = is_grouped(query);
    if grouped {
        let keys = query.group_by();
        let grouped_slots = query
            .projection()
            .iter()
            .chain(query.having().map(Predicate::expr))
            .chain(query.order_by().iter().map(OrderSpec::expr));
        for expr in grouped_slots {
            if !is_group_safe(expr, keys) {
                return Err(invalid(
                    expr,
                    "must be a group key, an aggregate, or built only from those",
                ));
            }
        }
    }

    Ok(grouped)
}

fn check_nesting(expr: &Expr) -> Result<(), PlanError> {
    if let Expr::Aggregate { arg: Some(arg), .. } = expr
        && arg.contains_aggregate()
    {
        return Err(invalid(expr, "nests an aggregate inside an aggregate"));
    }

    expr.children().into_iter().try_for_each(check_nesting)
}

fn check_subqueries(expr: &Expr) -> Result<(), PlanError> {
    match expr {
        Expr::Subquery(subquery) => {
            require_single_column("scalar subquery", subquery)?;
            plan_level(subquery.query())?;
        }
        Expr::InSubquery { subquery, .. } => {
            require_single_column("in subquery", subquery)?;
            plan_level(subquery.query())?;
        }
        Expr::Exists(subquery) => {
            plan_level(subquery.query())?;
        }
        _ => {}
    }

    expr.children().into_iter().try_for_each(check_subqueries)
}

fn require_single_column(context: &'static str, subquery: &Subquery) -> Result<(), PlanError> {
    if subquery.arity() == 1 {
        Ok(())
    } else {
        Err(PlanError::ArityMismatch {
            context,
            expected: 1,
            found: subquery.arity(),
        })
    }
}

// An expression is group-safe when it equals a group key, is an aggregate,
// or only combines group-safe parts. Fields of an entity that is itself a
// group key are functionally dependent on it and therefore safe.
fn is_group_safe(expr: &Expr, keys: &[Expr]) -> bool {
    let unlabeled = expr.unlabeled();
    if keys.iter().any(|key| key.unlabeled() == unlabeled) {
        return true;
    }

    match unlabeled {
        Expr::Aggregate { .. } | Expr::Literal(_) | Expr::Exists(_) | Expr::Subquery(_) => true,
        Expr::Field(path) => keys.iter().any(|key| {
            matches!(key.unlabeled(), Expr::Entity(entity)
                if entity.alias() == path.alias() && path.via().is_empty())
        }),
        Expr::Entity(_) => false,
        other => other
            .children()
            .into_iter()
            .all(|child| is_group_safe(child, keys)),
    }
}

fn invalid(expr: &Expr, reason: &'static str) -> PlanError {
    PlanError::InvalidAggregation {
        expr: expr.to_string(),
        reason,
    }
}
