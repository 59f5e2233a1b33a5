use crate::{
    db::{
        executor::context::{ExecutionContext, Layout, RowScope, Unit},
        query::{NullOrdering, OrderDirection, QueryDescriptor},
    },
    error::QueryError,
    value::{Value, compare_values},
};
use std::cmp::Ordering;

/// Stable sort of rows or groups by the query's order keys.
///
/// Each key only discriminates units equal under every earlier key. Null
/// placement is resolved per key (explicit setting, then the executor
/// default, then the store's natural ordering) and is applied after the
/// direction, so "nulls last" holds for descending keys too.
pub(super) fn sort_units(
    ctx: &ExecutionContext<'_>,
    query: &QueryDescriptor,
    layout: &Layout,
    units: Vec<Unit>,
    outer: Option<&RowScope<'_>>,
) -> Result<Vec<Unit>, QueryError> {
    if query.order_by().is_empty() {
        return Ok(units);
    }

    let policy: Vec<(OrderDirection, NullOrdering)> = query
        .order_by()
        .iter()
        .map(|order| {
            let direction = order.direction();
            let nulls = order
                .null_ordering()
                .or(ctx.config().default_null_ordering)
                .unwrap_or_else(|| ctx.store().natural_null_ordering(direction));

            (direction, nulls)
        })
        .collect();

    let mut keyed = Vec::with_capacity(units.len());
    for unit in units {
        let scope = unit.scope(layout, outer);
        let keys = query
            .order_by()
            .iter()
            .map(|order| ctx.eval(order.expr(), &scope))
            .collect::<Result<Vec<_>, _>>()?;
        keyed.push((keys, unit));
    }

    keyed.sort_by(|(left, _), (right, _)| compare_keys(left, right, &policy));

    Ok(keyed.into_iter().map(|(_, unit)| unit).collect())
}

fn compare_keys(
    left: &[Value],
    right: &[Value],
    policy: &[(OrderDirection, NullOrdering)],
) -> Ordering {
    left.iter()
        .zip(right)
        .zip(policy)
        .map(|((left, right), &(direction, nulls))| compare_key(left, right, direction, nulls))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Order two key values under one direction and null policy.
/// Incomparable non-null values are treated as equal so the sort stays stable.
pub(super) fn compare_key(
    left: &Value,
    right: &Value,
    direction: OrderDirection,
    nulls: NullOrdering,
) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => match nulls {
            NullOrdering::First => Ordering::Less,
            NullOrdering::Last => Ordering::Greater,
        },
        (false, true) => match nulls {
            NullOrdering::First => Ordering::Greater,
            NullOrdering::Last => Ordering::Less,
        },
        (false, false) => {
            let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
            match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        }
    }
}
