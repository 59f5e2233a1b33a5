use crate::{
    db::{
        executor::context::{ExecutionContext, Frame, Layout, RowScope, Unit},
        query::QueryDescriptor,
    },
    error::QueryError,
    value::Value,
};
use std::collections::HashMap;

/// Partition filtered frames into groups, then apply `having`.
///
/// Groups are keyed by the evaluated group-by values, with null equal to
/// null, and are emitted in the order their first row was seen. Without
/// group keys every frame lands in one group, which exists even when the
/// input is empty so that `count(*)` over nothing yields a row.
pub(super) fn group_rows(
    ctx: &ExecutionContext<'_>,
    query: &QueryDescriptor,
    layout: &Layout,
    frames: Vec<Frame>,
    outer: Option<&RowScope<'_>>,
) -> Result<Vec<Unit>, QueryError> {
    let units = if query.group_by().is_empty() {
        let frame = frames
            .first()
            .cloned()
            .unwrap_or_else(|| layout.empty_frame());

        vec![Unit {
            frame,
            group: Some(frames),
        }]
    } else {
        partition(ctx, query, layout, frames, outer)?
    };

    let Some(having) = query.having() else {
        return Ok(units);
    };

    let mut kept = Vec::with_capacity(units.len());
    for unit in units {
        if ctx.eval_predicate(having.expr(), &unit.scope(layout, outer))? {
            kept.push(unit);
        }
    }

    Ok(kept)
}

fn partition(
    ctx: &ExecutionContext<'_>,
    query: &QueryDescriptor,
    layout: &Layout,
    frames: Vec<Frame>,
    outer: Option<&RowScope<'_>>,
) -> Result<Vec<Unit>, QueryError> {
    let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut units: Vec<Unit> = Vec::new();

    for frame in frames {
        let scope = RowScope::row(layout, &frame, outer);
        let key = query
            .group_by()
            .iter()
            .map(|expr| ctx.eval(expr, &scope).map(|value| value.canonical()))
            .collect::<Result<Vec<_>, _>>()?;

        match index.get(&key) {
            Some(&slot) => {
                if let Some(group) = units[slot].group.as_mut() {
                    group.push(frame);
                }
            }
            None => {
                index.insert(key, units.len());
                units.push(Unit {
                    frame: frame.clone(),
                    group: Some(vec![frame]),
                });
            }
        }
    }
    tracing::trace!(groups = units.len(), "partitioned rows");

    Ok(units)
}
