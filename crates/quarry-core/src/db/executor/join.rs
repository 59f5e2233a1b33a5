use crate::{
    db::{
        executor::context::{ExecutionContext, Frame, Layout, RowScope},
        query::{JoinKind, JoinSpec, QueryDescriptor},
        store::StoreError,
    },
    entity::{Entity, Related},
    error::QueryError,
    model::AssociationModel,
};

/// Scan every source and form their cross product in declaration order.
pub(super) fn scan_sources(
    ctx: &ExecutionContext<'_>,
    query: &QueryDescriptor,
    layout: &Layout,
) -> Result<Vec<Frame>, QueryError> {
    let mut frames = vec![layout.empty_frame()];

    for (slot, source) in query.sources().iter().enumerate() {
        let table = ctx.scan(source.model(), source.alias())?;
        if slot > 0 {
            warn_if_large(ctx, frames.len(), table.len(), source.alias());
        }

        let mut next = Vec::with_capacity(frames.len().saturating_mul(table.len()));
        for frame in &frames {
            ctx.check_cancel()?;
            for entity in &table {
                let mut row = frame.clone();
                row[slot] = Some(entity.clone());
                next.push(row);
            }
        }
        frames = next;
    }

    Ok(frames)
}

/// Apply one join to every frame.
///
/// Association joins match through the association's key columns and then
/// the optional `on` condition; entity joins match through `on` alone, and
/// cartesian joins match everything. A fetch join records the matched
/// entities on the owner before the owner is copied into output frames.
pub(super) fn apply_join(
    ctx: &ExecutionContext<'_>,
    layout: &Layout,
    spec: &JoinSpec,
    slot: usize,
    frames: Vec<Frame>,
    outer: Option<&RowScope<'_>>,
) -> Result<Vec<Frame>, QueryError> {
    let table = ctx.scan(spec.target(), spec.alias())?;
    let association = join_association(layout, spec);
    if association.is_none() && spec.condition().is_none() {
        warn_if_large(ctx, frames.len(), table.len(), spec.alias());
    }

    let mut out = Vec::with_capacity(frames.len());
    for mut frame in frames {
        ctx.check_cancel()?;

        let mut matched: Vec<&Entity> = Vec::new();
        for candidate in &table {
            if let Some((owner_slot, assoc)) = association {
                let Some(owner) = frame[owner_slot].as_ref() else {
                    continue;
                };
                if !assoc.links(owner, candidate) {
                    continue;
                }
            }
            if let Some(on) = spec.condition() {
                frame[slot] = Some(candidate.clone());
                let keep = ctx.eval_predicate(on.expr(), &RowScope::row(layout, &frame, outer))?;
                frame[slot] = None;
                if !keep {
                    continue;
                }
            }
            matched.push(candidate);
        }

        if spec.is_fetch()
            && let Some((owner_slot, assoc)) = association
            && let Some(owner) = frame[owner_slot].as_mut()
        {
            let related = if assoc.is_to_many() {
                Related::Many(matched.iter().map(|entity| (*entity).clone()).collect())
            } else {
                Related::One(matched.first().map(|entity| Box::new((*entity).clone())))
            };
            owner
                .load_association(assoc.name, related)
                .map_err(StoreError::from)?;
        }

        if matched.is_empty() {
            if spec.kind() == JoinKind::Left {
                out.push(frame);
            }
            continue;
        }
        for candidate in matched {
            let mut row = frame.clone();
            row[slot] = Some(candidate.clone());
            out.push(row);
        }
    }

    Ok(out)
}

// Owner slot and association model of an association join.
fn join_association(
    layout: &Layout,
    spec: &JoinSpec,
) -> Option<(usize, &'static AssociationModel)> {
    let path = spec.association()?;
    let owner_slot = layout.slot(path.alias())?;
    let association = path.root().association(path.via().first()?)?;

    Some((owner_slot, association))
}

fn warn_if_large(ctx: &ExecutionContext<'_>, left: usize, right: usize, alias: &str) {
    let rows = u64::try_from(left.saturating_mul(right)).unwrap_or(u64::MAX);
    if rows > ctx.config().cartesian_warn_rows {
        tracing::warn!(
            alias,
            rows,
            threshold = ctx.config().cartesian_warn_rows,
            "cartesian product exceeds threshold; correlate through the filter or use an association join"
        );
    }
}
