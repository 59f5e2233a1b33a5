//! Module: executor::context
//! Responsibility: one execution's shared state and the row pipeline
//! (scan → join → filter → group → order → project → page).
//! Does not own: expression semantics (eval) or plan checks (plan).
//! Boundary: every phase either completes or returns an error; no partial
//! row set ever leaves `run`.

use crate::{
    config::ExecutorConfig,
    db::{
        executor::{
            CancelToken, ExecutionError, group, join, order,
            plan::is_grouped,
            trace::{TracePhase, TraceScope},
        },
        query::{Alias, QueryDescriptor, Subquery},
        store::{Store, StoreError},
    },
    entity::{Entity, EntityKey, Related},
    error::QueryError,
    model::EntityModel,
    value::Value,
};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

/// One candidate result row: an entity (or null) per bound alias.
pub(super) type Frame = Vec<Option<Entity>>;

///
/// Layout
/// Slot index of every alias bound by one query level.
///

pub(super) struct Layout {
    aliases: Vec<Alias>,
}

impl Layout {
    pub(super) fn for_query(query: &QueryDescriptor) -> Self {
        Self {
            aliases: query.bound_aliases().cloned().collect(),
        }
    }

    pub(super) fn slot(&self, alias: &Alias) -> Option<usize> {
        self.aliases.iter().position(|bound| bound == alias)
    }

    pub(super) fn empty_frame(&self) -> Frame {
        vec![None; self.aliases.len()]
    }
}

///
/// RowScope
///
/// What an expression can see while it is evaluated: the current frame,
/// the rows of its group when grouped, and the enclosing query's scope for
/// correlated references.
///

#[derive(Clone, Copy)]
pub(super) struct RowScope<'s> {
    layout: &'s Layout,
    frame: &'s [Option<Entity>],
    group: Option<&'s [Frame]>,
    parent: Option<&'s RowScope<'s>>,
}

impl<'s> RowScope<'s> {
    pub(super) const fn row(
        layout: &'s Layout,
        frame: &'s [Option<Entity>],
        parent: Option<&'s RowScope<'s>>,
    ) -> Self {
        Self {
            layout,
            frame,
            group: None,
            parent,
        }
    }

    pub(super) const fn grouped(
        layout: &'s Layout,
        frame: &'s [Option<Entity>],
        group: &'s [Frame],
        parent: Option<&'s RowScope<'s>>,
    ) -> Self {
        Self {
            layout,
            frame,
            group: Some(group),
            parent,
        }
    }

    /// Same level, one member row of the current group.
    pub(super) const fn member(&self, frame: &'s [Option<Entity>]) -> Self {
        Self::row(self.layout, frame, self.parent)
    }

    pub(super) const fn group(&self) -> Option<&'s [Frame]> {
        self.group
    }

    /// The entity bound to `alias` here or in an enclosing scope.
    /// `None` when the alias is unknown; `Some(None)` for a null binding.
    pub(super) fn entity(&self, alias: &Alias) -> Option<Option<&'s Entity>> {
        match self.layout.slot(alias) {
            Some(slot) => self.frame.get(slot).map(Option::as_ref),
            None => self.parent.and_then(|parent| parent.entity(alias)),
        }
    }
}

///
/// Unit
/// A row, or a group of rows with a representative, ready for ordering.
///

pub(super) struct Unit {
    pub(super) frame: Frame,
    pub(super) group: Option<Vec<Frame>>,
}

impl Unit {
    pub(super) const fn row(frame: Frame) -> Self {
        Self { frame, group: None }
    }

    pub(super) fn scope<'s>(
        &'s self,
        layout: &'s Layout,
        parent: Option<&'s RowScope<'s>>,
    ) -> RowScope<'s> {
        match &self.group {
            Some(group) => RowScope::grouped(layout, &self.frame, group, parent),
            None => RowScope::row(layout, &self.frame, parent),
        }
    }
}

///
/// Evaluated
/// Projected rows of one query level plus the row count before paging.
///

pub(super) struct Evaluated {
    pub(super) rows: Vec<Vec<Value>>,
    pub(super) unpaged: usize,
}

type SubqueryRows = Rc<Vec<Vec<Value>>>;

///
/// ExecutionContext
///
/// State shared by every level of one execution. Uncorrelated subquery
/// results and lazily resolved associations are cached here and dropped
/// with the context.
///

pub(super) struct ExecutionContext<'a> {
    store: &'a dyn Store,
    config: &'a ExecutorConfig,
    cancel: Option<&'a CancelToken>,
    subqueries: RefCell<HashMap<usize, SubqueryRows>>,
    correlation: RefCell<HashMap<usize, bool>>,
    resolved: RefCell<HashMap<(&'static str, EntityKey, &'static str), Related>>,
}

impl<'a> ExecutionContext<'a> {
    pub(super) fn new(
        store: &'a dyn Store,
        config: &'a ExecutorConfig,
        cancel: Option<&'a CancelToken>,
    ) -> Self {
        Self {
            store,
            config,
            cancel,
            subqueries: RefCell::new(HashMap::new()),
            correlation: RefCell::new(HashMap::new()),
            resolved: RefCell::new(HashMap::new()),
        }
    }

    pub(super) fn store(&self) -> &'a dyn Store {
        self.store
    }

    pub(super) const fn config(&self) -> &'a ExecutorConfig {
        self.config
    }

    pub(super) fn check_cancel(&self) -> Result<(), ExecutionError> {
        self.cancel.map_or(Ok(()), CancelToken::check)
    }

    /// Scan one table and materialize its rows.
    pub(super) fn scan(
        &self,
        model: &'static EntityModel,
        alias: &Alias,
    ) -> Result<Vec<Entity>, QueryError> {
        let rows = self.store.scan(model, alias)?;
        tracing::trace!(entity = model.name, %alias, rows = rows.len(), "scanned");

        let entities = rows
            .into_iter()
            .map(|row| Entity::materialize(model, row).map_err(StoreError::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entities)
    }

    /// Follow a to-one association, resolving it through the store when the
    /// instance has not loaded it.
    pub(super) fn follow(
        &self,
        entity: &Entity,
        association: &'static str,
    ) -> Result<Option<Entity>, QueryError> {
        if let Some(related) = entity.related(association) {
            return Ok(related.as_one().cloned());
        }
        let Some(key) = entity.key() else {
            return Ok(None);
        };

        let cache_key = (entity.model().name, key, association);
        if let Some(related) = self.resolved.borrow().get(&cache_key) {
            return Ok(related.as_one().cloned());
        }

        tracing::trace!(
            entity = entity.model().name,
            %key,
            association,
            "resolving association"
        );
        let related = self.store.resolve_association(entity, association)?;
        let one = related.as_one().cloned();
        self.resolved.borrow_mut().insert(cache_key, related);

        Ok(one)
    }

    /// Projected rows of a subquery. Uncorrelated subqueries run once per
    /// execution; correlated ones run once per outer row.
    pub(super) fn subquery_rows(
        &self,
        subquery: &Subquery,
        scope: &RowScope<'_>,
    ) -> Result<SubqueryRows, QueryError> {
        let correlated = self.is_correlated(subquery);
        if !correlated && let Some(rows) = self.subqueries.borrow().get(&subquery.id()) {
            return Ok(Rc::clone(rows));
        }

        let parent = correlated.then_some(scope);
        let rows = Rc::new(self.run(subquery.query(), parent, None)?.rows);
        if !correlated {
            self.subqueries
                .borrow_mut()
                .insert(subquery.id(), Rc::clone(&rows));
        }

        Ok(rows)
    }

    fn is_correlated(&self, subquery: &Subquery) -> bool {
        if let Some(correlated) = self.correlation.borrow().get(&subquery.id()) {
            return *correlated;
        }
        let correlated = subquery.is_correlated();
        self.correlation
            .borrow_mut()
            .insert(subquery.id(), correlated);

        correlated
    }

    /// Run one query level end to end.
    pub(super) fn run(
        &self,
        query: &QueryDescriptor,
        outer: Option<&RowScope<'_>>,
        trace: Option<&TraceScope<'_>>,
    ) -> Result<Evaluated, QueryError> {
        let layout = Layout::for_query(query);
        let phase = |phase: TracePhase, rows: usize| {
            if let Some(trace) = trace {
                trace.phase(phase, rows);
            }
        };

        // scan + join
        self.check_cancel()?;
        let mut frames = join::scan_sources(self, query, &layout)?;
        phase(TracePhase::Scan, frames.len());

        for (index, spec) in query.joins().iter().enumerate() {
            self.check_cancel()?;
            let slot = query.sources().len() + index;
            frames = join::apply_join(self, &layout, spec, slot, frames, outer)?;
        }
        if !query.joins().is_empty() {
            phase(TracePhase::Join, frames.len());
        }

        // filter
        if let Some(filter) = query.filter() {
            self.check_cancel()?;
            let mut kept = Vec::with_capacity(frames.len());
            for frame in frames {
                let scope = RowScope::row(&layout, &frame, outer);
                if self.eval_predicate(filter.expr(), &scope)? {
                    kept.push(frame);
                }
            }
            frames = kept;
            phase(TracePhase::Filter, frames.len());
        }

        // group
        let units = if is_grouped(query) {
            self.check_cancel()?;
            let units = group::group_rows(self, query, &layout, frames, outer)?;
            phase(TracePhase::Group, units.len());
            units
        } else {
            frames.into_iter().map(Unit::row).collect()
        };

        // order
        self.check_cancel()?;
        let units = order::sort_units(self, query, &layout, units, outer)?;
        if !query.order_by().is_empty() {
            phase(TracePhase::Order, units.len());
        }

        // project + page; distinct needs every projected row before paging
        let offset = to_usize(query.offset().unwrap_or(0));
        let limit = query.limit().map_or(usize::MAX, to_usize);
        let evaluated = if query.is_distinct() {
            let mut rows = self.project(query, &layout, &units, outer)?;
            let mut seen = HashSet::with_capacity(rows.len());
            rows.retain(|row| seen.insert(row.iter().map(Value::canonical).collect::<Vec<_>>()));
            phase(TracePhase::Project, rows.len());

            let unpaged = rows.len();
            Evaluated {
                rows: rows.into_iter().skip(offset).take(limit).collect(),
                unpaged,
            }
        } else {
            let unpaged = units.len();
            let page: Vec<Unit> = units.into_iter().skip(offset).take(limit).collect();
            let rows = self.project(query, &layout, &page, outer)?;
            phase(TracePhase::Project, rows.len());

            Evaluated { rows, unpaged }
        };
        if query.is_paginated() {
            phase(TracePhase::Page, evaluated.rows.len());
        }

        self.check_cancel()?;

        Ok(evaluated)
    }

    fn project(
        &self,
        query: &QueryDescriptor,
        layout: &Layout,
        units: &[Unit],
        outer: Option<&RowScope<'_>>,
    ) -> Result<Vec<Vec<Value>>, QueryError> {
        units
            .iter()
            .map(|unit| {
                let scope = unit.scope(layout, outer);
                query
                    .projection()
                    .iter()
                    .map(|expr| self.eval(expr, &scope))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
