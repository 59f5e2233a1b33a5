//! Module: executor
//! Responsibility: planning and interpreting query descriptors against a
//! backing store, and the fetch surface callers use to run them.
//! Does not own: descriptor construction (query) or result shaping
//! beyond row assembly (response).
//! Boundary: a query either completes with every row or fails; a failed or
//! cancelled execution never hands back a partial result.

mod cancel;
mod context;
mod eval;
mod group;
mod join;
mod order;
mod plan;
mod trace;

#[cfg(test)]
mod tests;

use crate::{
    config::ExecutorConfig,
    db::{
        executor::{context::ExecutionContext, trace::TraceScope},
        query::{Expr, QueryDescriptor},
        response::{CardinalityError, ResultSet, Row},
        store::{Store, StoreError},
    },
    entity::Entity,
    error::QueryError,
    value::Value,
};
use std::sync::Arc;
use thiserror::Error as ThisError;

// re-exports
pub use cancel::CancelToken;
pub use plan::{PlanError, QueryPlan};
pub use trace::{QueryState, QueryTraceEvent, QueryTraceSink, TracePhase};

// Design notes:
// - Joins run in declared order; no reordering is attempted.
// - ORDER BY is stable; rows equal under every key keep their input order.
// - Uncorrelated subqueries are evaluated once per execution and cached
//   by descriptor identity; correlated ones run per outer row.

///
/// ExecutionError
///
/// Failures raised while rows are being read. Store errors are passed
/// through untouched and never retried here.
///

#[derive(Debug, ThisError)]
pub enum ExecutionError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("arithmetic error in '{expr}': {reason}")]
    Arithmetic { expr: String, reason: &'static str },

    #[error("execution cancelled")]
    Cancelled,

    #[error("executor invariant violated: {message}")]
    Invariant { message: String },
}

impl ExecutionError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}

///
/// Executor
///
/// Entry point for running descriptors against one store. Cheap to build;
/// holds no state between executions.
///

pub struct Executor<'a> {
    store: &'a dyn Store,
    config: ExecutorConfig,
    trace: Option<&'a dyn QueryTraceSink>,
    cancel: Option<CancelToken>,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            config: ExecutorConfig::default(),
            trace: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_trace_sink(mut self, sink: &'a dyn QueryTraceSink) -> Self {
        self.trace = Some(sink);
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Planning
    // ------------------------------------------------------------------

    /// Validate a descriptor without reading any rows.
    pub fn plan(&self, query: &QueryDescriptor) -> Result<QueryPlan, QueryError> {
        plan::plan_query(query)
    }

    // ------------------------------------------------------------------
    // Fetch surface
    // ------------------------------------------------------------------

    /// Every row of the query, paged by its own offset and limit.
    pub fn execute(&self, query: &QueryDescriptor) -> Result<ResultSet, QueryError> {
        self.traced(query, |ctx, trace| {
            let evaluated = ctx.run(query, None, Some(trace))?;

            Ok(result_set(query, evaluated.rows, None))
        })
    }

    /// One page plus the row count the query would produce without its
    /// offset and limit.
    pub fn execute_paged(&self, query: &QueryDescriptor) -> Result<ResultSet, QueryError> {
        self.traced(query, |ctx, trace| {
            let evaluated = ctx.run(query, None, Some(trace))?;
            let total = match self.store.count(&query.without_pagination())? {
                Some(total) => total,
                None => u64::try_from(evaluated.unpaged).unwrap_or(u64::MAX),
            };
            trace.phase(TracePhase::Count, evaluated.unpaged);

            Ok(result_set(query, evaluated.rows, Some(total)))
        })
    }

    /// At most one row. More than one matching row is an error rather than
    /// a silent pick.
    pub fn execute_one(&self, query: &QueryDescriptor) -> Result<Option<Row>, QueryError> {
        let rows = self.execute(query)?;
        match rows.len() {
            0 | 1 => Ok(rows.into_iter().next()),
            found => Err(CardinalityError::NotUnique { found }.into()),
        }
    }

    /// The first row in query order, if any. Evaluates with a limit of one.
    pub fn execute_first(&self, query: &QueryDescriptor) -> Result<Option<Row>, QueryError> {
        let capped = query.with_limit_cap(1);
        let rows = self.traced(query, |ctx, trace| {
            let evaluated = ctx.run(&capped, None, Some(trace))?;

            Ok(result_set(&capped, evaluated.rows, None))
        })?;

        Ok(rows.into_iter().next())
    }

    /// Number of rows the query produces, ignoring offset and limit.
    /// Trace events carry the fingerprint of `query` as given.
    pub fn count(&self, query: &QueryDescriptor) -> Result<u64, QueryError> {
        let unpaged = query.without_pagination();
        self.traced(query, |ctx, trace| {
            if let Some(total) = self.store.count(&unpaged)? {
                return Ok(total);
            }
            let evaluated = ctx.run(&unpaged, None, None)?;
            trace.phase(TracePhase::Count, evaluated.unpaged);

            Ok(u64::try_from(evaluated.unpaged).unwrap_or(u64::MAX))
        })
    }

    /// Resolve a not-loaded association on a caller-held instance.
    /// Already loaded associations are left untouched.
    pub fn resolve(&self, entity: &mut Entity, association: &str) -> Result<(), QueryError> {
        if entity.is_loaded(association) {
            return Ok(());
        }
        tracing::trace!(
            entity = entity.model().name,
            association,
            "explicit association resolve"
        );

        let related = self.store.resolve_association(entity, association)?;
        entity
            .load_association(association, related)
            .map_err(StoreError::from)?;

        Ok(())
    }

    // Plan, then run `body` under one trace scope, emitting the terminal
    // event for whichever way it ends.
    fn traced<T>(
        &self,
        query: &QueryDescriptor,
        body: impl FnOnce(&ExecutionContext<'_>, &TraceScope<'_>) -> Result<T, QueryError>,
    ) -> Result<T, QueryError>
    where
        T: RowCount,
    {
        let trace = TraceScope::new(self.trace, query.fingerprint());
        let plan = match plan::plan_query(query) {
            Ok(plan) => plan,
            Err(err) => {
                trace.failed(err.class());
                return Err(err);
            }
        };
        trace.planned(plan.is_grouped());

        let ctx = ExecutionContext::new(self.store, &self.config, self.cancel.as_ref());
        match body(&ctx, &trace) {
            Ok(out) => {
                trace.completed(out.row_count());
                Ok(out)
            }
            Err(err) => {
                trace.failed(err.class());
                Err(err)
            }
        }
    }
}

// Row count reported in the completion event.
trait RowCount {
    fn row_count(&self) -> usize;
}

impl RowCount for ResultSet {
    fn row_count(&self) -> usize {
        self.len()
    }
}

impl RowCount for u64 {
    fn row_count(&self) -> usize {
        usize::try_from(*self).unwrap_or(usize::MAX)
    }
}

fn result_set(
    query: &QueryDescriptor,
    rows: Vec<Vec<Value>>,
    total: Option<u64>,
) -> ResultSet {
    let columns: Arc<[Expr]> = Arc::from(query.projection());
    let rows = rows
        .into_iter()
        .map(|values| Row::new(Arc::clone(&columns), values))
        .collect();

    ResultSet::new(rows, columns, total, query.offset(), query.limit())
}
