mod properties;

use crate::{
    config::ExecutorConfig,
    db::{
        executor::{
            CancelToken, ExecutionError, Executor, PlanError, QueryState, QueryTraceEvent,
            TracePhase,
        },
        query::{
            BuildError, Expr, JoinSpec, NullOrdering, NumberExpr, OrderDirection, Predicate,
            Query, QueryDescriptor, SearchedCase, SimpleCase, Subquery,
        },
        response::{CardinalityError, ResultSet},
        store::{MemoryStore, RawRow, Store, StoreError},
    },
    entity::{Entity, Related},
    error::{ErrorClass, QueryError},
    test_support::{
        Fixture, QMember, QTeam, RecordingSink, member, seeded, team, team_name_of,
    },
    value::Value,
};

fn run(store: &MemoryStore, query: &Query) -> ResultSet {
    let descriptor = query.build().expect("query should build");

    Executor::new(store)
        .execute(&descriptor)
        .expect("execution should succeed")
}

fn run_err(store: &MemoryStore, query: &Query) -> QueryError {
    Executor::new(store)
        .execute(query.descriptor())
        .expect_err("execution should fail")
}

fn usernames(rows: &ResultSet) -> Vec<Option<String>> {
    rows.scalars::<Option<String>>()
        .expect("first column should be text")
}

fn ints(rows: &ResultSet) -> Vec<i64> {
    rows.scalars::<i64>().expect("first column should be int")
}

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

/// Store that serves the fixture but fails every association lookup.
struct NoResolveStore(MemoryStore);

impl Store for NoResolveStore {
    fn scan(
        &self,
        model: &'static crate::model::EntityModel,
        alias: &crate::db::query::Alias,
    ) -> Result<Vec<RawRow>, StoreError> {
        self.0.scan(model, alias)
    }

    fn resolve_association(&self, _: &Entity, _: &str) -> Result<Related, StoreError> {
        Err(StoreError::Unavailable {
            message: "lazy resolution disabled".to_string(),
        })
    }
}

/// Store whose scans always fail.
struct DownStore;

impl Store for DownStore {
    fn scan(
        &self,
        _: &'static crate::model::EntityModel,
        _: &crate::db::query::Alias,
    ) -> Result<Vec<RawRow>, StoreError> {
        Err(StoreError::Unavailable {
            message: "connection refused".to_string(),
        })
    }

    fn resolve_association(&self, _: &Entity, _: &str) -> Result<Related, StoreError> {
        Ok(Related::One(None))
    }
}
