//! Core runtime for Quarry: entity models, values, typed query expressions,
//! the query descriptor builder, and the execution engine that interprets
//! descriptors against a pluggable backing store.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod model;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains the vocabulary needed to declare paths, build queries,
/// and execute them. Error types stay in `error`.
///

pub mod prelude {
    pub use crate::{
        config::ExecutorConfig,
        db::{
            executor::{CancelToken, Executor},
            query::{
                AssociationPath, EntityPath, Expr, JoinSpec, KeyExpr, NullOrdering, NumberExpr,
                OrderDirection, OrderSpec, Predicate, Query, QueryDescriptor, SearchedCase,
                SimpleCase, StringExpr, Subquery, exists,
            },
            response::{FromRow, FromValue, ResultSet, Row},
            store::{MemoryStore, Store},
        },
        entity::{AssociationState, Entity, EntityKey, Related},
        model::{AssociationKind, AssociationModel, EntityModel, FieldModel, ScalarKind},
        value::Value,
    };
}
