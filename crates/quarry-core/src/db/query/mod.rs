//! Module: query
//! Responsibility: typed expression trees, predicates, subqueries, and the
//! immutable query descriptor with its build-time validation.
//! Does not own: planning, execution, or result shaping.
//! Boundary: everything here is a value; nothing reads from a store.

mod alias;
mod descriptor;
mod error;
mod expr;
mod fingerprint;
mod predicate;
mod subquery;

// re-exports
pub use alias::Alias;
pub use descriptor::{
    IntoProjection, JoinKind, JoinSpec, NullOrdering, OrderDirection, OrderSpec, Query,
    QueryDescriptor, Source,
};
pub use error::BuildError;
pub use expr::{
    AggregateFunc, ArithOp, AssociationPath, BinaryOp, CaseExpr, CompareOp, EntityPath,
    EntityRef, Expr, ExprKind, FieldPath, KeyExpr, NumberExpr, SearchedCase, SimpleCase,
    StringExpr, UnaryOp,
};
pub use fingerprint::QueryFingerprint;
pub use predicate::Predicate;
pub use subquery::{Subquery, exists};
