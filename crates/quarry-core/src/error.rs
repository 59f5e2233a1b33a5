use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use crate::{
    config::ConfigError,
    db::{
        executor::{ExecutionError, PlanError},
        query::BuildError,
        response::{CardinalityError, ProjectionError},
        store::StoreError,
    },
    entity::EntityError,
    value::NonFiniteFloat,
};

///
/// QueryError
///
/// Top-level error surface for building, planning, and executing queries.
///
/// Build and plan failures are caller logic errors and are never retried.
/// Execution failures wrap the backing store as-is; retry policy belongs to
/// the store, not to this crate.
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Plan(#[from] PlanError),

    #[error("{0}")]
    Execution(#[from] ExecutionError),

    #[error("{0}")]
    Cardinality(#[from] CardinalityError),

    #[error("{0}")]
    Projection(#[from] ProjectionError),
}

impl QueryError {
    /// Stable classification of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Build(_) => ErrorClass::Build,
            Self::Plan(_) => ErrorClass::Plan,
            Self::Execution(_) => ErrorClass::Execution,
            Self::Cardinality(_) => ErrorClass::Cardinality,
            Self::Projection(_) => ErrorClass::Projection,
        }
    }

    /// True when the execution was abandoned through a cancel token.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Cancelled))
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        Self::Execution(ExecutionError::Store(err))
    }
}

///
/// ErrorClass
///
/// Build and Plan are raised before any row is read; Execution is raised
/// while reading; Cardinality and Projection are raised while shaping the
/// result for the caller.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    Build,
    Plan,
    Execution,
    Cardinality,
    Projection,
}

impl ErrorClass {
    /// Build- and plan-time failures are rejected before execution starts.
    #[must_use]
    pub const fn is_pre_execution(self) -> bool {
        matches!(self, Self::Build | Self::Plan)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Build => "build",
            Self::Plan => "plan",
            Self::Execution => "execution",
            Self::Cardinality => "cardinality",
            Self::Projection => "projection",
        };

        write!(f, "{label}")
    }
}
