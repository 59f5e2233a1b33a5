//! Module: response
//! Responsibility: result rows and their mapping into scalars, tuples,
//! entities, and caller-defined records.
//! Does not own: evaluation; every value here is already computed.
//! Boundary: cardinality and projection failures are raised here, after
//! execution has completed.

mod project;


use crate::{db::query::Expr, entity::Entity, value::Value};
use derive_more::{Deref, IntoIterator};
use std::sync::Arc;
use thiserror::Error as ThisError;

// re-exports
pub use project::{FromRow, FromValue};

///
/// CardinalityError
///
/// A single-row surface saw a different number of rows.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CardinalityError {
    #[error("expected exactly one row, found 0")]
    NotFound,

    #[error("expected at most one row, found {found}")]
    NotUnique { found: usize },
}

///
/// ProjectionError
///
/// A result row could not be mapped into the requested shape.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ProjectionError {
    #[error("projection has {columns} column(s); entity mapping needs exactly one entity column")]
    NotAnEntityProjection { columns: usize },

    #[error("result row has no column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}' holds {found}, expected {expected}")]
    KindMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
}

///
/// Row
///
/// One result tuple. Values line up with the projection; columns can be
/// read by position, by expression, or by label.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    columns: Arc<[Expr]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) const fn new(columns: Arc<[Expr]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the first column projecting `expr`. Labels are ignored on
    /// both sides.
    #[must_use]
    pub fn get_expr(&self, expr: impl Into<Expr>) -> Option<&Value> {
        let expr = expr.into();

        self.position(|column| column.unlabeled() == expr.unlabeled())
            .and_then(|index| self.values.get(index))
    }

    /// Value of the column labelled `name`. Unlabelled field columns answer
    /// to their field name.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.position(|column| column.label() == Some(name))
            .or_else(|| {
                self.position(|column| {
                    matches!(column, Expr::Field(path) if path.field() == name)
                })
            })
            .and_then(|index| self.values.get(index))
    }

    /// Typed read by position.
    pub fn get_as<T: FromValue>(&self, index: usize) -> Result<T, ProjectionError> {
        let value = self.get(index).ok_or_else(|| ProjectionError::MissingColumn {
            column: format!("#{index}"),
        })?;

        convert(value, || format!("#{index}"))
    }

    /// Typed read by label.
    pub fn named_as<T: FromValue>(&self, name: &str) -> Result<T, ProjectionError> {
        let value = self.named(name).ok_or_else(|| ProjectionError::MissingColumn {
            column: name.to_string(),
        })?;

        convert(value, || name.to_string())
    }

    #[must_use]
    pub fn columns(&self) -> &[Expr] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn position(&self, matches: impl Fn(&Expr) -> bool) -> Option<usize> {
        self.columns.iter().position(matches)
    }
}

fn convert<T: FromValue>(
    value: &Value,
    column: impl FnOnce() -> String,
) -> Result<T, ProjectionError> {
    T::from_value(value).ok_or_else(|| ProjectionError::KindMismatch {
        column: column(),
        expected: T::EXPECTED,
        found: value.type_name(),
    })
}

///
/// ResultSet
///
/// Rows of one execution in query order. `total` is present only for
/// paged executions and counts rows before offset and limit.
///

#[derive(Clone, Debug, Deref, IntoIterator)]
pub struct ResultSet {
    #[deref]
    #[into_iterator(owned, ref)]
    rows: Vec<Row>,
    columns: Arc<[Expr]>,
    total: Option<u64>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl ResultSet {
    pub(crate) const fn new(
        rows: Vec<Row>,
        columns: Arc<[Expr]>,
        total: Option<u64>,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Self {
        Self {
            rows,
            columns,
            total,
            offset,
            limit,
        }
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn total(&self) -> Option<u64> {
        self.total
    }

    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        self.offset
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub fn columns(&self) -> &[Expr] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    // ------------------------------------------------------------------
    // Exact cardinality
    // ------------------------------------------------------------------

    /// Require exactly one row.
    pub fn one(self) -> Result<Row, CardinalityError> {
        self.one_opt()?.ok_or(CardinalityError::NotFound)
    }

    /// Require at most one row.
    pub fn one_opt(self) -> Result<Option<Row>, CardinalityError> {
        match self.rows.len() {
            0 | 1 => Ok(self.rows.into_iter().next()),
            found => Err(CardinalityError::NotUnique { found }),
        }
    }

    // ------------------------------------------------------------------
    // Projection
    // ------------------------------------------------------------------

    /// Entities of a single entity-typed projection, in row order.
    /// A null entity (unmatched left join) is a kind mismatch.
    pub fn into_entities(self) -> Result<Vec<Entity>, ProjectionError> {
        let [column] = &*self.columns else {
            return Err(ProjectionError::NotAnEntityProjection {
                columns: self.columns.len(),
            });
        };
        if !matches!(column.unlabeled(), Expr::Entity(_)) {
            return Err(ProjectionError::NotAnEntityProjection { columns: 1 });
        }

        self.rows.into_iter().map(|row| row.get_as(0)).collect()
    }

    /// The first column of every row.
    pub fn scalars<T: FromValue>(&self) -> Result<Vec<T>, ProjectionError> {
        self.rows.iter().map(|row| row.get_as(0)).collect()
    }

    /// Map every row through a caller-defined record type.
    pub fn project<T: FromRow>(&self) -> Result<Vec<T>, ProjectionError> {
        self.rows.iter().map(T::from_row).collect()
    }
}
