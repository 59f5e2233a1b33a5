use crate::db::query::expr::Expr;
use serde::{Deserialize, Serialize};

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

///
/// NullOrdering
///
/// Placement of null sort keys relative to non-null ones, independent of
/// direction: `First` puts nulls first for both `asc` and `desc`.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NullOrdering {
    First,
    Last,
}

///
/// OrderSpec
///
/// One sort key. `nulls = None` defers to the executor config, then to the
/// store's natural ordering.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderSpec {
    expr: Expr,
    direction: OrderDirection,
    nulls: Option<NullOrdering>,
}

impl OrderSpec {
    #[must_use]
    pub const fn new(expr: Expr, direction: OrderDirection) -> Self {
        Self {
            expr,
            direction,
            nulls: None,
        }
    }

    #[must_use]
    pub const fn nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = Some(nulls);
        self
    }

    #[must_use]
    pub const fn nulls_first(self) -> Self {
        self.nulls(NullOrdering::First)
    }

    #[must_use]
    pub const fn nulls_last(self) -> Self {
        self.nulls(NullOrdering::Last)
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub const fn direction(&self) -> OrderDirection {
        self.direction
    }

    #[must_use]
    pub const fn null_ordering(&self) -> Option<NullOrdering> {
        self.nulls
    }
}
