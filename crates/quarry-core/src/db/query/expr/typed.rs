use crate::{
    db::query::{
        BuildError, OrderSpec, Predicate, Subquery,
        expr::{AggregateFunc, ArithOp, BinaryOp, CompareOp, Expr, ExprKind, UnaryOp},
    },
    entity::EntityKey,
    value::Value,
};
use std::fmt;

///
/// NumberExpr
///
/// Int- or float-valued expression. Comparisons and arithmetic between two
/// `NumberExpr`s are well-typed by construction.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NumberExpr(Expr);

///
/// StringExpr
/// Text-valued expression.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StringExpr(Expr);

///
/// KeyExpr
/// Identity or foreign-key valued expression.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyExpr(Expr);

// Shared surface of the typed wrappers. The inherent `eq`/`ne` take
// precedence over `PartialEq` in method-call position.
macro_rules! typed_expr {
    ($ty:ident, $context:literal, $check:path) => {
        impl $ty {
            pub(crate) const fn from_expr_unchecked(expr: Expr) -> Self {
                Self(expr)
            }

            #[must_use]
            pub const fn expr(&self) -> &Expr {
                &self.0
            }

            #[must_use]
            pub fn into_expr(self) -> Expr {
                self.0
            }

            /// Typed null literal.
            #[must_use]
            pub const fn null() -> Self {
                Self(Expr::null())
            }

            // ------------------------------------------------------------------
            // Comparison predicates
            // ------------------------------------------------------------------

            #[must_use]
            pub fn eq(&self, rhs: impl Into<Self>) -> Predicate {
                self.compare(CompareOp::Eq, rhs)
            }

            #[must_use]
            pub fn ne(&self, rhs: impl Into<Self>) -> Predicate {
                self.compare(CompareOp::Ne, rhs)
            }

            #[must_use]
            pub fn gt(&self, rhs: impl Into<Self>) -> Predicate {
                self.compare(CompareOp::Gt, rhs)
            }

            /// Greater than or equal.
            #[must_use]
            pub fn goe(&self, rhs: impl Into<Self>) -> Predicate {
                self.compare(CompareOp::Goe, rhs)
            }

            #[must_use]
            pub fn lt(&self, rhs: impl Into<Self>) -> Predicate {
                self.compare(CompareOp::Lt, rhs)
            }

            /// Less than or equal.
            #[must_use]
            pub fn loe(&self, rhs: impl Into<Self>) -> Predicate {
                self.compare(CompareOp::Loe, rhs)
            }

            /// Inclusive range test.
            #[must_use]
            pub fn between(&self, low: impl Into<Self>, high: impl Into<Self>) -> Predicate {
                Predicate::from_expr_unchecked(Expr::Between {
                    expr: Box::new(self.0.clone()),
                    low: Box::new(low.into().0),
                    high: Box::new(high.into().0),
                })
            }

            #[must_use]
            pub fn in_list<I>(&self, values: I) -> Predicate
            where
                I: IntoIterator,
                I::Item: Into<Self>,
            {
                self.membership(values, false)
            }

            #[must_use]
            pub fn not_in<I>(&self, values: I) -> Predicate
            where
                I: IntoIterator,
                I::Item: Into<Self>,
            {
                self.membership(values, true)
            }

            /// Membership in a single-column subquery of a comparable kind.
            pub fn in_subquery(&self, subquery: &Subquery) -> Result<Predicate, BuildError> {
                Expr::in_subquery(self.0.clone(), subquery, false)
                    .map(Predicate::from_expr_unchecked)
            }

            pub fn not_in_subquery(&self, subquery: &Subquery) -> Result<Predicate, BuildError> {
                Expr::in_subquery(self.0.clone(), subquery, true)
                    .map(Predicate::from_expr_unchecked)
            }

            #[must_use]
            pub fn is_null(&self) -> Predicate {
                Predicate::from_expr_unchecked(Expr::is_null(self.0.clone()))
            }

            #[must_use]
            pub fn is_not_null(&self) -> Predicate {
                Predicate::from_expr_unchecked(Expr::is_not_null(self.0.clone()))
            }

            // ------------------------------------------------------------------
            // Aggregates
            // ------------------------------------------------------------------

            /// Count of non-null values.
            #[must_use]
            pub fn count(&self) -> NumberExpr {
                NumberExpr(self.aggregate(AggregateFunc::Count))
            }

            #[must_use]
            pub fn min(&self) -> Self {
                Self(self.aggregate(AggregateFunc::Min))
            }

            #[must_use]
            pub fn max(&self) -> Self {
                Self(self.aggregate(AggregateFunc::Max))
            }

            // ------------------------------------------------------------------
            // Projection and ordering
            // ------------------------------------------------------------------

            /// Labeled projection column.
            #[must_use]
            pub fn as_(&self, label: &str) -> Expr {
                self.0.clone().as_(label)
            }

            #[must_use]
            pub fn asc(&self) -> OrderSpec {
                self.0.clone().asc()
            }

            #[must_use]
            pub fn desc(&self) -> OrderSpec {
                self.0.clone().desc()
            }

            fn compare(&self, op: CompareOp, rhs: impl Into<Self>) -> Predicate {
                Predicate::from_expr_unchecked(Expr::binary(
                    BinaryOp::Compare(op),
                    self.0.clone(),
                    rhs.into().0,
                ))
            }

            fn membership<I>(&self, values: I, negated: bool) -> Predicate
            where
                I: IntoIterator,
                I::Item: Into<Self>,
            {
                Predicate::from_expr_unchecked(Expr::InList {
                    expr: Box::new(self.0.clone()),
                    list: values.into_iter().map(|value| value.into().0).collect(),
                    negated,
                })
            }

            fn aggregate(&self, func: AggregateFunc) -> Expr {
                Expr::Aggregate {
                    func,
                    arg: Some(Box::new(self.0.clone())),
                }
            }
        }

        impl From<&$ty> for $ty {
            fn from(value: &$ty) -> Self {
                value.clone()
            }
        }

        impl From<$ty> for Expr {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl From<&$ty> for Expr {
            fn from(value: &$ty) -> Self {
                value.0.clone()
            }
        }

        impl TryFrom<Expr> for $ty {
            type Error = BuildError;

            fn try_from(expr: Expr) -> Result<Self, Self::Error> {
                if $check(expr.kind()) {
                    expr.check_tree()?;
                    Ok(Self(expr))
                } else {
                    Err(BuildError::type_mismatch($context, stringify!($ty), expr.kind()))
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_expr!(NumberExpr, "number expression", ExprKind::is_numeric);
typed_expr!(StringExpr, "string expression", ExprKind::is_text);
typed_expr!(KeyExpr, "key expression", ExprKind::is_key);

impl NumberExpr {
    #[must_use]
    pub fn add(&self, rhs: impl Into<Self>) -> Self {
        self.arith(ArithOp::Add, rhs)
    }

    #[must_use]
    pub fn sub(&self, rhs: impl Into<Self>) -> Self {
        self.arith(ArithOp::Sub, rhs)
    }

    #[must_use]
    pub fn mul(&self, rhs: impl Into<Self>) -> Self {
        self.arith(ArithOp::Mul, rhs)
    }

    /// Division; int by int truncates, division by zero is an execution error.
    #[must_use]
    pub fn div(&self, rhs: impl Into<Self>) -> Self {
        self.arith(ArithOp::Div, rhs)
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Self(Expr::unary(UnaryOp::Neg, self.0.clone()))
    }

    #[must_use]
    pub fn sum(&self) -> Self {
        Self(self.aggregate(AggregateFunc::Sum))
    }

    /// Average; always float.
    #[must_use]
    pub fn avg(&self) -> Self {
        Self(self.aggregate(AggregateFunc::Avg))
    }

    /// Decimal text rendering of the value.
    #[must_use]
    pub fn string_value(&self) -> StringExpr {
        StringExpr(Expr::unary(UnaryOp::ToText, self.0.clone()))
    }

    fn arith(&self, op: ArithOp, rhs: impl Into<Self>) -> Self {
        Self(Expr::binary(BinaryOp::Arith(op), self.0.clone(), rhs.into().0))
    }
}

impl StringExpr {
    #[must_use]
    pub fn concat(&self, rhs: impl Into<Self>) -> Self {
        Self(Expr::binary(BinaryOp::Concat, self.0.clone(), rhs.into().0))
    }

    #[must_use]
    pub fn starts_with(&self, prefix: impl Into<Self>) -> Predicate {
        Predicate::from_expr_unchecked(Expr::binary(
            BinaryOp::StartsWith,
            self.0.clone(),
            prefix.into().0,
        ))
    }

    #[must_use]
    pub fn contains(&self, needle: impl Into<Self>) -> Predicate {
        Predicate::from_expr_unchecked(Expr::binary(
            BinaryOp::Contains,
            self.0.clone(),
            needle.into().0,
        ))
    }
}

impl From<i32> for NumberExpr {
    fn from(value: i32) -> Self {
        Self(Expr::literal(value))
    }
}

impl From<i64> for NumberExpr {
    fn from(value: i64) -> Self {
        Self(Expr::literal(value))
    }
}

impl From<u32> for NumberExpr {
    fn from(value: u32) -> Self {
        Self(Expr::literal(value))
    }
}

impl From<f64> for NumberExpr {
    fn from(value: f64) -> Self {
        Self(Expr::Literal(Value::float(value)))
    }
}

impl From<&str> for StringExpr {
    fn from(value: &str) -> Self {
        Self(Expr::literal(value))
    }
}

impl From<String> for StringExpr {
    fn from(value: String) -> Self {
        Self(Expr::literal(value))
    }
}

impl From<EntityKey> for KeyExpr {
    fn from(value: EntityKey) -> Self {
        Self(Expr::literal(value))
    }
}
