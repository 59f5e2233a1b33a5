
use crate::db::query::{
    BuildError,
    expr::{BinaryOp, Expr, ExprKind, UnaryOp},
};
use std::{
    fmt,
    ops::{BitAnd, BitOr, Not},
};

///
/// Predicate
///
/// Boolean-valued expression evaluated under three-valued logic.
/// Composition is explicit nesting: `a.and(b).and(c)` is `((a and b) and c)`,
/// and `Predicate::all` folds in the same left-deep shape.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Predicate(Expr);

impl Predicate {
    pub(crate) const fn from_expr_unchecked(expr: Expr) -> Self {
        Self(expr)
    }

    /// Wrap a boolean-kinded expression.
    pub fn try_new(expr: Expr) -> Result<Self, BuildError> {
        if expr.kind().is_bool() {
            expr.check_tree()?;
            Ok(Self(expr))
        } else {
            Err(BuildError::type_mismatch("predicate", "bool", expr.kind()))
        }
    }

    #[must_use]
    pub fn literal(value: bool) -> Self {
        Self(Expr::literal(value))
    }

    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.0
    }

    #[must_use]
    pub fn into_expr(self) -> Expr {
        self.0
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self(Expr::binary(BinaryOp::And, self.0, other.0))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self(Expr::binary(BinaryOp::Or, self.0, other.0))
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self(Expr::unary(UnaryOp::Not, self.0))
    }

    /// Conjunction of the present predicates; `None` when none are present.
    ///
    /// Absent entries are skipped, so optional filters can be passed
    /// through without branching at the call site.
    #[must_use]
    pub fn all<I>(predicates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<Self>>,
    {
        predicates.into_iter().flatten().reduce(Self::and)
    }

    /// Disjunction of the present predicates; `None` when none are present.
    #[must_use]
    pub fn any<I>(predicates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<Self>>,
    {
        predicates.into_iter().flatten().reduce(Self::or)
    }

    #[must_use]
    pub const fn kind(&self) -> ExprKind {
        ExprKind::BOOL
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitAnd for &Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.clone().and(rhs.clone())
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl BitOr for &Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.clone().or(rhs.clone())
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl From<Predicate> for Expr {
    fn from(predicate: Predicate) -> Self {
        predicate.0
    }
}

impl From<&Predicate> for Expr {
    fn from(predicate: &Predicate) -> Self {
        predicate.0.clone()
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Self::literal(value)
    }
}

impl TryFrom<Expr> for Predicate {
    type Error = BuildError;

    fn try_from(expr: Expr) -> Result<Self, Self::Error> {
        Self::try_new(expr)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
