//! Module: query::expr
//! Responsibility: the expression tree, its static kinds, and checked
//! constructors that reject ill-typed composition at build time.
//! Does not own: evaluation (executor) or alias binding checks (descriptor).
//! Boundary: every `Expr` that leaves this module through a public
//! constructor is well-typed with respect to its children.

mod case;
mod path;
mod typed;

#[cfg(test)]
mod tests;

use crate::{
    db::query::{
        Alias, BuildError, OrderSpec, Subquery,
        descriptor::{NullOrdering, OrderDirection},
    },
    entity::EntityKey,
    model::ScalarKind,
    value::Value,
};
use std::{fmt, sync::Arc};

// re-exports
pub use case::{CaseExpr, SearchedCase, SimpleCase};
pub use path::{AssociationPath, EntityPath};
pub use typed::{KeyExpr, NumberExpr, StringExpr};

///
/// ExprKind
///
/// Static result kind of an expression.
/// `Null` is the kind of an untyped null literal and unifies with anything.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExprKind {
    Null,
    Scalar(ScalarKind),
    Entity(&'static str),
}

impl ExprKind {
    pub const BOOL: Self = Self::Scalar(ScalarKind::Bool);
    pub const FLOAT: Self = Self::Scalar(ScalarKind::Float);
    pub const INT: Self = Self::Scalar(ScalarKind::Int);
    pub const KEY: Self = Self::Scalar(ScalarKind::Key);
    pub const TEXT: Self = Self::Scalar(ScalarKind::Text);

    #[must_use]
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Entity(entity) => Self::Entity(entity.model().name),
            other => other.scalar_kind().map_or(Self::Null, Self::Scalar),
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Null | Self::Scalar(ScalarKind::Int | ScalarKind::Float))
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Null | Self::Scalar(ScalarKind::Text))
    }

    #[must_use]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Null | Self::Scalar(ScalarKind::Bool))
    }

    #[must_use]
    pub const fn is_key(self) -> bool {
        matches!(self, Self::Null | Self::Scalar(ScalarKind::Key))
    }

    /// Scalars and nulls have a total order; entities only support equality.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        !matches!(self, Self::Entity(_))
    }

    #[must_use]
    pub fn is_comparable_with(self, other: Self) -> bool {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => true,
            (Self::Scalar(a), Self::Scalar(b)) => a.is_comparable_with(b),
            (Self::Entity(a), Self::Entity(b)) => a == b,
            _ => false,
        }
    }

    /// Common kind of two branches; numeric kinds widen to float.
    #[must_use]
    pub fn unify(self, other: Self) -> Option<Self> {
        match (self, other) {
            (Self::Null, kind) | (kind, Self::Null) => Some(kind),
            (a, b) if a == b => Some(a),
            (Self::Scalar(a), Self::Scalar(b)) if a.is_numeric() && b.is_numeric() => {
                Some(Self::FLOAT)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Entity(name) => write!(f, "entity {name}"),
        }
    }
}

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Goe,
    Lt,
    Loe,
}

impl CompareOp {
    /// Ordering comparisons need a total order on both operands.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Gt | Self::Goe | Self::Lt | Self::Loe)
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Goe => ">=",
            Self::Lt => "<",
            Self::Loe => "<=",
        }
    }
}

///
/// ArithOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    Compare(CompareOp),
    Arith(ArithOp),
    And,
    Or,
    Concat,
    StartsWith,
    Contains,
}

///
/// UnaryOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
    ToText,
}

///
/// AggregateFunc
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

///
/// FieldPath
///
/// A scalar field reached from a bound alias, optionally through a chain
/// of to-one associations (`member.team.name`).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldPath {
    pub(crate) alias: Alias,
    pub(crate) root: &'static str,
    pub(crate) via: Vec<&'static str>,
    pub(crate) field: &'static str,
    pub(crate) kind: ScalarKind,
}

impl FieldPath {
    #[must_use]
    pub const fn alias(&self) -> &Alias {
        &self.alias
    }

    /// Entity type the alias is expected to be bound to.
    #[must_use]
    pub const fn root(&self) -> &'static str {
        self.root
    }

    #[must_use]
    pub fn via(&self) -> &[&'static str] {
        &self.via
    }

    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alias)?;
        for hop in &self.via {
            write!(f, ".{hop}")?;
        }

        write!(f, ".{}", self.field)
    }
}

///
/// EntityRef
/// A whole bound entity used as an expression (projection, count, equality).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityRef {
    pub(crate) alias: Alias,
    pub(crate) entity: &'static str,
}

impl EntityRef {
    #[must_use]
    pub const fn alias(&self) -> &Alias {
        &self.alias
    }

    #[must_use]
    pub const fn entity(&self) -> &'static str {
        self.entity
    }
}

///
/// Expr
///
/// Untyped expression tree. The typed wrappers (`NumberExpr`, `StringExpr`,
/// `KeyExpr`, `Predicate`) are the usual way in; the checked constructors
/// here are for composition that the wrappers cannot express statically.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Literal(Value),
    Field(FieldPath),
    Entity(EntityRef),
    Unary {
        op: UnaryOp,
        expr: Box<Self>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Between {
        expr: Box<Self>,
        low: Box<Self>,
        high: Box<Self>,
    },
    InList {
        expr: Box<Self>,
        list: Vec<Self>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Self>,
        subquery: Subquery,
        negated: bool,
    },
    Exists(Subquery),
    Aggregate {
        func: AggregateFunc,
        arg: Option<Box<Self>>,
    },
    Case(Box<CaseExpr>),
    Subquery(Subquery),
    Labeled {
        expr: Box<Self>,
        label: Arc<str>,
    },
}

impl Expr {
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Value::Null)
    }

    /// Static result kind.
    #[must_use]
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Literal(value) => ExprKind::of_value(value),
            Self::Field(path) => ExprKind::Scalar(path.kind),
            Self::Entity(entity) => ExprKind::Entity(entity.entity),
            Self::Unary { op, expr } => match op {
                UnaryOp::Not | UnaryOp::IsNull | UnaryOp::IsNotNull => ExprKind::BOOL,
                UnaryOp::Neg => expr.kind(),
                UnaryOp::ToText => ExprKind::TEXT,
            },
            Self::Binary { op, left, right } => match op {
                BinaryOp::Compare(_)
                | BinaryOp::And
                | BinaryOp::Or
                | BinaryOp::StartsWith
                | BinaryOp::Contains => ExprKind::BOOL,
                BinaryOp::Concat => ExprKind::TEXT,
                BinaryOp::Arith(_) => numeric_result(left.kind(), right.kind()),
            },
            Self::Between { .. } | Self::InList { .. } | Self::InSubquery { .. } => ExprKind::BOOL,
            Self::Exists(_) => ExprKind::BOOL,
            Self::Aggregate { func, arg } => match func {
                AggregateFunc::Count => ExprKind::INT,
                AggregateFunc::Avg => ExprKind::FLOAT,
                AggregateFunc::Sum | AggregateFunc::Min | AggregateFunc::Max => {
                    arg.as_ref().map_or(ExprKind::Null, |arg| arg.kind())
                }
            },
            Self::Case(case) => case.kind(),
            Self::Subquery(subquery) => subquery.kind(),
            Self::Labeled { expr, .. } => expr.kind(),
        }
    }

    /// Comparison of two operands with compatible kinds.
    pub fn compare(
        op: CompareOp,
        left: impl Into<Self>,
        right: impl Into<Self>,
    ) -> Result<Self, BuildError> {
        Self::binary(BinaryOp::Compare(op), left.into(), right.into()).checked()
    }

    /// Numeric arithmetic. `int op int` stays int; anything with a float is float.
    pub fn arithmetic(
        op: ArithOp,
        left: impl Into<Self>,
        right: impl Into<Self>,
    ) -> Result<Self, BuildError> {
        Self::binary(BinaryOp::Arith(op), left.into(), right.into()).checked()
    }

    pub fn concat(left: impl Into<Self>, right: impl Into<Self>) -> Result<Self, BuildError> {
        Self::binary(BinaryOp::Concat, left.into(), right.into()).checked()
    }

    pub fn and(left: impl Into<Self>, right: impl Into<Self>) -> Result<Self, BuildError> {
        Self::binary(BinaryOp::And, left.into(), right.into()).checked()
    }

    pub fn or(left: impl Into<Self>, right: impl Into<Self>) -> Result<Self, BuildError> {
        Self::binary(BinaryOp::Or, left.into(), right.into()).checked()
    }

    pub fn not(expr: impl Into<Self>) -> Result<Self, BuildError> {
        Self::unary(UnaryOp::Not, expr.into()).checked()
    }

    /// Text rendering of a scalar (`member.age.stringValue()`).
    pub fn to_text(expr: impl Into<Self>) -> Result<Self, BuildError> {
        Self::unary(UnaryOp::ToText, expr.into()).checked()
    }

    #[must_use]
    pub fn is_null(expr: impl Into<Self>) -> Self {
        Self::unary(UnaryOp::IsNull, expr.into())
    }

    #[must_use]
    pub fn is_not_null(expr: impl Into<Self>) -> Self {
        Self::unary(UnaryOp::IsNotNull, expr.into())
    }

    /// Inclusive range test.
    pub fn between(
        expr: impl Into<Self>,
        low: impl Into<Self>,
        high: impl Into<Self>,
    ) -> Result<Self, BuildError> {
        Self::Between {
            expr: Box::new(expr.into()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
        }
        .checked()
    }

    pub fn in_list<I>(expr: impl Into<Self>, list: I, negated: bool) -> Result<Self, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        Self::InList {
            expr: Box::new(expr.into()),
            list: list.into_iter().map(Into::into).collect(),
            negated,
        }
        .checked()
    }

    /// Membership in a single-column subquery. Column count is checked at
    /// plan time; only the kind is checked here.
    pub fn in_subquery(
        expr: impl Into<Self>,
        subquery: &Subquery,
        negated: bool,
    ) -> Result<Self, BuildError> {
        Self::InSubquery {
            expr: Box::new(expr.into()),
            subquery: subquery.clone(),
            negated,
        }
        .checked()
    }

    /// Aggregate call. `arg = None` is only valid for `count(*)`.
    pub fn aggregate(func: AggregateFunc, arg: Option<Self>) -> Result<Self, BuildError> {
        Self::Aggregate {
            func,
            arg: arg.map(Box::new),
        }
        .checked()
    }

    /// `count(*)`.
    #[must_use]
    pub const fn count_all() -> Self {
        Self::Aggregate {
            func: AggregateFunc::Count,
            arg: None,
        }
    }

    /// Scalar subquery used as a value.
    #[must_use]
    pub fn subquery(subquery: &Subquery) -> Self {
        Self::Subquery(subquery.clone())
    }

    /// Attach a result label, replacing any existing one.
    #[must_use]
    pub fn as_(self, label: &str) -> Self {
        Self::Labeled {
            expr: Box::new(self.unlabeled().clone()),
            label: Arc::from(label),
        }
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Labeled { label, .. } => Some(label),
            _ => None,
        }
    }

    /// The expression without its label.
    #[must_use]
    pub fn unlabeled(&self) -> &Self {
        match self {
            Self::Labeled { expr, .. } => expr.unlabeled(),
            other => other,
        }
    }

    #[must_use]
    pub fn asc(self) -> OrderSpec {
        OrderSpec::new(self, OrderDirection::Asc)
    }

    #[must_use]
    pub fn desc(self) -> OrderSpec {
        OrderSpec::new(self, OrderDirection::Desc)
    }

    /// Order key with an explicit null placement.
    #[must_use]
    pub fn order(self, direction: OrderDirection, nulls: NullOrdering) -> OrderSpec {
        OrderSpec::new(self, direction).nulls(nulls)
    }

    /// Direct children, case branches included. Subquery bodies are not
    /// children; they are separate scopes.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Literal(_)
            | Self::Field(_)
            | Self::Entity(_)
            | Self::Exists(_)
            | Self::Subquery(_) => Vec::new(),
            Self::Unary { expr, .. }
            | Self::Labeled { expr, .. }
            | Self::InSubquery { expr, .. } => vec![expr],
            Self::Binary { left, right, .. } => vec![left, right],
            Self::Between { expr, low, high } => vec![expr, low, high],
            Self::InList { expr, list, .. } => {
                let mut children = vec![expr.as_ref()];
                children.extend(list);
                children
            }
            Self::Aggregate { arg, .. } => arg.iter().map(AsRef::as_ref).collect(),
            Self::Case(case) => case.children(),
        }
    }

    /// Subqueries referenced directly by this tree (not nested ones).
    #[must_use]
    pub fn subqueries(&self) -> Vec<&Subquery> {
        let mut out = Vec::new();
        self.collect_subqueries(&mut out);

        out
    }

    fn collect_subqueries<'a>(&'a self, out: &mut Vec<&'a Subquery>) {
        match self {
            Self::Exists(subquery) | Self::Subquery(subquery) => out.push(subquery),
            Self::InSubquery { subquery, .. } => out.push(subquery),
            _ => {}
        }
        for child in self.children() {
            child.collect_subqueries(out);
        }
    }

    /// Whether an aggregate call appears anywhere outside nested subqueries.
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate { .. })
            || self.children().into_iter().any(Self::contains_aggregate)
    }

    /// Aliases read by this tree, nested subqueries excluded.
    pub(crate) fn collect_aliases<'a>(&'a self, out: &mut Vec<&'a Alias>) {
        match self {
            Self::Field(path) => out.push(&path.alias),
            Self::Entity(entity) => out.push(&entity.alias),
            _ => {}
        }
        for child in self.children() {
            child.collect_aliases(out);
        }
    }

    pub(crate) fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub(crate) fn unary(op: UnaryOp, expr: Self) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    fn checked(self) -> Result<Self, BuildError> {
        self.check_node()?;

        Ok(self)
    }

    /// Operand-kind rules of this node alone; children are not visited.
    /// Every checked constructor applies these, and build validation
    /// re-applies them so hand-assembled trees get the same checks.
    pub(crate) fn check_node(&self) -> Result<(), BuildError> {
        match self {
            Self::Unary { op, expr } => match op {
                UnaryOp::Not => expect_kind("not", expr, "bool", ExprKind::is_bool),
                UnaryOp::Neg => expect_kind("negation", expr, "number", ExprKind::is_numeric),
                UnaryOp::ToText if matches!(expr.kind(), ExprKind::Entity(_)) => Err(
                    BuildError::type_mismatch("string value", "scalar", expr.kind()),
                ),
                UnaryOp::ToText | UnaryOp::IsNull | UnaryOp::IsNotNull => Ok(()),
            },
            Self::Binary { op, left, right } => check_binary(*op, left, right),
            Self::Between { expr, low, high } => {
                for bound in [low, high] {
                    if !expr.kind().is_orderable() || !expr.kind().is_comparable_with(bound.kind())
                    {
                        return Err(BuildError::type_mismatch(
                            "between",
                            expr.kind().to_string(),
                            bound.kind(),
                        ));
                    }
                }
                Ok(())
            }
            Self::InList { expr, list, .. } => list.iter().try_for_each(|item| {
                if expr.kind().is_comparable_with(item.kind()) {
                    Ok(())
                } else {
                    Err(BuildError::type_mismatch(
                        "in list",
                        expr.kind().to_string(),
                        item.kind(),
                    ))
                }
            }),
            Self::InSubquery { expr, subquery, .. } => {
                if expr.kind().is_comparable_with(subquery.kind()) {
                    Ok(())
                } else {
                    Err(BuildError::type_mismatch(
                        "in subquery",
                        expr.kind().to_string(),
                        subquery.kind(),
                    ))
                }
            }
            Self::Aggregate { func, arg } => check_aggregate(*func, arg.as_deref()),
            Self::Case(case) => case.check().map(|_| ()),
            Self::Literal(_)
            | Self::Field(_)
            | Self::Entity(_)
            | Self::Exists(_)
            | Self::Subquery(_)
            | Self::Labeled { .. } => Ok(()),
        }
    }

    /// `check_node` over this node and every descendant, stopping at
    /// subquery boundaries.
    pub(crate) fn check_tree(&self) -> Result<(), BuildError> {
        self.check_node()?;

        self.children().into_iter().try_for_each(Self::check_tree)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Field(path) => write!(f, "{path}"),
            Self::Entity(entity) => write!(f, "{}", entity.alias),
            Self::Unary { op, expr } => match op {
                UnaryOp::Not => write!(f, "not({expr})"),
                UnaryOp::Neg => write!(f, "-({expr})"),
                UnaryOp::IsNull => write!(f, "{expr} is null"),
                UnaryOp::IsNotNull => write!(f, "{expr} is not null"),
                UnaryOp::ToText => write!(f, "str({expr})"),
            },
            Self::Binary { op, left, right } => match op {
                BinaryOp::Compare(op) => write!(f, "{left} {} {right}", op.symbol()),
                BinaryOp::Arith(op) => write!(f, "({left} {} {right})", op.symbol()),
                BinaryOp::And => write!(f, "({left} and {right})"),
                BinaryOp::Or => write!(f, "({left} or {right})"),
                BinaryOp::Concat => write!(f, "concat({left}, {right})"),
                BinaryOp::StartsWith => write!(f, "{left} like {right}%"),
                BinaryOp::Contains => write!(f, "{left} like %{right}%"),
            },
            Self::Between { expr, low, high } => write!(f, "{expr} between {low} and {high}"),
            Self::InList {
                expr,
                list,
                negated,
            } => {
                let items: Vec<String> = list.iter().map(ToString::to_string).collect();
                let not = if *negated { "not " } else { "" };
                write!(f, "{expr} {not}in ({})", items.join(", "))
            }
            Self::InSubquery { expr, negated, .. } => {
                let not = if *negated { "not " } else { "" };
                write!(f, "{expr} {not}in (subquery)")
            }
            Self::Exists(_) => write!(f, "exists (subquery)"),
            Self::Aggregate { func, arg } => match arg {
                Some(arg) => write!(f, "{}({arg})", func.name()),
                None => write!(f, "{}(*)", func.name()),
            },
            Self::Case(_) => write!(f, "case"),
            Self::Subquery(_) => write!(f, "(subquery)"),
            Self::Labeled { expr, label } => write!(f, "{expr} as {label}"),
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

macro_rules! impl_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self::Literal(Value::from(value))
                }
            }
        )*
    };
}

impl_from_literal!(bool, i32, i64, u32, f64, &str, String, EntityKey);

fn numeric_result(left: ExprKind, right: ExprKind) -> ExprKind {
    match (left, right) {
        (ExprKind::Null, kind) | (kind, ExprKind::Null) => kind,
        (ExprKind::INT, ExprKind::INT) => ExprKind::INT,
        _ => ExprKind::FLOAT,
    }
}

fn check_binary(op: BinaryOp, left: &Expr, right: &Expr) -> Result<(), BuildError> {
    let (lk, rk) = (left.kind(), right.kind());
    match op {
        BinaryOp::Compare(op) => {
            if !lk.is_comparable_with(rk) {
                return Err(BuildError::type_mismatch("comparison", lk.to_string(), rk));
            }
            if op.is_ordering() && !(lk.is_orderable() && rk.is_orderable()) {
                return Err(BuildError::type_mismatch("ordering comparison", "scalar", lk));
            }
            Ok(())
        }
        BinaryOp::Arith(_) => {
            expect_kind("arithmetic", left, "number", ExprKind::is_numeric)?;
            expect_kind("arithmetic", right, "number", ExprKind::is_numeric)
        }
        BinaryOp::Concat => {
            expect_kind("concat", left, "text", ExprKind::is_text)?;
            expect_kind("concat", right, "text", ExprKind::is_text)
        }
        BinaryOp::StartsWith | BinaryOp::Contains => {
            expect_kind("text match", left, "text", ExprKind::is_text)?;
            expect_kind("text match", right, "text", ExprKind::is_text)
        }
        BinaryOp::And | BinaryOp::Or => {
            expect_kind("logical operator", left, "bool", ExprKind::is_bool)?;
            expect_kind("logical operator", right, "bool", ExprKind::is_bool)
        }
    }
}

fn check_aggregate(func: AggregateFunc, arg: Option<&Expr>) -> Result<(), BuildError> {
    let Some(arg) = arg else {
        return match func {
            AggregateFunc::Count => Ok(()),
            _ => Err(BuildError::type_mismatch(func.name(), "argument", "none")),
        };
    };

    match func {
        AggregateFunc::Count => Ok(()),
        AggregateFunc::Sum | AggregateFunc::Avg => {
            expect_kind(func.name(), arg, "number", ExprKind::is_numeric)
        }
        AggregateFunc::Min | AggregateFunc::Max if !arg.kind().is_orderable() => Err(
            BuildError::type_mismatch(func.name(), "scalar", arg.kind()),
        ),
        AggregateFunc::Min | AggregateFunc::Max => Ok(()),
    }
}

fn expect_kind(
    context: &'static str,
    expr: &Expr,
    expected: &'static str,
    check: fn(ExprKind) -> bool,
) -> Result<(), BuildError> {
    if check(expr.kind()) {
        Ok(())
    } else {
        Err(BuildError::type_mismatch(context, expected, expr.kind()))
    }
}
