//! Expression evaluation over one row scope.
//!
//! Null semantics follow SQL three-valued logic: comparisons and arithmetic
//! involving null yield null, `and`/`or` short-circuit on a decisive side,
//! and filters keep only rows that evaluate to `true`.

use crate::{
    db::{
        executor::{
            ExecutionError,
            context::{ExecutionContext, RowScope},
        },
        query::{
            AggregateFunc, Alias, ArithOp, BinaryOp, CaseExpr, CompareOp, Expr, ExprKind,
            FieldPath, Subquery, UnaryOp,
        },
        response::CardinalityError,
    },
    entity::Entity,
    error::QueryError,
    value::{Float64, Value, compare_values, values_equal},
};
use std::{borrow::Cow, cmp::Ordering, num::FpCategory};

impl ExecutionContext<'_> {
    /// Evaluate a boolean expression as a row filter: only `true` passes.
    pub(super) fn eval_predicate(
        &self,
        expr: &Expr,
        scope: &RowScope<'_>,
    ) -> Result<bool, QueryError> {
        Ok(truth(&self.eval(expr, scope)?) == Some(true))
    }

    pub(super) fn eval(&self, expr: &Expr, scope: &RowScope<'_>) -> Result<Value, QueryError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Field(path) => self.eval_field(path, scope),
            Expr::Entity(entity) => Ok(bound(scope, entity.alias())?
                .map_or(Value::Null, |entity| Value::Entity(Box::new(entity.clone())))),
            Expr::Unary { op, expr: inner } => {
                let value = self.eval(inner, scope)?;
                eval_unary(*op, value, expr)
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, expr, scope),
            Expr::Between {
                expr: inner,
                low,
                high,
            } => {
                let value = self.eval(inner, scope)?;
                let low = self.eval(low, scope)?;
                let high = self.eval(high, scope)?;

                Ok(bool_value(and3(
                    compare(CompareOp::Goe, &value, &low),
                    compare(CompareOp::Loe, &value, &high),
                )))
            }
            Expr::InList {
                expr: inner,
                list,
                negated,
            } => {
                let value = self.eval(inner, scope)?;
                let candidates = list
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(bool_value(negate_if(
                    *negated,
                    membership(&value, candidates.iter()),
                )))
            }
            Expr::InSubquery {
                expr: inner,
                subquery,
                negated,
            } => {
                let value = self.eval(inner, scope)?;
                let rows = self.subquery_rows(subquery, scope)?;

                Ok(bool_value(negate_if(
                    *negated,
                    membership(&value, rows.iter().filter_map(|row| row.first())),
                )))
            }
            Expr::Exists(subquery) => {
                let rows = self.subquery_rows(subquery, scope)?;

                Ok(Value::Bool(!rows.is_empty()))
            }
            Expr::Aggregate { func, arg } => self.eval_aggregate(*func, arg.as_deref(), expr, scope),
            Expr::Case(case) => self.eval_case(case, scope),
            Expr::Subquery(subquery) => self.eval_scalar_subquery(subquery, scope),
            Expr::Labeled { expr, .. } => self.eval(expr, scope),
        }
    }

    // Walk the to-one hops of a path, resolving associations the bound
    // instance has not loaded. A null link anywhere yields null.
    fn eval_field(&self, path: &FieldPath, scope: &RowScope<'_>) -> Result<Value, QueryError> {
        let Some(root) = bound(scope, path.alias())? else {
            return Ok(Value::Null);
        };

        let mut current: Cow<'_, Entity> = Cow::Borrowed(root);
        for &hop in path.via() {
            match self.follow(&current, hop)? {
                Some(next) => current = Cow::Owned(next),
                None => return Ok(Value::Null),
            }
        }

        Ok(current.value(path.field()).unwrap_or(Value::Null))
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        whole: &Expr,
        scope: &RowScope<'_>,
    ) -> Result<Value, QueryError> {
        match op {
            BinaryOp::And => {
                let left = truth(&self.eval(left, scope)?);
                if left == Some(false) {
                    return Ok(Value::Bool(false));
                }
                let right = truth(&self.eval(right, scope)?);

                Ok(bool_value(and3(left, right)))
            }
            BinaryOp::Or => {
                let left = truth(&self.eval(left, scope)?);
                if left == Some(true) {
                    return Ok(Value::Bool(true));
                }
                let right = truth(&self.eval(right, scope)?);

                Ok(bool_value(or3(left, right)))
            }
            _ => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                if left.is_null() || right.is_null() {
                    return Ok(Value::Null);
                }

                match op {
                    BinaryOp::Compare(op) => Ok(bool_value(compare(op, &left, &right))),
                    BinaryOp::Arith(op) => arithmetic(op, &left, &right, whole),
                    BinaryOp::Concat => Ok(match (left.to_text(), right.to_text()) {
                        (Some(left), Some(right)) => Value::Text(left + &right),
                        _ => Value::Null,
                    }),
                    BinaryOp::StartsWith => Ok(text_test(&left, &right, |text, prefix| {
                        text.starts_with(prefix)
                    })),
                    BinaryOp::Contains => Ok(text_test(&left, &right, |text, part| text.contains(part))),
                    BinaryOp::And | BinaryOp::Or => Err(ExecutionError::invariant(
                        "logical operator reached the scalar branch",
                    )
                    .into()),
                }
            }
        }
    }

    fn eval_aggregate(
        &self,
        func: AggregateFunc,
        arg: Option<&Expr>,
        whole: &Expr,
        scope: &RowScope<'_>,
    ) -> Result<Value, QueryError> {
        let Some(group) = scope.group() else {
            return Err(ExecutionError::invariant(format!(
                "aggregate '{whole}' evaluated outside a grouped scope"
            ))
            .into());
        };

        let Some(arg) = arg else {
            return Ok(count_value(group.len()));
        };

        let mut values = Vec::with_capacity(group.len());
        for frame in group {
            let value = self.eval(arg, &scope.member(frame))?;
            if !value.is_null() {
                values.push(value);
            }
        }

        match func {
            AggregateFunc::Count => Ok(count_value(values.len())),
            AggregateFunc::Sum => sum(&values, whole),
            AggregateFunc::Avg => {
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                let total: f64 = values.iter().filter_map(Value::as_f64).sum();

                float_result(total / len_as_f64(values.len()), whole)
            }
            AggregateFunc::Min => Ok(extreme(values, Ordering::Less)),
            AggregateFunc::Max => Ok(extreme(values, Ordering::Greater)),
        }
    }

    fn eval_case(&self, case: &CaseExpr, scope: &RowScope<'_>) -> Result<Value, QueryError> {
        let operand = case
            .operand()
            .map(|operand| self.eval(operand, scope))
            .transpose()?;

        let mut chosen = case.otherwise();
        for (when, then) in case.arms() {
            let when = self.eval(when, scope)?;
            let matched = match &operand {
                Some(operand) => values_equal(operand, &when),
                None => truth(&when),
            };
            if matched == Some(true) {
                chosen = then;
                break;
            }
        }

        let value = self.eval(chosen, scope)?;
        if case.kind() == ExprKind::FLOAT
            && let Value::Int(_) = value
        {
            return Ok(value.as_f64().map_or(Value::Null, Value::float));
        }

        Ok(value)
    }

    fn eval_scalar_subquery(
        &self,
        subquery: &Subquery,
        scope: &RowScope<'_>,
    ) -> Result<Value, QueryError> {
        let rows = self.subquery_rows(subquery, scope)?;
        match rows.as_slice() {
            [] => Ok(Value::Null),
            [row] => Ok(row.first().cloned().unwrap_or(Value::Null)),
            _ => Err(CardinalityError::NotUnique { found: rows.len() }.into()),
        }
    }
}

// Entity bound to `alias`, or an invariant error when planning let an
// unbound alias through.
fn bound<'s>(
    scope: &RowScope<'s>,
    alias: &Alias,
) -> Result<Option<&'s Entity>, QueryError> {
    scope.entity(alias).ok_or_else(|| {
        ExecutionError::invariant(format!("alias '{alias}' is not bound at execution")).into()
    })
}

fn eval_unary(op: UnaryOp, value: Value, whole: &Expr) -> Result<Value, QueryError> {
    match op {
        UnaryOp::Not => Ok(bool_value(truth(&value).map(|b| !b))),
        UnaryOp::IsNull => Ok(Value::Bool(value.is_null())),
        UnaryOp::IsNotNull => Ok(Value::Bool(!value.is_null())),
        UnaryOp::ToText => Ok(value.to_text().map_or(Value::Null, Value::Text)),
        UnaryOp::Neg => match value {
            Value::Int(v) => v
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| arithmetic_error(whole, "integer overflow")),
            Value::Float(v) => float_result(-v.get(), whole),
            Value::Null => Ok(Value::Null),
            other => Err(ExecutionError::invariant(format!(
                "negation of non-numeric {}",
                other.type_name()
            ))
            .into()),
        },
    }
}

fn arithmetic(op: ArithOp, left: &Value, right: &Value, whole: &Expr) -> Result<Value, QueryError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        if op == ArithOp::Div && *b == 0 {
            return Err(arithmetic_error(whole, "division by zero"));
        }
        let result = match op {
            ArithOp::Add => a.checked_add(*b),
            ArithOp::Sub => a.checked_sub(*b),
            ArithOp::Mul => a.checked_mul(*b),
            ArithOp::Div => a.checked_div(*b),
        };

        return result
            .map(Value::Int)
            .ok_or_else(|| arithmetic_error(whole, "integer overflow"));
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(ExecutionError::invariant(format!(
            "arithmetic over {} and {}",
            left.type_name(),
            right.type_name()
        ))
        .into());
    };
    if op == ArithOp::Div && b.classify() == FpCategory::Zero {
        return Err(arithmetic_error(whole, "division by zero"));
    }

    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
    };

    float_result(result, whole)
}

fn sum(values: &[Value], whole: &Expr) -> Result<Value, QueryError> {
    if values.is_empty() {
        return Ok(Value::Null);
    }

    if values.iter().all(|value| matches!(value, Value::Int(_))) {
        let mut total: i64 = 0;
        for value in values {
            total = value
                .as_int()
                .and_then(|v| total.checked_add(v))
                .ok_or_else(|| arithmetic_error(whole, "integer overflow"))?;
        }

        return Ok(Value::Int(total));
    }

    float_result(values.iter().filter_map(Value::as_f64).sum(), whole)
}

// Smallest (`Less`) or largest (`Greater`) value; the first one wins ties.
fn extreme(values: Vec<Value>, keep: Ordering) -> Value {
    values
        .into_iter()
        .reduce(|best, value| {
            if compare_values(&value, &best) == Some(keep) {
                value
            } else {
                best
            }
        })
        .unwrap_or(Value::Null)
}

fn membership<'v>(value: &Value, candidates: impl Iterator<Item = &'v Value>) -> Option<bool> {
    if value.is_null() {
        return None;
    }

    let mut unknown = false;
    for candidate in candidates {
        match values_equal(value, candidate) {
            Some(true) => return Some(true),
            Some(false) => {}
            None => unknown = true,
        }
    }

    if unknown { None } else { Some(false) }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Option<bool> {
    let ordering = compare_values(left, right)?;

    Some(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Goe => ordering != Ordering::Less,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Loe => ordering != Ordering::Greater,
    })
}

fn text_test(left: &Value, right: &Value, test: fn(&str, &str) -> bool) -> Value {
    match (left.as_text(), right.as_text()) {
        (Some(left), Some(right)) => Value::Bool(test(left, right)),
        _ => Value::Null,
    }
}

const fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

fn bool_value(value: Option<bool>) -> Value {
    value.map_or(Value::Null, Value::Bool)
}

const fn and3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

const fn or3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn negate_if(negated: bool, value: Option<bool>) -> Option<bool> {
    if negated { value.map(|b| !b) } else { value }
}

fn float_result(value: f64, whole: &Expr) -> Result<Value, QueryError> {
    Float64::try_new(value)
        .map(Value::Float)
        .ok_or_else(|| arithmetic_error(whole, "result is not finite"))
}

fn arithmetic_error(whole: &Expr, reason: &'static str) -> QueryError {
    ExecutionError::Arithmetic {
        expr: whole.to_string(),
        reason,
    }
    .into()
}

fn count_value(count: usize) -> Value {
    Value::Int(i64::try_from(count).unwrap_or(i64::MAX))
}

#[expect(clippy::cast_precision_loss)]
const fn len_as_f64(len: usize) -> f64 {
    len as f64
}
