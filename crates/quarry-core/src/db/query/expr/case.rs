use crate::db::query::{
    BuildError, Predicate,
    expr::{Expr, ExprKind},
};

///
/// CaseExpr
///
/// Conditional expression. A simple case compares one operand against each
/// arm's value; a searched case tests each arm's predicate. The first
/// matching arm wins; otherwise the default (null unless given) applies.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseExpr {
    operand: Option<Expr>,
    arms: Vec<(Expr, Expr)>,
    otherwise: Expr,
    kind: ExprKind,
}

impl CaseExpr {
    #[must_use]
    pub const fn operand(&self) -> Option<&Expr> {
        self.operand.as_ref()
    }

    /// `(when, then)` pairs in declaration order.
    #[must_use]
    pub fn arms(&self) -> &[(Expr, Expr)] {
        &self.arms
    }

    #[must_use]
    pub const fn otherwise(&self) -> &Expr {
        &self.otherwise
    }

    #[must_use]
    pub const fn kind(&self) -> ExprKind {
        self.kind
    }

    pub(crate) fn children(&self) -> Vec<&Expr> {
        let mut children: Vec<&Expr> = self.operand.iter().collect();
        for (when, then) in &self.arms {
            children.push(when);
            children.push(then);
        }
        children.push(&self.otherwise);

        children
    }

    fn finish(
        operand: Option<Expr>,
        arms: Vec<(Expr, Expr)>,
        otherwise: Expr,
    ) -> Result<Expr, BuildError> {
        let kind = check_arms(operand.as_ref(), &arms, &otherwise)?;

        Ok(Expr::Case(Box::new(Self {
            operand,
            arms,
            otherwise,
            kind,
        })))
    }

    /// Re-check the arm rules; returns the unified branch kind.
    pub(crate) fn check(&self) -> Result<ExprKind, BuildError> {
        check_arms(self.operand.as_ref(), &self.arms, &self.otherwise)
    }
}

fn check_arms(
    operand: Option<&Expr>,
    arms: &[(Expr, Expr)],
    otherwise: &Expr,
) -> Result<ExprKind, BuildError> {
    if arms.is_empty() {
        return Err(BuildError::EmptyCase);
    }

    for (when, _) in arms {
        match operand {
            Some(operand) if !operand.kind().is_comparable_with(when.kind()) => {
                return Err(BuildError::type_mismatch(
                    "case when",
                    operand.kind().to_string(),
                    when.kind(),
                ));
            }
            None if !when.kind().is_bool() => {
                return Err(BuildError::type_mismatch("case when", "bool", when.kind()));
            }
            _ => {}
        }
    }

    let mut kind = otherwise.kind();
    for (_, then) in arms {
        kind = kind.unify(then.kind()).ok_or_else(|| {
            BuildError::type_mismatch("case branches", kind.to_string(), then.kind())
        })?;
    }

    Ok(kind)
}

///
/// SimpleCase
///
/// `case operand when v1 then r1 ... else d end`. The default is mandatory.
///

#[derive(Clone, Debug)]
pub struct SimpleCase {
    operand: Expr,
    arms: Vec<(Expr, Expr)>,
}

impl SimpleCase {
    #[must_use]
    pub fn on(operand: impl Into<Expr>) -> Self {
        Self {
            operand: operand.into(),
            arms: Vec::new(),
        }
    }

    #[must_use]
    pub fn when(mut self, value: impl Into<Expr>, then: impl Into<Expr>) -> Self {
        self.arms.push((value.into(), then.into()));
        self
    }

    /// Finish with the default branch and type-check every arm.
    pub fn otherwise(self, default: impl Into<Expr>) -> Result<Expr, BuildError> {
        CaseExpr::finish(Some(self.operand), self.arms, default.into())
    }
}

///
/// SearchedCase
///
/// `case when p1 then r1 ... [else d] end`.
///

#[derive(Clone, Debug, Default)]
pub struct SearchedCase {
    arms: Vec<(Expr, Expr)>,
}

impl SearchedCase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn when(mut self, condition: Predicate, then: impl Into<Expr>) -> Self {
        self.arms.push((condition.into_expr(), then.into()));
        self
    }

    pub fn otherwise(self, default: impl Into<Expr>) -> Result<Expr, BuildError> {
        CaseExpr::finish(None, self.arms, default.into())
    }

    /// Finish with a null default.
    pub fn end(self) -> Result<Expr, BuildError> {
        CaseExpr::finish(None, self.arms, Expr::null())
    }
}
