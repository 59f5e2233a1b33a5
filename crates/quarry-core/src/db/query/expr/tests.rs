use crate::{
    db::query::{
        AggregateFunc, ArithOp, BuildError, CompareOp, Expr, ExprKind, NumberExpr, SearchedCase,
        SimpleCase, StringExpr,
    },
    test_support::{QMember, QTeam, team_name_of},
    value::Value,
};

#[test]
fn field_paths_carry_declared_kinds() {
    let m = QMember::new("m");

    assert_eq!(m.age().expr().kind(), ExprKind::INT);
    assert_eq!(m.username().expr().kind(), ExprKind::TEXT);
    assert_eq!(m.id().expr().kind(), ExprKind::KEY);
    assert_eq!(team_name_of(&m).expr().kind(), ExprKind::TEXT);
    assert_eq!(Expr::from(m.path()).kind(), ExprKind::Entity("Member"));
}

#[test]
fn arithmetic_result_kinds() {
    let m = QMember::new("m");

    assert_eq!(m.age().add(1).expr().kind(), ExprKind::INT);
    assert_eq!(m.age().div(2.0).expr().kind(), ExprKind::FLOAT);
    assert_eq!(m.age().avg().expr().kind(), ExprKind::FLOAT);
    assert_eq!(m.age().count().expr().kind(), ExprKind::INT);
    assert_eq!(m.age().sum().expr().kind(), ExprKind::INT);
}

#[test]
fn untyped_constructors_reject_kind_mismatches() {
    let m = QMember::new("m");

    assert!(matches!(
        Expr::arithmetic(ArithOp::Add, m.username(), 1),
        Err(BuildError::TypeMismatch {
            context: "arithmetic",
            ..
        })
    ));
    assert!(matches!(
        Expr::compare(CompareOp::Eq, m.username(), m.age()),
        Err(BuildError::TypeMismatch { .. })
    ));
    assert!(matches!(
        Expr::concat(m.age(), "x"),
        Err(BuildError::TypeMismatch { .. })
    ));
    assert!(matches!(
        Expr::not(m.age()),
        Err(BuildError::TypeMismatch { .. })
    ));
    assert!(matches!(
        Expr::aggregate(AggregateFunc::Sum, Some(m.username().into())),
        Err(BuildError::TypeMismatch { .. })
    ));
    assert!(matches!(
        Expr::aggregate(AggregateFunc::Avg, None),
        Err(BuildError::TypeMismatch { .. })
    ));
}

#[test]
fn entities_compare_for_equality_only() {
    let m = QMember::new("m");
    let other = QMember::new("o");
    let t = QTeam::new("t");

    assert!(Expr::compare(CompareOp::Eq, m.path(), other.path()).is_ok());
    assert!(Expr::compare(CompareOp::Lt, m.path(), other.path()).is_err());
    assert!(Expr::compare(CompareOp::Eq, m.path(), t.path()).is_err());
}

#[test]
fn null_literal_fits_every_scalar_slot() {
    let m = QMember::new("m");

    assert!(Expr::compare(CompareOp::Eq, m.age(), Expr::null()).is_ok());
    assert!(Expr::concat(m.username(), Expr::null()).is_ok());
    assert_eq!(NumberExpr::null().expr().kind(), ExprKind::Null);
}

#[test]
fn typed_conversion_checks_kind() {
    let m = QMember::new("m");

    assert!(NumberExpr::try_from(Expr::from(m.age())).is_ok());
    assert!(StringExpr::try_from(Expr::from(m.age())).is_err());
    assert!(StringExpr::try_from(Expr::literal("x")).is_ok());
}

#[test]
fn case_requires_arms_and_compatible_branches() {
    let m = QMember::new("m");

    assert_eq!(
        SearchedCase::new().otherwise("x"),
        Err(BuildError::EmptyCase)
    );
    assert!(matches!(
        SimpleCase::on(m.age()).when("ten", 1).otherwise(0),
        Err(BuildError::TypeMismatch {
            context: "case when",
            ..
        })
    ));
    assert!(matches!(
        SearchedCase::new().when(m.age().gt(1), "big").otherwise(0),
        Err(BuildError::TypeMismatch {
            context: "case branches",
            ..
        })
    ));
}

#[test]
fn case_branch_kinds_widen() {
    let m = QMember::new("m");

    let widened = SearchedCase::new()
        .when(m.age().gt(1), 1)
        .otherwise(0.5)
        .expect("int and float branches unify");
    let nullable = SearchedCase::new()
        .when(m.age().gt(1), "x")
        .end()
        .expect("null default unifies with text");

    assert_eq!(widened.kind(), ExprKind::FLOAT);
    assert_eq!(nullable.kind(), ExprKind::TEXT);
}

#[test]
fn labels_do_not_change_identity() {
    let m = QMember::new("m");
    let labelled = m.age().as_("years");

    assert_eq!(labelled.label(), Some("years"));
    assert_eq!(labelled.unlabeled(), m.age().expr());
    assert_eq!(labelled.kind(), ExprKind::INT);
    assert_eq!(labelled.clone().as_("age").label(), Some("age"));
}

#[test]
fn aggregate_detection_stops_at_subqueries() {
    let m = QMember::new("m");
    let inner = QMember::new("i");
    let sub = crate::db::query::Subquery::new(
        &crate::db::query::Query::new()
            .select(inner.age().max())
            .from(inner.path()),
    );

    assert!(m.age().add(m.age().sum()).expr().contains_aggregate());
    assert!(!Expr::subquery(&sub).contains_aggregate());
    assert!(!m.age().add(1).expr().contains_aggregate());
}

#[test]
fn display_renders_paths_and_operators() {
    let m = QMember::new("m");

    assert_eq!(team_name_of(&m).to_string(), "m.team.name");
    assert_eq!(m.age().add(1).to_string(), "(m.age + 1)");
    assert_eq!(Expr::count_all().to_string(), "count(*)");
    assert_eq!(
        m.age().in_list([1, 2]).to_string(),
        "m.age in (1, 2)"
    );
}

#[test]
fn literals_convert_into_expressions() {
    assert_eq!(Expr::from(3), Expr::Literal(Value::Int(3)));
    assert_eq!(Expr::from("a"), Expr::Literal(Value::from("a")));
    assert_eq!(Expr::from(true).kind(), ExprKind::BOOL);
}
