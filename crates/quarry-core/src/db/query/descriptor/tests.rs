use crate::{
    db::query::{
        AggregateFunc, Alias, BinaryOp, BuildError, CompareOp, Expr, JoinSpec, Predicate, Query,
        Subquery,
    },
    test_support::{QMember, QTeam, team_name_of},
};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------
// Build validation
// ---------------------------------------------------------------------

#[test]
fn build_requires_a_source() {
    let m = QMember::new("m");

    let err = Query::new()
        .select(m.username())
        .build()
        .expect_err("query without source should fail");

    assert_eq!(err, BuildError::MissingSource);
}

#[test]
fn build_rejects_unbound_aliases() {
    let m = QMember::new("m");
    let stray = QMember::new("x");

    let err = Query::select_from(m.path())
        .filter(stray.age().gt(1))
        .build()
        .expect_err("unbound alias should fail");

    assert_eq!(
        err,
        BuildError::UnboundAlias {
            alias: "x".to_string()
        }
    );
}

#[test]
fn build_rejects_duplicate_sources() {
    let m = QMember::new("m");

    let err = Query::select_from(m.path())
        .from(m.path())
        .build()
        .expect_err("duplicate alias should fail");

    assert!(matches!(err, BuildError::DuplicateAlias { .. }));
}

#[test]
fn build_rejects_unknown_fields_and_associations() {
    let m = QMember::new("m");

    let unknown_field = Query::select_from(m.path())
        .filter(m.path().number("nope").gt(1))
        .build();
    let unknown_assoc = Query::select_from(m.path())
        .filter(m.path().association("club").string("name").eq("x"))
        .build();

    assert_eq!(
        unknown_field,
        Err(BuildError::UnknownField {
            entity: "Member",
            field: "nope",
        })
    );
    assert_eq!(
        unknown_assoc,
        Err(BuildError::UnknownAssociation {
            entity: "Member",
            association: "club",
        })
    );
}

#[test]
fn build_rejects_mistyped_field_paths() {
    let m = QMember::new("m");

    let err = Query::select_from(m.path())
        .filter(m.path().number("username").gt(1))
        .build()
        .expect_err("mistyped path should fail");

    assert!(matches!(
        err,
        BuildError::TypeMismatch {
            context: "field path",
            ..
        }
    ));
}

#[test]
fn build_accepts_to_one_traversal() {
    let m = QMember::new("m");

    let built = Query::select_from(m.path())
        .filter(team_name_of(&m).eq("teamA"))
        .build();

    assert!(built.is_ok());
}

#[test]
fn join_targets_must_be_one_hop() {
    let m = QMember::new("m");
    let other = QMember::new("o");

    let err = Query::select_from(m.path())
        .join(JoinSpec::inner(
            &m.team().association("members"),
            other.path(),
        ))
        .build()
        .expect_err("two-hop join should fail");

    assert_eq!(
        err,
        BuildError::JoinPathDepth {
            alias: "m".to_string(),
            hops: 2,
        }
    );
}

#[test]
fn join_target_must_match_association() {
    let m = QMember::new("m");
    let other = QMember::new("o");

    let err = Query::select_from(m.path())
        .inner_join(&m.team(), other.path())
        .build()
        .expect_err("mismatched join target should fail");

    assert!(matches!(
        err,
        BuildError::TypeMismatch {
            context: "join target",
            ..
        }
    ));
}

#[test]
fn join_owner_must_be_bound_locally() {
    let m = QMember::new("m");
    let t = QTeam::new("t");
    let inner = QMember::new("i");

    // the subquery joins through the outer alias
    let sub = Subquery::new(
        &Query::new()
            .select(t.name())
            .from(inner.path())
            .inner_join(&m.team(), t.path()),
    );
    let err = Query::select_from(m.path())
        .filter(sub.exists())
        .build()
        .expect_err("outer join owner should fail");

    assert_eq!(
        err,
        BuildError::UnboundAlias {
            alias: "m".to_string()
        }
    );
}

#[test]
fn join_condition_sees_its_own_alias() {
    let m = QMember::new("m");
    let t = QTeam::new("t");

    let built = Query::select_from(m.path())
        .join(JoinSpec::inner_entity(t.path()).on(m.team_id().eq(t.id())))
        .build();

    assert!(built.is_ok());
}

// ---------------------------------------------------------------------
// Builder composition
// ---------------------------------------------------------------------

#[test]
fn builder_calls_leave_the_receiver_untouched() {
    let m = QMember::new("m");
    let base = Query::select_from(m.path());

    let filtered = base.filter(m.age().gt(1));

    assert!(base.descriptor().filter().is_none());
    assert!(filtered.descriptor().filter().is_some());
}

#[test]
fn chained_filters_conjoin() {
    let m = QMember::new("m");
    let p = m.age().gt(1);
    let q = m.username().eq("x");

    let chained = Query::select_from(m.path()).filter(p.clone()).filter(q.clone());
    let combined = Query::select_from(m.path()).filter(p.clone().and(q.clone()));
    let skipped = Query::select_from(m.path()).filter_all([Some(p), None, Some(q)]);

    assert_eq!(chained, combined);
    assert_eq!(chained, skipped);
}

#[test]
fn order_by_appends_keys() {
    let m = QMember::new("m");

    let query = Query::select_from(m.path())
        .order_by([m.age().desc()])
        .order_by([m.username().asc()]);

    assert_eq!(
        query.descriptor().order_by(),
        &[m.age().desc(), m.username().asc()]
    );
}

#[test]
fn tuple_projection_keeps_order() {
    let m = QMember::new("m");
    let t = QTeam::new("t");

    let query = Query::new().select((m.username(), t.name(), m.age().as_("years")));

    let projection = query.descriptor().projection();
    assert_eq!(projection.len(), 3);
    assert_eq!(projection[0], Expr::from(m.username()));
    assert_eq!(projection[2].label(), Some("years"));
}

// ---------------------------------------------------------------------
// Derived descriptors
// ---------------------------------------------------------------------

#[test]
fn without_pagination_clears_offset_and_limit() {
    let m = QMember::new("m");
    let paged = Query::select_from(m.path())
        .offset(2)
        .limit(5)
        .build()
        .expect("build should succeed");

    let unpaged = paged.without_pagination();

    assert!(paged.is_paginated());
    assert!(!unpaged.is_paginated());
    assert_eq!(unpaged.filter(), paged.filter());
}

#[test]
fn limit_cap_keeps_the_smaller_limit() {
    let m = QMember::new("m");
    let base = Query::select_from(m.path());

    let open = base.descriptor().with_limit_cap(1);
    let tighter = base.limit(5).descriptor().with_limit_cap(1);
    let looser = base.limit(0).descriptor().with_limit_cap(1);

    assert_eq!(open.limit(), Some(1));
    assert_eq!(tighter.limit(), Some(1));
    assert_eq!(looser.limit(), Some(0));
}

#[test]
fn aliases_bound_and_free() {
    let m = QMember::new("m");
    let t = QTeam::new("t");
    let inner = QMember::new("i");

    let correlated = Query::new()
        .select(inner.age())
        .from(inner.path())
        .filter(inner.team_id().eq(t.id()));
    let outer = Query::select_from(t.path()).filter(Subquery::new(&correlated).exists());

    let bound: Vec<_> = Query::select_from(m.path())
        .inner_join(&m.team(), t.path())
        .descriptor()
        .bound_aliases()
        .cloned()
        .collect();

    assert_eq!(bound, vec![Alias::new("m"), Alias::new("t")]);
    assert_eq!(
        correlated.descriptor().free_aliases(),
        BTreeSet::from([Alias::new("t")])
    );
    assert!(outer.descriptor().free_aliases().is_empty());
}

#[test]
fn validate_matches_build() {
    let m = QMember::new("m");
    let stray = QMember::new("x");
    let query = Query::select_from(m.path()).filter(stray.age().gt(1));

    assert_eq!(
        query.descriptor().validate(),
        query.build().map(|_| ())
    );
}

#[test]
fn build_rechecks_operand_kinds_of_assembled_trees() {
    let m = QMember::new("m");
    let assembled = Expr::Binary {
        op: BinaryOp::Compare(CompareOp::Eq),
        left: Box::new(m.username().into_expr()),
        right: Box::new(Expr::literal(10)),
    };
    // a bool-kinded root whose operands disagree
    let hidden = m.age().gt(1).into_expr();
    let nested = Expr::Binary {
        op: BinaryOp::And,
        left: Box::new(hidden),
        right: Box::new(assembled.clone()),
    };

    let descriptor = Query::new()
        .select((m.username(), nested))
        .from(m.path())
        .build();

    assert!(matches!(
        descriptor,
        Err(BuildError::TypeMismatch {
            context: "comparison",
            ..
        })
    ));
    assert!(matches!(
        Predicate::try_new(assembled),
        Err(BuildError::TypeMismatch {
            context: "comparison",
            ..
        })
    ));
}

#[test]
fn build_rechecks_assembled_aggregates_and_ranges() {
    let m = QMember::new("m");
    let summed_text = Expr::Aggregate {
        func: AggregateFunc::Sum,
        arg: Some(Box::new(m.username().into_expr())),
    };
    let mixed_range = Expr::Between {
        expr: Box::new(m.age().into_expr()),
        low: Box::new(Expr::literal("a")),
        high: Box::new(Expr::literal(5)),
    };

    let aggregate = Query::new().select(summed_text).from(m.path()).build();
    let range = Query::new()
        .select(m.username())
        .from(m.path())
        .order_by([mixed_range.asc()])
        .build();

    assert!(matches!(
        aggregate,
        Err(BuildError::TypeMismatch { context: "sum", .. })
    ));
    assert!(matches!(
        range,
        Err(BuildError::TypeMismatch {
            context: "between",
            ..
        })
    ));
}
