use super::*;
use crate::entity::EntityKey;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn arb_username() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("ann".to_string())),
        Just(Some("bob".to_string())),
        Just(Some("cid".to_string())),
    ]
}

fn arb_members() -> impl Strategy<Value = Vec<(Option<String>, Option<i64>)>> {
    prop::collection::vec(
        (arb_username(), prop::option::of(0i64..50)),
        0..12,
    )
}

fn arb_predicate() -> impl Strategy<Value = Predicate> {
    let m = QMember::new("m");
    let (age, username) = (m.age(), m.username());

    prop_oneof![
        (0i64..50).prop_map({
            let age = age.clone();
            move |bound| age.gt(bound)
        }),
        (0i64..50).prop_map({
            let age = age.clone();
            move |bound| age.loe(bound)
        }),
        arb_username().prop_map({
            let username = username.clone();
            move |name| name.map_or_else(|| username.is_null(), |name| username.eq(name))
        }),
        Just(age.is_null()),
    ]
}

fn store_of(members: &[(Option<String>, Option<i64>)]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for (username, age) in members {
        let mut entity = member(username.as_deref(), *age, None);
        store.persist(&mut entity).expect("persist should succeed");
    }

    store
}

fn keys(store: &MemoryStore, predicate: Option<Predicate>) -> BTreeSet<EntityKey> {
    let m = QMember::new("m");
    let query = Query::new()
        .select(m.id())
        .from(m.path())
        .filter_all([predicate]);

    run(store, &query)
        .scalars::<EntityKey>()
        .expect("ids should be keys")
        .into_iter()
        .collect()
}

proptest! {
    #[test]
    fn conjunction_is_intersection(
        members in arb_members(),
        p in arb_predicate(),
        q in arb_predicate(),
    ) {
        let store = store_of(&members);

        let both = keys(&store, Some(p.clone().and(q.clone())));
        let left = keys(&store, Some(p));
        let right = keys(&store, Some(q));

        prop_assert_eq!(both, left.intersection(&right).copied().collect::<BTreeSet<_>>());
    }

    #[test]
    fn disjunction_is_union(
        members in arb_members(),
        p in arb_predicate(),
        q in arb_predicate(),
    ) {
        let store = store_of(&members);

        let either = keys(&store, Some(p.clone().or(q.clone())));
        let left = keys(&store, Some(p));
        let right = keys(&store, Some(q));

        prop_assert_eq!(either, left.union(&right).copied().collect::<BTreeSet<_>>());
    }

    #[test]
    fn predicate_and_negation_never_overlap(members in arb_members(), p in arb_predicate()) {
        let store = store_of(&members);

        let kept = keys(&store, Some(p.clone()));
        let negated = keys(&store, Some(!p));
        let all = keys(&store, None);

        prop_assert!(kept.is_disjoint(&negated));
        prop_assert!(kept.len() + negated.len() <= all.len());
    }

    #[test]
    fn order_is_sorted_and_stable(members in arb_members()) {
        let store = store_of(&members);
        let m = QMember::new("m");
        let query = Query::new()
            .select((m.age(), m.id()))
            .from(m.path())
            .order_by([m.age().asc().nulls_last()]);

        let rows: Vec<(Option<i64>, EntityKey)> = run(&store, &query)
            .project()
            .expect("rows should project");

        prop_assert_eq!(rows.len(), members.len());
        for pair in rows.windows(2) {
            let ((left_age, left_key), (right_age, right_key)) = (pair[0], pair[1]);
            match (left_age, right_age) {
                (Some(l), Some(r)) => {
                    prop_assert!(l <= r);
                    if l == r {
                        prop_assert!(left_key < right_key);
                    }
                }
                (None, Some(_)) => prop_assert!(false, "null sorted before a value"),
                (Some(_), None) => {}
                (None, None) => prop_assert!(left_key < right_key),
            }
        }
    }

    #[test]
    fn page_is_a_slice_of_the_full_result(
        members in arb_members(),
        offset in 0u64..15,
        limit in 0u64..15,
    ) {
        let store = store_of(&members);
        let m = QMember::new("m");
        let base = Query::new()
            .select(m.id())
            .from(m.path())
            .order_by([m.age().desc(), m.id().asc()]);

        let all = run(&store, &base)
            .scalars::<EntityKey>()
            .expect("ids should be keys");
        let page = Executor::new(&store)
            .execute_paged(&base.offset(offset).limit(limit).build().expect("build"))
            .expect("execution should succeed");

        let expected: Vec<EntityKey> = all
            .iter()
            .copied()
            .skip(usize::try_from(offset).expect("small offset"))
            .take(usize::try_from(limit).expect("small limit"))
            .collect();
        prop_assert_eq!(page.scalars::<EntityKey>().expect("ids should be keys"), expected);
        prop_assert_eq!(page.total(), Some(all.len() as u64));
    }
}
