use crate::{
    db::{
        query::{Alias, NullOrdering, OrderDirection},
        store::{MemoryStore, RawRow, Store, StoreError, resolve_by_scan},
    },
    entity::{Entity, EntityError, EntityKey, Related},
    test_support::{MEMBER, TEAM, member, seeded, team},
    value::Value,
};

#[test]
fn persist_assigns_sequential_keys() {
    let mut store = MemoryStore::new();
    assert!(store.is_empty());

    let mut first = team("a");
    let mut second = team("b");
    let k1 = store.persist(&mut first).expect("persist should succeed");
    let k2 = store.persist(&mut second).expect("persist should succeed");

    assert_eq!(k1, EntityKey::new(1));
    assert_eq!(k2, EntityKey::new(2));
    assert_eq!(first.key(), Some(k1));
    assert_eq!(store.len(&TEAM), 2);
}

#[test]
fn persist_overwrites_in_place() {
    let mut store = MemoryStore::new();
    let mut renamed = team("before");
    let key = store.persist(&mut renamed).expect("persist should succeed");

    renamed.set("name", "after").expect("set should succeed");
    let again = store.persist(&mut renamed).expect("persist should succeed");
    let rows = store
        .scan(&TEAM, &Alias::new("t"))
        .expect("scan should succeed");

    assert_eq!(again, key);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values.get("name"), Some(&Value::from("after")));
}

#[test]
fn scan_of_unknown_table_is_empty() {
    let store = MemoryStore::new();

    let rows = store
        .scan(&MEMBER, &Alias::new("m"))
        .expect("scan should succeed");

    assert!(rows.is_empty());
}

#[test]
fn remove_reports_whether_a_row_existed() {
    let mut store = MemoryStore::new();
    let mut doomed = team("x");
    let key = store.persist(&mut doomed).expect("persist should succeed");

    assert!(store.remove(&TEAM, key));
    assert!(!store.remove(&TEAM, key));
    assert_eq!(store.len(&TEAM), 0);
}

#[test]
fn resolve_to_one_by_scan() {
    let fixture = seeded();
    let scanned = fixture
        .store
        .scan(&MEMBER, &Alias::new("m"))
        .expect("scan should succeed");
    let first =
        Entity::materialize(&MEMBER, scanned[0].clone()).expect("materialize should succeed");

    let related = fixture
        .store
        .resolve_association(&first, "team")
        .expect("resolve should succeed");

    assert_eq!(
        related.as_one().map(Entity::key),
        Some(fixture.team_a.key())
    );
}

#[test]
fn resolve_to_many_by_scan() {
    let fixture = seeded();

    let related = fixture
        .store
        .resolve_association(&fixture.team_b, "members")
        .expect("resolve should succeed");

    let names: Vec<_> = related
        .as_many()
        .iter()
        .filter_map(|member| member.get("username").cloned())
        .collect();
    assert_eq!(names, vec![Value::from("member3"), Value::from("member4")]);
}

#[test]
fn resolve_missing_reference_is_empty() {
    let fixture = seeded();
    let loner = member(Some("loner"), None, None);

    let related = resolve_by_scan(&fixture.store, &loner, "team").expect("resolve should succeed");

    assert_eq!(related, Related::One(None));
}

#[test]
fn resolve_unknown_association_is_an_entity_error() {
    let fixture = seeded();

    let err = fixture
        .store
        .resolve_association(&fixture.team_a, "sponsors")
        .expect_err("unknown association should fail");

    assert!(matches!(
        err,
        StoreError::Entity(EntityError::UnknownAssociation { .. })
    ));
}

#[test]
fn materialize_ignores_unknown_columns() {
    let mut row = RawRow {
        key: EntityKey::new(9),
        values: std::collections::BTreeMap::new(),
    };
    row.values.insert("name".to_string(), Value::from("z"));
    row.values.insert("legacy".to_string(), Value::Int(1));

    let entity = Entity::materialize(&TEAM, row).expect("materialize should succeed");

    assert_eq!(entity.key(), Some(EntityKey::new(9)));
    assert_eq!(entity.get("name"), Some(&Value::from("z")));
    assert_eq!(entity.get("legacy"), None);
    assert!(!entity.is_loaded("members"));
}

#[test]
fn natural_null_ordering_treats_null_as_smallest() {
    let store = MemoryStore::new();

    assert_eq!(
        store.natural_null_ordering(OrderDirection::Asc),
        NullOrdering::First
    );
    assert_eq!(
        store.natural_null_ordering(OrderDirection::Desc),
        NullOrdering::Last
    );
}

#[test]
fn raw_rows_serialize_with_named_columns() {
    let fixture = seeded();
    let rows = fixture
        .store
        .scan(&TEAM, &Alias::new("t"))
        .expect("scan should succeed");

    let json = serde_json::to_value(&rows[0]).expect("serialize should succeed");

    assert_eq!(json["key"], serde_json::json!(1));
    assert_eq!(json["values"]["name"], serde_json::json!({ "Text": "teamA" }));
}
