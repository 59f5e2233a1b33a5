use crate::{
    db::store::MemoryStore,
    entity::{AssociationState, Entity, EntityError, EntityKey, Related},
    test_support::{MEMBER, TEAM, member, team},
    value::Value,
};

#[test]
fn new_instances_are_transient_and_unloaded() {
    let fresh = Entity::new(&MEMBER);

    assert_eq!(fresh.key(), None);
    assert_eq!(fresh.get("username"), Some(&Value::Null));
    assert_eq!(fresh.association("team"), Some(&AssociationState::NotLoaded));
    assert!(!fresh.is_loaded("team"));
    assert!(!fresh.is_loaded("unknown"));
}

#[test]
fn set_rejects_unknown_fields_and_wrong_kinds() {
    let mut fresh = Entity::new(&MEMBER);

    assert!(matches!(
        fresh.set("nickname", "x"),
        Err(EntityError::UnknownField { .. })
    ));
    assert!(matches!(
        fresh.set("age", "ten"),
        Err(EntityError::KindMismatch { field: "age", .. })
    ));
    assert!(matches!(
        fresh.set("id", EntityKey::new(1)),
        Err(EntityError::KeyImmutable { .. })
    ));
}

#[test]
fn non_nullable_fields_reject_null() {
    let mut fresh = Entity::new(&TEAM);

    assert_eq!(
        fresh.set("name", None::<&str>),
        Err(EntityError::NullNotAllowed {
            entity: "Team",
            field: "name",
        })
    );
}

#[test]
fn set_reference_requires_a_persisted_target() {
    let transient = team("teamA");
    let mut player = Entity::new(&MEMBER);

    assert_eq!(
        player.set_reference("team", &transient),
        Err(EntityError::Unpersisted { entity: "Team" })
    );
}

#[test]
fn set_reference_writes_key_and_loads_association() {
    let mut store = MemoryStore::new();
    let mut team_a = team("teamA");
    let key = store.persist(&mut team_a).expect("persist should succeed");

    let player = member(Some("p"), Some(1), Some(&team_a));

    assert_eq!(player.get("team_id"), Some(&Value::Key(key)));
    assert!(player.is_loaded("team"));
    assert_eq!(
        player
            .related("team")
            .and_then(Related::as_one)
            .map(Entity::key),
        Some(Some(key))
    );
}

#[test]
fn rewriting_the_foreign_key_unloads_the_reference() {
    let mut store = MemoryStore::new();
    let mut team_a = team("teamA");
    let mut team_b = team("teamB");
    store.persist(&mut team_a).expect("persist should succeed");
    let other = store.persist(&mut team_b).expect("persist should succeed");

    let mut player = member(Some("p"), Some(1), Some(&team_a));
    player.set("team_id", other).expect("set should succeed");

    assert!(!player.is_loaded("team"));
}

#[test]
fn set_reference_checks_association_shape() {
    let mut store = MemoryStore::new();
    let mut team_a = team("teamA");
    store.persist(&mut team_a).expect("persist should succeed");
    let mut other_team = team("teamB");
    store.persist(&mut other_team).expect("persist should succeed");

    let mut player = Entity::new(&MEMBER);
    let mut teammate = Entity::new(&MEMBER);
    store.persist(&mut teammate).expect("persist should succeed");
    assert!(matches!(
        player.set_reference("team", &teammate),
        Err(EntityError::TargetMismatch { .. })
    ));
    assert!(matches!(
        team_a.set_reference("members", &other_team),
        Err(EntityError::NotManyToOne { .. })
    ));
}

#[test]
fn identity_is_immutable_once_assigned() {
    let mut team_a = team("teamA");
    team_a
        .assign_key(EntityKey::new(1))
        .expect("first assignment should succeed");

    assert!(team_a.assign_key(EntityKey::new(1)).is_ok());
    assert_eq!(
        team_a.assign_key(EntityKey::new(2)),
        Err(EntityError::KeyImmutable { entity: "Team" })
    );
}

#[test]
fn equality_ignores_association_state() {
    let mut store = MemoryStore::new();
    let mut team_a = team("teamA");
    store.persist(&mut team_a).expect("persist should succeed");

    let loaded = member(Some("p"), Some(1), Some(&team_a));
    let mut emptied = loaded.clone();
    emptied
        .load_association("team", Related::One(None))
        .expect("load should succeed");

    assert_eq!(loaded, emptied);
}

#[test]
fn value_reads_the_identity_field() {
    let mut store = MemoryStore::new();
    let mut team_a = team("teamA");
    let key = store.persist(&mut team_a).expect("persist should succeed");

    assert_eq!(team_a.value("id"), Some(Value::Key(key)));
    assert_eq!(team_a.get("id"), None);
    assert_eq!(team_a.value("name"), Some(Value::from("teamA")));
}
