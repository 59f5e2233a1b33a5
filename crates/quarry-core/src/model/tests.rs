use crate::{
    model::ScalarKind,
    test_support::{MEMBER, TEAM, member, team},
};

#[test]
fn field_kind_includes_identity() {
    assert_eq!(MEMBER.field_kind("id"), Some(ScalarKind::Key));
    assert_eq!(MEMBER.field_kind("age"), Some(ScalarKind::Int));
    assert_eq!(MEMBER.field_kind("missing"), None);
}

#[test]
fn associations_are_found_by_name() {
    let team_assoc = MEMBER.association("team").expect("member.team exists");
    let members_assoc = TEAM.association("members").expect("team.members exists");

    assert!(!team_assoc.is_to_many());
    assert!(members_assoc.is_to_many());
    assert_eq!(team_assoc.target, &TEAM);
    assert!(MEMBER.association("teams").is_none());
}

#[test]
fn links_follow_the_foreign_key_both_ways() {
    let mut store = crate::db::store::MemoryStore::new();
    let mut team_a = team("teamA");
    let mut team_b = team("teamB");
    store.persist(&mut team_a).expect("persist should succeed");
    store.persist(&mut team_b).expect("persist should succeed");
    let player = member(Some("p"), Some(1), Some(&team_a));

    let to_one = MEMBER.association("team").expect("member.team exists");
    let to_many = TEAM.association("members").expect("team.members exists");

    assert!(to_one.links(&player, &team_a));
    assert!(!to_one.links(&player, &team_b));
    assert!(to_many.links(&team_a, &player));
    assert!(!to_many.links(&team_b, &player));
}

#[test]
fn transient_targets_never_link() {
    let transient = team("nowhere");
    let player = member(Some("p"), None, None);
    let to_one = MEMBER.association("team").expect("member.team exists");

    assert!(!to_one.links(&player, &transient));
}

#[test]
fn scalar_kind_compatibility() {
    assert!(ScalarKind::Int.is_comparable_with(ScalarKind::Float));
    assert!(!ScalarKind::Text.is_comparable_with(ScalarKind::Key));
    assert!(ScalarKind::Float.accepts(ScalarKind::Int));
    assert!(!ScalarKind::Int.accepts(ScalarKind::Float));
}

#[test]
fn cyclic_models_debug_without_recursion() {
    let rendered = format!("{MEMBER:?}");

    assert!(rendered.contains("Member"));
    assert!(rendered.contains("Team"));
}
