//! Member/Team fixture shared by unit tests.

use crate::{
    db::{
        executor::{QueryTraceEvent, QueryTraceSink},
        query::{AssociationPath, EntityPath, KeyExpr, NumberExpr, StringExpr},
        store::MemoryStore,
    },
    entity::Entity,
    model::{AssociationKind, AssociationModel, EntityModel, FieldModel, ScalarKind},
};
use derive_more::Deref;
use std::cell::RefCell;

pub(crate) static MEMBER: EntityModel = EntityModel {
    name: "Member",
    key: "id",
    fields: &[
        FieldModel {
            name: "username",
            kind: ScalarKind::Text,
            nullable: true,
        },
        FieldModel {
            name: "age",
            kind: ScalarKind::Int,
            nullable: true,
        },
        FieldModel {
            name: "team_id",
            kind: ScalarKind::Key,
            nullable: true,
        },
    ],
    associations: &[AssociationModel {
        name: "team",
        target: &TEAM,
        kind: AssociationKind::ManyToOne {
            foreign_key: "team_id",
        },
    }],
};

pub(crate) static TEAM: EntityModel = EntityModel {
    name: "Team",
    key: "id",
    fields: &[FieldModel {
        name: "name",
        kind: ScalarKind::Text,
        nullable: false,
    }],
    associations: &[AssociationModel {
        name: "members",
        target: &MEMBER,
        kind: AssociationKind::OneToMany { mapped_by: "team" },
    }],
};

///
/// QMember
/// Typed paths for one `Member` alias.
///

#[derive(Clone, Debug, Deref)]
pub(crate) struct QMember(EntityPath);

impl QMember {
    pub(crate) fn new(alias: &str) -> Self {
        Self(EntityPath::new(&MEMBER, alias))
    }

    pub(crate) fn path(&self) -> &EntityPath {
        &self.0
    }

    pub(crate) fn id(&self) -> KeyExpr {
        self.0.key()
    }

    pub(crate) fn username(&self) -> StringExpr {
        self.0.string("username")
    }

    pub(crate) fn age(&self) -> NumberExpr {
        self.0.number("age")
    }

    pub(crate) fn team_id(&self) -> KeyExpr {
        self.0.reference("team_id")
    }

    pub(crate) fn team(&self) -> AssociationPath {
        self.0.association("team")
    }
}

///
/// QTeam
///

#[derive(Clone, Debug, Deref)]
pub(crate) struct QTeam(EntityPath);

impl QTeam {
    pub(crate) fn new(alias: &str) -> Self {
        Self(EntityPath::new(&TEAM, alias))
    }

    pub(crate) fn path(&self) -> &EntityPath {
        &self.0
    }

    pub(crate) fn id(&self) -> KeyExpr {
        self.0.key()
    }

    pub(crate) fn name(&self) -> StringExpr {
        self.0.string("name")
    }

    pub(crate) fn members(&self) -> AssociationPath {
        self.0.association("members")
    }
}

/// `member.team.name` through the to-one association.
pub(crate) fn team_name_of(member: &QMember) -> StringExpr {
    member.team().string("name")
}

///
/// Fixture
///
/// teamA: member1 (10), member2 (20)
/// teamB: member3 (30), member4 (40)
///

pub(crate) struct Fixture {
    pub(crate) store: MemoryStore,
    pub(crate) team_a: Entity,
    pub(crate) team_b: Entity,
    pub(crate) members: Vec<Entity>,
}

pub(crate) fn seeded() -> Fixture {
    let mut store = MemoryStore::new();
    let mut team_a = team("teamA");
    let mut team_b = team("teamB");
    store.persist(&mut team_a).expect("persist teamA");
    store.persist(&mut team_b).expect("persist teamB");

    let mut members = vec![
        member(Some("member1"), Some(10), Some(&team_a)),
        member(Some("member2"), Some(20), Some(&team_a)),
        member(Some("member3"), Some(30), Some(&team_b)),
        member(Some("member4"), Some(40), Some(&team_b)),
    ];
    for member in &mut members {
        store.persist(member).expect("persist member");
    }

    Fixture {
        store,
        team_a,
        team_b,
        members,
    }
}

pub(crate) fn team(name: &str) -> Entity {
    Entity::new(&TEAM).with("name", name).expect("team name")
}

pub(crate) fn member(username: Option<&str>, age: Option<i64>, team: Option<&Entity>) -> Entity {
    let mut member = Entity::new(&MEMBER)
        .with("username", username)
        .expect("username")
        .with("age", age)
        .expect("age");
    if let Some(team) = team {
        member.set_reference("team", team).expect("team reference");
    }

    member
}

///
/// RecordingSink
/// Collects trace events in emission order.
///

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: RefCell<Vec<QueryTraceEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<QueryTraceEvent> {
        self.events.borrow().clone()
    }
}

impl QueryTraceSink for RecordingSink {
    fn on_event(&self, event: QueryTraceEvent) {
        self.events.borrow_mut().push(event);
    }
}
