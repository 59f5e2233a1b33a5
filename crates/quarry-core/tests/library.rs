//! End-to-end queries over a small Author/Book catalogue, using only the
//! public prelude.

use quarry_core::{
    error::{ErrorClass, ProjectionError},
    prelude::*,
};

static AUTHOR: EntityModel = EntityModel {
    name: "Author",
    key: "id",
    fields: &[FieldModel {
        name: "name",
        kind: ScalarKind::Text,
        nullable: false,
    }],
    associations: &[AssociationModel {
        name: "books",
        target: &BOOK,
        kind: AssociationKind::OneToMany { mapped_by: "author" },
    }],
};

static BOOK: EntityModel = EntityModel {
    name: "Book",
    key: "id",
    fields: &[
        FieldModel {
            name: "title",
            kind: ScalarKind::Text,
            nullable: false,
        },
        FieldModel {
            name: "pages",
            kind: ScalarKind::Int,
            nullable: true,
        },
        FieldModel {
            name: "author_id",
            kind: ScalarKind::Key,
            nullable: true,
        },
    ],
    associations: &[AssociationModel {
        name: "author",
        target: &AUTHOR,
        kind: AssociationKind::ManyToOne {
            foreign_key: "author_id",
        },
    }],
};

struct Paths {
    a: EntityPath,
    b: EntityPath,
}

impl Paths {
    fn new() -> Self {
        Self {
            a: EntityPath::new(&AUTHOR, "a"),
            b: EntityPath::new(&BOOK, "b"),
        }
    }

    fn title(&self) -> StringExpr {
        self.b.string("title")
    }

    fn pages(&self) -> NumberExpr {
        self.b.number("pages")
    }

    fn author_name(&self) -> StringExpr {
        self.a.string("name")
    }

    fn book_author(&self) -> AssociationPath {
        self.b.association("author")
    }
}

///
/// BookLine
///

#[derive(Debug, PartialEq)]
struct BookLine {
    title: String,
    author: String,
    pages: Option<i64>,
}

impl FromRow for BookLine {
    fn from_row(row: &Row) -> Result<Self, ProjectionError> {
        Ok(Self {
            title: row.named_as("title")?,
            author: row.named_as("author")?,
            pages: row.named_as("pages")?,
        })
    }
}

fn catalogue() -> MemoryStore {
    let mut store = MemoryStore::new();
    let mut le_guin = Entity::new(&AUTHOR)
        .with("name", "Le Guin")
        .expect("author should build");
    let mut banks = Entity::new(&AUTHOR)
        .with("name", "Banks")
        .expect("author should build");
    store.persist(&mut le_guin).expect("persist should succeed");
    store.persist(&mut banks).expect("persist should succeed");

    let books = [
        ("The Dispossessed", Some(387), &le_guin),
        ("The Lathe of Heaven", Some(184), &le_guin),
        ("Excession", Some(451), &banks),
        ("Consider Phlebas", None, &banks),
        ("Use of Weapons", Some(411), &banks),
    ];
    for (title, pages, author) in books {
        let mut book = Entity::new(&BOOK)
            .with("title", title)
            .and_then(|book| book.with("pages", pages))
            .and_then(|book| book.with_reference("author", author))
            .expect("book should build");
        store.persist(&mut book).expect("persist should succeed");
    }

    store
}

#[test]
fn labelled_join_projects_into_records() {
    let store = catalogue();
    let p = Paths::new();

    let query = Query::new()
        .select((
            p.title().as_("title"),
            p.author_name().as_("author"),
            p.pages(),
        ))
        .from(&p.b)
        .inner_join(&p.book_author(), &p.a)
        .filter(p.pages().gt(400))
        .order_by([p.pages().desc()])
        .build()
        .expect("build should succeed");

    let lines = Executor::new(&store)
        .execute(&query)
        .expect("execute should succeed")
        .project::<BookLine>()
        .expect("projection should succeed");

    assert_eq!(
        lines,
        vec![
            BookLine {
                title: "Excession".to_string(),
                author: "Banks".to_string(),
                pages: Some(451),
            },
            BookLine {
                title: "Use of Weapons".to_string(),
                author: "Banks".to_string(),
                pages: Some(411),
            },
        ]
    );
}

#[test]
fn grouped_counts_with_having() {
    let store = catalogue();
    let p = Paths::new();

    let query = Query::new()
        .select((p.author_name(), p.b.count().as_("books")))
        .from(&p.b)
        .inner_join(&p.book_author(), &p.a)
        .group_by(p.author_name())
        .having(p.b.count().goe(3))
        .build()
        .expect("build should succeed");

    let rows = Executor::new(&store)
        .execute(&query)
        .expect("execute should succeed");

    let shaped = rows
        .project::<(String, i64)>()
        .expect("projection should succeed");
    assert_eq!(shaped, vec![("Banks".to_string(), 3)]);
    assert_eq!(rows[0].named_as::<i64>("books"), Ok(3));
}

#[test]
fn configured_null_ordering_applies_to_unspecified_keys() {
    let store = catalogue();
    let p = Paths::new();
    let config = ExecutorConfig::from_toml_str("default_null_ordering = \"last\"")
        .expect("config should parse");

    let query = Query::new()
        .select(p.title())
        .from(&p.b)
        .order_by([p.pages().asc()])
        .build()
        .expect("build should succeed");

    let titles = Executor::new(&store)
        .with_config(config)
        .execute(&query)
        .expect("execute should succeed")
        .scalars::<String>()
        .expect("scalars should succeed");

    assert_eq!(titles.last().map(String::as_str), Some("Consider Phlebas"));
    assert_eq!(titles.first().map(String::as_str), Some("The Lathe of Heaven"));
}

#[test]
fn paged_listing_reports_total() {
    let store = catalogue();
    let p = Paths::new();

    let query = Query::new()
        .select(p.title())
        .from(&p.b)
        .order_by([p.title().asc()])
        .offset(1)
        .limit(2)
        .build()
        .expect("build should succeed");

    let page = Executor::new(&store)
        .execute_paged(&query)
        .expect("execute should succeed");

    assert_eq!(page.total(), Some(5));
    assert_eq!(
        page.scalars::<String>().expect("scalars should succeed"),
        vec!["Excession".to_string(), "The Dispossessed".to_string()]
    );
}

#[test]
fn entities_come_back_with_fetched_associations() {
    let store = catalogue();
    let p = Paths::new();

    let query = Query::select_from(&p.a)
        .join(JoinSpec::left(&p.a.association("books"), &p.b).fetch())
        .distinct()
        .order_by([p.author_name().asc()])
        .build()
        .expect("build should succeed");

    let authors = Executor::new(&store)
        .execute(&query)
        .expect("execute should succeed")
        .into_entities()
        .expect("entity mapping should succeed");

    let shelf: Vec<(Option<&Value>, usize)> = authors
        .iter()
        .map(|author| {
            (
                author.get("name"),
                author.related("books").map_or(0, |books| books.as_many().len()),
            )
        })
        .collect();
    assert_eq!(
        shelf,
        vec![
            (Some(&Value::from("Banks")), 3),
            (Some(&Value::from("Le Guin")), 2),
        ]
    );
}

#[test]
fn unvalidated_descriptors_fail_as_build_errors() {
    let store = catalogue();
    let p = Paths::new();

    let query = Query::new().select(p.title()).from(&p.b).filter(p.author_name().eq("x"));

    let err = Executor::new(&store)
        .execute(query.descriptor())
        .expect_err("unbound alias should fail");

    assert_eq!(err.class(), ErrorClass::Build);
}
