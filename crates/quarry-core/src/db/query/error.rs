use thiserror::Error as ThisError;

///
/// BuildError
///
/// Rejected construction. Raised while composing expressions or when a
/// descriptor is finalized with `Query::build`; never retried.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BuildError {
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },

    #[error("alias '{alias}' is not bound by any enclosing source or join")]
    UnboundAlias { alias: String },

    #[error("alias '{alias}' is bound more than once in the same query")]
    DuplicateAlias { alias: String },

    #[error("entity '{entity}' has no field '{field}'")]
    UnknownField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("entity '{entity}' has no association '{association}'")]
    UnknownAssociation {
        entity: &'static str,
        association: &'static str,
    },

    #[error(
        "association '{entity}.{association}' is to-many and cannot be traversed by a path; join it instead"
    )]
    ToManyTraversal {
        entity: &'static str,
        association: &'static str,
    },

    #[error("join target must be a single association hop from '{alias}', found {hops} hops")]
    JoinPathDepth { alias: String, hops: usize },

    #[error("query declares no source entity")]
    MissingSource,

    #[error(
        "cartesian join on '{alias}' cannot carry an `on` condition; express the join condition in the filter"
    )]
    CartesianJoinCondition { alias: String },

    #[error("fetch join on '{alias}' requires an association target")]
    FetchRequiresAssociation { alias: String },

    #[error("case expression requires at least one when/then arm")]
    EmptyCase,
}

impl BuildError {
    pub(crate) fn type_mismatch(
        context: &'static str,
        expected: impl Into<String>,
        found: impl ToString,
    ) -> Self {
        Self::TypeMismatch {
            context,
            expected: expected.into(),
            found: found.to_string(),
        }
    }
}
