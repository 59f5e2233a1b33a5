use crate::{
    db::query::{
        Alias, Predicate,
        expr::{AggregateFunc, EntityRef, Expr, FieldPath, KeyExpr, NumberExpr, StringExpr},
    },
    model::{EntityModel, ScalarKind},
};

///
/// EntityPath
///
/// A bound alias for one entity type; the root of every field path.
/// Construct one per source or join in a query (`QMember::new("m")`).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityPath {
    alias: Alias,
    model: &'static EntityModel,
}

///
/// AssociationPath
///
/// A path from a bound alias through one or more to-one associations.
/// Used as a join target and for implicit navigation in expressions.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationPath {
    alias: Alias,
    root: &'static EntityModel,
    via: Vec<&'static str>,
}

impl EntityPath {
    #[must_use]
    pub fn new(model: &'static EntityModel, alias: &str) -> Self {
        Self {
            alias: Alias::new(alias),
            model,
        }
    }

    #[must_use]
    pub const fn alias(&self) -> &Alias {
        &self.alias
    }

    #[must_use]
    pub const fn model(&self) -> &'static EntityModel {
        self.model
    }

    /// The bound entity itself as an expression.
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        Expr::Entity(EntityRef {
            alias: self.alias.clone(),
            entity: self.model.name,
        })
    }

    /// The identity field.
    #[must_use]
    pub fn key(&self) -> KeyExpr {
        KeyExpr::from_expr_unchecked(Expr::Field(FieldPath {
            alias: self.alias.clone(),
            root: self.model.name,
            via: Vec::new(),
            field: self.model.key,
            kind: ScalarKind::Key,
        }))
    }

    #[must_use]
    pub fn association(&self, name: &'static str) -> AssociationPath {
        AssociationPath {
            alias: self.alias.clone(),
            root: self.model,
            via: vec![name],
        }
    }

    /// Number of bound rows in the group, same as `count(*)` for inner joins.
    #[must_use]
    pub fn count(&self) -> NumberExpr {
        NumberExpr::from_expr_unchecked(Expr::Aggregate {
            func: AggregateFunc::Count,
            arg: Some(Box::new(self.to_expr())),
        })
    }

    fn field_path(&self, field: &'static str, fallback: ScalarKind) -> FieldPath {
        FieldPath {
            alias: self.alias.clone(),
            root: self.model.name,
            via: Vec::new(),
            field,
            kind: declared_kind(Some(self.model), field, fallback),
        }
    }
}

impl AssociationPath {
    #[must_use]
    pub const fn alias(&self) -> &Alias {
        &self.alias
    }

    #[must_use]
    pub const fn root(&self) -> &'static EntityModel {
        self.root
    }

    #[must_use]
    pub fn via(&self) -> &[&'static str] {
        &self.via
    }

    /// Model at the end of the path, if every hop exists.
    #[must_use]
    pub fn target(&self) -> Option<&'static EntityModel> {
        self.via.iter().try_fold(self.root, |model, hop| {
            model.association(hop).map(|assoc| assoc.target)
        })
    }

    /// Extend the path by one more association hop.
    #[must_use]
    pub fn association(&self, name: &'static str) -> Self {
        let mut via = self.via.clone();
        via.push(name);

        Self {
            alias: self.alias.clone(),
            root: self.root,
            via,
        }
    }

    /// Identity of the entity at the end of the path.
    #[must_use]
    pub fn key(&self) -> KeyExpr {
        let field = self.target().map_or("id", |target| target.key);

        KeyExpr::from_expr_unchecked(Expr::Field(self.field_path(field, ScalarKind::Key)))
    }

    fn field_path(&self, field: &'static str, fallback: ScalarKind) -> FieldPath {
        FieldPath {
            alias: self.alias.clone(),
            root: self.root.name,
            via: self.via.clone(),
            field,
            kind: declared_kind(self.target(), field, fallback),
        }
    }
}

// Scalar accessors shared by both path roots.
macro_rules! scalar_accessors {
    ($ty:ident) => {
        impl $ty {
            /// Numeric field.
            #[must_use]
            pub fn number(&self, field: &'static str) -> NumberExpr {
                NumberExpr::from_expr_unchecked(Expr::Field(self.field_path(field, ScalarKind::Int)))
            }

            #[must_use]
            pub fn string(&self, field: &'static str) -> StringExpr {
                StringExpr::from_expr_unchecked(Expr::Field(
                    self.field_path(field, ScalarKind::Text),
                ))
            }

            /// Boolean field used directly as a predicate.
            #[must_use]
            pub fn boolean(&self, field: &'static str) -> Predicate {
                Predicate::from_expr_unchecked(Expr::Field(
                    self.field_path(field, ScalarKind::Bool),
                ))
            }

            /// Foreign-key column.
            #[must_use]
            pub fn reference(&self, field: &'static str) -> KeyExpr {
                KeyExpr::from_expr_unchecked(Expr::Field(self.field_path(field, ScalarKind::Key)))
            }
        }
    };
}

scalar_accessors!(EntityPath);
scalar_accessors!(AssociationPath);

impl From<EntityPath> for Expr {
    fn from(path: EntityPath) -> Self {
        path.to_expr()
    }
}

impl From<&EntityPath> for Expr {
    fn from(path: &EntityPath) -> Self {
        path.to_expr()
    }
}

// Kind recorded on the path: the model's kind when it matches the accessor,
// otherwise the accessor's kind so validation can report the mismatch.
fn declared_kind(
    model: Option<&'static EntityModel>,
    field: &str,
    fallback: ScalarKind,
) -> ScalarKind {
    match model.and_then(|model| model.field_kind(field)) {
        Some(kind) if kind == fallback || (kind.is_numeric() && fallback.is_numeric()) => kind,
        _ => fallback,
    }
}
