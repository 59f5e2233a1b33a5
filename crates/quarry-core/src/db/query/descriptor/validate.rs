use crate::{
    db::query::{
        Alias, AssociationPath, BuildError, Predicate, QueryDescriptor,
        descriptor::{JoinKind, JoinSpec, OrderSpec},
        expr::{Expr, FieldPath},
    },
    model::EntityModel,
};

///
/// Scope
///
/// Alias bindings of one query level. Lookups fall through to enclosing
/// levels, which is what makes correlated subqueries resolvable.
///

pub(super) struct Scope<'a> {
    bindings: Vec<(Alias, &'static EntityModel)>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    const fn new(parent: Option<&'a Scope<'a>>) -> Self {
        Self {
            bindings: Vec::new(),
            parent,
        }
    }

    fn lookup(&self, alias: &Alias) -> Option<&'static EntityModel> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == alias)
            .map(|(_, model)| *model)
            .or_else(|| self.parent.and_then(|parent| parent.lookup(alias)))
    }

    // Shadowing an outer alias is allowed; rebinding within a level is not.
    fn bind(&mut self, alias: &Alias, model: &'static EntityModel) -> Result<(), BuildError> {
        if self.bindings.iter().any(|(bound, _)| bound == alias) {
            return Err(BuildError::DuplicateAlias {
                alias: alias.to_string(),
            });
        }
        self.bindings.push((alias.clone(), model));

        Ok(())
    }

    // Join owners must be bound at the same level as the join.
    fn require_local(&self, alias: &Alias) -> Result<&'static EntityModel, BuildError> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == alias)
            .map(|(_, model)| *model)
            .ok_or_else(|| BuildError::UnboundAlias {
                alias: alias.to_string(),
            })
    }

    fn require(&self, alias: &Alias) -> Result<&'static EntityModel, BuildError> {
        self.lookup(alias).ok_or_else(|| BuildError::UnboundAlias {
            alias: alias.to_string(),
        })
    }
}

/// Validate one query level and, recursively, every subquery it contains.
pub(super) fn validate_query(
    query: &QueryDescriptor,
    parent: Option<&Scope<'_>>,
) -> Result<(), BuildError> {
    if query.sources().is_empty() {
        return Err(BuildError::MissingSource);
    }

    let mut scope = Scope::new(parent);
    for source in query.sources() {
        scope.bind(source.alias(), source.model())?;
    }

    // joins bind in declaration order; a join condition sees its own alias
    for join in query.joins() {
        validate_join(join, &scope)?;
        scope.bind(join.alias(), join.target())?;
        if let Some(on) = join.condition() {
            validate_expr(on.expr(), &scope)?;
        }
    }

    let slots = query
        .filter()
        .map(Predicate::expr)
        .into_iter()
        .chain(query.group_by())
        .chain(query.having().map(Predicate::expr))
        .chain(query.order_by().iter().map(OrderSpec::expr))
        .chain(query.projection());
    for expr in slots {
        validate_expr(expr, &scope)?;
    }

    Ok(())
}

fn validate_join(join: &JoinSpec, scope: &Scope<'_>) -> Result<(), BuildError> {
    if join.kind() == JoinKind::Cartesian && join.condition().is_some() {
        return Err(BuildError::CartesianJoinCondition {
            alias: join.alias().to_string(),
        });
    }

    let Some(path) = join.association() else {
        if join.is_fetch() {
            return Err(BuildError::FetchRequiresAssociation {
                alias: join.alias().to_string(),
            });
        }
        return Ok(());
    };

    validate_join_association(path, join, scope)
}

fn validate_join_association(
    path: &AssociationPath,
    join: &JoinSpec,
    scope: &Scope<'_>,
) -> Result<(), BuildError> {
    let owner = scope.require_local(path.alias())?;
    if owner != path.root() {
        return Err(BuildError::type_mismatch(
            "join owner",
            path.root().name,
            owner.name,
        ));
    }

    let [hop] = path.via() else {
        return Err(BuildError::JoinPathDepth {
            alias: path.alias().to_string(),
            hops: path.via().len(),
        });
    };
    let assoc = owner
        .association(hop)
        .ok_or(BuildError::UnknownAssociation {
            entity: owner.name,
            association: *hop,
        })?;
    if assoc.target != join.target() {
        return Err(BuildError::type_mismatch(
            "join target",
            assoc.target.name,
            join.target().name,
        ));
    }

    Ok(())
}

fn validate_expr(expr: &Expr, scope: &Scope<'_>) -> Result<(), BuildError> {
    expr.check_node()?;

    match expr {
        Expr::Field(path) => validate_field(path, scope),
        Expr::Entity(entity) => {
            let model = scope.require(entity.alias())?;
            if model.name == entity.entity() {
                Ok(())
            } else {
                Err(BuildError::type_mismatch(
                    "entity reference",
                    entity.entity(),
                    model.name,
                ))
            }
        }
        Expr::Exists(subquery) | Expr::Subquery(subquery) => {
            validate_query(subquery.query(), Some(scope))
        }
        Expr::InSubquery { expr, subquery, .. } => {
            validate_expr(expr, scope)?;
            validate_query(subquery.query(), Some(scope))
        }
        other => other
            .children()
            .into_iter()
            .try_for_each(|child| validate_expr(child, scope)),
    }
}

fn validate_field(path: &FieldPath, scope: &Scope<'_>) -> Result<(), BuildError> {
    let mut model = scope.require(path.alias())?;
    if model.name != path.root() {
        return Err(BuildError::type_mismatch("path root", path.root(), model.name));
    }

    for hop in path.via() {
        let assoc = model
            .association(hop)
            .ok_or(BuildError::UnknownAssociation {
                entity: model.name,
                association: *hop,
            })?;
        if assoc.is_to_many() {
            return Err(BuildError::ToManyTraversal {
                entity: model.name,
                association: *hop,
            });
        }
        model = assoc.target;
    }

    let kind = model
        .field_kind(path.field())
        .ok_or(BuildError::UnknownField {
            entity: model.name,
            field: path.field(),
        })?;
    if kind != path.kind() {
        return Err(BuildError::type_mismatch(
            "field path",
            path.kind().to_string(),
            kind,
        ));
    }

    Ok(())
}
