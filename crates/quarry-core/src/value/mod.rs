mod compare;
mod float;


use crate::{
    entity::{Entity, EntityKey},
    model::ScalarKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// re-exports
pub use compare::{compare_values, values_equal};
pub use float::{Float64, NonFiniteFloat};

///
/// Value
/// Runtime value of a field, literal, or evaluated expression.
///
/// Null   → SQL NULL; a legitimate field value, never "no row".
/// Entity → a materialized entity instance; only produced by entity-typed
///          projections and never persisted.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(Float64),
    Text(String),
    Key(EntityKey),
    #[serde(skip)]
    Entity(Box<Entity>),
}

impl Value {
    /// Float value, or `Null` when the input is not finite.
    #[must_use]
    pub fn float(value: f64) -> Self {
        Float64::try_new(value).map_or(Self::Null, Self::Float)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Representative used for hashed equality (group keys, distinct).
    /// Integral floats collapse onto the matching int, so values that
    /// `values_equal` treats as equal share one key.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn canonical(&self) -> Self {
        match self {
            Self::Float(f) => {
                let v = f.get();
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                    Self::Int(v as i64)
                } else {
                    self.clone()
                }
            }
            other => other.clone(),
        }
    }

    /// Scalar kind of this value; `None` for `Null` and entities.
    #[must_use]
    pub const fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Bool(_) => Some(ScalarKind::Bool),
            Self::Int(_) => Some(ScalarKind::Int),
            Self::Float(_) => Some(ScalarKind::Float),
            Self::Text(_) => Some(ScalarKind::Text),
            Self::Key(_) => Some(ScalarKind::Key),
            Self::Null | Self::Entity(_) => None,
        }
    }

    /// Short label used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Key(_) => "key",
            Self::Entity(_) => "entity",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; ints widen to float.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(v.get()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_key(&self) -> Option<EntityKey> {
        match self {
            Self::Key(k) => Some(*k),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Text rendering used by numeric-to-string coercion.
    /// Returns `None` for `Null` and entities.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Key(k) => Some(k.get().to_string()),
            Self::Null | Self::Entity(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Key(k) => write!(f, "{k}"),
            Self::Entity(e) => write!(f, "{}({})", e.model().name, display_key(e.key())),
        }
    }
}

fn display_key(key: Option<EntityKey>) -> String {
    key.map_or_else(|| "transient".to_string(), |k| k.to_string())
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl From<Float64> for Value {
    fn from(value: Float64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<EntityKey> for Value {
    fn from(value: EntityKey) -> Self {
        Self::Key(value)
    }
}

impl From<Entity> for Value {
    fn from(value: Entity) -> Self {
        Self::Entity(Box::new(value))
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
