use serde::{Deserialize, Serialize};
use std::fmt;

///
/// FieldModel
/// Runtime field metadata used by path validation and materialization.
///

#[derive(Debug)]
pub struct FieldModel {
    /// Field name as used in paths and raw rows.
    pub name: &'static str,
    pub kind: ScalarKind,
    /// Whether the field may hold `Value::Null`.
    pub nullable: bool,
}

///
/// ScalarKind
///
/// Static result type of scalar fields and expressions.
/// `Key` is the surrogate identity type; foreign keys share it.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Text,
    Key,
}

impl ScalarKind {
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Two kinds may be compared with each other.
    #[must_use]
    pub const fn is_comparable_with(self, other: Self) -> bool {
        match (self, other) {
            (Self::Int | Self::Float, Self::Int | Self::Float)
            | (Self::Bool, Self::Bool)
            | (Self::Text, Self::Text)
            | (Self::Key, Self::Key) => true,
            _ => false,
        }
    }

    /// A value of kind `other` may be stored in a field of this kind.
    #[must_use]
    pub const fn accepts(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Bool, Self::Bool)
                | (Self::Int, Self::Int)
                | (Self::Float, Self::Int | Self::Float)
                | (Self::Text, Self::Text)
                | (Self::Key, Self::Key)
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Key => "key",
        };

        write!(f, "{label}")
    }
}
