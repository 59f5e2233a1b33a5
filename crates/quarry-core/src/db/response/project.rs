use crate::{
    db::response::{ProjectionError, Row},
    entity::{Entity, EntityKey},
    value::Value,
};

///
/// FromValue
///
/// Conversion of one result value into a Rust type. `None` means the value
/// has the wrong kind; nulls only convert into `Option<T>` and `Value`.
///

pub trait FromValue: Sized {
    /// Kind name reported in projection errors.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "int (32-bit)";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int().and_then(|v| Self::try_from(v).ok())
    }
}

impl FromValue for u64 {
    const EXPECTED: &'static str = "non-negative int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int().and_then(|v| Self::try_from(v).ok())
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(ToString::to_string)
    }
}

impl FromValue for EntityKey {
    const EXPECTED: &'static str = "key";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_key()
    }
}

impl FromValue for Entity {
    const EXPECTED: &'static str = "entity";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_entity().cloned()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

///
/// FromRow
///
/// Constructor projection: build a caller-defined record from one row.
/// Tuples map positionally; records usually read labelled columns with
/// `Row::named_as`.
///

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, ProjectionError>;
}

macro_rules! impl_from_row_tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(row: &Row) -> Result<Self, ProjectionError> {
                Ok(($(row.get_as::<$name>($index)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(A: 0);
impl_from_row_tuple!(A: 0, B: 1);
impl_from_row_tuple!(A: 0, B: 1, C: 2);
impl_from_row_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_from_row_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
