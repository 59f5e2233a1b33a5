use crate::value::Value;
use std::cmp::Ordering;

/// Compare two non-null values of compatible kinds.
///
/// Ints and floats compare numerically across variants. Entities compare by
/// key. Returns `None` when either side is null or the kinds are not
/// comparable; callers treat that as SQL UNKNOWN.
#[must_use]
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => Some(a.cmp(b)),
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Key(a), Value::Key(b)) => Some(a.cmp(b)),
        (Value::Entity(a), Value::Entity(b)) => {
            if a.model().name != b.model().name {
                return None;
            }

            match (a.key(), b.key()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => (a == b).then_some(Ordering::Equal),
            }
        }
        _ => None,
    }
}

/// SQL equality: `None` when either side is null (UNKNOWN).
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> Option<bool> {
    if left.is_null() || right.is_null() {
        return None;
    }

    Some(compare_values(left, right) == Some(Ordering::Equal))
}
