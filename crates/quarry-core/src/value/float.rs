use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use thiserror::Error as ThisError;

///
/// Float64
///
/// Finite 64-bit float with total equality, ordering, and hashing.
/// `-0.0` is normalized to `0.0` so equal values hash identically.
///

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Float64(f64);

impl Float64 {
    /// Construct from a finite float; NaN and infinities are rejected.
    #[must_use]
    pub fn try_new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }

        Some(Self(if value == 0.0 { 0.0 } else { value }))
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Float64 {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Float64 {}

impl PartialOrd for Float64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Float64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Float64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Float64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for Float64 {
    type Error = NonFiniteFloat;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_new(value).ok_or(NonFiniteFloat(value))
    }
}

impl From<Float64> for f64 {
    fn from(value: Float64) -> Self {
        value.0
    }
}

///
/// NonFiniteFloat
///

#[derive(Clone, Copy, Debug, PartialEq, ThisError)]
#[error("float value {0} is not finite")]
pub struct NonFiniteFloat(pub f64);
