//! Executor configuration, loadable from TOML.

#[cfg(test)]
mod tests;

use crate::db::query::NullOrdering;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Cross-product size above which a theta join is logged as a warning.
pub const DEFAULT_CARTESIAN_WARN_ROWS: u64 = 10_000;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid executor config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// ExecutorConfig
///
/// Knobs that change how the executor resolves unspecified behaviour.
///
/// ```toml
/// default_null_ordering = "last"
/// cartesian_warn_rows = 50000
/// ```
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Null placement for order keys that do not set one. `None` defers to
    /// `Store::natural_null_ordering`.
    pub default_null_ordering: Option<NullOrdering>,

    /// Cartesian products larger than this are still formed, but logged.
    pub cartesian_warn_rows: u64,
}

impl ExecutorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    #[must_use]
    pub const fn with_default_null_ordering(mut self, nulls: NullOrdering) -> Self {
        self.default_null_ordering = Some(nulls);
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_null_ordering: None,
            cartesian_warn_rows: DEFAULT_CARTESIAN_WARN_ROWS,
        }
    }
}
