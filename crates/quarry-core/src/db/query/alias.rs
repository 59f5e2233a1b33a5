use derive_more::Deref;
use std::{fmt, sync::Arc};

///
/// Alias
///
/// Name binding one source entity within a single query's scope.
/// Cheap to clone; derefs to `str`.
///

#[derive(Clone, Debug, Deref, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[deref(forward)]
pub struct Alias(Arc<str>);

impl Alias {
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Alias {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
