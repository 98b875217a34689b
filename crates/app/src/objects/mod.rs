//! Namespaced object identity shared by every object kind.

use std::fmt::{Display, Formatter, Result as FmtResult};

mod errors;
pub mod memory;

pub use errors::RepositoryError;

/// Namespace and name identifying a single cluster object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    /// Namespace the object lives in.
    pub namespace: String,

    /// Object name, unique within its namespace and kind.
    pub name: String,
}

impl ObjectKey {
    /// Creates a key from its parts.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Namespaces covered by a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every namespace visible to the caller.
    #[default]
    AllNamespaces,

    /// A single namespace.
    Namespace(String),
}

impl Scope {
    /// Whether objects in `namespace` fall inside this scope.
    #[must_use]
    pub fn contains(&self, namespace: &str) -> bool {
        match self {
            Self::AllNamespaces => true,
            Self::Namespace(scoped) => scoped == namespace,
        }
    }
}

impl From<Option<String>> for Scope {
    fn from(namespace: Option<String>) -> Self {
        namespace.map_or(Self::AllNamespaces, Self::Namespace)
    }
}
