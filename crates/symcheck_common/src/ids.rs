//! Identifier newtypes for knowledge-graph resources.
//!
//! Identifiers are kept in compact prefixed form (`dbr:Fever`). The full
//! resource URI is only produced when talking to the graph endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace of DBpedia resources.
pub const RESOURCE_NAMESPACE: &str = "http://dbpedia.org/resource/";

/// Prefix used for compact identifiers.
pub const RESOURCE_PREFIX: &str = "dbr:";

/// Compact a full resource URI. Strings that are already compact (or use a
/// foreign namespace) are returned unchanged.
pub fn compact(raw: &str) -> String {
    match raw.strip_prefix(RESOURCE_NAMESPACE) {
        Some(local) => format!("{}{}", RESOURCE_PREFIX, local),
        None => raw.to_string(),
    }
}

/// Expand a compact identifier to its full URI.
pub fn expand(id: &str) -> String {
    match id.strip_prefix(RESOURCE_PREFIX) {
        Some(local) => format!("{}{}", RESOURCE_NAMESPACE, local),
        None => id.to_string(),
    }
}

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Build from either a full URI or a compact identifier.
            pub fn new(raw: impl AsRef<str>) -> Self {
                Self(compact(raw.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Full resource URI, for use inside graph queries.
            pub fn expand(&self) -> String {
                expand(&self.0)
            }

            /// Human-readable fallback when no label is known.
            pub fn local_name(&self) -> String {
                let local = self
                    .0
                    .strip_prefix(RESOURCE_PREFIX)
                    .or_else(|| self.0.rsplit('/').next())
                    .unwrap_or(&self.0);
                local.replace('_', " ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::new(raw)
            }
        }
    };
}

resource_id!(
    /// Identity of a symptom resource.
    SymptomId
);

resource_id!(
    /// Identity of a disease resource.
    DiseaseId
);

/// A disease as returned by a graph lookup. Labels are not unique across
/// diseases, so ordering is by identifier only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DiseaseRef {
    pub id: DiseaseId,
    pub label: String,
}

impl DiseaseRef {
    pub fn new(id: impl Into<DiseaseId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}
