//! Type categories.
//!
//! Each category is its own namespace: a node type and a data type may share
//! a name without conflict.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    /// Node types
    Node,
    /// Relationship types
    Relationship,
    /// Capability types
    Capability,
    /// Data types
    Data,
    /// Group types
    Group,
    /// Policy types
    Policy,
    /// Artifact types
    Artifact,
    /// Interface types
    Interface,
}

impl TypeCategory {
    /// Every category, in registry order
    pub const ALL: [TypeCategory; 8] = [
        Self::Node,
        Self::Relationship,
        Self::Capability,
        Self::Data,
        Self::Group,
        Self::Policy,
        Self::Artifact,
        Self::Interface,
    ];

    /// Lowercase category name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Relationship => "relationship",
            Self::Capability => "capability",
            Self::Data => "data",
            Self::Group => "group",
            Self::Policy => "policy",
            Self::Artifact => "artifact",
            Self::Interface => "interface",
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
