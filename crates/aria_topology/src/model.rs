//! Normalized deployment graph.
//!
//! A [`Topology`] is built once by the normalizer and is read-only
//! afterwards. Property values may still hold intrinsic-function markers;
//! they are resolved on demand through [`crate::functions`].

use aria_core::{Map, Value};
use aria_types::{InterfaceSchema, Occurrences};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Instance counts; `-1` means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaling {
    /// Instances created on deploy
    pub default_instances: i64,
    /// Lower bound
    pub min_instances: i64,
    /// Upper bound, `-1` when unbounded
    pub max_instances: i64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            default_instances: 1,
            min_instances: 0,
            max_instances: -1,
        }
    }
}

/// A capability offered by a node template, with its occurrence count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityInstance {
    /// Capability type
    pub type_name: String,
    /// Bounds on incoming relationships
    pub occurrences: Occurrences,
    /// Relationships bound so far
    pub current_occ: u64,
    /// Property values
    pub properties: Map,
}

impl CapabilityInstance {
    /// Check if one more relationship may bind
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.occurrences.has_room(self.current_occ)
    }
}

/// A requirement bound to a target template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Requirement name on the source template
    pub requirement: String,
    /// Target template
    pub target: String,
    /// Capability of the target the requirement bound to
    pub capability: Option<String>,
    /// Relationship type
    pub type_name: String,
    /// Relationship template, when one was named
    pub template: Option<String>,
    /// Relationship type chain, root first
    pub type_hierarchy: Vec<String>,
    /// Property values
    pub properties: Map,
    /// Operations run on the source node
    pub source_interfaces: IndexMap<String, InterfaceSchema>,
    /// Operations run on the target node
    pub target_interfaces: IndexMap<String, InterfaceSchema>,
}

/// A node template instantiated against its resolved type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Template name
    pub name: String,
    /// Node type
    pub type_name: String,
    /// Node type chain, root first
    pub type_hierarchy: Vec<String>,
    /// Property values
    pub properties: Map,
    /// Offered capabilities
    pub capabilities: IndexMap<String, CapabilityInstance>,
    /// Outgoing relationships in requirement order
    pub relationships: Vec<Relationship>,
    /// Type interfaces overlaid by the template's own
    pub interfaces: IndexMap<String, InterfaceSchema>,
    /// Instance counts
    pub scaling: Scaling,
}

/// Plugin declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    /// Plugin name
    pub name: String,
    /// Where operations run
    pub executor: Option<String>,
    /// Package source
    pub source: Option<String>,
}

/// Workflow declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow name
    pub name: String,
    /// `plugin.task` mapping
    pub mapping: String,
    /// Parameter definitions, kept raw
    pub parameters: Map,
}

/// The normalized deployment graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Deployment input values
    pub inputs: Map,
    /// Node templates in declaration order
    pub node_templates: IndexMap<String, NodeTemplate>,
    /// Output expressions, kept raw
    pub outputs: Map,
    /// Plugin declarations
    pub plugins: IndexMap<String, Plugin>,
    /// Workflow declarations
    pub workflows: IndexMap<String, Workflow>,
}

impl Topology {
    /// Look up a node template
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NodeTemplate> {
        self.node_templates.get(name)
    }

    /// Number of node templates
    #[must_use]
    pub fn len(&self) -> usize {
        self.node_templates.len()
    }

    /// Check if the topology has no node templates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_templates.is_empty()
    }

    /// Total relationship count
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.node_templates.values().map(|t| t.relationships.len()).sum()
    }

    /// Property of a template, addressed by a path of keys
    #[must_use]
    pub fn property(&self, template: &str, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut value = self.get(template)?.properties.get(*first)?;
        for key in rest {
            value = value.get(key)?;
        }
        Some(value)
    }
}
