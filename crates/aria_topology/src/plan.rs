//! Legacy deployment plan.
//!
//! The orchestrator reads this JSON shape directly, so struct field order
//! is the key order and `-1` stands for an unbounded instance count.

use crate::functions::{contains_functions, FunctionTable};
use crate::model::{NodeTemplate, Relationship, Topology};
use aria_core::{Map, Value};
use aria_types::InterfaceSchema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One operation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOperation {
    /// Implementation text before the first `.`
    pub plugin: Option<String>,
    /// Implementation text after the first `.`
    pub operation: Option<String>,
    /// Same as `inputs`
    pub parameters: Map,
    /// Whether `inputs` holds function markers
    pub has_intrinsic_functions: bool,
    /// Operation executor, or the plugin's
    pub executor: Option<String>,
    /// Operation inputs, unevaluated
    pub inputs: Map,
    /// Retry limit
    pub max_retries: Option<i64>,
    /// Seconds between retries
    pub retry_interval: Option<f64>,
}

/// Operations keyed `<interface>.<operation>`
pub type PlanOperations = IndexMap<String, PlanOperation>;

/// Operations grouped by interface, then operation name
pub type PlanInterfaces = IndexMap<String, IndexMap<String, PlanOperation>>;

/// Outgoing relationship of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRelationship {
    /// Target node id
    pub target_id: String,
    /// Source-side operations, flattened
    pub source_operations: PlanOperations,
    /// Target-side operations, flattened
    pub target_operations: PlanOperations,
    /// Source-side operations by interface
    pub source_interfaces: PlanInterfaces,
    /// Target-side operations by interface
    pub target_interfaces: PlanInterfaces,
    /// Relationship type chain, root first
    pub type_hierarchy: Vec<String>,
    /// Property values
    pub properties: Map,
}

/// Plugin referenced by a node's operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPlugin {
    /// Plugin name
    pub name: String,
    /// Executor
    pub executor: Option<String>,
    /// Package source
    pub source: Option<String>,
}

/// Instance counts of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalableProperties {
    /// Instances in this plan
    pub current_instances: i64,
    /// Instances created on deploy
    pub default_instances: i64,
    /// Lower bound
    pub min_instances: i64,
    /// Upper bound, `-1` when unbounded
    pub max_instances: i64,
}

/// The `scalable` capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalableCapability {
    /// Instance counts
    pub properties: ScalableProperties,
}

/// Node capabilities as the plan carries them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCapabilities {
    /// Scaling
    pub scalable: ScalableCapability,
}

/// One node, per node template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    /// Template name
    pub id: String,
    /// Property values, unevaluated
    pub properties: Map,
    /// Operations keyed `<interface>.<operation>`
    pub operations: PlanOperations,
    /// Node type chain, root first
    pub type_hierarchy: Vec<String>,
    /// Outgoing relationships
    pub relationships: Vec<PlanRelationship>,
    /// Plugins the operations use
    pub plugins: Vec<PlanPlugin>,
    /// Node type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Capabilities
    pub capabilities: PlanCapabilities,
}

/// Relationship of a node instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRelationship {
    /// Relationship type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Target node id
    pub target_name: String,
    /// Target instance id
    pub target_id: String,
}

/// One node instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInstance {
    /// Node id
    pub name: String,
    /// Instance id
    pub id: String,
    /// Relationships, one per target instance
    pub relationships: Vec<InstanceRelationship>,
}

/// Workflow entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanWorkflow {
    /// Mapping text before the first `.`
    pub plugin: Option<String>,
    /// Mapping text after the first `.`
    pub operation: Option<String>,
    /// Parameter definitions
    pub parameters: Map,
}

/// The deployment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Nodes in template order
    pub nodes: Vec<PlanNode>,
    /// Node instances in template order
    pub node_instances: Vec<NodeInstance>,
    /// Workflows
    pub workflows: IndexMap<String, PlanWorkflow>,
}

impl Plan {
    /// Build a plan, detecting functions of the standard table
    #[must_use]
    pub fn build(topology: &Topology) -> Self {
        Self::build_with(topology, &FunctionTable::standard())
    }

    /// Build a plan, detecting functions of `table`
    #[must_use]
    pub fn build_with(topology: &Topology, table: &FunctionTable) -> Self {
        let emitter = Emitter { topology, table };
        let nodes: Vec<PlanNode> = topology
            .node_templates
            .values()
            .map(|template| emitter.node(template))
            .collect();
        let node_instances = topology
            .node_templates
            .values()
            .flat_map(|template| emitter.instances(template))
            .collect();
        let workflows = topology
            .workflows
            .values()
            .map(|workflow| {
                let (plugin, operation) = split_first_dot(Some(workflow.mapping.as_str()));
                (
                    workflow.name.clone(),
                    PlanWorkflow {
                        plugin,
                        operation,
                        parameters: workflow.parameters.clone(),
                    },
                )
            })
            .collect();

        tracing::info!(nodes = nodes.len(), "built deployment plan");
        Self {
            nodes,
            node_instances,
            workflows,
        }
    }

    /// Plan as a JSON value
    ///
    /// # Errors
    ///
    /// Returns error if a float is not representable
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Plan as pretty-printed JSON text
    ///
    /// # Errors
    ///
    /// Returns error if a float is not representable
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Deterministic instance id: `<template>_<6 hex>`
#[must_use]
pub fn instance_id(template: &str, index: u64) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(template.as_bytes());
    hasher.update(&index.to_le_bytes());
    let hash = hasher.finalize();
    format!("{}_{}", template, hex::encode(&hash.as_bytes()[..3]))
}

fn split_first_dot(text: Option<&str>) -> (Option<String>, Option<String>) {
    match text {
        Some(text) => match text.split_once('.') {
            Some((plugin, operation)) => (Some(plugin.to_string()), Some(operation.to_string())),
            None => (None, Some(text.to_string())),
        },
        None => (None, None),
    }
}

struct Emitter<'a> {
    topology: &'a Topology,
    table: &'a FunctionTable,
}

impl Emitter<'_> {
    fn node(&self, template: &NodeTemplate) -> PlanNode {
        let scaling = template.scaling;
        PlanNode {
            id: template.name.clone(),
            properties: template.properties.clone(),
            operations: self.flatten(&template.interfaces),
            type_hierarchy: template.type_hierarchy.clone(),
            relationships: template
                .relationships
                .iter()
                .map(|rel| self.relationship(rel))
                .collect(),
            plugins: self.plugins(template),
            type_name: template.type_name.clone(),
            capabilities: PlanCapabilities {
                scalable: ScalableCapability {
                    properties: ScalableProperties {
                        current_instances: scaling.default_instances,
                        default_instances: scaling.default_instances,
                        min_instances: scaling.min_instances,
                        max_instances: scaling.max_instances,
                    },
                },
            },
        }
    }

    fn relationship(&self, rel: &Relationship) -> PlanRelationship {
        PlanRelationship {
            target_id: rel.target.clone(),
            source_operations: self.flatten(&rel.source_interfaces),
            target_operations: self.flatten(&rel.target_interfaces),
            source_interfaces: self.grouped(&rel.source_interfaces),
            target_interfaces: self.grouped(&rel.target_interfaces),
            type_hierarchy: rel.type_hierarchy.clone(),
            properties: rel.properties.clone(),
        }
    }

    fn instances(&self, template: &NodeTemplate) -> Vec<NodeInstance> {
        let relationships: Vec<InstanceRelationship> = template
            .relationships
            .iter()
            .flat_map(|rel| {
                let count = self.instance_count(&rel.target);
                (0..count).map(move |index| InstanceRelationship {
                    type_name: rel.type_name.clone(),
                    target_name: rel.target.clone(),
                    target_id: instance_id(&rel.target, index),
                })
            })
            .collect();
        (0..self.instance_count(&template.name))
            .map(|index| NodeInstance {
                name: template.name.clone(),
                id: instance_id(&template.name, index),
                relationships: relationships.clone(),
            })
            .collect()
    }

    fn instance_count(&self, template: &str) -> u64 {
        self.topology
            .get(template)
            .map_or(0, |t| u64::try_from(t.scaling.default_instances).unwrap_or(0))
    }

    fn operation(&self, schema: &aria_types::OperationSchema) -> PlanOperation {
        let (plugin, operation) = split_first_dot(schema.implementation.as_deref());
        let executor = schema.executor.clone().or_else(|| {
            plugin
                .as_deref()
                .and_then(|name| self.topology.plugins.get(name))
                .and_then(|p| p.executor.clone())
        });
        PlanOperation {
            plugin,
            operation,
            parameters: schema.inputs.clone(),
            has_intrinsic_functions: contains_functions(&Value::Map(schema.inputs.clone()), self.table),
            executor,
            inputs: schema.inputs.clone(),
            max_retries: schema.max_retries,
            retry_interval: schema.retry_interval,
        }
    }

    fn flatten(&self, interfaces: &IndexMap<String, InterfaceSchema>) -> PlanOperations {
        let mut operations = IndexMap::new();
        for (interface, schema) in interfaces {
            for (name, op) in &schema.operations {
                operations.insert(format!("{}.{}", interface, name), self.operation(op));
            }
        }
        operations
    }

    fn grouped(&self, interfaces: &IndexMap<String, InterfaceSchema>) -> PlanInterfaces {
        interfaces
            .iter()
            .map(|(interface, schema)| {
                let operations = schema
                    .operations
                    .iter()
                    .map(|(name, op)| (name.clone(), self.operation(op)))
                    .collect();
                (interface.clone(), operations)
            })
            .collect()
    }

    /// Plugins named by the node's operations and its relationships' source operations
    fn plugins(&self, template: &NodeTemplate) -> Vec<PlanPlugin> {
        let interfaces = std::iter::once(&template.interfaces)
            .chain(template.relationships.iter().map(|rel| &rel.source_interfaces));
        let mut names: Vec<String> = Vec::new();
        for schema in interfaces.flat_map(IndexMap::values) {
            for op in schema.operations.values() {
                if let (Some(plugin), _) = split_first_dot(op.implementation.as_deref()) {
                    if !names.contains(&plugin) {
                        names.push(plugin);
                    }
                }
            }
        }

        let declared = &self.topology.plugins;
        names
            .into_iter()
            .filter_map(|name| match declared.get(&name) {
                Some(plugin) => Some(PlanPlugin {
                    name,
                    executor: plugin.executor.clone(),
                    source: plugin.source.clone(),
                }),
                None if declared.is_empty() => Some(PlanPlugin {
                    name,
                    executor: None,
                    source: None,
                }),
                None => None,
            })
            .collect()
    }
}
