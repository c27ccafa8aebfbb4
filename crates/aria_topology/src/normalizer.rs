//! Topology normalizer.
//!
//! Two passes over the declared node templates. The first resolves each
//! template's type and fills in properties, capabilities, interfaces and
//! scaling. The second binds requirements in declaration order, so a
//! capability's occurrence count only ever grows. Structural problems are
//! appended to the issue list; the offending element is left out.

use crate::model::{CapabilityInstance, NodeTemplate, Plugin, Relationship, Scaling, Topology, Workflow};
use crate::template::{Declarations, InputDecl, RelationshipTemplateDecl, RequirementDecl, TemplateDecl};
use aria_core::{CoreResult, IssueList, Location, Map, TypeCategory, Value};
use aria_presentation::{Grammar, Presentation};
use aria_types::schema::overlay_interfaces;
use aria_types::{InterfaceSchema, Occurrences, PropertySchema, Schema, TypeRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Relationship type used when a requirement names none
pub const DEFAULT_RELATIONSHIP: &str = "tosca.relationships.Root";

/// Normalizer settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Supplied deployment input values
    pub inputs: Map,
    /// Treat undeclared supplied inputs as errors instead of warnings
    pub strict_inputs: bool,
}

impl NormalizeConfig {
    /// Create a configuration with no inputs
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set every supplied input
    #[must_use]
    pub fn with_inputs(mut self, inputs: Map) -> Self {
        self.inputs = inputs;
        self
    }

    /// Supply one input value
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    /// Set strict input checking
    #[must_use]
    pub fn with_strict_inputs(mut self, strict: bool) -> Self {
        self.strict_inputs = strict;
        self
    }
}

/// Relationship settings resolved before a requirement is bound
struct ResolvedRelationship {
    type_name: String,
    template: Option<String>,
    type_hierarchy: Vec<String>,
    properties: Map,
    source_interfaces: IndexMap<String, InterfaceSchema>,
    target_interfaces: IndexMap<String, InterfaceSchema>,
}

/// A requirement with its definition's constraints filled in
struct Requirement {
    decl: RequirementDecl,
    occurrences: Occurrences,
}

/// Builds a [`Topology`] from a validated document and a frozen registry
#[derive(Debug)]
pub struct Normalizer<'r> {
    registry: &'r TypeRegistry,
    config: NormalizeConfig,
}

impl<'r> Normalizer<'r> {
    /// Create a normalizer over a frozen registry
    #[must_use]
    pub fn new(registry: &'r TypeRegistry, config: NormalizeConfig) -> Self {
        Self { registry, config }
    }

    /// Normalize the templates of a document root presentation.
    ///
    /// # Errors
    ///
    /// Returns a presentation error on accessor misuse; every structural
    /// problem is appended to `issues` instead
    pub fn normalize(
        &self,
        view: &Presentation<'_>,
        grammar: &Grammar,
        issues: &mut IssueList,
    ) -> CoreResult<Topology> {
        let decls = Declarations::read(view, grammar.dialect)?;
        let mut topology = Topology {
            inputs: self.resolve_inputs(&decls.inputs, view.location(), issues),
            ..Topology::default()
        };

        let mut resolved: Vec<(&TemplateDecl, Schema)> = Vec::new();
        let mut locations: IndexMap<String, Location> = IndexMap::new();
        for decl in &decls.templates {
            let Some(type_name) = decl.type_name.as_deref() else {
                issues.report(
                    format!("node template \"{}\" declares no type", decl.name),
                    decl.location.clone(),
                );
                continue;
            };
            let Some(schema) = self.registry.merged_schema(TypeCategory::Node, type_name) else {
                issues.report(
                    format!(
                        "node template \"{}\" has unknown node type \"{}\"",
                        decl.name, type_name
                    ),
                    decl.location.clone(),
                );
                continue;
            };
            let template = self.instantiate(decl, type_name, &schema, issues);
            topology.node_templates.insert(decl.name.clone(), template);
            locations.insert(decl.name.clone(), decl.location.clone());
            resolved.push((decl, schema));
        }

        for (decl, schema) in &resolved {
            for requirement in requirements_of(decl, schema) {
                self.bind(
                    &decl.name,
                    requirement,
                    &decls.relationship_templates,
                    &mut topology,
                    issues,
                );
            }
        }

        for (name, template) in &topology.node_templates {
            for (cap_name, cap) in &template.capabilities {
                if !cap.occurrences.contains(cap.current_occ) {
                    let location = locations.get(name).cloned().unwrap_or_else(|| view.location());
                    issues.report(
                        format!(
                            "capability \"{}\" of node template \"{}\" has {} relationships, outside {}",
                            cap_name, name, cap.current_occ, cap.occurrences
                        ),
                        location,
                    );
                }
            }
        }

        topology.outputs = decls.outputs;
        for (name, executor, source) in decls.plugins {
            topology
                .plugins
                .insert(name.clone(), Plugin { name, executor, source });
        }
        for (name, mapping, parameters) in decls.workflows {
            topology.workflows.insert(
                name.clone(),
                Workflow {
                    name,
                    mapping,
                    parameters,
                },
            );
        }

        tracing::info!(
            templates = topology.len(),
            relationships = topology.relationship_count(),
            issues = issues.len(),
            "normalized topology"
        );
        Ok(topology)
    }

    fn resolve_inputs(&self, declared: &[InputDecl], root: Location, issues: &mut IssueList) -> Map {
        let mut inputs = Map::new();
        for input in declared {
            match self.config.inputs.get(&input.name).or(input.default.as_ref()) {
                Some(value) => {
                    inputs.insert(input.name.clone(), value.clone());
                }
                None if input.required => issues.report(
                    format!("input \"{}\" has no value and no default", input.name),
                    input.location.clone(),
                ),
                None => {}
            }
        }
        for name in self.config.inputs.keys() {
            if declared.iter().any(|input| &input.name == name) {
                continue;
            }
            let message = format!("supplied input \"{}\" is not declared", name);
            if self.config.strict_inputs {
                issues.report(message, root.clone());
            } else {
                issues.warn(message, root.clone());
            }
        }
        inputs
    }

    fn instantiate(
        &self,
        decl: &TemplateDecl,
        type_name: &str,
        schema: &Schema,
        issues: &mut IssueList,
    ) -> NodeTemplate {
        let owner = format!("node template \"{}\"", decl.name);
        let properties = resolve_properties(&owner, &decl.properties, &schema.properties, &decl.location, issues);

        let mut capabilities = IndexMap::new();
        for (cap_name, cap_schema) in &schema.capabilities {
            let assigned = decl.capabilities.get(cap_name).cloned().unwrap_or_default();
            let owner = format!("capability \"{}\" of node template \"{}\"", cap_name, decl.name);
            capabilities.insert(
                cap_name.clone(),
                CapabilityInstance {
                    type_name: cap_schema.type_name.clone().unwrap_or_default(),
                    occurrences: cap_schema.occurrences,
                    current_occ: 0,
                    properties: resolve_properties(&owner, &assigned, &cap_schema.properties, &decl.location, issues),
                },
            );
        }
        for cap_name in decl.capabilities.keys() {
            if !schema.capabilities.contains_key(cap_name) {
                issues.warn(
                    format!("{} assigns undeclared capability \"{}\"", owner, cap_name),
                    decl.location.clone(),
                );
            }
        }

        let mut interfaces = schema.interfaces.clone();
        overlay_interfaces(&mut interfaces, &decl.interfaces);

        let scaling = scaling_of(decl, &capabilities);
        tracing::debug!(template = %decl.name, type_name, "instantiated node template");

        NodeTemplate {
            name: decl.name.clone(),
            type_name: type_name.to_string(),
            type_hierarchy: self.registry.type_hierarchy(TypeCategory::Node, type_name),
            properties,
            capabilities,
            relationships: Vec::new(),
            interfaces,
            scaling,
        }
    }

    fn bind(
        &self,
        source: &str,
        requirement: Requirement,
        relationship_templates: &IndexMap<String, RelationshipTemplateDecl>,
        topology: &mut Topology,
        issues: &mut IssueList,
    ) {
        let Requirement { decl, occurrences } = requirement;
        let Some(relationship) = self.resolve_relationship(source, &decl, relationship_templates, issues) else {
            return;
        };

        let explicit_target = decl
            .node
            .as_deref()
            .filter(|node| decl.explicit || topology.node_templates.contains_key(*node));

        let bound = match explicit_target {
            Some(target) => self.bind_explicit(source, &decl, target, topology, issues),
            None => self.find_match(source, &decl, topology),
        };
        let Some((target, capability)) = bound else {
            if explicit_target.is_none() && occurrences.min >= 1 {
                issues.report(
                    format!(
                        "requirement \"{}\" of node template \"{}\" matches no capability with room",
                        decl.name, source
                    ),
                    decl.location.clone(),
                );
            }
            return;
        };

        if let Some(cap) = capability
            .as_deref()
            .and_then(|name| topology.node_templates.get_mut(&target)?.capabilities.get_mut(name))
        {
            cap.current_occ += 1;
        }
        tracing::debug!(
            source,
            requirement = %decl.name,
            to = %target,
            capability = ?capability,
            "bound requirement"
        );

        let Some(template) = topology.node_templates.get_mut(source) else {
            return;
        };
        template.relationships.push(Relationship {
            requirement: decl.name,
            target,
            capability,
            type_name: relationship.type_name,
            template: relationship.template,
            type_hierarchy: relationship.type_hierarchy,
            properties: relationship.properties,
            source_interfaces: relationship.source_interfaces,
            target_interfaces: relationship.target_interfaces,
        });
    }

    /// Bind to a named template, skipping node type matching.
    ///
    /// Prefers a capability matching the constraint, then any with room.
    fn bind_explicit(
        &self,
        source: &str,
        decl: &RequirementDecl,
        target: &str,
        topology: &Topology,
        issues: &mut IssueList,
    ) -> Option<(String, Option<String>)> {
        let Some(template) = topology.get(target) else {
            issues.report(
                format!(
                    "requirement \"{}\" of node template \"{}\" targets unknown node template \"{}\"",
                    decl.name, source, target
                ),
                decl.location.clone(),
            );
            return None;
        };
        if template.capabilities.is_empty() {
            return Some((target.to_string(), None));
        }
        let capability = self.pick_capability(decl, template).or_else(|| {
            template
                .capabilities
                .iter()
                .find(|(_, cap)| cap.has_room())
                .map(|(name, _)| name.clone())
        });
        match capability {
            Some(capability) => Some((target.to_string(), Some(capability))),
            None => {
                issues.report(
                    format!(
                        "requirement \"{}\" of node template \"{}\" finds no capability with room on \"{}\"",
                        decl.name, source, target
                    ),
                    decl.location.clone(),
                );
                None
            }
        }
    }

    /// First template in declaration order satisfying the constraints
    fn find_match(
        &self,
        source: &str,
        decl: &RequirementDecl,
        topology: &Topology,
    ) -> Option<(String, Option<String>)> {
        topology
            .node_templates
            .values()
            .filter(|candidate| candidate.name != source)
            .filter(|candidate| match decl.node.as_deref() {
                Some(node) => {
                    self.registry
                        .is_descendant_or_self(TypeCategory::Node, &candidate.type_name, node)
                }
                None => true,
            })
            .find_map(|candidate| {
                if candidate.capabilities.is_empty() && decl.capability.is_none() {
                    return Some((candidate.name.clone(), None));
                }
                self.pick_capability(decl, candidate)
                    .map(|capability| (candidate.name.clone(), Some(capability)))
            })
    }

    /// First capability matching the constraint by name or type that has room
    fn pick_capability(&self, decl: &RequirementDecl, candidate: &NodeTemplate) -> Option<String> {
        candidate
            .capabilities
            .iter()
            .filter(|(name, cap)| match decl.capability.as_deref() {
                Some(constraint) => {
                    name.as_str() == constraint
                        || self
                            .registry
                            .is_descendant_or_self(TypeCategory::Capability, &cap.type_name, constraint)
                }
                None => true,
            })
            .find(|(_, cap)| cap.has_room())
            .map(|(name, _)| name.clone())
    }

    fn resolve_relationship(
        &self,
        source: &str,
        decl: &RequirementDecl,
        relationship_templates: &IndexMap<String, RelationshipTemplateDecl>,
        issues: &mut IssueList,
    ) -> Option<ResolvedRelationship> {
        let named = decl.relationship.as_deref();
        let template = named.and_then(|name| relationship_templates.get(name));
        let type_name = match (template, named) {
            (Some(template), _) => template.type_name.clone().unwrap_or_else(|| DEFAULT_RELATIONSHIP.to_string()),
            (None, Some(name)) => name.to_string(),
            (None, None) => DEFAULT_RELATIONSHIP.to_string(),
        };

        let schema = match self.registry.merged_schema(TypeCategory::Relationship, &type_name) {
            Some(schema) => schema,
            None if named.is_none() && template.is_none() => Schema::default(),
            None => {
                issues.report(
                    format!(
                        "requirement \"{}\" of node template \"{}\" names unknown relationship \"{}\"",
                        decl.name,
                        source,
                        named.unwrap_or(&type_name)
                    ),
                    decl.location.clone(),
                );
                return None;
            }
        };

        let mut assigned = template.map(|t| t.properties.clone()).unwrap_or_default();
        for (key, value) in &decl.properties {
            assigned.insert(key.clone(), value.clone());
        }
        let owner = format!("relationship \"{}\" of node template \"{}\"", decl.name, source);
        let properties = resolve_properties(&owner, &assigned, &schema.properties, &decl.location, issues);

        let mut source_interfaces = schema.interfaces.clone();
        overlay_interfaces(&mut source_interfaces, &schema.source_interfaces);
        if let Some(template) = template {
            overlay_interfaces(&mut source_interfaces, &template.interfaces);
        }
        overlay_interfaces(&mut source_interfaces, &decl.source_interfaces);
        let mut target_interfaces = schema.target_interfaces.clone();
        overlay_interfaces(&mut target_interfaces, &decl.target_interfaces);

        Some(ResolvedRelationship {
            type_hierarchy: self.registry.type_hierarchy(TypeCategory::Relationship, &type_name),
            type_name,
            template: template.map(|t| t.name.clone()),
            properties,
            source_interfaces,
            target_interfaces,
        })
    }
}

/// Normalize with default settings
///
/// # Errors
///
/// Returns a presentation error on accessor misuse
pub fn normalize(
    view: &Presentation<'_>,
    grammar: &Grammar,
    registry: &TypeRegistry,
    issues: &mut IssueList,
) -> CoreResult<Topology> {
    Normalizer::new(registry, NormalizeConfig::default()).normalize(view, grammar, issues)
}

/// Inline requirements completed from their definitions, then inherited
/// definitions the template did not assign
fn requirements_of(decl: &TemplateDecl, schema: &Schema) -> Vec<Requirement> {
    let mut requirements: Vec<Requirement> = decl
        .requirements
        .iter()
        .map(|assigned| {
            let definition = schema.requirements.get(&assigned.name);
            let mut completed = assigned.clone();
            if let Some(definition) = definition {
                if completed.capability.is_none() {
                    completed.capability.clone_from(&definition.capability);
                }
                if completed.relationship.is_none() {
                    completed.relationship.clone_from(&definition.relationship);
                }
                if completed.node.is_none() {
                    completed.node.clone_from(&definition.node);
                }
            }
            Requirement {
                decl: completed,
                occurrences: definition.map_or(Occurrences::REQUIREMENT, |d| d.occurrences),
            }
        })
        .collect();

    for (name, definition) in &schema.requirements {
        if decl.requirements.iter().any(|assigned| &assigned.name == name) {
            continue;
        }
        requirements.push(Requirement {
            decl: RequirementDecl {
                name: name.clone(),
                node: definition.node.clone(),
                capability: definition.capability.clone(),
                relationship: definition.relationship.clone(),
                properties: Map::new(),
                source_interfaces: IndexMap::new(),
                target_interfaces: IndexMap::new(),
                explicit: false,
                location: decl.location.clone(),
            },
            occurrences: definition.occurrences,
        });
    }
    requirements
}

/// Assigned values over definition defaults; required and absent is an issue
fn resolve_properties(
    owner: &str,
    assigned: &Map,
    definitions: &IndexMap<String, PropertySchema>,
    location: &Location,
    issues: &mut IssueList,
) -> Map {
    let mut properties = Map::new();
    for (name, definition) in definitions {
        let value = assigned
            .get(name)
            .filter(|value| !value.is_null())
            .or(definition.default.as_ref());
        match value {
            Some(value) => {
                properties.insert(name.clone(), value.clone());
            }
            None if definition.required => issues.report(
                format!("{} is missing required property \"{}\"", owner, name),
                location.clone(),
            ),
            None => {}
        }
    }
    for (name, value) in assigned {
        if !definitions.contains_key(name) {
            issues.warn(
                format!("{} assigns undeclared property \"{}\"", owner, name),
                location.clone(),
            );
            properties.insert(name.clone(), value.clone());
        }
    }
    properties
}

fn scaling_of(decl: &TemplateDecl, capabilities: &IndexMap<String, CapabilityInstance>) -> Scaling {
    let mut scaling = Scaling::default();
    if let Some(deploy) = decl.deploy {
        scaling.default_instances = deploy;
    }
    if let Some(scalable) = capabilities.get("scalable") {
        let read = |key: &str| scalable.properties.get(key).and_then(Value::as_i64);
        if let Some(default) = read("default_instances") {
            scaling.default_instances = default;
        }
        if let Some(min) = read("min_instances") {
            scaling.min_instances = min;
        }
        if let Some(max) = read("max_instances") {
            scaling.max_instances = max;
        }
    }
    scaling
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::{Locator, RawDocument};
    use aria_presentation::GrammarTable;

    fn run(yaml: &str, config: NormalizeConfig) -> (Topology, IssueList) {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let doc = RawDocument::new(Value::from(value), Locator::new("main.yaml"));
        let table = GrammarTable::standard();
        let grammar = table.select(&doc.root, &doc.locator).unwrap();
        let view = Presentation::root(&doc, grammar.root);
        let registry = TypeRegistry::build(&view, grammar).unwrap();
        let mut issues = IssueList::new();
        let topology = Normalizer::new(&registry, config)
            .normalize(&view, grammar, &mut issues)
            .unwrap();
        (topology, issues)
    }

    #[test]
    fn test_requirement_satisfaction() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
capability_types:
  StorageCap: {}
  Volume: {derived_from: StorageCap}
node_types:
  AppType:
    requirements:
      - storage: {capability: StorageCap, node: Container}
  Container:
    capabilities:
      storage: {type: Volume}
topology_template:
  node_templates:
    app: {type: AppType}
    db: {type: Container}
",
            NormalizeConfig::new(),
        );
        assert!(issues.is_empty(), "{:?}", issues);
        let app = topology.get("app").unwrap();
        assert_eq!(app.relationships.len(), 1);
        assert_eq!(app.relationships[0].target, "db");
        assert_eq!(app.relationships[0].capability.as_deref(), Some("storage"));
        assert_eq!(app.relationships[0].type_name, DEFAULT_RELATIONSHIP);
        assert!(app.relationships[0].type_hierarchy.is_empty());
        assert_eq!(topology.get("db").unwrap().capabilities["storage"].current_occ, 1);
    }

    #[test]
    fn test_occurrence_violation_is_an_issue() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
capability_types:
  Slot: {}
node_types:
  App:
    requirements:
      - first: {capability: Slot}
      - second: {capability: Slot}
  Host:
    capabilities:
      slot: {type: Slot, occurrences: [1, 1]}
topology_template:
  node_templates:
    app: {type: App}
    host: {type: Host}
",
            NormalizeConfig::new(),
        );
        assert_eq!(issues.len(), 1);
        assert!(issues.iter().next().unwrap().message.contains("second"));
        assert_eq!(topology.len(), 2);
        let app = topology.get("app").unwrap();
        assert_eq!(app.relationships.len(), 1);
        assert_eq!(app.relationships[0].requirement, "first");
        assert_eq!(topology.get("host").unwrap().capabilities["slot"].current_occ, 1);
    }

    #[test]
    fn test_explicit_target_respects_room() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
node_types:
  App: {}
  Host:
    capabilities:
      slot: {type: Slot, occurrences: [1, 1]}
topology_template:
  node_templates:
    app:
      type: App
      requirements:
        - a: host
        - b: host
    host: {type: Host}
",
            NormalizeConfig::new(),
        );
        assert_eq!(issues.errors().count(), 1);
        assert_eq!(topology.get("app").unwrap().relationships.len(), 1);
        assert_eq!(topology.get("host").unwrap().capabilities["slot"].current_occ, 1);
    }

    #[test]
    fn test_explicit_target_ignores_capability_type() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
node_types:
  App:
    requirements:
      - host: {capability: Container}
  Server:
    capabilities:
      endpoint: {type: Endpoint, occurrences: [0, UNBOUNDED]}
topology_template:
  node_templates:
    app:
      type: App
      requirements:
        - host: server
    server: {type: Server}
",
            NormalizeConfig::new(),
        );
        assert!(issues.is_empty(), "{:?}", issues);
        let app = topology.get("app").unwrap();
        assert_eq!(app.relationships.len(), 1);
        assert_eq!(app.relationships[0].target, "server");
        assert_eq!(app.relationships[0].capability.as_deref(), Some("endpoint"));
        assert_eq!(topology.get("server").unwrap().capabilities["endpoint"].current_occ, 1);
    }

    #[test]
    fn test_capability_below_min_is_an_issue() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
capability_types:
  Slot: {}
  Pair: {}
node_types:
  App:
    requirements:
      - pair: {capability: Pair}
  Host:
    capabilities:
      slot: {type: Slot}
      pair: {type: Pair, occurrences: [2, 3]}
topology_template:
  node_templates:
    app: {type: App}
    host: {type: Host}
",
            NormalizeConfig::new(),
        );
        let messages: Vec<&str> = issues.errors().map(|issue| issue.message.as_str()).collect();
        assert_eq!(messages.len(), 2, "{:?}", messages);
        assert!(messages[0].contains("\"slot\"") && messages[0].contains("has 0 relationships, outside [1, UNBOUNDED]"));
        assert!(messages[1].contains("\"pair\"") && messages[1].contains("has 1 relationships, outside [2, 3]"));
        assert_eq!(topology.len(), 2);
        assert_eq!(topology.get("app").unwrap().relationships.len(), 1);
    }

    #[test]
    fn test_required_property_missing() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
node_types:
  Server:
    properties:
      port: {type: integer}
      name: {type: string, required: false}
      region: {type: string, default: eu}
topology_template:
  node_templates:
    web: {type: Server, properties: {name: w}}
",
            NormalizeConfig::new(),
        );
        assert_eq!(issues.len(), 1);
        let message = &issues.iter().next().unwrap().message;
        assert!(message.contains("\"port\""));
        assert!(message.contains("\"web\""));
        assert_eq!(topology.property("web", &["name"]), Some(&Value::from("w")));
        assert_eq!(topology.property("web", &["region"]), Some(&Value::from("eu")));
        assert_eq!(topology.property("web", &["port"]), None);
    }

    #[test]
    fn test_unknown_type_is_excluded() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
node_types:
  Server: {}
topology_template:
  node_templates:
    web: {type: Server}
    ghost: {type: Missing}
",
            NormalizeConfig::new(),
        );
        assert_eq!(issues.len(), 1);
        assert!(issues.iter().next().unwrap().message.contains("Missing"));
        assert!(topology.get("ghost").is_none());
        assert_eq!(topology.get("web").unwrap().type_hierarchy, vec!["Server".to_string()]);
    }

    #[test]
    fn test_relationship_template() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
capability_types:
  Endpoint: {}
relationship_types:
  tosca.relationships.Root: {}
  ConnectsTo:
    derived_from: tosca.relationships.Root
    properties:
      secure: {type: boolean, default: false}
node_types:
  Client:
    requirements:
      - db: {capability: Endpoint, relationship: ConnectsTo, occurrences: [0, 1]}
  Database:
    capabilities:
      endpoint: {type: Endpoint, occurrences: [0, UNBOUNDED]}
topology_template:
  relationship_templates:
    secure_link: {type: ConnectsTo, properties: {secure: true}}
  node_templates:
    client:
      type: Client
      requirements:
        - db: {node: database, relationship: secure_link}
    database: {type: Database}
",
            NormalizeConfig::new(),
        );
        assert!(issues.is_empty(), "{:?}", issues);
        let rel = &topology.get("client").unwrap().relationships[0];
        assert_eq!(rel.target, "database");
        assert_eq!(rel.capability.as_deref(), Some("endpoint"));
        assert_eq!(rel.template.as_deref(), Some("secure_link"));
        assert_eq!(rel.type_name, "ConnectsTo");
        assert_eq!(
            rel.type_hierarchy,
            vec!["tosca.relationships.Root".to_string(), "ConnectsTo".to_string()]
        );
        assert_eq!(rel.properties.get("secure"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_unknown_relationship_skips_binding() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
node_types:
  App: {}
  Host: {}
topology_template:
  node_templates:
    app:
      type: App
      requirements:
        - host: {node: host, relationship: Nowhere}
    host: {type: Host}
",
            NormalizeConfig::new(),
        );
        assert_eq!(issues.len(), 1);
        assert!(issues.iter().next().unwrap().message.contains("Nowhere"));
        assert!(topology.get("app").unwrap().relationships.is_empty());
    }

    #[test]
    fn test_inputs() {
        let yaml = r"
tosca_definitions_version: tosca_simple_yaml_1_0
topology_template:
  inputs:
    port: {type: integer, default: 80}
    name: {type: string}
    optional: {type: string, required: false}
";
        let (topology, issues) = run(yaml, NormalizeConfig::new().with_input("extra", 1_i64));
        assert_eq!(topology.inputs.get("port"), Some(&Value::Integer(80)));
        assert_eq!(issues.errors().count(), 1);
        assert_eq!(issues.len(), 2);

        let config = NormalizeConfig::new()
            .with_input("name", "web")
            .with_input("port", 8080_i64)
            .with_input("extra", 1_i64)
            .with_strict_inputs(true);
        let (topology, issues) = run(yaml, config);
        assert_eq!(topology.inputs.get("port"), Some(&Value::Integer(8080)));
        assert_eq!(topology.inputs.get("name"), Some(&Value::from("web")));
        assert!(topology.inputs.get("optional").is_none());
        assert_eq!(issues.errors().count(), 1);
        assert!(issues.iter().next().unwrap().message.contains("extra"));
    }

    #[test]
    fn test_scaling_and_interfaces() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: tosca_simple_yaml_1_0
capability_types:
  Scalable: {}
node_types:
  Server:
    capabilities:
      scalable:
        type: Scalable
        occurrences: [0, UNBOUNDED]
        properties:
          default_instances: {type: integer, default: 1}
          min_instances: {type: integer, default: 1}
    interfaces:
      Standard:
        create: create.sh
        start: start.sh
topology_template:
  node_templates:
    web:
      type: Server
      capabilities:
        scalable: {properties: {default_instances: 3}}
      interfaces:
        Standard:
          start: custom_start.sh
",
            NormalizeConfig::new(),
        );
        assert!(issues.is_empty(), "{:?}", issues);
        let web = topology.get("web").unwrap();
        assert_eq!(
            web.scaling,
            Scaling {
                default_instances: 3,
                min_instances: 1,
                max_instances: -1
            }
        );
        let ops = &web.interfaces["Standard"].operations;
        assert_eq!(ops["create"].implementation.as_deref(), Some("create.sh"));
        assert_eq!(ops["start"].implementation.as_deref(), Some("custom_start.sh"));
    }

    #[test]
    fn test_cloudify_blueprint() {
        let (topology, issues) = run(
            r"
tosca_definitions_version: cloudify_dsl_1_0
plugins:
  fab: {executor: central_deployment_agent, source: fab-plugin}
workflows:
  install: default_workflows.install
node_types:
  cloudify.nodes.Compute:
    properties:
      ip: {default: 10.0.0.1}
  web_app:
    properties:
      port: {default: 8080}
    interfaces:
      cloudify.interfaces.lifecycle:
        create: fab.tasks.create
relationships:
  cloudify.relationships.contained_in: {}
node_templates:
  vm:
    type: cloudify.nodes.Compute
    instances: {deploy: 2}
  app:
    type: web_app
    relationships:
      - {type: cloudify.relationships.contained_in, target: vm}
      - {type: cloudify.relationships.contained_in, target: nowhere}
",
            NormalizeConfig::new(),
        );
        assert_eq!(issues.len(), 1);
        assert!(issues.iter().next().unwrap().message.contains("nowhere"));
        assert_eq!(topology.get("vm").unwrap().scaling.default_instances, 2);

        let app = topology.get("app").unwrap();
        assert_eq!(app.relationships.len(), 1);
        let rel = &app.relationships[0];
        assert_eq!(rel.target, "vm");
        assert_eq!(rel.capability, None);
        assert_eq!(rel.type_hierarchy, vec!["cloudify.relationships.contained_in".to_string()]);
        assert_eq!(topology.property("app", &["port"]), Some(&Value::Integer(8080)));
        assert_eq!(topology.plugins["fab"].executor.as_deref(), Some("central_deployment_agent"));
        assert_eq!(topology.workflows["install"].mapping, "default_workflows.install");
    }
}
