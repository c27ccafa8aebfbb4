//! Dialect-neutral topology declarations.
//!
//! TOSCA keeps templates under `topology_template` and expresses
//! connections as requirement assignments; Cloudify keeps them at the top
//! level and lists explicit relationships. Both are read into the same
//! declaration records before normalization.

use aria_core::{Location, Map, Value};
use aria_presentation::{Dialect, Presentation, PresentationError};
use aria_types::schema::extract_interfaces;
use aria_types::InterfaceSchema;
use indexmap::IndexMap;

/// A requirement as written on a template
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementDecl {
    /// Requirement name
    pub name: String,
    /// Target template, or node type constraint
    pub node: Option<String>,
    /// Capability name or type constraint
    pub capability: Option<String>,
    /// Relationship type or template
    pub relationship: Option<String>,
    /// Relationship property values
    pub properties: Map,
    /// Relationship source-side interfaces
    pub source_interfaces: IndexMap<String, InterfaceSchema>,
    /// Relationship target-side interfaces
    pub target_interfaces: IndexMap<String, InterfaceSchema>,
    /// `node` always names a template
    pub explicit: bool,
    /// Declaration location
    pub location: Location,
}

/// A node template as written
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDecl {
    /// Template name
    pub name: String,
    /// Declared node type
    pub type_name: Option<String>,
    /// Assigned property values
    pub properties: Map,
    /// Requirements in declaration order
    pub requirements: Vec<RequirementDecl>,
    /// Template-level interfaces
    pub interfaces: IndexMap<String, InterfaceSchema>,
    /// Capability property assignments, by capability name
    pub capabilities: IndexMap<String, Map>,
    /// Cloudify `instances.deploy`
    pub deploy: Option<i64>,
    /// Declaration location
    pub location: Location,
}

/// A TOSCA relationship template
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipTemplateDecl {
    /// Template name
    pub name: String,
    /// Relationship type
    pub type_name: Option<String>,
    /// Property values
    pub properties: Map,
    /// Interfaces
    pub interfaces: IndexMap<String, InterfaceSchema>,
}

/// A deployment input definition
#[derive(Debug, Clone, PartialEq)]
pub struct InputDecl {
    /// Input name
    pub name: String,
    /// Default value
    pub default: Option<Value>,
    /// Whether a value must be supplied when there is no default
    pub required: bool,
    /// Declaration location
    pub location: Location,
}

/// Every topology-level declaration of a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    /// Input definitions
    pub inputs: Vec<InputDecl>,
    /// Node templates in declaration order
    pub templates: Vec<TemplateDecl>,
    /// Relationship templates
    pub relationship_templates: IndexMap<String, RelationshipTemplateDecl>,
    /// Output expressions
    pub outputs: Map,
    /// Plugin declarations: name, executor, source
    pub plugins: Vec<(String, Option<String>, Option<String>)>,
    /// Workflow declarations: name, mapping, parameters
    pub workflows: Vec<(String, String, Map)>,
}

impl Declarations {
    /// Read the declarations of a document root presentation
    ///
    /// # Errors
    ///
    /// Returns error on accessor misuse
    pub fn read(root: &Presentation<'_>, dialect: Dialect) -> Result<Self, PresentationError> {
        match dialect {
            Dialect::Tosca => Self::read_tosca(root),
            Dialect::Cloudify => Self::read_cloudify(root),
        }
    }

    fn read_tosca(root: &Presentation<'_>) -> Result<Self, PresentationError> {
        let Some(topology) = root.object("topology_template")? else {
            return Ok(Self::default());
        };
        let mut decls = Self::default();

        for input in topology.objects("inputs")? {
            let Some(name) = input.name() else { continue };
            decls.inputs.push(InputDecl {
                name: name.to_string(),
                default: input.value("default")?.map(|v| v.into_owned()),
                required: input.boolean("required")?.unwrap_or(true),
                location: input.location(),
            });
        }

        for template in topology.objects("node_templates")? {
            let Some(name) = template.name() else { continue };
            let mut requirements = Vec::new();
            for req in template.objects("requirements")? {
                let Some(req_name) = req.name() else { continue };
                let relationship = req.object("relationship")?;
                let (rel_type, properties, interfaces) = match &relationship {
                    Some(rel) => (
                        rel.string("type")?.map(str::to_string),
                        rel.map("properties")?.cloned().unwrap_or_default(),
                        extract_interfaces(rel, "interfaces")?,
                    ),
                    None => (None, Map::new(), IndexMap::new()),
                };
                requirements.push(RequirementDecl {
                    name: req_name.to_string(),
                    node: req.string("node")?.map(str::to_string),
                    capability: req.string("capability")?.map(str::to_string),
                    relationship: rel_type,
                    properties,
                    source_interfaces: interfaces,
                    target_interfaces: IndexMap::new(),
                    explicit: false,
                    location: req.location(),
                });
            }

            let mut capabilities = IndexMap::new();
            for cap in template.objects("capabilities")? {
                if let Some(cap_name) = cap.name() {
                    let properties = cap.map("properties")?.cloned().unwrap_or_default();
                    capabilities.insert(cap_name.to_string(), properties);
                }
            }

            decls.templates.push(TemplateDecl {
                name: name.to_string(),
                type_name: template.string("type")?.map(str::to_string),
                properties: template.map("properties")?.cloned().unwrap_or_default(),
                requirements,
                interfaces: extract_interfaces(&template, "interfaces")?,
                capabilities,
                deploy: None,
                location: template.location(),
            });
        }

        for rel in topology.objects("relationship_templates")? {
            let Some(name) = rel.name() else { continue };
            decls.relationship_templates.insert(
                name.to_string(),
                RelationshipTemplateDecl {
                    name: name.to_string(),
                    type_name: rel.string("type")?.map(str::to_string),
                    properties: rel.map("properties")?.cloned().unwrap_or_default(),
                    interfaces: extract_interfaces(&rel, "interfaces")?,
                },
            );
        }

        for output in topology.objects("outputs")? {
            if let Some(name) = output.name() {
                let value = output.value("value")?.map(|v| v.into_owned()).unwrap_or_default();
                decls.outputs.insert(name.to_string(), value);
            }
        }

        Ok(decls)
    }

    fn read_cloudify(root: &Presentation<'_>) -> Result<Self, PresentationError> {
        let mut decls = Self::default();

        for input in root.objects("inputs")? {
            let Some(name) = input.name() else { continue };
            decls.inputs.push(InputDecl {
                name: name.to_string(),
                default: input.value("default")?.map(|v| v.into_owned()),
                required: true,
                location: input.location(),
            });
        }

        for template in root.objects("node_templates")? {
            let Some(name) = template.name() else { continue };
            let mut requirements = Vec::new();
            for rel in template.objects("relationships")? {
                let rel_type = rel.string("type")?.map(str::to_string);
                requirements.push(RequirementDecl {
                    name: rel_type.clone().unwrap_or_default(),
                    node: rel.string("target")?.map(str::to_string),
                    capability: None,
                    relationship: rel_type,
                    properties: rel.map("properties")?.cloned().unwrap_or_default(),
                    source_interfaces: extract_interfaces(&rel, "source_interfaces")?,
                    target_interfaces: extract_interfaces(&rel, "target_interfaces")?,
                    explicit: true,
                    location: rel.location(),
                });
            }
            let deploy = match template.object("instances")? {
                Some(instances) => instances.integer("deploy")?,
                None => None,
            };

            decls.templates.push(TemplateDecl {
                name: name.to_string(),
                type_name: template.string("type")?.map(str::to_string),
                properties: template.map("properties")?.cloned().unwrap_or_default(),
                requirements,
                interfaces: extract_interfaces(&template, "interfaces")?,
                capabilities: IndexMap::new(),
                deploy,
                location: template.location(),
            });
        }

        for output in root.objects("outputs")? {
            if let Some(name) = output.name() {
                let value = output.value("value")?.map(|v| v.into_owned()).unwrap_or_default();
                decls.outputs.insert(name.to_string(), value);
            }
        }

        for plugin in root.objects("plugins")? {
            if let Some(name) = plugin.name() {
                decls.plugins.push((
                    name.to_string(),
                    plugin.string("executor")?.map(str::to_string),
                    plugin.string("source")?.map(str::to_string),
                ));
            }
        }

        for workflow in root.objects("workflows")? {
            let Some(name) = workflow.name() else { continue };
            let Some(mapping) = workflow.string("mapping")? else { continue };
            let parameters = workflow
                .raw_field("parameters")
                .and_then(Value::as_map)
                .cloned()
                .unwrap_or_default();
            decls
                .workflows
                .push((name.to_string(), mapping.to_string(), parameters));
        }

        Ok(decls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::{Locator, RawDocument};
    use aria_presentation::GrammarTable;

    fn read(yaml: &str) -> Declarations {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let doc = RawDocument::new(Value::from(value), Locator::new("main.yaml"));
        let table = GrammarTable::standard();
        let grammar = table.select(&doc.root, &doc.locator).unwrap();
        Declarations::read(&Presentation::root(&doc, grammar.root), grammar.dialect).unwrap()
    }

    #[test]
    fn test_read_tosca() {
        let decls = read(
            "tosca_definitions_version: tosca_simple_yaml_1_0\n\
             topology_template:\n\
             \x20 inputs:\n    port: {type: integer, default: 80}\n\
             \x20 node_templates:\n\
             \x20   app:\n      type: App\n      requirements:\n        - host: server\n        - db: {node: Database, relationship: {type: ConnectsTo, properties: {a: 1}}}\n\
             \x20   server:\n      type: Server\n      capabilities:\n        scalable: {properties: {default_instances: 2}}\n\
             \x20 outputs:\n    url: {value: {get_input: port}}\n",
        );
        assert_eq!(decls.inputs.len(), 1);
        assert_eq!(decls.inputs[0].default, Some(Value::Integer(80)));
        assert_eq!(decls.templates.len(), 2);

        let app = &decls.templates[0];
        assert_eq!(app.requirements[0].name, "host");
        assert_eq!(app.requirements[0].node.as_deref(), Some("server"));
        assert!(!app.requirements[0].explicit);
        assert_eq!(app.requirements[1].relationship.as_deref(), Some("ConnectsTo"));
        assert_eq!(app.requirements[1].properties.get("a"), Some(&Value::Integer(1)));
        assert_eq!(app.requirements[1].location.path.to_string(), "topology_template.node_templates.app.requirements[1].db");

        let server = &decls.templates[1];
        assert_eq!(
            server.capabilities["scalable"].get("default_instances"),
            Some(&Value::Integer(2))
        );
        assert!(decls.outputs["url"].get("get_input").is_some());
    }

    #[test]
    fn test_read_cloudify() {
        let decls = read(
            "tosca_definitions_version: cloudify_dsl_1_0\n\
             inputs:\n  image: {}\n\
             plugins:\n  fab: {executor: central_deployment_agent, source: fab-plugin}\n\
             workflows:\n  install: default_workflows.install\n\
             node_templates:\n\
             \x20 vm:\n    type: cloudify.nodes.Compute\n    instances: {deploy: 3}\n\
             \x20 app:\n    type: cloudify.nodes.App\n    relationships:\n      - {type: cloudify.relationships.contained_in, target: vm}\n",
        );
        assert!(decls.inputs[0].required);
        assert_eq!(decls.templates[0].deploy, Some(3));
        let rel = &decls.templates[1].requirements[0];
        assert!(rel.explicit);
        assert_eq!(rel.node.as_deref(), Some("vm"));
        assert_eq!(rel.relationship.as_deref(), Some("cloudify.relationships.contained_in"));
        assert_eq!(
            decls.plugins,
            vec![("fab".to_string(), Some("central_deployment_agent".to_string()), Some("fab-plugin".to_string()))]
        );
        assert_eq!(decls.workflows[0].1, "default_workflows.install");
    }

    #[test]
    fn test_tosca_without_topology() {
        let decls = read("tosca_definitions_version: tosca_simple_yaml_1_0\n");
        assert!(decls.templates.is_empty());
    }
}
