//! TOSCA Simple Profile in YAML 1.0 presentation tables.
//!
//! Section numbers refer to the OASIS TOSCA Simple Profile in YAML v1.0.

use crate::field::{DefaultValue, FieldDescriptor as F, PresentationType, PrimitiveType as P};
use crate::grammar::{Dialect, Grammar};
use aria_core::TypeCategory;

/// Schema of a list/map entry
pub static ENTRY_SCHEMA: PresentationType = PresentationType::new(
    "tosca.EntrySchema",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("description", P::String),
        F::primitive_list("constraints", P::Any),
    ],
)
.section("3.5.8.4")
.short_form("type");

/// Property definition
pub static PROPERTY_DEFINITION: PresentationType = PresentationType::new(
    "tosca.PropertyDefinition",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("description", P::String),
        F::primitive("required", P::Boolean).with_default(DefaultValue::Bool(true)),
        F::primitive("default", P::Any),
        F::primitive("status", P::String),
        F::primitive_list("constraints", P::Any),
        F::object("entry_schema", &ENTRY_SCHEMA),
    ],
)
.section("3.5.8");

/// Attribute definition
pub static ATTRIBUTE_DEFINITION: PresentationType = PresentationType::new(
    "tosca.AttributeDefinition",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("description", P::String),
        F::primitive("default", P::Any),
        F::primitive("status", P::String),
        F::object("entry_schema", &ENTRY_SCHEMA),
    ],
)
.section("3.5.10");

/// Input and output parameter definition
pub static PARAMETER_DEFINITION: PresentationType = PresentationType::new(
    "tosca.ParameterDefinition",
    &[
        F::primitive("type", P::String),
        F::primitive("description", P::String),
        F::primitive("required", P::Boolean).with_default(DefaultValue::Bool(true)),
        F::primitive("default", P::Any),
        F::primitive("value", P::Any),
        F::primitive("status", P::String),
        F::primitive_list("constraints", P::Any),
        F::object("entry_schema", &ENTRY_SCHEMA),
    ],
)
.section("3.5.12");

/// Operation definition, or a bare implementation string
pub static OPERATION_DEFINITION: PresentationType = PresentationType::new(
    "tosca.OperationDefinition",
    &[
        F::primitive("description", P::String),
        F::primitive("implementation", P::Any),
        F::primitive("inputs", P::Map),
    ],
)
.section("3.5.13")
.short_form("implementation");

/// Interface definition; undeclared keys are operations
pub static INTERFACE_DEFINITION: PresentationType = PresentationType::new(
    "tosca.InterfaceDefinition",
    &[
        F::primitive("type", P::String),
        F::primitive("description", P::String),
        F::primitive("inputs", P::Map),
    ],
)
.section("3.5.14")
.rest(&OPERATION_DEFINITION);

/// Artifact definition, or a bare file path
pub static ARTIFACT_DEFINITION: PresentationType = PresentationType::new(
    "tosca.ArtifactDefinition",
    &[
        F::primitive("type", P::String),
        F::primitive("file", P::String).required(),
        F::primitive("repository", P::String),
        F::primitive("description", P::String),
        F::primitive("deploy_path", P::String),
    ],
)
.section("3.5.6")
.short_form("file");

/// Capability definition, or a bare capability type name
pub static CAPABILITY_DEFINITION: PresentationType = PresentationType::new(
    "tosca.CapabilityDefinition",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("description", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
        F::object_dict("attributes", &ATTRIBUTE_DEFINITION),
        F::primitive_list("valid_source_types", P::String),
        F::primitive_list("occurrences", P::Any),
    ],
)
.section("3.6.1")
.short_form("type");

/// Relationship part of a requirement definition
pub static REQUIREMENT_RELATIONSHIP: PresentationType = PresentationType::new(
    "tosca.RequirementRelationship",
    &[
        F::primitive("type", P::String).required(),
        F::object_dict("interfaces", &INTERFACE_DEFINITION),
    ],
)
.section("3.6.2.2.3")
.short_form("type");

/// Requirement definition, or a bare capability type name
pub static REQUIREMENT_DEFINITION: PresentationType = PresentationType::new(
    "tosca.RequirementDefinition",
    &[
        F::primitive("capability", P::String).required(),
        F::primitive("node", P::String),
        F::object("relationship", &REQUIREMENT_RELATIONSHIP),
        F::primitive_list("occurrences", P::Any),
    ],
)
.section("3.6.2")
.short_form("capability");

/// Node type
pub static NODE_TYPE: PresentationType = PresentationType::new(
    "tosca.NodeType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("version", P::String),
        F::primitive("description", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
        F::object_dict("attributes", &ATTRIBUTE_DEFINITION),
        F::sequenced("requirements", &REQUIREMENT_DEFINITION),
        F::object_dict("capabilities", &CAPABILITY_DEFINITION),
        F::object_dict("interfaces", &INTERFACE_DEFINITION),
        F::object_dict("artifacts", &ARTIFACT_DEFINITION),
    ],
)
.section("3.6.9");

/// Relationship type
pub static RELATIONSHIP_TYPE: PresentationType = PresentationType::new(
    "tosca.RelationshipType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("version", P::String),
        F::primitive("description", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
        F::object_dict("attributes", &ATTRIBUTE_DEFINITION),
        F::object_dict("interfaces", &INTERFACE_DEFINITION),
        F::primitive_list("valid_target_types", P::String),
    ],
)
.section("3.6.10");

/// Capability type
pub static CAPABILITY_TYPE: PresentationType = PresentationType::new(
    "tosca.CapabilityType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("version", P::String),
        F::primitive("description", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
        F::object_dict("attributes", &ATTRIBUTE_DEFINITION),
        F::primitive_list("valid_source_types", P::String),
    ],
)
.section("3.6.6");

/// Data type
pub static DATA_TYPE: PresentationType = PresentationType::new(
    "tosca.DataType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("version", P::String),
        F::primitive("description", P::String),
        F::primitive_list("constraints", P::Any),
        F::object_dict("properties", &PROPERTY_DEFINITION),
    ],
)
.section("3.6.5");

/// Group type
pub static GROUP_TYPE: PresentationType = PresentationType::new(
    "tosca.GroupType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("version", P::String),
        F::primitive("description", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
        F::primitive_list("members", P::String),
        F::object_dict("interfaces", &INTERFACE_DEFINITION),
    ],
)
.section("3.6.11");

/// Policy type
pub static POLICY_TYPE: PresentationType = PresentationType::new(
    "tosca.PolicyType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("version", P::String),
        F::primitive("description", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
        F::primitive_list("targets", P::String),
    ],
)
.section("3.6.12");

/// Artifact type
pub static ARTIFACT_TYPE: PresentationType = PresentationType::new(
    "tosca.ArtifactType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("version", P::String),
        F::primitive("description", P::String),
        F::primitive("mime_type", P::String),
        F::primitive_list("file_ext", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
    ],
)
.section("3.6.4");

/// Interface type; undeclared keys are operations
pub static INTERFACE_TYPE: PresentationType = PresentationType::new(
    "tosca.InterfaceType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("version", P::String),
        F::primitive("description", P::String),
        F::primitive("inputs", P::Map),
    ],
)
.section("3.6.7")
.rest(&OPERATION_DEFINITION);

/// Relationship of a requirement assignment, or a bare type/template name
pub static RELATIONSHIP_ASSIGNMENT: PresentationType = PresentationType::new(
    "tosca.RelationshipAssignment",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("properties", P::Map),
        F::object_dict("interfaces", &INTERFACE_DEFINITION),
    ],
)
.section("3.7.2.2.3")
.short_form("type");

/// Requirement assignment, or a bare target template name
pub static REQUIREMENT_ASSIGNMENT: PresentationType = PresentationType::new(
    "tosca.RequirementAssignment",
    &[
        F::primitive("capability", P::String),
        F::primitive("node", P::String),
        F::object("relationship", &RELATIONSHIP_ASSIGNMENT),
        F::primitive("node_filter", P::Map),
        F::primitive_list("occurrences", P::Any),
    ],
)
.section("3.7.2")
.short_form("node");

/// Capability assignment
pub static CAPABILITY_ASSIGNMENT: PresentationType = PresentationType::new(
    "tosca.CapabilityAssignment",
    &[
        F::primitive("properties", P::Map),
        F::primitive("attributes", P::Map),
        F::primitive_list("occurrences", P::Any),
    ],
)
.section("3.7.1");

/// Node template
pub static NODE_TEMPLATE: PresentationType = PresentationType::new(
    "tosca.NodeTemplate",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("description", P::String),
        F::primitive_list("directives", P::String),
        F::primitive("properties", P::Map),
        F::primitive("attributes", P::Map),
        F::sequenced("requirements", &REQUIREMENT_ASSIGNMENT),
        F::object_dict("capabilities", &CAPABILITY_ASSIGNMENT),
        F::object_dict("interfaces", &INTERFACE_DEFINITION),
        F::object_dict("artifacts", &ARTIFACT_DEFINITION),
        F::primitive("node_filter", P::Map),
        F::primitive("copy", P::String),
    ],
)
.section("3.7.3");

/// Relationship template
pub static RELATIONSHIP_TEMPLATE: PresentationType = PresentationType::new(
    "tosca.RelationshipTemplate",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("description", P::String),
        F::primitive("properties", P::Map),
        F::primitive("attributes", P::Map),
        F::object_dict("interfaces", &INTERFACE_DEFINITION),
        F::primitive("copy", P::String),
    ],
)
.section("3.7.4");

/// Group definition
pub static GROUP_DEFINITION: PresentationType = PresentationType::new(
    "tosca.GroupDefinition",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("description", P::String),
        F::primitive("properties", P::Map),
        F::primitive_list("members", P::String),
        F::object_dict("interfaces", &INTERFACE_DEFINITION),
    ],
)
.section("3.7.5");

/// Policy definition
pub static POLICY_DEFINITION: PresentationType = PresentationType::new(
    "tosca.PolicyDefinition",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("description", P::String),
        F::primitive("properties", P::Map),
        F::primitive_list("targets", P::String),
    ],
)
.section("3.7.6");

/// Topology template
pub static TOPOLOGY_TEMPLATE: PresentationType = PresentationType::new(
    "tosca.TopologyTemplate",
    &[
        F::primitive("description", P::String),
        F::object_dict("inputs", &PARAMETER_DEFINITION),
        F::object_dict("node_templates", &NODE_TEMPLATE),
        F::object_dict("relationship_templates", &RELATIONSHIP_TEMPLATE),
        F::object_dict("groups", &GROUP_DEFINITION),
        F::sequenced("policies", &POLICY_DEFINITION),
        F::object_dict("outputs", &PARAMETER_DEFINITION),
        F::primitive("substitution_mappings", P::Map),
    ],
)
.section("3.8");

/// Repository definition, or a bare URL
pub static REPOSITORY_DEFINITION: PresentationType = PresentationType::new(
    "tosca.RepositoryDefinition",
    &[
        F::primitive("description", P::String),
        F::primitive("url", P::String).required(),
        F::primitive("credential", P::Map),
    ],
)
.section("3.5.5")
.short_form("url");

/// Service template (document root)
pub static SERVICE_TEMPLATE: PresentationType = PresentationType::new(
    "tosca.ServiceTemplate",
    &[
        F::primitive("tosca_definitions_version", P::String).required(),
        F::primitive("metadata", P::Map),
        F::primitive("description", P::String),
        F::primitive("dsl_definitions", P::Any),
        F::object_dict("repositories", &REPOSITORY_DEFINITION),
        F::primitive_list("imports", P::Any),
        F::object_dict("artifact_types", &ARTIFACT_TYPE),
        F::object_dict("data_types", &DATA_TYPE),
        F::object_dict("capability_types", &CAPABILITY_TYPE),
        F::object_dict("interface_types", &INTERFACE_TYPE),
        F::object_dict("relationship_types", &RELATIONSHIP_TYPE),
        F::object_dict("node_types", &NODE_TYPE),
        F::object_dict("group_types", &GROUP_TYPE),
        F::object_dict("policy_types", &POLICY_TYPE),
        F::object("topology_template", &TOPOLOGY_TEMPLATE),
    ],
)
.section("3.9");

/// Type sections of a TOSCA service template
pub static TYPE_SECTIONS: &[(&str, TypeCategory)] = &[
    ("node_types", TypeCategory::Node),
    ("relationship_types", TypeCategory::Relationship),
    ("capability_types", TypeCategory::Capability),
    ("data_types", TypeCategory::Data),
    ("group_types", TypeCategory::Group),
    ("policy_types", TypeCategory::Policy),
    ("artifact_types", TypeCategory::Artifact),
    ("interface_types", TypeCategory::Interface),
];

/// `tosca_simple_yaml_1_0`
pub static TOSCA_SIMPLE_YAML_1_0: Grammar = Grammar {
    version: "tosca_simple_yaml_1_0",
    dialect: Dialect::Tosca,
    root: &SERVICE_TEMPLATE,
    imports_field: Some("imports"),
    type_sections: TYPE_SECTIONS,
};
