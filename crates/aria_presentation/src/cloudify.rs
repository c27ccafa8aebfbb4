//! Cloudify DSL presentation tables.
//!
//! `cloudify_dsl_1_1` and `cloudify_dsl_1_2` are composed onto the 1.0
//! tables through [`PresentationType::based_on`]; only what changed is
//! declared again.

use crate::field::{DefaultValue, FieldDescriptor as F, PresentationType, PrimitiveType as P};
use crate::grammar::{Dialect, Grammar};
use aria_core::TypeCategory;

/// Property definition
pub static PROPERTY_DEFINITION: PresentationType = PresentationType::new(
    "cloudify.PropertyDefinition",
    &[
        F::primitive("description", P::String),
        F::primitive("type", P::String),
        F::primitive("default", P::Any),
        F::primitive("required", P::Boolean).with_default(DefaultValue::Bool(true)),
    ],
);

/// Operation, or a bare `plugin.task` mapping
pub static OPERATION: PresentationType = PresentationType::new(
    "cloudify.Operation",
    &[
        F::primitive("implementation", P::String).required(),
        F::primitive("inputs", P::Map),
        F::primitive("executor", P::String),
        F::primitive("max_retries", P::Integer),
        F::primitive("retry_interval", P::Number),
    ],
)
.short_form("implementation");

/// Interface; every key is an operation
pub static INTERFACE: PresentationType =
    PresentationType::new("cloudify.Interface", &[]).rest(&OPERATION);

/// Node type
pub static NODE_TYPE: PresentationType = PresentationType::new(
    "cloudify.NodeType",
    &[
        F::primitive("derived_from", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
        F::object_dict("interfaces", &INTERFACE),
    ],
);

/// Relationship type
pub static RELATIONSHIP_TYPE: PresentationType = PresentationType::new(
    "cloudify.RelationshipType",
    &[
        F::primitive("derived_from", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
        F::object_dict("source_interfaces", &INTERFACE),
        F::object_dict("target_interfaces", &INTERFACE),
    ],
);

/// Policy type
pub static POLICY_TYPE: PresentationType = PresentationType::new(
    "cloudify.PolicyType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("source", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
    ],
);

/// Data type (1.2 and later)
pub static DATA_TYPE: PresentationType = PresentationType::new(
    "cloudify.DataType",
    &[
        F::primitive("derived_from", P::String),
        F::primitive("description", P::String),
        F::object_dict("properties", &PROPERTY_DEFINITION),
    ],
);

/// Instance counts of a node template
pub static INSTANCES: PresentationType = PresentationType::new(
    "cloudify.Instances",
    &[F::primitive("deploy", P::Integer).with_default(DefaultValue::Integer(1))],
);

/// Relationship entry of a node template
pub static RELATIONSHIP_ASSIGNMENT: PresentationType = PresentationType::new(
    "cloudify.RelationshipAssignment",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("target", P::String).required(),
        F::primitive("properties", P::Map),
        F::object_dict("source_interfaces", &INTERFACE),
        F::object_dict("target_interfaces", &INTERFACE),
    ],
);

/// Node template
pub static NODE_TEMPLATE: PresentationType = PresentationType::new(
    "cloudify.NodeTemplate",
    &[
        F::primitive("type", P::String).required(),
        F::primitive("properties", P::Map),
        F::object("instances", &INSTANCES),
        F::object_dict("interfaces", &INTERFACE),
        F::object_list("relationships", &RELATIONSHIP_ASSIGNMENT),
    ],
);

/// Plugin declaration
pub static PLUGIN: PresentationType = PresentationType::new(
    "cloudify.Plugin",
    &[
        F::primitive("executor", P::String).required(),
        F::primitive("source", P::String),
        F::primitive("install", P::Boolean).with_default(DefaultValue::Bool(true)),
    ],
);

/// Plugin declaration (1.1 and later)
pub static PLUGIN_1_1: PresentationType = PresentationType::new(
    "cloudify.Plugin_1_1",
    &[
        F::primitive("install_arguments", P::String),
        F::primitive("package_name", P::String),
        F::primitive("package_version", P::String),
    ],
)
.based_on(&PLUGIN);

/// Workflow, or a bare `plugin.task` mapping
pub static WORKFLOW: PresentationType = PresentationType::new(
    "cloudify.Workflow",
    &[
        F::primitive("mapping", P::String).required(),
        F::object_dict("parameters", &PROPERTY_DEFINITION),
    ],
)
.short_form("mapping");

/// Deployment input
pub static INPUT: PresentationType = PresentationType::new(
    "cloudify.Input",
    &[
        F::primitive("description", P::String),
        F::primitive("type", P::String),
        F::primitive("default", P::Any),
    ],
);

/// Deployment output
pub static OUTPUT: PresentationType = PresentationType::new(
    "cloudify.Output",
    &[
        F::primitive("description", P::String),
        F::primitive("value", P::Any).required(),
    ],
);

/// Group of node templates
pub static GROUP: PresentationType = PresentationType::new(
    "cloudify.Group",
    &[
        F::primitive_list("members", P::String).required(),
        F::primitive("policies", P::Map),
    ],
);

/// Blueprint root (1.0)
pub static BLUEPRINT_1_0: PresentationType = PresentationType::new(
    "cloudify.Blueprint_1_0",
    &[
        F::primitive("tosca_definitions_version", P::String).required(),
        F::primitive_list("imports", P::String),
        F::object_dict("inputs", &INPUT),
        F::object_dict("node_types", &NODE_TYPE),
        F::object_dict("relationships", &RELATIONSHIP_TYPE),
        F::object_dict("node_templates", &NODE_TEMPLATE),
        F::object_dict("plugins", &PLUGIN),
        F::object_dict("workflows", &WORKFLOW),
        F::object_dict("outputs", &OUTPUT),
        F::object_dict("groups", &GROUP),
        F::object_dict("policy_types", &POLICY_TYPE),
        F::primitive("policy_triggers", P::Map),
    ],
);

/// Blueprint root (1.1)
pub static BLUEPRINT_1_1: PresentationType = PresentationType::new(
    "cloudify.Blueprint_1_1",
    &[F::object_dict("plugins", &PLUGIN_1_1)],
)
.based_on(&BLUEPRINT_1_0);

/// Blueprint root (1.2)
pub static BLUEPRINT_1_2: PresentationType = PresentationType::new(
    "cloudify.Blueprint_1_2",
    &[
        F::primitive("description", P::String),
        F::primitive("dsl_definitions", P::Any),
        F::object_dict("data_types", &DATA_TYPE),
    ],
)
.based_on(&BLUEPRINT_1_1);

static TYPE_SECTIONS_1_0: &[(&str, TypeCategory)] = &[
    ("node_types", TypeCategory::Node),
    ("relationships", TypeCategory::Relationship),
    ("policy_types", TypeCategory::Policy),
];

static TYPE_SECTIONS_1_2: &[(&str, TypeCategory)] = &[
    ("node_types", TypeCategory::Node),
    ("relationships", TypeCategory::Relationship),
    ("policy_types", TypeCategory::Policy),
    ("data_types", TypeCategory::Data),
];

/// Built-in Cloudify grammars, oldest first
pub static GRAMMARS: &[Grammar] = &[
    Grammar {
        version: "cloudify_dsl_1_0",
        dialect: Dialect::Cloudify,
        root: &BLUEPRINT_1_0,
        imports_field: Some("imports"),
        type_sections: TYPE_SECTIONS_1_0,
    },
    Grammar {
        version: "cloudify_dsl_1_1",
        dialect: Dialect::Cloudify,
        root: &BLUEPRINT_1_1,
        imports_field: Some("imports"),
        type_sections: TYPE_SECTIONS_1_0,
    },
    Grammar {
        version: "cloudify_dsl_1_2",
        dialect: Dialect::Cloudify,
        root: &BLUEPRINT_1_2,
        imports_field: Some("imports"),
        type_sections: TYPE_SECTIONS_1_2,
    },
];
