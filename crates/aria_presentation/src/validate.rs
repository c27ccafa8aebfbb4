//! Whole-document, best-effort field validation.
//!
//! Validation walks every descriptor of every reachable presentation and
//! appends to the caller's [`IssueList`]. One invalid field never hides
//! another.

use crate::field::{FieldKind, PresentationType, PrimitiveType};
use crate::presentation::Presentation;
use aria_core::{IssueList, Value};
use serde::{Deserialize, Serialize};

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Report undeclared keys as warnings
    pub report_unknown_fields: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            report_unknown_fields: true,
        }
    }
}

impl ValidateConfig {
    /// Set whether unknown fields are reported
    #[must_use]
    pub fn with_report_unknown_fields(mut self, report: bool) -> Self {
        self.report_unknown_fields = report;
        self
    }
}

/// Validate a presentation with the default configuration
pub fn validate(presentation: &Presentation<'_>, issues: &mut IssueList) {
    Validator::new(ValidateConfig::default()).validate(presentation, issues);
}

/// Presentation validator
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidateConfig,
}

impl Validator {
    /// Create a validator
    #[must_use]
    pub fn new(config: ValidateConfig) -> Self {
        Self { config }
    }

    /// Validate a presentation and everything nested in it
    pub fn validate(&self, presentation: &Presentation<'_>, issues: &mut IssueList) {
        let ty = presentation.presentation_type();
        let raw = presentation.raw();

        if !raw.is_map() {
            match ty.short_form {
                Some(field) if raw.is_scalar() => {
                    if let Some(descriptor) = ty.descriptor(field) {
                        if let FieldKind::Primitive(expected) = descriptor.kind {
                            self.check_primitive(presentation, field, raw, expected, issues);
                        }
                    }
                }
                _ => issues.report(
                    format!("{} must be a map, found {}", ty.name, raw.kind_name()),
                    presentation.location(),
                ),
            }
            return;
        }

        for descriptor in ty.descriptors() {
            let Some(value) = presentation.raw_field(descriptor.name) else {
                if descriptor.required {
                    issues.report(
                        format!("missing required field \"{}\" in {}", descriptor.name, ty.name),
                        presentation.field_location(descriptor.name),
                    );
                }
                continue;
            };

            match descriptor.kind {
                FieldKind::Primitive(expected) => {
                    self.check_primitive(presentation, descriptor.name, value, expected, issues);
                }
                FieldKind::PrimitiveList(expected) => {
                    self.check_primitive_list(presentation, descriptor.name, value, expected, issues);
                }
                FieldKind::Object
                | FieldKind::ObjectList
                | FieldKind::ObjectDict
                | FieldKind::ObjectSequencedList => {
                    if let Some(nested) = descriptor.nested {
                        self.validate_nested(presentation, descriptor.name, descriptor.kind, nested, value, issues);
                    }
                }
            }
        }

        self.check_undeclared(presentation, ty, issues);
    }

    fn check_primitive(
        &self,
        presentation: &Presentation<'_>,
        field: &str,
        value: &Value,
        expected: PrimitiveType,
        issues: &mut IssueList,
    ) {
        if !expected.accepts(value) {
            issues.report(
                format!(
                    "field \"{}\" of {} must be {}, found {}",
                    field,
                    presentation.presentation_type().name,
                    expected,
                    value.kind_name()
                ),
                presentation.field_location(field),
            );
        }
    }

    fn check_primitive_list(
        &self,
        presentation: &Presentation<'_>,
        field: &str,
        value: &Value,
        expected: PrimitiveType,
        issues: &mut IssueList,
    ) {
        let Some(items) = value.as_list() else {
            issues.report(
                format!("field \"{}\" must be a list, found {}", field, value.kind_name()),
                presentation.field_location(field),
            );
            return;
        };
        for (i, item) in items.iter().enumerate() {
            if !expected.accepts(item) {
                let path = presentation.path().child(field).index(i);
                issues.report(
                    format!("item {} of \"{}\" must be {}, found {}", i, field, expected, item.kind_name()),
                    presentation.document().location(&path),
                );
            }
        }
    }

    fn validate_nested(
        &self,
        presentation: &Presentation<'_>,
        field: &str,
        kind: FieldKind,
        nested: &'static PresentationType,
        value: &Value,
        issues: &mut IssueList,
    ) {
        let base = presentation.path().child(field);
        match (kind, value) {
            (FieldKind::Object, _) => {
                self.validate(&presentation.nested(value, nested, base), issues);
            }
            (FieldKind::ObjectList, Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    self.validate(&presentation.nested(item, nested, base.index(i)), issues);
                }
            }
            (FieldKind::ObjectDict, Value::Map(map)) => {
                for (key, item) in map {
                    self.validate(&presentation.nested(item, nested, base.child(key.as_str())), issues);
                }
            }
            (FieldKind::ObjectSequencedList, Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    match item.as_map().filter(|m| m.len() == 1).and_then(|m| m.iter().next()) {
                        Some((key, entry)) => self.validate(
                            &presentation.nested(entry, nested, base.index(i).child(key.as_str())),
                            issues,
                        ),
                        None => issues.report(
                            format!("item {} of \"{}\" must be a single-entry map", i, field),
                            presentation.document().location(&base.index(i)),
                        ),
                    }
                }
            }
            _ => {
                let expected = if kind == FieldKind::ObjectDict { "map" } else { "list" };
                issues.report(
                    format!("field \"{}\" must be a {}, found {}", field, expected, value.kind_name()),
                    presentation.document().location(&base),
                );
            }
        }
    }

    fn check_undeclared(
        &self,
        presentation: &Presentation<'_>,
        ty: &'static PresentationType,
        issues: &mut IssueList,
    ) {
        if ty.rest.is_some() {
            for entry in presentation.rest_entries() {
                self.validate(&entry, issues);
            }
            return;
        }
        if !self.config.report_unknown_fields {
            return;
        }
        if let Some(map) = presentation.raw().as_map() {
            for key in map.keys().filter(|k| ty.descriptor(k).is_none()) {
                issues.warn(
                    format!("unknown field \"{}\" in {}", key, ty.name),
                    presentation.field_location(key),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;
    use aria_core::{Locator, RawDocument, Severity};

    static PROPERTY: PresentationType = PresentationType::new(
        "Property",
        &[
            FieldDescriptor::primitive("type", PrimitiveType::String).required(),
            FieldDescriptor::primitive("required", PrimitiveType::Boolean),
        ],
    )
    .short_form("type");

    static NODE_TYPE: PresentationType = PresentationType::new(
        "NodeType",
        &[
            FieldDescriptor::primitive("derived_from", PrimitiveType::String),
            FieldDescriptor::object_dict("properties", &PROPERTY),
        ],
    );

    static ROOT: PresentationType = PresentationType::new(
        "Root",
        &[
            FieldDescriptor::primitive("version", PrimitiveType::String).required(),
            FieldDescriptor::primitive_list("imports", PrimitiveType::String),
            FieldDescriptor::object_dict("node_types", &NODE_TYPE),
        ],
    );

    fn run(yaml: &str) -> IssueList {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let doc = RawDocument::new(Value::from(value), Locator::new("doc.yaml"));
        let mut issues = IssueList::new();
        validate(&Presentation::root(&doc, &ROOT), &mut issues);
        issues
    }

    #[test]
    fn test_valid_document() {
        let issues = run("version: '1'\nnode_types:\n  A:\n    properties:\n      x: string\n      y: {type: integer}\n");
        assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn test_collects_all_issues() {
        let issues = run(
            "imports: [a.yaml, 3]\nnode_types:\n  A:\n    derived_from: 5\n    properties:\n      x: {required: true}\n  B:\n    properties:\n      y: {}\n",
        );
        let messages: Vec<_> = issues.iter().map(|i| i.message.clone()).collect();
        assert_eq!(issues.len(), 5, "{:?}", messages);
        assert!(messages[0].contains("\"version\""));
        assert!(messages[1].contains("item 1 of \"imports\""));
        assert!(messages[2].contains("\"derived_from\""));
        assert!(messages[3].contains("\"type\""));
        assert!(messages[4].contains("\"type\""));
    }

    #[test]
    fn test_issue_locations() {
        let issues = run("version: '1'\nnode_types:\n  A:\n    properties:\n      x: {}\n");
        let issue = issues.iter().next().unwrap();
        assert_eq!(issue.location.path.to_string(), "node_types.A.properties.x.type");
        assert_eq!(issue.location.locator.as_ref().unwrap().uri, "doc.yaml");
    }

    #[test]
    fn test_unknown_field_warning() {
        let issues = run("version: '1'\nbogus: 1\n");
        assert_eq!(issues.len(), 1);
        let issue = issues.iter().next().unwrap();
        assert_eq!(issue.severity, Severity::Warning);
        assert!(!issues.has_errors());
    }

    #[test]
    fn test_unknown_fields_can_be_silenced() {
        let value: serde_yaml::Value = serde_yaml::from_str("version: '1'\nbogus: 1\n").unwrap();
        let doc = RawDocument::new(Value::from(value), Locator::new("doc.yaml"));
        let mut issues = IssueList::new();
        Validator::new(ValidateConfig::default().with_report_unknown_fields(false))
            .validate(&Presentation::root(&doc, &ROOT), &mut issues);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_wrong_collection_shape() {
        let issues = run("version: '1'\nnode_types: [A]\n");
        assert_eq!(issues.len(), 1);
        assert!(issues.iter().next().unwrap().message.contains("must be a map"));
    }
}
