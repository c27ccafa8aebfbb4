//! Type schemas.
//!
//! A [`Schema`] holds the entries one type declares itself. Merged schemas
//! are produced by [`Schema::overlay`] from the root of the inheritance
//! chain down, so the closest declaration of a key wins.
//!
//! Extraction is dialect-neutral: a field the presentation type does not
//! declare simply contributes nothing.

use aria_core::{Map, Value};
use aria_presentation::{Presentation, PresentationError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyword for an unbounded upper occurrence limit
pub const UNBOUNDED: &str = "UNBOUNDED";

/// Occurrence bounds `[min, max]`; `max == None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrences {
    /// Lower bound
    pub min: u64,
    /// Upper bound, `None` when unbounded
    pub max: Option<u64>,
}

impl Occurrences {
    /// Default for capabilities: `[1, UNBOUNDED]`
    pub const CAPABILITY: Self = Self { min: 1, max: None };
    /// Default for requirements: `[1, 1]`
    pub const REQUIREMENT: Self = Self { min: 1, max: Some(1) };

    /// Create bounds
    #[must_use]
    pub const fn new(min: u64, max: Option<u64>) -> Self {
        Self { min, max }
    }

    /// Parse a raw `[min, max]` pair
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        let [min, max] = value.as_list()? else {
            return None;
        };
        let min = u64::try_from(min.as_i64()?).ok()?;
        let max = match max {
            Value::String(s) if s == UNBOUNDED => None,
            other => Some(u64::try_from(other.as_i64()?).ok()?),
        };
        match max {
            Some(max) if max < min => None,
            _ => Some(Self { min, max }),
        }
    }

    /// Check if one more occurrence fits after `current`
    #[must_use]
    pub fn has_room(&self, current: u64) -> bool {
        self.max.is_none_or(|max| current < max)
    }

    /// Check if `count` lies within the bounds
    #[must_use]
    pub fn contains(&self, count: u64) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl fmt::Display for Occurrences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, {}]", self.min, UNBOUNDED),
        }
    }
}

/// Property or attribute definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Declared data type
    pub type_name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Whether a value must be present
    pub required: bool,
    /// Default value
    pub default: Option<Value>,
    /// Entry type of list/map properties
    pub entry_schema: Option<String>,
}

impl PropertySchema {
    /// Extract from a property or attribute definition presentation
    ///
    /// # Errors
    ///
    /// Returns error on accessor misuse
    pub fn extract(p: &Presentation<'_>) -> Result<Self, PresentationError> {
        let entry_schema = if declared(p, "entry_schema") {
            p.object("entry_schema")?
                .map(|entry| entry.string("type"))
                .transpose()?
                .flatten()
                .map(str::to_string)
        } else {
            None
        };
        Ok(Self {
            type_name: string_if(p, "type")?,
            description: string_if(p, "description")?,
            required: if declared(p, "required") {
                p.boolean("required")?.unwrap_or(true)
            } else {
                true
            },
            default: value_if(p, "default")?,
            entry_schema,
        })
    }
}

/// Capability definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySchema {
    /// Capability type
    pub type_name: Option<String>,
    /// Occurrence bounds
    pub occurrences: Occurrences,
    /// Node types allowed as sources
    pub valid_source_types: Vec<String>,
    /// Property definitions
    pub properties: IndexMap<String, PropertySchema>,
}

impl CapabilitySchema {
    /// Extract from a capability definition presentation
    ///
    /// # Errors
    ///
    /// Returns error on accessor misuse
    pub fn extract(p: &Presentation<'_>) -> Result<Self, PresentationError> {
        Ok(Self {
            type_name: string_if(p, "type")?,
            occurrences: occurrences_if(p, Occurrences::CAPABILITY)?,
            valid_source_types: strings_if(p, "valid_source_types")?,
            properties: definitions(p, "properties")?,
        })
    }
}

/// Requirement definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSchema {
    /// Required capability type
    pub capability: Option<String>,
    /// Required node type
    pub node: Option<String>,
    /// Relationship type or template
    pub relationship: Option<String>,
    /// Occurrence bounds
    pub occurrences: Occurrences,
}

impl RequirementSchema {
    /// Extract from a requirement definition presentation
    ///
    /// # Errors
    ///
    /// Returns error on accessor misuse
    pub fn extract(p: &Presentation<'_>) -> Result<Self, PresentationError> {
        let relationship = if declared(p, "relationship") {
            p.object("relationship")?
                .map(|rel| rel.string("type"))
                .transpose()?
                .flatten()
                .map(str::to_string)
        } else {
            None
        };
        Ok(Self {
            capability: string_if(p, "capability")?,
            node: string_if(p, "node")?,
            relationship,
            occurrences: occurrences_if(p, Occurrences::REQUIREMENT)?,
        })
    }
}

/// One operation of an interface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationSchema {
    /// Implementation, e.g. `plugin.tasks.create` or a script path
    pub implementation: Option<String>,
    /// Operation inputs, kept raw
    pub inputs: Map,
    /// Executor override
    pub executor: Option<String>,
    /// Retry limit
    pub max_retries: Option<i64>,
    /// Seconds between retries
    pub retry_interval: Option<f64>,
}

impl OperationSchema {
    /// Extract from an operation presentation
    ///
    /// # Errors
    ///
    /// Returns error on accessor misuse
    pub fn extract(p: &Presentation<'_>) -> Result<Self, PresentationError> {
        let implementation = value_if(p, "implementation")?.and_then(|value| match value {
            Value::String(s) => Some(s),
            other => other.get("primary").and_then(Value::as_str).map(str::to_string),
        });
        Ok(Self {
            implementation,
            inputs: if declared(p, "inputs") {
                p.map("inputs")?.cloned().unwrap_or_default()
            } else {
                Map::new()
            },
            executor: string_if(p, "executor")?,
            max_retries: if declared(p, "max_retries") {
                p.integer("max_retries")?
            } else {
                None
            },
            retry_interval: value_if(p, "retry_interval")?.and_then(|v| v.as_f64()),
        })
    }
}

/// Interface: named operations plus an optional interface type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSchema {
    /// Interface type
    pub type_name: Option<String>,
    /// Operations by name
    pub operations: IndexMap<String, OperationSchema>,
}

impl InterfaceSchema {
    /// Extract from an interface presentation whose undeclared keys are operations
    ///
    /// # Errors
    ///
    /// Returns error on accessor misuse
    pub fn extract(p: &Presentation<'_>) -> Result<Self, PresentationError> {
        let mut operations = IndexMap::new();
        for op in p.rest_entries() {
            if let Some(name) = op.name() {
                operations.insert(name.to_string(), OperationSchema::extract(&op)?);
            }
        }
        Ok(Self {
            type_name: string_if(p, "type")?,
            operations,
        })
    }

    /// Overlay a closer declaration, operation by operation
    pub fn overlay(&mut self, closer: &InterfaceSchema) {
        if closer.type_name.is_some() {
            self.type_name.clone_from(&closer.type_name);
        }
        for (name, op) in &closer.operations {
            self.operations.insert(name.clone(), op.clone());
        }
    }
}

/// Entries one type declares, or a merged view of a chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Property definitions
    pub properties: IndexMap<String, PropertySchema>,
    /// Attribute definitions
    pub attributes: IndexMap<String, PropertySchema>,
    /// Capability definitions
    pub capabilities: IndexMap<String, CapabilitySchema>,
    /// Requirement definitions, by requirement name
    pub requirements: IndexMap<String, RequirementSchema>,
    /// Interfaces
    pub interfaces: IndexMap<String, InterfaceSchema>,
    /// Relationship source-side interfaces
    pub source_interfaces: IndexMap<String, InterfaceSchema>,
    /// Relationship target-side interfaces
    pub target_interfaces: IndexMap<String, InterfaceSchema>,
}

impl Schema {
    /// Extract the entries a type presentation declares itself
    ///
    /// # Errors
    ///
    /// Returns error on accessor misuse
    pub fn extract(p: &Presentation<'_>) -> Result<Self, PresentationError> {
        let mut capabilities = IndexMap::new();
        for cap in objects_if(p, "capabilities")? {
            if let Some(name) = cap.name() {
                capabilities.insert(name.to_string(), CapabilitySchema::extract(&cap)?);
            }
        }
        let mut requirements = IndexMap::new();
        for req in objects_if(p, "requirements")? {
            if let Some(name) = req.name() {
                requirements.insert(name.to_string(), RequirementSchema::extract(&req)?);
            }
        }
        Ok(Self {
            properties: definitions(p, "properties")?,
            attributes: definitions(p, "attributes")?,
            capabilities,
            requirements,
            interfaces: extract_interfaces(p, "interfaces")?,
            source_interfaces: extract_interfaces(p, "source_interfaces")?,
            target_interfaces: extract_interfaces(p, "target_interfaces")?,
        })
    }

    /// Overlay a closer (more derived) schema onto this one
    pub fn overlay(&mut self, closer: &Schema) {
        overlay_map(&mut self.properties, &closer.properties);
        overlay_map(&mut self.attributes, &closer.attributes);
        overlay_map(&mut self.capabilities, &closer.capabilities);
        overlay_map(&mut self.requirements, &closer.requirements);
        overlay_interfaces(&mut self.interfaces, &closer.interfaces);
        overlay_interfaces(&mut self.source_interfaces, &closer.source_interfaces);
        overlay_interfaces(&mut self.target_interfaces, &closer.target_interfaces);
    }
}

/// Overlay interface maps, merging operations within same-named interfaces
pub fn overlay_interfaces(
    base: &mut IndexMap<String, InterfaceSchema>,
    closer: &IndexMap<String, InterfaceSchema>,
) {
    for (name, interface) in closer {
        base.entry(name.clone()).or_default().overlay(interface);
    }
}

fn overlay_map<T: Clone>(base: &mut IndexMap<String, T>, closer: &IndexMap<String, T>) {
    for (key, value) in closer {
        base.insert(key.clone(), value.clone());
    }
}

/// Extract an interface dict field, if the presentation type declares it
///
/// # Errors
///
/// Returns error on accessor misuse
pub fn extract_interfaces(
    p: &Presentation<'_>,
    field: &str,
) -> Result<IndexMap<String, InterfaceSchema>, PresentationError> {
    let mut interfaces = IndexMap::new();
    for interface in objects_if(p, field)? {
        if let Some(name) = interface.name() {
            interfaces.insert(name.to_string(), InterfaceSchema::extract(&interface)?);
        }
    }
    Ok(interfaces)
}

fn definitions(
    p: &Presentation<'_>,
    field: &str,
) -> Result<IndexMap<String, PropertySchema>, PresentationError> {
    let mut definitions = IndexMap::new();
    for definition in objects_if(p, field)? {
        if let Some(name) = definition.name() {
            definitions.insert(name.to_string(), PropertySchema::extract(&definition)?);
        }
    }
    Ok(definitions)
}

fn declared(p: &Presentation<'_>, field: &str) -> bool {
    p.presentation_type().descriptor(field).is_some()
}

fn objects_if<'a>(
    p: &Presentation<'a>,
    field: &str,
) -> Result<Vec<Presentation<'a>>, PresentationError> {
    if declared(p, field) {
        p.objects(field)
    } else {
        Ok(Vec::new())
    }
}

fn string_if(p: &Presentation<'_>, field: &str) -> Result<Option<String>, PresentationError> {
    if declared(p, field) {
        Ok(p.string(field)?.map(str::to_string))
    } else {
        Ok(None)
    }
}

fn strings_if(p: &Presentation<'_>, field: &str) -> Result<Vec<String>, PresentationError> {
    if declared(p, field) {
        Ok(p.strings(field)?.into_iter().map(str::to_string).collect())
    } else {
        Ok(Vec::new())
    }
}

fn value_if(p: &Presentation<'_>, field: &str) -> Result<Option<Value>, PresentationError> {
    if declared(p, field) {
        Ok(p.value(field)?.map(std::borrow::Cow::into_owned))
    } else {
        Ok(None)
    }
}

fn occurrences_if(
    p: &Presentation<'_>,
    default: Occurrences,
) -> Result<Occurrences, PresentationError> {
    let Some(raw) = value_if(p, "occurrences")? else {
        return Ok(default);
    };
    Ok(Occurrences::parse(&raw).unwrap_or_else(|| {
        tracing::warn!(location = %p.field_location("occurrences"), "invalid occurrences, using {}", default);
        default
    }))
}
