//! Grammar dispatch.
//!
//! A document's discriminator value (its `tosca_definitions_version`)
//! selects the root presentation type from a [`GrammarTable`] populated
//! before parsing begins.

use crate::field::PresentationType;
use crate::{cloudify, tosca};
use aria_core::{CoreError, CoreResult, Locator, TypeCategory, Value};
use indexmap::IndexMap;

/// Discriminator field shared by the TOSCA family
pub const DISCRIMINATOR: &str = "tosca_definitions_version";

/// Grammar family, deciding where templates and relationships live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// TOSCA simple profile: `topology_template`, requirements and capabilities
    Tosca,
    /// Cloudify DSL: top-level `node_templates`, explicit relationships, plugins
    Cloudify,
}

/// One registered grammar version
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    /// Discriminator value
    pub version: &'static str,
    /// Grammar family
    pub dialect: Dialect,
    /// Root presentation type
    pub root: &'static PresentationType,
    /// Field listing import locators, if the grammar has imports
    pub imports_field: Option<&'static str>,
    /// Top-level sections declaring types, by category
    pub type_sections: &'static [(&'static str, TypeCategory)],
}

impl Grammar {
    /// Section declaring types of `category`
    #[must_use]
    pub fn section_for(&self, category: TypeCategory) -> Option<&'static str> {
        self.type_sections
            .iter()
            .find(|(_, c)| *c == category)
            .map(|(section, _)| *section)
    }

    /// Category declared by a top-level section
    #[must_use]
    pub fn category_of(&self, section: &str) -> Option<TypeCategory> {
        self.type_sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, category)| *category)
    }
}

/// Discriminator value to grammar mapping
#[derive(Debug, Clone)]
pub struct GrammarTable {
    field: String,
    grammars: IndexMap<String, Grammar>,
}

impl GrammarTable {
    /// Create an empty table using the standard discriminator field
    #[must_use]
    pub fn new() -> Self {
        Self {
            field: DISCRIMINATOR.to_string(),
            grammars: IndexMap::new(),
        }
    }

    /// Use a different discriminator field
    #[must_use]
    pub fn with_discriminator(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Register a grammar, replacing any previous one with the same version
    pub fn register(&mut self, grammar: Grammar) {
        tracing::debug!(version = grammar.version, "registering grammar");
        self.grammars.insert(grammar.version.to_string(), grammar);
    }

    /// Table with every built-in TOSCA grammar
    #[must_use]
    pub fn tosca() -> Self {
        let mut table = Self::new();
        table.register(tosca::TOSCA_SIMPLE_YAML_1_0);
        table
    }

    /// Table with every built-in Cloudify grammar
    #[must_use]
    pub fn cloudify() -> Self {
        let mut table = Self::new();
        for grammar in cloudify::GRAMMARS {
            table.register(*grammar);
        }
        table
    }

    /// Table with every built-in grammar
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::tosca();
        for grammar in cloudify::GRAMMARS {
            table.register(*grammar);
        }
        table
    }

    /// Discriminator field name
    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.field
    }

    /// Discriminator value of a raw root
    #[must_use]
    pub fn discriminator_of<'v>(&self, root: &'v Value) -> Option<&'v str> {
        root.get(&self.field).and_then(Value::as_str)
    }

    /// Look up a grammar by discriminator value
    #[must_use]
    pub fn get(&self, version: &str) -> Option<&Grammar> {
        self.grammars.get(version)
    }

    /// Grammar for a raw root, if its discriminator is registered
    #[must_use]
    pub fn lookup(&self, root: &Value) -> Option<&Grammar> {
        self.discriminator_of(root).and_then(|v| self.get(v))
    }

    /// Select the grammar for a raw root
    ///
    /// # Errors
    ///
    /// Returns `GrammarNotFound` if the discriminator is absent or unregistered
    pub fn select(&self, root: &Value, locator: &Locator) -> CoreResult<&Grammar> {
        self.lookup(root).ok_or_else(|| CoreError::GrammarNotFound {
            field: self.field.clone(),
            value: self
                .discriminator_of(root)
                .map_or_else(String::new, str::to_string),
            locator: locator.clone(),
        })
    }

    /// Registered grammars in registration order
    pub fn grammars(&self) -> impl Iterator<Item = &Grammar> {
        self.grammars.values()
    }

    /// Number of registered grammars
    #[must_use]
    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    /// Check if no grammar is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}

impl Default for GrammarTable {
    fn default() -> Self {
        Self::standard()
    }
}
