//! Type registry and inheritance resolver.
//!
//! Types are attached by fixpoint iteration, so declaration order never
//! matters: each pass attaches every pending type whose parent is absent or
//! already attached, until a pass attaches nothing. Anything left over
//! derives from a missing type or sits on a cycle.

use crate::schema::Schema;
use aria_core::{CoreError, CoreResult, Locator, TreePath, TypeCategory};
use aria_presentation::{Grammar, Presentation};
use indexmap::IndexMap;

/// A declared type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Name, unique within its category
    pub name: String,
    /// Category namespace
    pub category: TypeCategory,
    /// Declared parent name
    pub parent: Option<String>,
    /// Entries declared by this type itself
    pub schema: Schema,
    /// Declaration path in the composed document
    pub path: TreePath,
    /// Declaring document
    pub locator: Locator,
}

impl TypeDef {
    /// Create a root type with an empty schema
    #[must_use]
    pub fn new(name: impl Into<String>, category: TypeCategory) -> Self {
        Self {
            name: name.into(),
            category,
            parent: None,
            schema: Schema::default(),
            path: TreePath::root(),
            locator: Locator::new(""),
        }
    }

    /// Set the parent name
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the own schema
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
}

/// Inheritance forest of one category
#[derive(Debug, Clone, Default)]
struct Forest {
    types: IndexMap<String, TypeDef>,
    roots: Vec<String>,
    children: IndexMap<String, Vec<String>>,
}

/// Frozen per-category inheritance forests
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    forests: IndexMap<TypeCategory, Forest>,
}

impl TypeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            forests: IndexMap::new(),
        }
    }

    /// Build from the type sections of a document root presentation
    ///
    /// # Errors
    ///
    /// Returns `DanglingParent` if a parent never resolves, `DuplicateType`
    /// if a name repeats within a category, or a presentation error on
    /// accessor misuse
    pub fn build(view: &Presentation<'_>, grammar: &Grammar) -> CoreResult<Self> {
        let mut registry = Self::new();
        for (section, category) in grammar.type_sections {
            let mut declared = Vec::new();
            for p in view.objects(section)? {
                let Some(name) = p.name() else { continue };
                declared.push(TypeDef {
                    name: name.to_string(),
                    category: *category,
                    parent: p.string("derived_from")?.map(str::to_string),
                    schema: Schema::extract(&p)?,
                    path: p.path().clone(),
                    locator: view.document().origin_of(p.path()).clone(),
                });
            }
            registry.declare(*category, declared)?;
        }
        tracing::info!(types = registry.len(), "built type registry");
        Ok(registry)
    }

    /// Attach declared types of one category
    ///
    /// # Errors
    ///
    /// Returns `DanglingParent` or `DuplicateType`
    pub fn declare(&mut self, category: TypeCategory, declared: Vec<TypeDef>) -> CoreResult<()> {
        let forest = self.forests.entry(category).or_default();
        let mut pending = declared;
        let mut pass = 0;

        while !pending.is_empty() {
            pass += 1;
            let (ready, waiting): (Vec<TypeDef>, Vec<TypeDef>) = pending
                .into_iter()
                .partition(|t| t.parent.as_ref().is_none_or(|p| forest.types.contains_key(p)));
            if ready.is_empty() {
                pending = waiting;
                break;
            }
            for def in ready {
                if forest.types.contains_key(&def.name) {
                    return Err(CoreError::DuplicateType {
                        category,
                        type_name: def.name,
                        locator: def.locator,
                    });
                }
                match &def.parent {
                    Some(parent) => forest
                        .children
                        .entry(parent.clone())
                        .or_default()
                        .push(def.name.clone()),
                    None => forest.roots.push(def.name.clone()),
                }
                tracing::debug!(%category, name = %def.name, pass, "attached type");
                forest.types.insert(def.name.clone(), def);
            }
            pending = waiting;
        }

        match pending.into_iter().next() {
            Some(def) => Err(CoreError::DanglingParent {
                category,
                parent: def.parent.unwrap_or_default(),
                type_name: def.name,
                locator: def.locator,
            }),
            None => Ok(()),
        }
    }

    /// Look up a type
    #[must_use]
    pub fn get(&self, category: TypeCategory, name: &str) -> Option<&TypeDef> {
        self.forests.get(&category)?.types.get(name)
    }

    /// Check if a type exists
    #[must_use]
    pub fn contains(&self, category: TypeCategory, name: &str) -> bool {
        self.get(category, name).is_some()
    }

    /// Type names of a category in attachment order
    pub fn names(&self, category: TypeCategory) -> impl Iterator<Item = &str> {
        self.forests
            .get(&category)
            .into_iter()
            .flat_map(|forest| forest.types.keys().map(String::as_str))
    }

    /// Parentless types of a category
    #[must_use]
    pub fn roots(&self, category: TypeCategory) -> &[String] {
        self.forests
            .get(&category)
            .map(|forest| forest.roots.as_slice())
            .unwrap_or_default()
    }

    /// Direct children of a type
    #[must_use]
    pub fn children(&self, category: TypeCategory, name: &str) -> &[String] {
        self.forests
            .get(&category)
            .and_then(|forest| forest.children.get(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Parent of a type
    #[must_use]
    pub fn parent(&self, category: TypeCategory, name: &str) -> Option<&TypeDef> {
        let parent = self.get(category, name)?.parent.as_deref()?;
        self.get(category, parent)
    }

    /// Iterate a type and its ancestors, closest first
    pub fn ancestors<'r>(
        &'r self,
        category: TypeCategory,
        name: &str,
    ) -> impl Iterator<Item = &'r TypeDef> + 'r {
        std::iter::successors(self.get(category, name), move |def| {
            def.parent.as_deref().and_then(|p| self.get(category, p))
        })
    }

    /// Check if `candidate` is `ancestor` or derives from it
    #[must_use]
    pub fn is_descendant_or_self(&self, category: TypeCategory, candidate: &str, ancestor: &str) -> bool {
        self.ancestors(category, candidate).any(|def| def.name == ancestor)
    }

    /// Inheritance chain, root first, ending with `name`
    #[must_use]
    pub fn type_hierarchy(&self, category: TypeCategory, name: &str) -> Vec<String> {
        let mut chain: Vec<String> = self
            .ancestors(category, name)
            .map(|def| def.name.clone())
            .collect();
        chain.reverse();
        chain
    }

    /// Schema of `name` with every ancestor's entries, closest wins
    #[must_use]
    pub fn merged_schema(&self, category: TypeCategory, name: &str) -> Option<Schema> {
        let chain: Vec<&TypeDef> = self.ancestors(category, name).collect();
        if chain.is_empty() {
            return None;
        }
        let mut merged = Schema::default();
        for def in chain.into_iter().rev() {
            merged.overlay(&def.schema);
        }
        Some(merged)
    }

    /// Number of types in a category
    #[must_use]
    pub fn category_len(&self, category: TypeCategory) -> usize {
        self.forests.get(&category).map_or(0, |forest| forest.types.len())
    }

    /// Total number of types
    #[must_use]
    pub fn len(&self) -> usize {
        self.forests.values().map(|forest| forest.types.len()).sum()
    }

    /// Check if no type is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertySchema;
    use aria_core::{RawDocument, Value};
    use aria_presentation::GrammarTable;

    fn property(default: i64) -> PropertySchema {
        PropertySchema {
            type_name: Some("integer".to_string()),
            description: None,
            required: true,
            default: Some(Value::Integer(default)),
            entry_schema: None,
        }
    }

    fn with_property(def: TypeDef, name: &str, default: i64) -> TypeDef {
        let mut schema = Schema::default();
        schema.properties.insert(name.to_string(), property(default));
        def.with_schema(schema)
    }

    fn build(yaml: &str) -> CoreResult<TypeRegistry> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let doc = RawDocument::new(Value::from(value), Locator::new("main.yaml"));
        let table = GrammarTable::standard();
        let grammar = table.select(&doc.root, &doc.locator)?;
        TypeRegistry::build(&Presentation::root(&doc, grammar.root), grammar)
    }

    #[test]
    fn test_order_independent_attachment() {
        let mut registry = TypeRegistry::new();
        registry
            .declare(
                TypeCategory::Node,
                vec![
                    with_property(TypeDef::new("C", TypeCategory::Node).with_parent("B"), "c", 3),
                    with_property(TypeDef::new("A", TypeCategory::Node), "a", 1),
                    with_property(TypeDef::new("B", TypeCategory::Node).with_parent("A"), "a", 2),
                ],
            )
            .unwrap();

        assert_eq!(registry.category_len(TypeCategory::Node), 3);
        assert_eq!(registry.roots(TypeCategory::Node), ["A".to_string()]);
        assert_eq!(registry.children(TypeCategory::Node, "A"), ["B".to_string()]);
        assert_eq!(registry.type_hierarchy(TypeCategory::Node, "C"), vec!["A", "B", "C"]);

        let merged = registry.merged_schema(TypeCategory::Node, "C").unwrap();
        assert_eq!(merged.properties["a"].default, Some(Value::Integer(2)));
        assert_eq!(merged.properties["c"].default, Some(Value::Integer(3)));
    }

    #[test]
    fn test_closest_wins() {
        let mut registry = TypeRegistry::new();
        registry
            .declare(
                TypeCategory::Node,
                vec![
                    with_property(TypeDef::new("A", TypeCategory::Node), "x", 1),
                    with_property(TypeDef::new("B", TypeCategory::Node).with_parent("A"), "x", 2),
                ],
            )
            .unwrap();
        let merged = registry.merged_schema(TypeCategory::Node, "B").unwrap();
        assert_eq!(merged.properties["x"].default, Some(Value::Integer(2)));
        let base = registry.merged_schema(TypeCategory::Node, "A").unwrap();
        assert_eq!(base.properties["x"].default, Some(Value::Integer(1)));
    }

    #[test]
    fn test_dangling_parent() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .declare(
                TypeCategory::Data,
                vec![TypeDef::new("A", TypeCategory::Data).with_parent("Missing")],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DanglingParent { ref type_name, ref parent, .. } if type_name == "A" && parent == "Missing"
        ));
    }

    #[test]
    fn test_cycle_is_dangling() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .declare(
                TypeCategory::Node,
                vec![
                    TypeDef::new("A", TypeCategory::Node).with_parent("B"),
                    TypeDef::new("B", TypeCategory::Node).with_parent("A"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::DanglingParent { .. }));
    }

    #[test]
    fn test_descendant_checks() {
        let mut registry = TypeRegistry::new();
        registry
            .declare(
                TypeCategory::Capability,
                vec![
                    TypeDef::new("Root", TypeCategory::Capability),
                    TypeDef::new("Storage", TypeCategory::Capability).with_parent("Root"),
                    TypeDef::new("Block", TypeCategory::Capability).with_parent("Storage"),
                ],
            )
            .unwrap();
        assert!(registry.is_descendant_or_self(TypeCategory::Capability, "Block", "Root"));
        assert!(registry.is_descendant_or_self(TypeCategory::Capability, "Storage", "Storage"));
        assert!(!registry.is_descendant_or_self(TypeCategory::Capability, "Root", "Block"));
        assert!(!registry.is_descendant_or_self(TypeCategory::Node, "Block", "Root"));
        assert_eq!(registry.parent(TypeCategory::Capability, "Block").map(|d| d.name.as_str()), Some("Storage"));
    }

    #[test]
    fn test_categories_are_separate_namespaces() {
        let registry = build(
            "tosca_definitions_version: tosca_simple_yaml_1_0\n\
             node_types:\n  Thing: {}\n\
             data_types:\n  Thing: {}\n",
        )
        .unwrap();
        assert!(registry.contains(TypeCategory::Node, "Thing"));
        assert!(registry.contains(TypeCategory::Data, "Thing"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_build_from_document() {
        let registry = build(
            "tosca_definitions_version: tosca_simple_yaml_1_0\n\
             node_types:\n\
             \x20 WebServer:\n    derived_from: Compute\n    properties:\n      port: {type: integer, default: 8080}\n\
             \x20 Compute:\n    properties:\n      port: {type: integer, default: 22}\n      cpus: {type: integer}\n",
        )
        .unwrap();
        let merged = registry.merged_schema(TypeCategory::Node, "WebServer").unwrap();
        assert_eq!(merged.properties["port"].default, Some(Value::Integer(8080)));
        assert!(merged.properties["cpus"].required);
        let def = registry.get(TypeCategory::Node, "WebServer").unwrap();
        assert_eq!(def.path.to_string(), "node_types.WebServer");
        assert_eq!(def.locator.uri, "main.yaml");
    }

    #[test]
    fn test_build_cloudify() {
        let registry = build(
            "tosca_definitions_version: cloudify_dsl_1_0\n\
             node_types:\n  cloudify.nodes.Root:\n    interfaces:\n      lifecycle:\n        create: {}\n\
             relationships:\n  cloudify.relationships.contained_in:\n    source_interfaces:\n      rel:\n        link: p.tasks.link\n",
        );
        let registry = registry.unwrap();
        assert!(registry.contains(TypeCategory::Node, "cloudify.nodes.Root"));
        let rel = registry
            .merged_schema(TypeCategory::Relationship, "cloudify.relationships.contained_in")
            .unwrap();
        assert_eq!(
            rel.source_interfaces["rel"].operations["link"].implementation.as_deref(),
            Some("p.tasks.link")
        );
    }

    #[test]
    fn test_build_reports_dangling_with_locator() {
        let err = build(
            "tosca_definitions_version: tosca_simple_yaml_1_0\nnode_types:\n  A: {derived_from: Nope}\n",
        )
        .unwrap_err();
        assert_eq!(err.locator().uri, "main.yaml");
        assert!(err.to_string().contains("Nope"));
    }
}
