//! Recursive import composition.
//!
//! A root locator is loaded, decoded, and every import it declares is
//! composed the same way and merged in, in document order. The active
//! import path is tracked so that a cycle fails instead of recursing.

use crate::decoder::Decoder;
use crate::loader::Loader;
use crate::merge::merge_document;
use aria_core::{CoreError, CoreResult, Locator, RawDocument, Value};
use aria_presentation::{Grammar, GrammarTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Import composition configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Load and merge declared imports
    pub follow_imports: bool,
    /// Maximum import nesting depth
    pub max_depth: usize,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            follow_imports: true,
            max_depth: 64,
        }
    }
}

impl ComposeConfig {
    /// Set whether imports are followed
    #[must_use]
    pub fn with_follow_imports(mut self, follow: bool) -> Self {
        self.follow_imports = follow;
        self
    }

    /// Set the maximum import depth
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Per-call composition state
#[derive(Default)]
struct ComposeState {
    /// Active import path, outermost first
    stack: Vec<String>,
    /// Documents already merged somewhere in this call
    merged: HashSet<String>,
}

/// Composes a root document and its transitive imports
pub struct ImportComposer {
    loader: Box<dyn Loader>,
    decoder: Box<dyn Decoder>,
    grammars: GrammarTable,
    config: ComposeConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl ImportComposer {
    /// Create a composer over a loader/decoder pair with the standard grammars
    #[must_use]
    pub fn new(loader: impl Loader + 'static, decoder: impl Decoder + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            decoder: Box::new(decoder),
            grammars: GrammarTable::standard(),
            config: ComposeConfig::default(),
            cancel: None,
        }
    }

    /// Use a different grammar table to find import fields
    #[must_use]
    pub fn with_grammars(mut self, grammars: GrammarTable) -> Self {
        self.grammars = grammars;
        self
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: ComposeConfig) -> Self {
        self.config = config;
        self
    }

    /// Check `flag` before every nested load
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Grammar table in use
    #[must_use]
    pub fn grammars(&self) -> &GrammarTable {
        &self.grammars
    }

    /// Compose the document at `locator` with everything it imports
    ///
    /// # Errors
    ///
    /// Returns a fatal error if any document cannot be loaded or decoded,
    /// if imports form a cycle or nest too deeply, or if merging fails
    pub fn compose(&self, locator: &Locator) -> CoreResult<RawDocument> {
        let root = self.load(locator)?;
        let mut state = ComposeState::default();
        let document = self.compose_document(root, locator, None, &mut state, 0)?;
        tracing::info!(
            locator = %locator,
            imports = state.merged.len(),
            "composed document"
        );
        Ok(document)
    }

    fn compose_document(
        &self,
        root: Value,
        locator: &Locator,
        inherited: Option<Grammar>,
        state: &mut ComposeState,
        depth: usize,
    ) -> CoreResult<RawDocument> {
        let grammar = self.grammars.lookup(&root).copied().or(inherited);
        let references = match (self.config.follow_imports, grammar.and_then(|g| g.imports_field)) {
            (true, Some(field)) => import_references(&root, field),
            _ => Vec::new(),
        };

        let mut document = RawDocument::new(root, locator.clone());
        state.stack.push(locator.uri.clone());

        for reference in references {
            let child = locator.resolve(&reference);
            if state.stack.contains(&child.uri) {
                let mut chain = state.stack.clone();
                chain.push(child.uri.clone());
                return Err(CoreError::ImportCycle {
                    locator: child,
                    chain,
                });
            }
            if state.merged.contains(&child.uri) {
                tracing::debug!(import = %child, "already merged, skipping");
                continue;
            }
            if depth + 1 > self.config.max_depth {
                return Err(CoreError::ImportTooDeep {
                    locator: child,
                    depth: self.config.max_depth,
                });
            }
            if self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(CoreError::Cancelled { locator: child });
            }

            tracing::debug!(import = %child.describe(), depth = depth + 1, "composing import");
            let raw = self.load(&child)?;
            let imported = self.compose_document(raw, &child, grammar, state, depth + 1)?;
            state.merged.insert(child.uri.clone());
            merge_document(&mut document, imported, grammar.as_ref())?;
        }

        state.stack.pop();
        Ok(document)
    }

    fn load(&self, locator: &Locator) -> CoreResult<Value> {
        let bytes = self
            .loader
            .load(locator)
            .map_err(|err| CoreError::ImportNotFound {
                locator: locator.clone(),
                cause: err.to_string(),
            })?;
        self.decoder
            .decode(&bytes)
            .map_err(|err| CoreError::ImportDecode {
                locator: locator.clone(),
                cause: err.to_string(),
            })
    }
}

/// Import references of a raw root: plain strings, `{file: ...}` import
/// definitions, or single-entry `{name: file-or-definition}` maps.
fn import_references(root: &Value, field: &str) -> Vec<String> {
    let Some(items) = root.get(field).and_then(Value::as_list) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Map(map) => match map.get("file") {
                Some(file) => file.as_str().map(str::to_string),
                None if map.len() == 1 => map.values().next().and_then(|entry| {
                    entry
                        .as_str()
                        .or_else(|| entry.get("file").and_then(Value::as_str))
                        .map(str::to_string)
                }),
                None => None,
            },
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::YamlDecoder;
    use crate::loader::LiteralLoader;
    use aria_core::TreePath;
    use proptest::prelude::*;

    const HEADER: &str = "tosca_definitions_version: tosca_simple_yaml_1_0\n";

    fn composer(docs: &[(&str, &str)]) -> ImportComposer {
        let mut loader = LiteralLoader::new();
        for (uri, text) in docs {
            loader.insert(*uri, *text);
        }
        ImportComposer::new(loader, YamlDecoder)
    }

    #[test]
    fn test_no_imports_is_identity() {
        let text = format!("{HEADER}description: hi\nnode_types:\n  A: {{}}\n");
        let composed = composer(&[("main.yaml", text.as_str())])
            .compose(&Locator::new("main.yaml"))
            .unwrap();
        let decoded = YamlDecoder.decode(text.as_bytes()).unwrap();
        assert_eq!(composed.root, decoded);
        assert!(composed.origins().is_empty());
    }

    #[test]
    fn test_imports_are_relative_to_importer() {
        let main = format!("{HEADER}imports: [types/base.yaml]\n");
        let base = "node_types:\n  Base: {}\nimports: [more.yaml]\n";
        let more = "node_types:\n  More: {}\n";
        let doc = composer(&[
            ("bp/main.yaml", main.as_str()),
            ("bp/types/base.yaml", base),
            ("bp/types/more.yaml", more),
        ])
        .compose(&Locator::new("bp/main.yaml"))
        .unwrap();

        let types = doc.root.get("node_types").and_then(Value::as_map).unwrap();
        let names: Vec<_> = types.keys().cloned().collect();
        assert_eq!(names, vec!["More", "Base"]);
        assert_eq!(
            doc.origin_of(&TreePath::from_keys(["node_types", "More"])).uri,
            "bp/types/more.yaml"
        );
        assert_eq!(
            doc.origin_of(&TreePath::from_keys(["node_types", "Base"])).uri,
            "bp/types/base.yaml"
        );
    }

    #[test]
    fn test_cycle_is_fatal() {
        let a = format!("{HEADER}imports: [b.yaml]\n");
        let b = format!("{HEADER}imports: [a.yaml]\n");
        let err = composer(&[("a.yaml", a.as_str()), ("b.yaml", b.as_str())])
            .compose(&Locator::new("a.yaml"))
            .unwrap_err();
        match err {
            CoreError::ImportCycle { chain, .. } => {
                assert_eq!(chain, vec!["a.yaml", "b.yaml", "a.yaml"]);
            }
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn test_diamond_merged_once() {
        let main = format!("{HEADER}imports: [b.yaml, c.yaml]\n");
        let b = "imports: [d.yaml]\ndescription: b\n";
        let c = "imports: [d.yaml]\n";
        let d = "node_types:\n  D: {}\n";
        let doc = composer(&[("main.yaml", main.as_str()), ("b.yaml", b), ("c.yaml", c), ("d.yaml", d)])
            .compose(&Locator::new("main.yaml"))
            .unwrap();
        assert!(doc.root.get("node_types").and_then(|t| t.get("D")).is_some());
    }

    #[test]
    fn test_missing_import_is_fatal() {
        let main = format!("{HEADER}imports: [missing.yaml]\n");
        let err = composer(&[("main.yaml", main.as_str())])
            .compose(&Locator::new("main.yaml"))
            .unwrap_err();
        assert!(matches!(err, CoreError::ImportNotFound { ref locator, .. } if locator.uri == "missing.yaml"));
        assert_eq!(err.locator().describe(), "missing.yaml <- main.yaml");
    }

    #[test]
    fn test_undecodable_import_is_fatal() {
        let main = format!("{HEADER}imports: [bad.yaml]\n");
        let err = composer(&[("main.yaml", main.as_str()), ("bad.yaml", "a: [1\n")])
            .compose(&Locator::new("main.yaml"))
            .unwrap_err();
        assert!(matches!(err, CoreError::ImportDecode { .. }));
    }

    #[test]
    fn test_max_depth() {
        let main = format!("{HEADER}imports: [a.yaml]\n");
        let a = "imports: [b.yaml]\n";
        let err = composer(&[("main.yaml", main.as_str()), ("a.yaml", a), ("b.yaml", "{}\n")])
            .with_config(ComposeConfig::default().with_max_depth(1))
            .compose(&Locator::new("main.yaml"))
            .unwrap_err();
        assert!(matches!(err, CoreError::ImportTooDeep { depth: 1, .. }));
    }

    #[test]
    fn test_follow_imports_disabled() {
        let main = format!("{HEADER}imports: [missing.yaml]\n");
        let doc = composer(&[("main.yaml", main.as_str())])
            .with_config(ComposeConfig::default().with_follow_imports(false))
            .compose(&Locator::new("main.yaml"))
            .unwrap();
        assert!(doc.root.get("imports").is_some());
    }

    #[test]
    fn test_cancellation() {
        let main = format!("{HEADER}imports: [a.yaml]\n");
        let flag = Arc::new(AtomicBool::new(true));
        let err = composer(&[("main.yaml", main.as_str()), ("a.yaml", "{}\n")])
            .with_cancellation(flag)
            .compose(&Locator::new("main.yaml"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { .. }));
    }

    #[test]
    fn test_import_definition_forms() {
        let root = Value::from(serde_json::json!({
            "imports": ["a.yaml", {"file": "b.yaml"}, {"named": "c.yaml"}, {"other": {"file": "d.yaml"}}, 5]
        }));
        assert_eq!(
            import_references(&root, "imports"),
            vec!["a.yaml", "b.yaml", "c.yaml", "d.yaml"]
        );
    }

    proptest! {
        #[test]
        fn prop_disjoint_imports_union(
            left in proptest::collection::btree_set("[a-m]{1,6}", 0..6),
            right in proptest::collection::btree_set("[n-z]{1,6}", 0..6),
        ) {
            let left_doc: String = left.iter().map(|k| format!("l_{k}: 1\n")).collect();
            let right_doc: String = right.iter().map(|k| format!("r_{k}: 2\n")).collect();
            let left_doc = if left_doc.is_empty() { "{}\n".to_string() } else { left_doc };
            let right_doc = if right_doc.is_empty() { "{}\n".to_string() } else { right_doc };

            let mut key_sets = Vec::new();
            for imports in ["[l.yaml, r.yaml]", "[r.yaml, l.yaml]"] {
                let main = format!("{HEADER}imports: {imports}\n");
                let doc = composer(&[("main.yaml", main.as_str()), ("l.yaml", left_doc.as_str()), ("r.yaml", right_doc.as_str())])
                    .compose(&Locator::new("main.yaml"))
                    .unwrap();
                let mut keys: Vec<String> = doc.root.as_map().unwrap().keys().cloned().collect();
                keys.sort();
                key_sets.push(keys);
            }

            let mut expected: Vec<String> = left.iter().map(|k| format!("l_{k}"))
                .chain(right.iter().map(|k| format!("r_{k}")))
                .chain(["imports".to_string(), "tosca_definitions_version".to_string()])
                .collect();
            expected.sort();
            prop_assert_eq!(&key_sets[0], &expected);
            prop_assert_eq!(&key_sets[1], &expected);
        }
    }
}
