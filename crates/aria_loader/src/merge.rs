//! Raw tree merging for imports.
//!
//! Maps merge key by key (imported keys first, then the importer's new
//! keys), sequences concatenate imported first, and on a scalar conflict
//! the importer's value wins. A structural conflict (a map or sequence on
//! one side, anything else on the other) is fatal.

use aria_core::{CoreError, CoreResult, Locator, RawDocument, TreePath, Value};
use aria_presentation::Grammar;

struct Merger<'a> {
    imported: &'a Locator,
    taken: Vec<TreePath>,
    shifts: Vec<(TreePath, usize)>,
}

impl Merger<'_> {
    fn merge(&mut self, mine: Value, theirs: Value, path: &TreePath) -> CoreResult<Value> {
        match (mine, theirs) {
            (Value::Map(mut mine), Value::Map(theirs)) => {
                let mut merged = aria_core::Map::with_capacity(mine.len() + theirs.len());
                for (key, value) in theirs {
                    let child = path.child(key.as_str());
                    let value = match mine.shift_remove(&key) {
                        Some(existing) => self.merge(existing, value, &child)?,
                        None => {
                            self.taken.push(child);
                            value
                        }
                    };
                    merged.insert(key, value);
                }
                merged.extend(mine);
                Ok(Value::Map(merged))
            }
            (Value::List(mine), Value::List(mut theirs)) => {
                let count = theirs.len();
                self.shifts.push((path.clone(), count));
                self.taken.extend((0..count).map(|i| path.index(i)));
                theirs.extend(mine);
                Ok(Value::List(theirs))
            }
            (mine, Value::Null) => Ok(mine),
            (Value::Null, theirs) => {
                self.taken.push(path.clone());
                Ok(theirs)
            }
            (mine, theirs) if mine.is_scalar() && theirs.is_scalar() => {
                if mine != theirs {
                    tracing::warn!(
                        path = %path,
                        imported = %self.imported,
                        "import conflict resolved in favour of the importer"
                    );
                }
                Ok(mine)
            }
            (mine, theirs) => Err(CoreError::MergeConflict {
                locator: self.imported.clone(),
                path: path.clone(),
                importer: mine.kind_name(),
                imported: theirs.kind_name(),
            }),
        }
    }
}

/// Merge a composed imported document into its importer.
///
/// The imported document's own imports field is dropped. A type declared
/// under the same section in both documents is a fatal duplicate.
pub(crate) fn merge_document(
    target: &mut RawDocument,
    imported: RawDocument,
    grammar: Option<&Grammar>,
) -> CoreResult<()> {
    let locator = imported.locator.clone();
    let mut theirs = imported.root.clone();

    if let Some(grammar) = grammar {
        if let (Some(field), Some(map)) = (grammar.imports_field, theirs.as_map_mut()) {
            map.shift_remove(field);
        }
        check_duplicates(&target.root, &theirs, &locator, grammar)?;
    }

    let mut merger = Merger {
        imported: &locator,
        taken: Vec::new(),
        shifts: Vec::new(),
    };
    let mine = std::mem::take(&mut target.root);
    target.root = merger.merge(mine, theirs, &TreePath::root())?;

    for (list, by) in &merger.shifts {
        target.shift_origins(list, *by);
    }
    for path in &merger.taken {
        target.record_origin(path.clone(), imported.origin_of(path).clone());
    }
    for (path, origin) in imported.origins() {
        let nested = merger
            .taken
            .iter()
            .any(|taken| path.len() > taken.len() && path.starts_with(taken));
        if nested {
            target.record_origin(path.clone(), origin.clone());
        }
    }

    tracing::debug!(
        imported = %locator,
        into = %target.locator,
        subtrees = merger.taken.len(),
        "merged import"
    );
    Ok(())
}

fn check_duplicates(
    mine: &Value,
    theirs: &Value,
    locator: &Locator,
    grammar: &Grammar,
) -> CoreResult<()> {
    for (section, category) in grammar.type_sections {
        let (Some(existing), Some(incoming)) = (
            mine.get(section).and_then(Value::as_map),
            theirs.get(section).and_then(Value::as_map),
        ) else {
            continue;
        };
        if let Some(name) = incoming.keys().find(|name| existing.contains_key(*name)) {
            return Err(CoreError::DuplicateType {
                category: *category,
                type_name: name.clone(),
                locator: locator.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::TypeCategory;
    use aria_presentation::GrammarTable;

    fn doc(uri: &str, json: serde_json::Value) -> RawDocument {
        RawDocument::new(Value::from(json), Locator::new(uri))
    }

    fn grammar() -> Grammar {
        *GrammarTable::standard().get("tosca_simple_yaml_1_0").unwrap()
    }

    #[test]
    fn test_map_merge_order() {
        let mut main = doc("main.yaml", serde_json::json!({"a": 1, "shared": {"x": 1}}));
        let imported = doc("lib.yaml", serde_json::json!({"shared": {"y": 2}, "b": 2}));
        merge_document(&mut main, imported, None).unwrap();

        let keys: Vec<_> = main.root.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["shared", "b", "a"]);
        let shared: Vec<_> = main.root.get("shared").unwrap().as_map().unwrap().keys().cloned().collect();
        assert_eq!(shared, vec!["y", "x"]);
    }

    #[test]
    fn test_sequences_concatenate_imported_first() {
        let mut main = doc("main.yaml", serde_json::json!({"list": [3]}));
        let imported = doc("lib.yaml", serde_json::json!({"list": [1, 2]}));
        merge_document(&mut main, imported, None).unwrap();
        assert_eq!(main.root.get("list"), Some(&Value::from(serde_json::json!([1, 2, 3]))));
        assert_eq!(main.origin_of(&TreePath::from_keys(["list"]).index(1)).uri, "lib.yaml");
        assert_eq!(main.origin_of(&TreePath::from_keys(["list"]).index(2)).uri, "main.yaml");
    }

    #[test]
    fn test_scalar_conflict_importer_wins() {
        let mut main = doc("main.yaml", serde_json::json!({"description": "mine"}));
        let imported = doc("lib.yaml", serde_json::json!({"description": "theirs"}));
        merge_document(&mut main, imported, None).unwrap();
        assert_eq!(main.root.get("description").and_then(Value::as_str), Some("mine"));
    }

    #[test]
    fn test_structural_conflict_is_fatal() {
        let mut main = doc("main.yaml", serde_json::json!({"metadata": {"a": 1}}));
        let imported = doc("lib.yaml", serde_json::json!({"metadata": [1]}));
        let err = merge_document(&mut main, imported, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MergeConflict { importer: "map", imported: "list", .. }
        ));
    }

    #[test]
    fn test_duplicate_type_is_fatal() {
        let mut main = doc("main.yaml", serde_json::json!({"node_types": {"A": {}}}));
        let imported = doc("lib.yaml", serde_json::json!({"node_types": {"B": {}, "A": {}}}));
        let err = merge_document(&mut main, imported, Some(&grammar())).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DuplicateType { category: TypeCategory::Node, ref type_name, .. } if type_name == "A"
        ));
    }

    #[test]
    fn test_imports_field_dropped_and_origins_recorded() {
        let mut main = doc("main.yaml", serde_json::json!({"imports": ["lib.yaml"]}));
        let imported = doc(
            "lib.yaml",
            serde_json::json!({"imports": ["other.yaml"], "node_types": {"A": {}}}),
        );
        merge_document(&mut main, imported, Some(&grammar())).unwrap();

        assert_eq!(main.root.get("imports"), Some(&Value::from(serde_json::json!(["lib.yaml"]))));
        let path = TreePath::from_keys(["node_types", "A", "properties"]);
        assert_eq!(main.origin_of(&path).uri, "lib.yaml");
    }
}
