//! Composed raw documents.

use crate::issue::Location;
use crate::locator::Locator;
use crate::path::{PathSegment, TreePath};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A raw tree plus the source of each merged subtree.
///
/// Built once per root locator and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Root value
    pub root: Value,
    /// Root document locator
    pub locator: Locator,
    origins: Vec<(TreePath, Locator)>,
}

impl RawDocument {
    /// Wrap a decoded tree
    #[must_use]
    pub fn new(root: Value, locator: Locator) -> Self {
        Self {
            root,
            locator,
            origins: Vec::new(),
        }
    }

    /// Record that the subtree at `path` came from `locator`
    pub fn record_origin(&mut self, path: TreePath, locator: Locator) {
        self.origins.push((path, locator));
    }

    /// Renumber recorded origins below the list at `list` after `by` items
    /// were prepended to it
    pub fn shift_origins(&mut self, list: &TreePath, by: usize) {
        let depth = list.len();
        for (path, _) in &mut self.origins {
            if !path.starts_with(list) {
                continue;
            }
            if let Some(&PathSegment::Index(index)) = path.segments().get(depth) {
                *path = path.with_index_at(depth, index + by);
            }
        }
    }

    /// Recorded subtree origins, in merge order
    #[must_use]
    pub fn origins(&self) -> &[(TreePath, Locator)] {
        &self.origins
    }

    /// Originating document of the node at `path` (longest recorded prefix)
    #[must_use]
    pub fn origin_of(&self, path: &TreePath) -> &Locator {
        self.origins
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(&self.locator, |(_, locator)| locator)
    }

    /// Full diagnostic location of the node at `path`
    #[must_use]
    pub fn location(&self, path: &TreePath) -> Location {
        Location::new(Some(self.origin_of(path).clone()), path.clone())
    }
}
