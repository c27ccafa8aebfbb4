//! Document locators.
//!
//! A locator both fetches and blames: loaders resolve it to bytes, and
//! issues carry it so a user can find the offending imported document.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid scheme pattern"));

/// Identifier of a source document plus the document that referenced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Path, URI or literal name
    pub uri: String,
    /// Importing document, if any
    pub origin: Option<Box<Locator>>,
}

impl Locator {
    /// Create a root locator
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            origin: None,
        }
    }

    /// Check if the uri carries a scheme such as `https://`
    #[must_use]
    pub fn has_scheme(&self) -> bool {
        SCHEME.is_match(&self.uri)
    }

    /// Resolve an import reference against this locator.
    ///
    /// References are importer-relative unless absolute or scheme-qualified.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Self {
        let uri = if reference.starts_with('/') || SCHEME.is_match(reference) {
            normalize(reference)
        } else {
            match self.uri.rfind('/') {
                Some(pos) => normalize(&format!("{}/{}", &self.uri[..pos], reference)),
                None => normalize(reference),
            }
        };
        Self {
            uri,
            origin: Some(Box::new(self.clone())),
        }
    }

    /// Iterate this locator and its importers, innermost first
    pub fn chain(&self) -> impl Iterator<Item = &Locator> {
        std::iter::successors(Some(self), |l| l.origin.as_deref())
    }

    /// Describe the import chain, e.g. `types.yaml <- main.yaml`
    #[must_use]
    pub fn describe(&self) -> String {
        self.chain().map(|l| l.uri.as_str()).collect::<Vec<_>>().join(" <- ")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// Collapse `.` and `..` segments, leaving any scheme/authority intact.
fn normalize(uri: &str) -> String {
    let (prefix, path) = match SCHEME.find(uri) {
        Some(m) => {
            let rest = &uri[m.end()..];
            let split = rest.find('/').map_or(rest.len(), |p| p);
            (&uri[..m.end() + split], &rest[split..])
        }
        None => ("", uri),
    };

    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("{}/{}", prefix, joined)
    } else {
        format!("{}{}", prefix, joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        let main = Locator::new("blueprints/main.yaml");
        let imported = main.resolve("types/base.yaml");
        assert_eq!(imported.uri, "blueprints/types/base.yaml");
        assert_eq!(imported.origin.as_deref(), Some(&main));
    }

    #[test]
    fn test_resolve_parent_segments() {
        let main = Locator::new("a/b/main.yaml");
        assert_eq!(main.resolve("../common.yaml").uri, "a/common.yaml");
        assert_eq!(main.resolve("./x.yaml").uri, "a/b/x.yaml");
        assert_eq!(Locator::new("main.yaml").resolve("../x.yaml").uri, "../x.yaml");
    }

    #[test]
    fn test_resolve_absolute_and_scheme() {
        let main = Locator::new("a/main.yaml");
        assert_eq!(main.resolve("/etc/types.yaml").uri, "/etc/types.yaml");
        assert_eq!(
            main.resolve("http://example.com/x/../types.yaml").uri,
            "http://example.com/types.yaml"
        );
        assert!(Locator::new("https://example.com/a.yaml").has_scheme());
    }

    #[test]
    fn test_resolve_against_url() {
        let main = Locator::new("http://example.com/bp/main.yaml");
        assert_eq!(main.resolve("types.yaml").uri, "http://example.com/bp/types.yaml");
    }

    #[test]
    fn test_describe_chain() {
        let main = Locator::new("main.yaml");
        let child = main.resolve("child.yaml");
        let grandchild = child.resolve("leaf.yaml");
        assert_eq!(grandchild.describe(), "leaf.yaml <- child.yaml <- main.yaml");
    }
}
