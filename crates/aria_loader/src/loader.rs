//! Raw-text acquisition.

use aria_core::Locator;
use indexmap::IndexMap;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Loader failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Nothing exists at the locator
    #[error("not found: {uri}")]
    NotFound {
        /// Requested uri
        uri: String,
    },

    /// The locator exists but could not be read
    #[error("cannot read {uri}: {message}")]
    Io {
        /// Requested uri
        uri: String,
        /// Underlying error
        message: String,
    },

    /// The loader cannot fetch this kind of uri
    #[error("unsupported scheme in {uri}")]
    UnsupportedScheme {
        /// Requested uri
        uri: String,
    },
}

/// Fetches the bytes behind a locator
pub trait Loader: Send + Sync {
    /// Loader name for diagnostics
    fn name(&self) -> &str;

    /// Load the document at `locator`
    ///
    /// # Errors
    ///
    /// Returns error if the document does not exist or cannot be read
    fn load(&self, locator: &Locator) -> Result<Vec<u8>, LoadError>;
}

/// Loads plain paths and `file://` uris from disk
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    root: Option<PathBuf>,
}

impl FileLoader {
    /// Create a loader resolving relative paths against the working directory
    #[must_use]
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Resolve relative paths against `root`
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn path_of(&self, locator: &Locator) -> Result<PathBuf, LoadError> {
        let raw = match locator.uri.strip_prefix("file://") {
            Some(path) => path,
            None if locator.has_scheme() => {
                return Err(LoadError::UnsupportedScheme {
                    uri: locator.uri.clone(),
                });
            }
            None => locator.uri.as_str(),
        };
        let path = PathBuf::from(raw);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        })
    }
}

impl Loader for FileLoader {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self, locator: &Locator) -> Result<Vec<u8>, LoadError> {
        let path = self.path_of(locator)?;
        tracing::debug!(path = %path.display(), "loading file");
        std::fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                uri: locator.uri.clone(),
            },
            _ => LoadError::Io {
                uri: locator.uri.clone(),
                message: err.to_string(),
            },
        })
    }
}

/// Serves documents registered in memory, keyed by uri
#[derive(Debug, Clone, Default)]
pub struct LiteralLoader {
    documents: IndexMap<String, Vec<u8>>,
}

impl LiteralLoader {
    /// Create an empty loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: IndexMap::new(),
        }
    }

    /// Register a document
    #[must_use]
    pub fn with_document(mut self, uri: impl Into<String>, text: impl Into<Vec<u8>>) -> Self {
        self.insert(uri, text);
        self
    }

    /// Register or replace a document
    pub fn insert(&mut self, uri: impl Into<String>, text: impl Into<Vec<u8>>) {
        self.documents.insert(uri.into(), text.into());
    }

    /// Number of registered documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if no document is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Loader for LiteralLoader {
    fn name(&self) -> &str {
        "literal"
    }

    fn load(&self, locator: &Locator) -> Result<Vec<u8>, LoadError> {
        self.documents
            .get(&locator.uri)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                uri: locator.uri.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_literal_loader() {
        let loader = LiteralLoader::new().with_document("a.yaml", "x: 1\n");
        assert_eq!(loader.load(&Locator::new("a.yaml")).unwrap(), b"x: 1\n");
        assert_eq!(
            loader.load(&Locator::new("b.yaml")),
            Err(LoadError::NotFound { uri: "b.yaml".to_string() })
        );
    }

    #[test]
    fn test_file_loader_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("main.yaml")).unwrap();
        file.write_all(b"tosca_definitions_version: tosca_simple_yaml_1_0\n").unwrap();

        let loader = FileLoader::new().with_root(dir.path());
        let bytes = loader.load(&Locator::new("main.yaml")).unwrap();
        assert!(bytes.starts_with(b"tosca_definitions_version"));

        let uri = format!("file://{}", dir.path().join("main.yaml").display());
        assert!(FileLoader::new().load(&Locator::new(uri)).is_ok());
    }

    #[test]
    fn test_file_loader_errors() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileLoader::new().with_root(dir.path());
        assert!(matches!(
            loader.load(&Locator::new("missing.yaml")),
            Err(LoadError::NotFound { .. })
        ));
        assert!(matches!(
            loader.load(&Locator::new("https://example.com/x.yaml")),
            Err(LoadError::UnsupportedScheme { .. })
        ));
    }
}
