//! Fatal error types for ARIA.
//!
//! Fatal errors abort the current invocation. Anything recoverable is
//! collected as an [`Issue`](crate::Issue) instead.

use crate::category::TypeCategory;
use crate::locator::Locator;
use crate::path::TreePath;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Fatal error, always tied to the originating locator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// No grammar matches the document's discriminator
    #[error("No grammar registered for {field} \"{value}\" in {locator}")]
    GrammarNotFound {
        /// Discriminator field name
        field: String,
        /// Discriminator value found (empty when absent)
        value: String,
        /// Document
        locator: Locator,
    },

    /// Imported document could not be loaded
    #[error("Import not found: {} ({cause})", .locator.describe())]
    ImportNotFound {
        /// Unloadable document
        locator: Locator,
        /// Loader message
        cause: String,
    },

    /// Imported document could not be decoded
    #[error("Cannot decode {}: {cause}", .locator.describe())]
    ImportDecode {
        /// Undecodable document
        locator: Locator,
        /// Decoder message
        cause: String,
    },

    /// A document imports itself, directly or transitively
    #[error("Import cycle: {}", .chain.join(" -> "))]
    ImportCycle {
        /// Document that closed the cycle
        locator: Locator,
        /// Active import path, outermost first, ending with the repeated uri
        chain: Vec<String>,
    },

    /// Import nesting exceeded the configured limit
    #[error("Import depth {depth} exceeded at {}", .locator.describe())]
    ImportTooDeep {
        /// Document at which the limit was hit
        locator: Locator,
        /// Configured limit
        depth: usize,
    },

    /// Importer and imported hold structurally different values at one key
    #[error("Cannot merge {imported} from {} into {importer} at {path}", .locator.describe())]
    MergeConflict {
        /// Imported document
        locator: Locator,
        /// Conflicting key
        path: TreePath,
        /// Kind of the importer's value
        importer: &'static str,
        /// Kind of the imported value
        imported: &'static str,
    },

    /// A type's parent never resolved (missing or cyclic)
    #[error("{category} type \"{type_name}\" derives from unresolved type \"{parent}\" ({locator})")]
    DanglingParent {
        /// Category namespace
        category: TypeCategory,
        /// Unattached type
        type_name: String,
        /// Declared parent
        parent: String,
        /// Declaring document
        locator: Locator,
    },

    /// Two documents declare the same type name in one category
    #[error("Duplicate {category} type \"{type_name}\" in {}", .locator.describe())]
    DuplicateType {
        /// Category namespace
        category: TypeCategory,
        /// Repeated name
        type_name: String,
        /// Document declaring the duplicate
        locator: Locator,
    },

    /// A presentation accessor was asked for an undeclared or mismatched field
    #[error("Presentation error in {locator}: {message}")]
    Presentation {
        /// Accessor failure
        message: String,
        /// Document being read
        locator: Locator,
    },

    /// Caller requested cancellation before the next nested load
    #[error("Cancelled before loading {locator}")]
    Cancelled {
        /// Document that would have been loaded next
        locator: Locator,
    },
}

impl CoreError {
    /// Locator the error originates from
    #[must_use]
    pub fn locator(&self) -> &Locator {
        match self {
            Self::GrammarNotFound { locator, .. }
            | Self::ImportNotFound { locator, .. }
            | Self::ImportDecode { locator, .. }
            | Self::ImportCycle { locator, .. }
            | Self::ImportTooDeep { locator, .. }
            | Self::MergeConflict { locator, .. }
            | Self::DanglingParent { locator, .. }
            | Self::DuplicateType { locator, .. }
            | Self::Presentation { locator, .. }
            | Self::Cancelled { locator } => locator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::ImportCycle {
            locator: Locator::new("a.yaml"),
            chain: vec!["a.yaml".to_string(), "b.yaml".to_string(), "a.yaml".to_string()],
        };
        assert_eq!(err.to_string(), "Import cycle: a.yaml -> b.yaml -> a.yaml");
    }

    #[test]
    fn test_dangling_parent_display() {
        let err = CoreError::DanglingParent {
            category: TypeCategory::Node,
            type_name: "Child".to_string(),
            parent: "Missing".to_string(),
            locator: Locator::new("main.yaml"),
        };
        let s = err.to_string();
        assert!(s.contains("node type \"Child\""));
        assert!(s.contains("\"Missing\""));
    }

    #[test]
    fn test_error_locator() {
        let locator = Locator::new("main.yaml").resolve("types.yaml");
        let err = CoreError::ImportNotFound {
            locator: locator.clone(),
            cause: "no such file".to_string(),
        };
        assert_eq!(err.locator(), &locator);
        assert!(err.to_string().contains("types.yaml <- main.yaml"));
    }
}
