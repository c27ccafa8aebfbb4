//! ARIA Core Types
//!
//! Raw document trees, locators, diagnostics and fatal errors shared by every
//! stage of the parser. This crate performs no I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod document;
pub mod error;
pub mod issue;
pub mod locator;
pub mod path;
pub mod value;

// Re-exports
pub use category::TypeCategory;
pub use document::RawDocument;
pub use error::{CoreError, CoreResult};
pub use issue::{Issue, IssueList, Location, Severity};
pub use locator::Locator;
pub use path::{PathSegment, TreePath};
pub use value::{DuplicateKey, Map, Value};
