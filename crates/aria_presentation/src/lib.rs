//! ARIA Presentation Layer
//!
//! Typed, schema-driven views over raw document trees. Presentation types
//! are static descriptor tables; grammars map a document's discriminator to
//! the root presentation type of its dialect.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cloudify;
pub mod field;
pub mod grammar;
pub mod presentation;
pub mod spec_registry;
pub mod tosca;
pub mod validate;

pub use field::{DefaultValue, FieldDescriptor, FieldKind, PresentationType, PrimitiveType};
pub use grammar::{Dialect, Grammar, GrammarTable, DISCRIMINATOR};
pub use presentation::{Presentation, PresentationError};
pub use spec_registry::SpecRegistryError;
pub use validate::{validate, ValidateConfig, Validator};
