//! ARIA Type Registry
//!
//! Per-category inheritance forests built from the type sections of a
//! validated document, with closest-wins merged schemas.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registry;
pub mod schema;

pub use registry::{TypeDef, TypeRegistry};
pub use schema::{
    CapabilitySchema, InterfaceSchema, Occurrences, OperationSchema, PropertySchema,
    RequirementSchema, Schema,
};
