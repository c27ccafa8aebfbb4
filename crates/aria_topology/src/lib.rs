//! ARIA Topology
//!
//! Normalizes a validated document into a deployment graph, resolves
//! intrinsic functions on demand, and emits the legacy deployment plan.
//! [`Pipeline`] runs every stage for one root locator.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod functions;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod plan;
pub mod template;

pub use functions::{
    contains_functions, evaluate, EvalScope, Evaluation, FunctionError, FunctionTable, RuntimeContext,
    TopologyContext,
};
pub use model::{CapabilityInstance, NodeTemplate, Plugin, Relationship, Scaling, Topology, Workflow};
pub use normalizer::{normalize, NormalizeConfig, Normalizer};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
pub use plan::Plan;
