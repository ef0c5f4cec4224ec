//! Flow Engine - typed workflow-graph validation and execution
//!
//! This crate is the runtime core behind a node-graph editor: it validates
//! user-authored graph documents and drives them through execution with
//! dependency ordering, parallel independent branches, per-node error
//! isolation, cooperative cancellation, and ordered lifecycle events.
//!
//! # Architecture
//!
//! - [`ParamKind`] / [`ParamValue`]: the typed-parameter contract every port
//!   value obeys (validation, wire serialization, defaults)
//! - [`NodeRegistry`]: kind string -> descriptor + executable factory
//! - [`Validator`]: total, deterministic structural and semantic checks
//! - [`Scheduler`]: the dispatch engine consuming a validated graph plus an
//!   [`ExecutionObserver`], producing an [`ExecutionReport`]
//! - [`Environment`]: opaque typed map threading embedder services into
//!   node bodies
//!
//! Node implementations live outside this crate; anything implementing
//! [`Node`] can be registered under a kind string.

pub mod descriptor;
pub mod error;
pub mod events;
pub mod extensions;
pub mod node;
pub mod params;
pub mod registry;
pub mod scheduler;
pub mod types;
pub mod validation;

pub use descriptor::{NodeCategory, NodeDescriptor, PortSpec};
pub use error::ExecuteError;
pub use events::{
    ExecutionEvent, ExecutionObserver, NullObserver, RecordingObserver, WireOutputs,
};
pub use extensions::Environment;
pub use node::{ExecutionContext, InputsExt, Node, NodeError, NodeInputs, NodeOutputs};
pub use params::{validate_connection, ParamKind, ParamValue};
pub use registry::{NodeFactory, NodeRegistry, RegistryError};
pub use scheduler::{ExecutionReport, NodeStatus, Scheduler, SchedulerOptions};
pub use types::{GraphEdge, GraphNode, NodeId, Port, PortName, Position, WorkflowGraph};
pub use validation::{ValidationDetails, ValidationError, ValidationErrorKind, Validator};
