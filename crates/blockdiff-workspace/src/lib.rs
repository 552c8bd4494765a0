//! Live block workspaces.
//!
//! A [`Workspace`] owns a forest of blocks materialized from interchange
//! text. Blocks live in an arena and are addressed by [`BlockKey`]; the
//! interchange `id` is kept as data and indexed for lookup. The
//! [`Toolkit`] is the factory: it owns the [`ShapeRegistry`] that tells the
//! materializer which connections each block type has, and the [`EventBus`]
//! that workspace mutations report to.
//!
//! # Key Types
//!
//! - [`Toolkit`] -- Workspace factory and materializer
//! - [`Workspace`] / [`Block`] / [`BlockKey`] -- The live block forest
//! - [`BlockShape`] / [`ShapeRegistry`] -- Connection shapes per block type
//! - [`EventBus`] / [`QuietGuard`] -- Mutation notifications and scoped suppression

pub mod block;
pub mod error;
pub mod events;
mod load;
mod save;
pub mod shape;
pub mod toolkit;
pub mod workspace;

pub use block::{Attachment, Block, BlockKey, Connections, Field, Input};
pub use error::{WorkspaceError, WorkspaceResult};
pub use events::{EventBus, QuietGuard, WorkspaceEvent, EVENT_LOG_CAPACITY};
pub use load::MAX_NESTING;
pub use save::SaveOptions;
pub use shape::{BlockShape, InputSpec, ShapeRegistry, Slot};
pub use toolkit::Toolkit;
pub use workspace::{CloneDepth, Workspace};
