//! Diff engine for block workspaces.
//!
//! Compares an old and a new workspace snapshot and produces a third,
//! annotated workspace: deleted code reappears as disabled ghosts, added,
//! moved, and changed blocks keep their colours, and untouched blocks are
//! greyed out or dropped. Identity is tracked by block id with a canonical
//! signature fallback for snapshots whose ids did not survive a round-trip.
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- Materialize, diff, render; never fails
//! - [`DiffResult`] / [`DiffOutcome`] / [`BlockChange`] -- What a diff reports
//! - [`DiffOptions`] -- Ghost suppression and render layout
//! - [`SignatureDiff`] -- Line diff explaining a changed block

pub mod canonical;
pub mod elision;
pub mod engine;
pub mod error;
pub mod explain;
pub mod options;
mod pipeline;
pub mod result;

pub use canonical::{canonical_element, canonical_signature};
pub use elision::elide_unmodified;
pub use engine::{diff_xml, DiffEngine};
pub use error::{DiffError, EngineResult};
pub use explain::{DiffLine, SignatureDiff};
pub use options::DiffOptions;
pub use result::{
    BlockChange, DiffOutcome, DiffResult, DiffSummary, MSG_ALL_NEW, MSG_CORRUPTED, MSG_FAILED,
    MSG_JUST_MOVED, MSG_NOTHING_REPRESENTABLE,
};
