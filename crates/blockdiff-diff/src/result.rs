//! What a diff hands back to the caller.

use blockdiff_render::RenderedImage;
use blockdiff_types::{BlockId, Signature};
use blockdiff_workspace::Workspace;
use serde::{Deserialize, Serialize};

use crate::error::DiffError;

/// The old snapshot could not be materialized.
pub const MSG_ALL_NEW: &str = "All blocks are new.";
/// The new snapshot could not be materialized.
pub const MSG_CORRUPTED: &str = "The current blocks seem corrupted.";
/// Both snapshots elided to nothing.
pub const MSG_JUST_MOVED: &str = "Some blocks were moved or changed.";
/// Reconciliation left nothing to draw.
pub const MSG_NOTHING_REPRESENTABLE: &str = "Some blocks were changed.";
/// The pipeline failed.
pub const MSG_FAILED: &str = "Oops, we could not diff those blocks.";

/// How a diff ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOutcome {
    /// The result workspace was rendered.
    Rendered,
    /// Everything elided: the program was most likely only rearranged.
    JustMoved,
    /// Blocks changed but cleanup left nothing to draw.
    NothingRepresentable,
    /// One of the snapshots could not be materialized.
    Corrupted,
    /// The pipeline failed; see [`DiffResult::error`].
    Failed,
}

/// One counted block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockChange {
    /// Present in the new snapshot only.
    Added { id: BlockId },
    /// Present in the old snapshot only.
    Deleted { id: BlockId },
    /// Present in both with different chain neighbours.
    Moved { id: BlockId },
    /// Present in both with a different own shape.
    Changed {
        id: BlockId,
        old_signature: Signature,
        new_signature: Signature,
    },
}

impl BlockChange {
    pub fn id(&self) -> &BlockId {
        match self {
            Self::Added { id } | Self::Deleted { id } | Self::Moved { id } => id,
            Self::Changed { id, .. } => id,
        }
    }

    /// Short lowercase label (`added`, `deleted`, `moved`, `changed`).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Deleted { .. } => "deleted",
            Self::Moved { .. } => "moved",
            Self::Changed { .. } => "changed",
        }
    }
}

/// The outcome of diffing two workspaces.
///
/// Callers branch on [`DiffResult::message`] and [`DiffResult::error`]
/// before trusting `ws` or `svg`.
#[derive(Debug)]
pub struct DiffResult {
    /// The annotated result workspace.
    pub ws: Option<Workspace>,
    /// The rendered result workspace.
    pub svg: Option<RenderedImage>,
    /// User-facing message when there is no regular rendering.
    pub message: Option<String>,
    /// The failure that was converted into this result.
    pub error: Option<DiffError>,
    pub deleted: usize,
    pub added: usize,
    pub modified: usize,
    /// One record per counted block.
    pub changes: Vec<BlockChange>,
    pub outcome: DiffOutcome,
}

impl DiffResult {
    fn message_only(outcome: DiffOutcome, message: &str) -> Self {
        Self {
            ws: None,
            svg: None,
            message: Some(message.to_string()),
            error: None,
            deleted: 0,
            added: 0,
            modified: 1,
            changes: Vec::new(),
            outcome,
        }
    }

    pub(crate) fn old_corrupted() -> Self {
        Self::message_only(DiffOutcome::Corrupted, MSG_ALL_NEW)
    }

    pub(crate) fn new_corrupted() -> Self {
        Self::message_only(DiffOutcome::Corrupted, MSG_CORRUPTED)
    }

    pub(crate) fn just_moved() -> Self {
        Self::message_only(DiffOutcome::JustMoved, MSG_JUST_MOVED)
    }

    pub(crate) fn failed(error: DiffError) -> Self {
        Self {
            error: Some(error),
            modified: 0,
            ..Self::message_only(DiffOutcome::Failed, MSG_FAILED)
        }
    }

    /// `true` when a rendered image is available.
    pub fn is_rendered(&self) -> bool {
        self.outcome == DiffOutcome::Rendered && self.svg.is_some()
    }

    /// Changes of one kind, in discovery order.
    pub fn changes_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a BlockChange> {
        self.changes.iter().filter(move |c| c.kind() == kind)
    }

    /// Serializable view without the live workspace.
    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            outcome: self.outcome,
            message: self.message.clone(),
            error: self.error.as_ref().map(ToString::to_string),
            deleted: self.deleted,
            added: self.added,
            modified: self.modified,
            changes: self.changes.clone(),
        }
    }
}

/// The counters, message, and change records of a [`DiffResult`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub outcome: DiffOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub deleted: usize,
    pub added: usize,
    pub modified: usize,
    pub changes: Vec<BlockChange>,
}
