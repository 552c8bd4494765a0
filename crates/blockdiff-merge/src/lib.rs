//! Three-way merge of workspace snapshots.
//!
//! Only the trivial cases are resolved: when one side is unchanged from the
//! common ancestor the other side wins. Anything else is left to the caller.
//!
//! # Key Types
//!
//! - [`merge_xml`] -- Resolve `a` and `b` against their common ancestor
//! - [`MergeOutcome`] -- Which side won, if any

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The result of [`merge_xml`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolution", content = "text", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// `a` was unchanged; `b` is the merge.
    TakeB(String),
    /// `b` was unchanged; `a` is the merge.
    TakeA(String),
    /// Both sides changed.
    Unresolved,
}

impl MergeOutcome {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// The merged snapshot, if there is one.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::TakeB(text) | Self::TakeA(text) => Some(text),
            Self::Unresolved => None,
        }
    }
}

/// Merge two snapshots `a` and `b` that both descend from `original`.
///
/// Snapshots are compared byte for byte.
pub fn merge_xml(a: &str, original: &str, b: &str) -> MergeOutcome {
    let outcome = if a == original {
        MergeOutcome::TakeB(b.to_string())
    } else if b == original {
        MergeOutcome::TakeA(a.to_string())
    } else {
        MergeOutcome::Unresolved
    };
    debug!(resolved = outcome.is_resolved(), "merge");
    outcome
}
