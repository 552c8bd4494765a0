//! Fast-path elision of unmodified top-level subtrees.
//!
//! Before reconciliation, every new top block is paired with an old block,
//! by id when possible and by full signature otherwise. Pairs whose full
//! signatures agree carry no information and are removed from both
//! workspaces.

use std::collections::HashMap;

use blockdiff_types::Signature;
use blockdiff_workspace::{BlockKey, Workspace};
use tracing::debug;

use crate::canonical::canonical_signature;
use crate::error::EngineResult;

/// Dispose every unmodified new top block together with its old twin.
/// Returns the number of pairs removed.
pub fn elide_unmodified(old: &mut Workspace, new: &mut Workspace) -> EngineResult<usize> {
    let mut by_signature: HashMap<Signature, BlockKey> = HashMap::new();
    for key in old.top_blocks() {
        by_signature.insert(canonical_signature(old, key, true)?, key);
    }

    let mut elided = 0;
    for new_key in new.top_blocks() {
        let new_block = new.get(new_key)?;
        let new_sig = canonical_signature(new, new_key, true)?;
        let old_key = old
            .block_by_id(new_block.id())
            .or_else(|| by_signature.get(&new_sig).copied())
            .filter(|key| old.contains(*key));
        let Some(old_key) = old_key else {
            continue;
        };
        if canonical_signature(old, old_key, true)? != new_sig {
            continue;
        }
        debug!(id = %new_block.id(), signature = %new_sig.short_hex(), "fast unmodified top");
        new.dispose(new_key)?;
        old.dispose(old_key)?;
        elided += 1;
    }
    Ok(elided)
}
