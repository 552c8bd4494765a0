//! Reconciliation of two workspaces into an annotated result workspace.
//!
//! The result starts as a copy of the new workspace without its disabled
//! blocks. Every result block begins unclaimed; the passes below claim them
//! in order and each pass only sees what earlier passes left:
//!
//! 1. ghosts of deleted top blocks
//! 2. added blocks
//! 3. ghosts of deleted statement blocks, stitched into the chains their
//!    originals sat in
//! 4. moved blocks (different chain neighbours)
//! 5. changed blocks (different own-shape signature)
//!
//! Cleanup then drops top-level trees nothing claimed and greys out the
//! unclaimed blocks left inside claimed trees.

use std::collections::{BTreeMap, HashMap, HashSet};

use blockdiff_render::Renderer;
use blockdiff_types::{BlockId, Colour};
use blockdiff_workspace::{Attachment, BlockKey, CloneDepth, Toolkit, Workspace};
use tracing::{debug, info};

use crate::canonical::canonical_signature;
use crate::elision::elide_unmodified;
use crate::error::EngineResult;
use crate::options::DiffOptions;
use crate::result::{BlockChange, DiffOutcome, DiffResult, MSG_NOTHING_REPRESENTABLE};

/// Run elision, the five passes, cleanup, and the final render.
pub(crate) fn reconcile(
    toolkit: &Toolkit,
    renderer: &dyn Renderer,
    mut old: Workspace,
    mut new: Workspace,
    options: &DiffOptions,
) -> EngineResult<DiffResult> {
    info!(started = 1, "blocks.diff");
    let elided = elide_unmodified(&mut old, &mut new)?;
    debug!(elided, "fast path done");

    let old_blocks = enabled(&old, old.all_blocks());
    let old_tops = enabled(&old, old.top_blocks());
    let new_blocks = enabled(&new, new.all_blocks());
    if old_blocks.is_empty() && new_blocks.is_empty() {
        info!(moves = 1, "blocks.diff");
        return Ok(DiffResult::just_moved());
    }

    let deleted_tops = absent(&old, &old_tops, &new)?;
    let deleted = absent(&old, &old_blocks, &new)?;
    let added = absent(&new, &new_blocks, &old)?;

    let mut result = toolkit.load_xml(&new.to_xml()?)?;
    for key in result.all_blocks() {
        if let Some(block) = result.block(key).filter(|b| b.is_disabled()) {
            debug!(block = %block.describe(), "dropping disabled block");
            result.dispose(key)?;
        }
    }
    let todo = result
        .all_blocks()
        .into_iter()
        .filter_map(|key| result.block(key).map(|b| (b.id().clone(), key)))
        .collect();

    let mut changes = Vec::with_capacity(deleted.len() + added.len());
    for &key in &deleted {
        changes.push(BlockChange::Deleted {
            id: old.get(key)?.id().clone(),
        });
    }
    for &key in &added {
        changes.push(BlockChange::Added {
            id: new.get(key)?.id().clone(),
        });
    }

    let mut pass = Passes {
        old: &old,
        result,
        todo,
        used_old: HashSet::new(),
        used: HashSet::new(),
        ghosts: HashMap::new(),
        changes,
        modified: 0,
    };
    pass.log_todo("start");
    pass.deleted_top_blocks(&deleted_tops, options.hide_deleted_top_blocks)?;
    pass.added_blocks(&new, &added)?;
    pass.deleted_statements(&deleted)?;
    pass.moved_blocks()?;
    pass.changed_blocks()?;
    pass.cleanup()?;

    let Passes {
        result,
        changes,
        modified,
        ..
    } = pass;
    let (deleted, added) = (deleted.len(), added.len());

    if result.is_empty() {
        info!(missed = 1, "blocks.diff");
        return Ok(DiffResult {
            ws: Some(result),
            svg: None,
            message: Some(MSG_NOTHING_REPRESENTABLE.to_string()),
            error: None,
            deleted,
            added,
            modified,
            changes,
            outcome: DiffOutcome::NothingRepresentable,
        });
    }

    let svg = renderer.render(&result, &options.render_options())?;
    info!(deleted, added, modified, "blocks.diff");
    Ok(DiffResult {
        ws: Some(result),
        svg: Some(svg),
        message: None,
        error: None,
        deleted,
        added,
        modified,
        changes,
        outcome: DiffOutcome::Rendered,
    })
}

fn enabled(ws: &Workspace, keys: Vec<BlockKey>) -> Vec<BlockKey> {
    keys.into_iter()
        .filter(|key| ws.block(*key).is_some_and(|b| !b.is_disabled()))
        .collect()
}

/// The blocks of `keys` (from `ws`) whose id does not occur in `other`.
fn absent(ws: &Workspace, keys: &[BlockKey], other: &Workspace) -> EngineResult<Vec<BlockKey>> {
    let mut out = Vec::new();
    for &key in keys {
        if other.block_by_id(ws.get(key)?.id()).is_none() {
            out.push(key);
        }
    }
    Ok(out)
}

struct Passes<'a> {
    old: &'a Workspace,
    result: Workspace,
    /// Unclaimed result blocks by id.
    todo: BTreeMap<BlockId, BlockKey>,
    /// Old blocks already shown by a ghost.
    used_old: HashSet<BlockKey>,
    /// Claimed result blocks.
    used: HashSet<BlockKey>,
    /// Pass 3 ghosts, by the id of the old block they stand for.
    ghosts: HashMap<BlockId, BlockKey>,
    changes: Vec<BlockChange>,
    modified: usize,
}

impl Passes<'_> {
    // ---------------------------------------------------------------
    // Claims
    // ---------------------------------------------------------------

    /// Claim a result block and everything below it.
    fn done(&mut self, key: BlockKey) {
        for k in self.result.descendants(key) {
            if let Some(block) = self.result.block(k) {
                self.todo.remove(block.id());
            }
            self.used.insert(k);
        }
    }

    /// Claim an old block and everything below it, together with the
    /// result blocks that carry the same ids.
    fn done_old(&mut self, key: BlockKey) {
        for k in self.old.descendants(key) {
            if let Some(block) = self.old.block(k) {
                self.todo.remove(block.id());
            }
            self.used_old.insert(k);
        }
    }

    fn claim(&mut self, id: &BlockId, key: BlockKey) {
        self.todo.remove(id);
        self.used.insert(key);
        self.modified += 1;
    }

    /// The enabled old block with this id.
    fn old_twin(&self, id: &BlockId) -> Option<BlockKey> {
        self.old
            .block_by_id(id)
            .filter(|key| self.old.block(*key).is_some_and(|b| !b.is_disabled()))
    }

    fn is_todo(&self, key: BlockKey) -> bool {
        self.result
            .block(key)
            .is_some_and(|b| self.todo.contains_key(b.id()))
    }

    fn log_todo(&self, stage: &str) {
        debug!(stage, todo = ?self.todo.keys().map(BlockId::as_str).collect::<Vec<_>>(), "unclaimed blocks");
    }

    // ---------------------------------------------------------------
    // Pass 1: deleted top blocks
    // ---------------------------------------------------------------

    fn deleted_top_blocks(&mut self, tops: &[BlockKey], hide: bool) -> EngineResult<()> {
        if hide {
            debug!(count = tops.len(), "deleted tops left to the statement pass");
            return Ok(());
        }
        for &key in tops {
            debug!(block = %self.old.get(key)?.describe(), "deleted top");
            self.done_old(key);
            let ghost = self.result.clone_subtree(self.old, key, CloneDepth::Chain)?;
            self.done(ghost);
            self.result.set_disabled(ghost, true)?;
        }
        self.log_todo("deleted top");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Pass 2: added blocks
    // ---------------------------------------------------------------

    fn added_blocks(&mut self, new: &Workspace, added: &[BlockKey]) -> EngineResult<()> {
        for &key in added {
            // Disabled ancestors take their added children with them.
            let Some(result_key) = self.result.block_by_id(new.get(key)?.id()) else {
                continue;
            };
            debug!(block = %self.result.get(result_key)?.describe(), "added");
            self.done(result_key);
        }
        self.log_todo("added");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Pass 3: deleted statement blocks
    // ---------------------------------------------------------------

    fn deleted_statements(&mut self, deleted: &[BlockKey]) -> EngineResult<()> {
        let mut stitched = Vec::new();
        for &key in deleted {
            let block = self.old.get(key)?;
            if self.todo.contains_key(block.id())
                || self.used_old.contains(&key)
                || self.old.is_plugged_reporter(key)
            {
                continue;
            }
            stitched.push(key);
        }

        for &key in &stitched {
            let ghost = self.result.clone_subtree(self.old, key, CloneDepth::Block)?;
            let id = self.old.get(key)?.id().clone();
            debug!(%id, ghost = %ghost, "deleted block");
            self.ghosts.insert(id, ghost);
        }
        for &key in &stitched {
            self.stitch(key)?;
        }
        self.log_todo("deleted");
        Ok(())
    }

    /// Reconnect the ghost of a deleted old block where the original sat:
    /// below the stand-in of its previous block and above the stand-in of
    /// its next block.
    fn stitch(&mut self, key: BlockKey) -> EngineResult<()> {
        let Some(&ghost) = self.ghosts.get(self.old.get(key)?.id()) else {
            return Ok(());
        };
        self.result.set_disabled(ghost, true)?;
        self.done(ghost);

        if let Some(previous) = self.old.previous_block(key) {
            if let Some(target) = self.stand_in(previous)? {
                debug!(ghost = %ghost, previous = %target, "stitching previous");
                self.attach_below(key, target, ghost)?;
            }
        }
        if let Some(next) = self.old.next_block(key) {
            if let Some(target) = self.stand_in(next)? {
                if self.can_precede(ghost, target)? {
                    debug!(ghost = %ghost, next = %target, "stitching next");
                    self.result.connect_before(ghost, target)?;
                }
            }
        }
        Ok(())
    }

    /// The result block standing for an old block: its ghost when it was
    /// deleted, otherwise the live block with the same id.
    fn stand_in(&self, old_key: BlockKey) -> EngineResult<Option<BlockKey>> {
        let id = self.old.get(old_key)?.id();
        Ok(self
            .ghosts
            .get(id)
            .copied()
            .or_else(|| self.result.block_by_id(id)))
    }

    /// Hang `ghost` below `target`: in the statement input the original
    /// `key` headed when `target` has it, else after `target`, else in the
    /// last statement input of `target`.
    ///
    /// The named input is tried before `target`'s next connection, so a
    /// ghost of a block that headed a statement input goes back into that
    /// input even when `target` could also be followed.
    fn attach_below(&mut self, key: BlockKey, target: BlockKey, ghost: BlockKey) -> EngineResult<()> {
        if !self.result.get(ghost)?.connections().previous
            || self.result.descendants(ghost).contains(&target)
        {
            return Ok(());
        }

        let target_block = self.result.get(target)?;
        let named = match self.old.get(key)?.attachment() {
            Attachment::Input { parent, index } => self
                .old
                .get(parent)?
                .inputs()
                .get(index)
                .and_then(|input| target_block.input_index(&input.name))
                .filter(|i| target_block.inputs()[*i].kind.is_statement()),
            _ => None,
        };
        let has_next = target_block.connections().next;

        if let Some(index) = named {
            self.result.connect_statement(target, index, ghost)?;
        } else if has_next {
            self.result.connect_after(target, ghost)?;
        } else if let Some(index) = self.result.last_statement_input(target) {
            self.result.connect_statement(target, index, ghost)?;
        }
        Ok(())
    }

    fn can_precede(&self, ghost: BlockKey, target: BlockKey) -> EngineResult<bool> {
        Ok(self.result.get(ghost)?.connections().next
            && self.result.get(target)?.connections().previous
            && !self.result.descendants(target).contains(&ghost))
    }

    // ---------------------------------------------------------------
    // Pass 4: moved blocks
    // ---------------------------------------------------------------

    fn moved_blocks(&mut self) -> EngineResult<()> {
        let mut moved = Vec::new();
        for (id, &key) in &self.todo {
            if self.is_moved(key)? {
                moved.push((id.clone(), key));
            }
        }
        for (id, key) in moved {
            debug!(%id, "moved");
            self.claim(&id, key);
            self.changes.push(BlockChange::Moved { id });
        }
        self.log_todo("moved");
        Ok(())
    }

    /// A block moved when its previous or next neighbour differs from the
    /// old one. Neighbours claimed by an earlier pass are not trusted: a
    /// block next to one is never reported as moved.
    fn is_moved(&self, key: BlockKey) -> EngineResult<bool> {
        let Some(old_key) = self.old_twin(self.result.get(key)?.id()) else {
            return Ok(false);
        };
        let new_previous = self.result.previous_block(key);
        let new_next = self.result.next_block(key);
        if new_previous
            .into_iter()
            .chain(new_next)
            .any(|neighbour| !self.is_todo(neighbour))
        {
            return Ok(false);
        }
        Ok(self.neighbour_differs(self.old.previous_block(old_key), new_previous)?
            || self.neighbour_differs(self.old.next_block(old_key), new_next)?)
    }

    fn neighbour_differs(&self, old: Option<BlockKey>, new: Option<BlockKey>) -> EngineResult<bool> {
        Ok(match (old, new) {
            (None, None) => false,
            (Some(old), Some(new)) => self.old.get(old)?.id() != self.result.get(new)?.id(),
            _ => true,
        })
    }

    // ---------------------------------------------------------------
    // Pass 5: changed blocks
    // ---------------------------------------------------------------

    fn changed_blocks(&mut self) -> EngineResult<()> {
        let mut changed = Vec::new();
        for (id, &key) in &self.todo {
            let Some(old_key) = self.old_twin(id) else {
                continue;
            };
            let old_signature = canonical_signature(self.old, old_key, false)?;
            let new_signature = canonical_signature(&self.result, key, false)?;
            if old_signature != new_signature {
                debug!(%id, old = %old_signature.short_hex(), new = %new_signature.short_hex(), "changed");
                changed.push((id.clone(), key, old_signature, new_signature));
            }
        }
        for (id, key, old_signature, new_signature) in changed {
            self.claim(&id, key);
            self.changes.push(BlockChange::Changed {
                id,
                old_signature,
                new_signature,
            });
        }
        self.log_todo("changed");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Cleanup
    // ---------------------------------------------------------------

    fn cleanup(&mut self) -> EngineResult<()> {
        for top in self.result.top_blocks() {
            let subtree = self.result.descendants(top);
            if subtree.iter().any(|k| self.used.contains(k)) {
                continue;
            }
            for k in &subtree {
                if let Some(block) = self.result.block(*k) {
                    self.todo.remove(block.id());
                }
            }
            debug!(block = %self.result.get(top)?.describe(), "unmodified top");
            self.result.dispose(top)?;
        }
        self.log_todo("cleaned");

        let unmodified: Vec<BlockKey> = self
            .todo
            .values()
            .copied()
            .filter(|key| self.result.contains(*key))
            .collect();
        for key in unmodified {
            self.result.set_colour(key, Colour::UNMODIFIED)?;
        }
        Ok(())
    }
}
