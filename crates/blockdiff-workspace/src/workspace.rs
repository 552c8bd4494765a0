//! The live block forest and its connection surgery.
//!
//! # Invariants
//!
//! - `a.next == Some(b)` iff `b.attachment == Attachment::Next(a)`.
//! - `parent.inputs[i].child == Some(b)` iff
//!   `b.attachment == Attachment::Input { parent, index: i }`.
//! - `top` lists exactly the live blocks whose attachment is `Top`.
//! - Block ids are unique within the workspace.

use std::collections::HashMap;
use std::rc::Rc;

use blockdiff_types::{BlockId, Colour, InputKind};
use blockdiff_xml::XmlElement;
use tracing::debug;

use crate::block::{Attachment, Block, BlockKey};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::events::{EventBus, WorkspaceEvent};

/// How much of a block [`Workspace::clone_subtree`] copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloneDepth {
    /// The block, everything nested in its inputs, and its following chain.
    Chain,
    /// The block and the reporters plugged into its value inputs only.
    Block,
}

/// An ownership container for a forest of blocks.
#[derive(Debug)]
pub struct Workspace {
    slots: Vec<Option<Block>>,
    by_id: HashMap<BlockId, BlockKey>,
    top: Vec<BlockKey>,
    /// Non-block root elements (`variables`, workspace comments).
    pub(crate) extras: Vec<XmlElement>,
    events: Rc<EventBus>,
}

impl Workspace {
    pub(crate) fn with_events(events: Rc<EventBus>) -> Self {
        Self {
            slots: Vec::new(),
            by_id: HashMap::new(),
            top: Vec::new(),
            extras: Vec::new(),
            events,
        }
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, key: BlockKey) -> bool {
        self.block(key).is_some()
    }

    pub fn block(&self, key: BlockKey) -> Option<&Block> {
        self.slots.get(key.0 as usize).and_then(Option::as_ref)
    }

    /// Like [`Self::block`] but an error for dead keys.
    pub fn get(&self, key: BlockKey) -> WorkspaceResult<&Block> {
        self.block(key).ok_or(WorkspaceError::UnknownBlock(key))
    }

    fn get_mut(&mut self, key: BlockKey) -> WorkspaceResult<&mut Block> {
        self.slots
            .get_mut(key.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(WorkspaceError::UnknownBlock(key))
    }

    pub fn block_by_id(&self, id: &BlockId) -> Option<BlockKey> {
        self.by_id.get(id).copied()
    }

    /// Root blocks in creation order.
    pub fn top_blocks(&self) -> Vec<BlockKey> {
        self.top.clone()
    }

    /// Every live block, top blocks first followed by their descendants.
    pub fn all_blocks(&self) -> Vec<BlockKey> {
        self.top.iter().flat_map(|k| self.descendants(*k)).collect()
    }

    /// The block itself, everything nested in its inputs, and its following
    /// chain, in depth-first order.
    pub fn descendants(&self, key: BlockKey) -> Vec<BlockKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(block) = self.block(current) else {
                continue;
            };
            out.push(current);
            if let Some(next) = block.next {
                stack.push(next);
            }
            for input in block.inputs.iter().rev() {
                if let Some(child) = input.child {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// The block on the other side of `key`'s previous connection: its
    /// predecessor in the chain, or its parent when it heads a statement
    /// input. Reporters never have a previous block.
    pub fn previous_block(&self, key: BlockKey) -> Option<BlockKey> {
        match self.block(key)?.attachment {
            Attachment::Top => None,
            Attachment::Next(prev) => Some(prev),
            Attachment::Input { parent, index } => self
                .block(parent)
                .and_then(|p| p.inputs.get(index))
                .filter(|input| input.kind.is_statement())
                .map(|_| parent),
        }
    }

    pub fn next_block(&self, key: BlockKey) -> Option<BlockKey> {
        self.block(key)?.next
    }

    /// Last block of the chain starting at `key`.
    pub fn last_in_chain(&self, key: BlockKey) -> BlockKey {
        let mut current = key;
        while let Some(next) = self.next_block(current) {
            current = next;
        }
        current
    }

    /// `true` if the block has an output connection that is plugged into a
    /// value input.
    pub fn is_plugged_reporter(&self, key: BlockKey) -> bool {
        self.block(key).is_some_and(|b| {
            b.connections.output && matches!(b.attachment, Attachment::Input { .. })
        })
    }

    /// Index of the last statement input of a block, if any.
    pub fn last_statement_input(&self, key: BlockKey) -> Option<usize> {
        self.block(key)?
            .inputs
            .iter()
            .rposition(|input| input.kind == InputKind::Statement)
    }

    // ---------------------------------------------------------------
    // Visual state
    // ---------------------------------------------------------------

    pub fn set_disabled(&mut self, key: BlockKey, disabled: bool) -> WorkspaceResult<()> {
        let block = self.get_mut(key)?;
        block.disabled = disabled;
        let id = block.id.clone();
        self.events.fire(WorkspaceEvent::Change {
            id,
            element: "disabled",
        });
        Ok(())
    }

    pub fn set_colour(&mut self, key: BlockKey, colour: Colour) -> WorkspaceResult<()> {
        let block = self.get_mut(key)?;
        block.colour = Some(colour);
        let id = block.id.clone();
        self.events.fire(WorkspaceEvent::Change {
            id,
            element: "colour",
        });
        Ok(())
    }

    // ---------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------

    /// Detach a block (with its following chain) from wherever it hangs and
    /// make it a top block. The gap it leaves is not healed.
    pub fn unplug(&mut self, key: BlockKey) -> WorkspaceResult<()> {
        let attachment = self.get(key)?.attachment;
        match attachment {
            Attachment::Top => return Ok(()),
            Attachment::Next(prev) => {
                self.get_mut(prev)?.next = None;
            }
            Attachment::Input { parent, index } => {
                if let Some(input) = self.get_mut(parent)?.inputs.get_mut(index) {
                    input.child = None;
                }
            }
        }
        let block = self.get_mut(key)?;
        block.attachment = Attachment::Top;
        let id = block.id.clone();
        self.top.push(key);
        self.events.fire(WorkspaceEvent::Move { id });
        Ok(())
    }

    /// Remove a block together with everything nested in it and its
    /// following chain.
    pub fn dispose(&mut self, key: BlockKey) -> WorkspaceResult<()> {
        self.unplug(key)?;
        self.top.retain(|k| *k != key);
        for k in self.descendants(key) {
            if let Some(block) = self.slots[k.0 as usize].take() {
                self.by_id.remove(&block.id);
                self.events.fire(WorkspaceEvent::Delete { id: block.id });
            }
        }
        debug!(block = %key, remaining = self.len(), "disposed block");
        Ok(())
    }

    /// Insert `block` (and its chain) right after `prev`. Whatever followed
    /// `prev` is re-attached after the last block of the inserted chain.
    pub fn connect_after(&mut self, prev: BlockKey, block: BlockKey) -> WorkspaceResult<()> {
        let prev_block = self.get(prev)?;
        if !prev_block.connections.next {
            return Err(invalid(prev_block, "no next connection"));
        }
        if prev_block.next == Some(block) {
            return Ok(());
        }
        self.require_previous(block)?;
        self.check_cycle(prev, block)?;

        self.unplug(block)?;
        let orphan = self.get_mut(prev)?.next.take();
        if let Some(orphan) = orphan {
            self.get_mut(orphan)?.attachment = Attachment::Top;
        }
        self.link_next(prev, block)?;
        if let Some(orphan) = orphan {
            self.reattach(block, orphan)?;
        }
        self.fire_move(block)
    }

    /// Insert `block` (and its chain) at the head of statement input `index`
    /// of `parent`. The previous contents of the input follow the inserted
    /// chain.
    pub fn connect_statement(
        &mut self,
        parent: BlockKey,
        index: usize,
        block: BlockKey,
    ) -> WorkspaceResult<()> {
        let parent_block = self.get(parent)?;
        let input = parent_block
            .inputs
            .get(index)
            .ok_or_else(|| invalid(parent_block, &format!("no input #{index}")))?;
        if !input.kind.is_statement() {
            return Err(invalid(
                parent_block,
                &format!("input {} is not a statement input", input.name),
            ));
        }
        if input.child == Some(block) {
            return Ok(());
        }
        self.require_previous(block)?;
        self.check_cycle(parent, block)?;

        self.unplug(block)?;
        let orphan = self.get_mut(parent)?.inputs[index].child.take();
        if let Some(orphan) = orphan {
            self.get_mut(orphan)?.attachment = Attachment::Top;
        }
        self.link_input(parent, index, block)?;
        if let Some(orphan) = orphan {
            self.reattach(block, orphan)?;
        }
        self.fire_move(block)
    }

    /// Attach `next` (and its chain) under `block`, taking it out of its
    /// current position. Whatever followed `block` is re-attached after the
    /// last block of `next`'s chain.
    pub fn connect_before(&mut self, block: BlockKey, next: BlockKey) -> WorkspaceResult<()> {
        let head = self.get(block)?;
        if !head.connections.next {
            return Err(invalid(head, "no next connection"));
        }
        if head.next == Some(next) {
            return Ok(());
        }
        self.require_previous(next)?;
        self.check_cycle(block, next)?;

        self.unplug(next)?;
        let orphan = self.get_mut(block)?.next.take();
        if let Some(orphan) = orphan {
            self.get_mut(orphan)?.attachment = Attachment::Top;
        }
        self.link_next(block, next)?;
        if let Some(orphan) = orphan {
            self.reattach(next, orphan)?;
        }
        self.fire_move(next)
    }

    /// Copy a block from another workspace into this one as a new top
    /// block and return its key.
    ///
    /// Ids are kept unless they are already taken here, in which case fresh
    /// ones are generated. The clone's previous connection is never
    /// connected; callers reconnect it explicitly.
    pub fn clone_subtree(
        &mut self,
        source: &Workspace,
        key: BlockKey,
        depth: CloneDepth,
    ) -> WorkspaceResult<BlockKey> {
        let mut root = None;
        let mut pending = vec![(key, depth, Attachment::Top)];
        while let Some((src, depth, at)) = pending.pop() {
            let original = source.get(src)?;
            let mut copy = original.clone();
            copy.id = self.unique_id(Some(original.id.clone()));
            copy.next = None;
            copy.attachment = Attachment::Top;
            for input in &mut copy.inputs {
                input.child = None;
            }
            let copy_key = self.insert(copy);
            self.link(copy_key, at)?;
            if root.is_none() {
                root = Some(copy_key);
            }

            if depth == CloneDepth::Chain {
                if let Some(next) = original.next {
                    pending.push((next, CloneDepth::Chain, Attachment::Next(copy_key)));
                }
            }
            for (index, input) in original.inputs.iter().enumerate().rev() {
                let Some(child) = input.child else {
                    continue;
                };
                if depth == CloneDepth::Block && input.kind != InputKind::Value {
                    continue;
                }
                let at = Attachment::Input {
                    parent: copy_key,
                    index,
                };
                pending.push((child, CloneDepth::Chain, at));
            }
        }
        root.ok_or(WorkspaceError::UnknownBlock(key))
    }

    // ---------------------------------------------------------------
    // Internals shared with the materializer
    // ---------------------------------------------------------------

    /// `wanted` if it is free, otherwise a freshly generated id.
    pub(crate) fn unique_id(&self, wanted: Option<BlockId>) -> BlockId {
        match wanted {
            Some(id) if !self.by_id.contains_key(&id) => id,
            _ => loop {
                let id = BlockId::generate();
                if !self.by_id.contains_key(&id) {
                    break id;
                }
            },
        }
    }

    /// Add a detached block. The caller guarantees its id is unique.
    pub(crate) fn insert(&mut self, block: Block) -> BlockKey {
        let key = BlockKey(self.slots.len() as u32);
        self.by_id.insert(block.id.clone(), key);
        if block.attachment == Attachment::Top {
            self.top.push(key);
        }
        self.events.fire(WorkspaceEvent::Create {
            id: block.id.clone(),
        });
        self.slots.push(Some(block));
        key
    }

    /// Hang a detached block at `at`. `Attachment::Top` leaves it where it is.
    pub(crate) fn link(&mut self, child: BlockKey, at: Attachment) -> WorkspaceResult<()> {
        match at {
            Attachment::Top => Ok(()),
            Attachment::Next(prev) => self.link_next(prev, child),
            Attachment::Input { parent, index } => self.link_input(parent, index, child),
        }
    }

    pub(crate) fn link_next(&mut self, prev: BlockKey, child: BlockKey) -> WorkspaceResult<()> {
        self.get_mut(prev)?.next = Some(child);
        self.get_mut(child)?.attachment = Attachment::Next(prev);
        self.top.retain(|k| *k != child);
        Ok(())
    }

    pub(crate) fn link_input(
        &mut self,
        parent: BlockKey,
        index: usize,
        child: BlockKey,
    ) -> WorkspaceResult<()> {
        let parent_block = self.get_mut(parent)?;
        if index >= parent_block.inputs.len() {
            return Err(invalid(parent_block, &format!("no input #{index}")));
        }
        parent_block.inputs[index].child = Some(child);
        self.get_mut(child)?.attachment = Attachment::Input { parent, index };
        self.top.retain(|k| *k != child);
        Ok(())
    }

    /// Hang a detached `orphan` chain after the last block of `head`'s
    /// chain, or leave it as a top block when that block cannot be followed.
    fn reattach(&mut self, head: BlockKey, orphan: BlockKey) -> WorkspaceResult<()> {
        let last = self.last_in_chain(head);
        if last != orphan && self.get(last)?.connections.next {
            self.link_next(last, orphan)
        } else {
            self.top.push(orphan);
            Ok(())
        }
    }

    fn require_previous(&self, key: BlockKey) -> WorkspaceResult<()> {
        let block = self.get(key)?;
        if block.connections.previous {
            Ok(())
        } else {
            Err(invalid(block, "no previous connection"))
        }
    }

    /// Refuse to hang `child` below `parent` when `parent` sits inside
    /// `child`'s subtree.
    fn check_cycle(&self, parent: BlockKey, child: BlockKey) -> WorkspaceResult<()> {
        if self.descendants(child).contains(&parent) {
            return Err(WorkspaceError::WouldCycle { parent, child });
        }
        Ok(())
    }

    fn fire_move(&self, key: BlockKey) -> WorkspaceResult<()> {
        let id = self.get(key)?.id.clone();
        self.events.fire(WorkspaceEvent::Move { id });
        Ok(())
    }
}

fn invalid(block: &Block, reason: &str) -> WorkspaceError {
    WorkspaceError::InvalidConnection {
        block_type: block.block_type.clone(),
        reason: reason.to_string(),
    }
}
