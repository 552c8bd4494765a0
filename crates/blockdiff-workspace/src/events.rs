//! Mutation notifications.
//!
//! Every structural or visual change to a workspace is reported to the
//! toolkit's [`EventBus`]. Bulk operations that perform many low-level
//! mutations hold a [`QuietGuard`] so that none of them is reported; the
//! guard re-enables reporting when dropped, including during unwinding.
//!
//! The bus keeps at most [`EVENT_LOG_CAPACITY`] undrained events; older ones
//! are dropped and counted.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use blockdiff_types::BlockId;

/// A change made to a workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkspaceEvent {
    Create { id: BlockId },
    Delete { id: BlockId },
    Move { id: BlockId },
    Change { id: BlockId, element: &'static str },
}

/// Undrained events kept by an [`EventBus`].
pub const EVENT_LOG_CAPACITY: usize = 1024;

/// Collects workspace events while enabled.
#[derive(Debug, Default)]
pub struct EventBus {
    quiet_depth: Cell<u32>,
    log: RefCell<VecDeque<WorkspaceEvent>>,
    dropped: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` unless some [`QuietGuard`] is alive.
    pub fn is_enabled(&self) -> bool {
        self.quiet_depth.get() == 0
    }

    /// Suppress events until the returned guard is dropped. Guards nest.
    pub fn quiet(&self) -> QuietGuard<'_> {
        self.quiet_depth.set(self.quiet_depth.get() + 1);
        QuietGuard { bus: self }
    }

    /// Record an event unless the bus is quiet. A full log drops its
    /// oldest event.
    pub fn fire(&self, event: WorkspaceEvent) {
        if !self.is_enabled() {
            return;
        }
        let mut log = self.log.borrow_mut();
        if log.len() == EVENT_LOG_CAPACITY {
            log.pop_front();
            self.dropped.set(self.dropped.get() + 1);
        }
        log.push_back(event);
    }

    /// Drain the recorded events, oldest first.
    pub fn take_events(&self) -> Vec<WorkspaceEvent> {
        self.log.borrow_mut().drain(..).collect()
    }

    /// Events discarded because the log was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.get()
    }
}

/// Scoped suppression of workspace events.
#[must_use = "events are re-enabled as soon as the guard is dropped"]
#[derive(Debug)]
pub struct QuietGuard<'a> {
    bus: &'a EventBus,
}

impl Drop for QuietGuard<'_> {
    fn drop(&mut self) {
        self.bus.quiet_depth.set(self.bus.quiet_depth.get() - 1);
    }
}
