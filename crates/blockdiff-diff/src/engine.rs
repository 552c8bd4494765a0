//! Entry points of the diff.
//!
//! [`DiffEngine`] materializes both snapshots with its [`Toolkit`], keeps the
//! toolkit's event bus quiet while the passes mutate workspaces, and turns
//! every failure (including panics) into a [`DiffResult`]. Nothing escapes
//! as an error.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use blockdiff_render::{Renderer, SvgRenderer};
use blockdiff_workspace::{Toolkit, Workspace};
use tracing::{error, warn};

use crate::error::DiffError;
use crate::options::DiffOptions;
use crate::pipeline::reconcile;
use crate::result::DiffResult;

/// Diffs workspaces built by one toolkit and renders the result.
pub struct DiffEngine {
    toolkit: Toolkit,
    renderer: Box<dyn Renderer>,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(Toolkit::default())
    }
}

impl DiffEngine {
    /// An engine rendering with [`SvgRenderer`].
    pub fn new(toolkit: Toolkit) -> Self {
        Self {
            toolkit,
            renderer: Box::new(SvgRenderer::new()),
        }
    }

    /// Replace the renderer used for the final image.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    /// Materialize two interchange snapshots and diff them.
    ///
    /// A snapshot that cannot be materialized is reported through the
    /// result's message, not as an error.
    pub fn diff_xml(&self, old: &str, new: &str, options: &DiffOptions) -> DiffResult {
        let _quiet = self.toolkit.events().quiet();
        let old = match self.toolkit.load_xml(old) {
            Ok(ws) => ws,
            Err(err) => {
                warn!(error = %err, "old snapshot could not be materialized");
                return DiffResult::old_corrupted();
            }
        };
        let new = match self.toolkit.load_xml(new) {
            Ok(ws) => ws,
            Err(err) => {
                warn!(error = %err, "new snapshot could not be materialized");
                return DiffResult::new_corrupted();
            }
        };
        self.diff_workspaces(old, new, options)
    }

    /// Diff two live workspaces. Both are consumed: the fast path disposes
    /// blocks from them.
    pub fn diff_workspaces(&self, old: Workspace, new: Workspace, options: &DiffOptions) -> DiffResult {
        let _quiet = self.toolkit.events().quiet();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            reconcile(&self.toolkit, self.renderer.as_ref(), old, new, options)
        }));
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                error!(error = %err, "blocks diff failed");
                DiffResult::failed(err)
            }
            Err(payload) => {
                let err = DiffError::Panicked(panic_message(payload.as_ref()));
                error!(error = %err, "blocks diff panicked");
                DiffResult::failed(err)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Diff two snapshots with an unconfigured toolkit and the SVG renderer.
pub fn diff_xml(old: &str, new: &str, options: &DiffOptions) -> DiffResult {
    DiffEngine::default().diff_xml(old, new, options)
}
