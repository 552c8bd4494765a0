//! Error types for the diff engine.

use blockdiff_render::RenderError;
use blockdiff_workspace::WorkspaceError;
use blockdiff_xml::XmlError;

/// Errors that can occur inside the diff pipeline.
///
/// None of these escape [`crate::DiffEngine`]: the engine folds them into a
/// [`crate::DiffResult`] with an apology message.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A workspace query or mutation failed.
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// The result workspace could not be rendered.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Interchange text could not be read.
    #[error("interchange error: {0}")]
    Xml(#[from] XmlError),

    /// The pipeline panicked.
    #[error("diff panicked: {0}")]
    Panicked(String),
}

/// Convenience alias for fallible engine steps.
pub type EngineResult<T> = Result<T, DiffError>;
