//! Error types for rendering.

use blockdiff_workspace::WorkspaceError;

/// Errors that can occur while rendering a workspace.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// There is nothing to draw.
    #[error("workspace has no blocks to render")]
    EmptyWorkspace,

    /// The workspace could not be traversed.
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

/// Convenience alias for render results.
pub type RenderResult<T> = Result<T, RenderError>;
