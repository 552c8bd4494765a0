use blockdiff_workspace::Workspace;

use crate::error::RenderResult;
use crate::options::RenderOptions;

/// A rendered workspace.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedImage {
    /// SVG document text.
    pub svg: String,
    /// Drawing width in pixels.
    pub width: f64,
    /// Drawing height in pixels.
    pub height: f64,
}

/// Turns a workspace into a displayable image.
pub trait Renderer {
    /// Render every block of `ws` using `options`.
    fn render(&self, ws: &Workspace, options: &RenderOptions) -> RenderResult<RenderedImage>;
}
