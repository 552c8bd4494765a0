//! Rendering capability for block workspaces.
//!
//! The diff engine only needs "turn this workspace into a displayable
//! image". [`Renderer`] is that seam; [`SvgRenderer`] is the implementation
//! shipped with the CLI.

pub mod error;
pub mod options;
pub mod renderer;
pub mod svg;

pub use error::{RenderError, RenderResult};
pub use options::{BlockLayout, RenderOptions};
pub use renderer::{RenderedImage, Renderer};
pub use svg::SvgRenderer;
