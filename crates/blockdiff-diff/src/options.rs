use blockdiff_render::RenderOptions;
use serde::{Deserialize, Serialize};

/// Configuration for a single diff.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Skip the whole-chain ghosts of deleted top blocks. The blocks stay
    /// unclaimed, so the deleted-statement pass still ghosts and stitches
    /// them one block at a time.
    pub hide_deleted_top_blocks: bool,
    /// Layout for the final render; `None` uses [`RenderOptions::default`].
    pub render_options: Option<RenderOptions>,
}

impl DiffOptions {
    /// The layout the final render uses.
    pub fn render_options(&self) -> RenderOptions {
        self.render_options.clone().unwrap_or_default()
    }
}
