use serde::{Deserialize, Serialize};

/// How top blocks are arranged relative to each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockLayout {
    /// Rows of blocks wrapped to approach the requested aspect ratio.
    #[default]
    Flow,
    /// A single column.
    Stack,
    /// The positions stored on the blocks.
    Original,
}

/// Layout configuration handed to a [`crate::Renderer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Pixels per em; every metric of the drawing scales with it.
    pub em_pixels: u32,
    pub layout: BlockLayout,
    /// Desired height / width of the flow arrangement.
    pub aspect_ratio: f64,
    /// Size the image to the width of its container instead of absolute pixels.
    pub use_view_width: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            em_pixels: 20,
            layout: BlockLayout::Flow,
            aspect_ratio: 0.5,
            use_view_width: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = RenderOptions::default();
        assert_eq!(o.em_pixels, 20);
        assert_eq!(o.layout, BlockLayout::Flow);
        assert!((o.aspect_ratio - 0.5).abs() < f64::EPSILON);
        assert!(o.use_view_width);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let o: RenderOptions = toml::from_str("layout = \"stack\"\nem_pixels = 12").unwrap();
        assert_eq!(o.layout, BlockLayout::Stack);
        assert_eq!(o.em_pixels, 12);
        assert!(o.use_view_width);
    }
}
