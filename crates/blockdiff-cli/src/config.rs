use std::fs;
use std::path::Path;

use anyhow::Context;
use blockdiff_diff::DiffOptions;
use blockdiff_render::RenderOptions;
use blockdiff_workspace::{ShapeRegistry, Toolkit};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "blockdiff.toml";

/// Contents of `blockdiff.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockDiffConfig {
    pub diff: DiffSection,
    pub render: RenderOptions,
    /// Connection shapes per block type.
    pub shapes: ShapeRegistry,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSection {
    pub hide_deleted_top_blocks: bool,
}

impl BlockDiffConfig {
    /// Load `path`, or `./blockdiff.toml` when no path is given. A missing
    /// default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            hide_deleted_top_blocks: self.diff.hide_deleted_top_blocks,
            render_options: Some(self.render.clone()),
        }
    }

    pub fn toolkit(&self) -> Toolkit {
        Toolkit::new(self.shapes.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use blockdiff_render::BlockLayout;
    use blockdiff_types::InputKind;

    use super::*;

    #[test]
    fn default_config() {
        let c = BlockDiffConfig::default();
        assert!(!c.diff.hide_deleted_top_blocks);
        assert_eq!(c.render, RenderOptions::default());
        assert!(c.shapes.is_empty());
        assert_eq!(c.diff_options().render_options(), RenderOptions::default());
    }

    #[test]
    fn loads_all_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[diff]
hide_deleted_top_blocks = true

[render]
layout = "stack"
em_pixels = 16

[shapes.pxt-on-start]
inputs = [{{ name = "HANDLER", kind = "statement" }}]

[shapes.math_number]
output = true
"#
        )
        .unwrap();

        let c = BlockDiffConfig::load(Some(file.path())).unwrap();
        assert!(c.diff_options().hide_deleted_top_blocks);
        assert_eq!(c.render.layout, BlockLayout::Stack);
        assert_eq!(c.render.em_pixels, 16);
        assert!(c.render.use_view_width);

        let start = c.shapes.get("pxt-on-start").unwrap();
        assert!(!start.previous && !start.next);
        assert_eq!(start.inputs[0].kind, InputKind::Statement);
        assert!(c.shapes.get("math_number").unwrap().output);
        assert_eq!(c.toolkit().shapes().len(), 2);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BlockDiffConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[render]\nem_pixels = \"big\"\n").unwrap();
        let err = BlockDiffConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }
}
