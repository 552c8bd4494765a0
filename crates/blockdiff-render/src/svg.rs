//! SVG rendering of block workspaces.
//!
//! Blocks are drawn as rounded rectangles labelled with their type and field
//! values. Reporters sit inline on their parent's row, statement inputs are
//! indented below it, and chains stack vertically. Disabled blocks (and
//! everything inside them) are drawn faded with a dashed outline.

use blockdiff_types::{Colour, InputKind};
use blockdiff_workspace::{Block, BlockKey, Workspace};
use blockdiff_xml::{XmlElement, XmlNode};
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::options::{BlockLayout, RenderOptions};
use crate::renderer::{RenderedImage, Renderer};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Renders workspaces to standalone SVG documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct SvgRenderer;

impl SvgRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for SvgRenderer {
    fn render(&self, ws: &Workspace, options: &RenderOptions) -> RenderResult<RenderedImage> {
        let tops = ws.top_blocks();
        if tops.is_empty() {
            return Err(RenderError::EmptyWorkspace);
        }
        let painter = Painter {
            ws,
            m: Metrics {
                em: f64::from(options.em_pixels.max(1)),
            },
        };

        let sizes = tops
            .iter()
            .map(|key| Ok((*key, painter.chain_size(*key)?)))
            .collect::<RenderResult<Vec<_>>>()?;
        let origins = arrange(ws, &sizes, options, &painter.m);

        let mut canvas = XmlElement::new("g");
        let (mut width, mut height) = (0.0_f64, 0.0_f64);
        for ((key, size), (x, y)) in sizes.iter().zip(origins) {
            painter.draw_chain(*key, x, y, false, &mut canvas)?;
            width = width.max(x + size.w);
            height = height.max(y + size.h);
        }
        width += painter.m.margin();
        height += painter.m.margin();

        let view_box = format!("0 0 {} {}", px(width), px(height));
        let mut svg = XmlElement::new("svg")
            .with_attr("xmlns", SVG_NS)
            .with_attr("class", "blockdiff");
        if options.use_view_width {
            svg.set_attr("width", "100%");
        } else {
            svg.set_attr("width", px(width));
            svg.set_attr("height", px(height));
        }
        svg.set_attr("viewBox", view_box);
        let svg = svg.with_child(canvas);

        debug!(blocks = ws.len(), width, height, layout = ?options.layout, "rendered workspace");
        Ok(RenderedImage {
            svg: svg.to_compact(),
            width,
            height,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Size {
    w: f64,
    h: f64,
}

struct Metrics {
    em: f64,
}

impl Metrics {
    fn pad(&self) -> f64 {
        self.em * 0.4
    }

    fn line(&self) -> f64 {
        self.em * 1.6
    }

    fn indent(&self) -> f64 {
        self.em
    }

    fn gap(&self) -> f64 {
        self.em
    }

    fn margin(&self) -> f64 {
        self.em * 0.5
    }

    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.em * 0.55
    }

    fn empty_statement(&self) -> Size {
        Size {
            w: self.em * 2.0,
            h: self.em * 0.8,
        }
    }
}

fn label(block: &Block) -> String {
    let mut out = block.block_type().to_string();
    for field in block.fields() {
        out.push(' ');
        out.push_str(&field.value);
    }
    out
}

fn px(v: f64) -> String {
    format!("{v:.1}")
}

struct Painter<'a> {
    ws: &'a Workspace,
    m: Metrics,
}

impl Painter<'_> {
    /// Width and height of the first row: the label plus inline reporters.
    fn row_size(&self, block: &Block) -> RenderResult<Size> {
        let m = &self.m;
        let mut w = m.pad() * 2.0 + m.text_width(&label(block));
        let mut h = m.line();
        for input in block.inputs() {
            if let (InputKind::Value, Some(child)) = (input.kind, input.child) {
                let size = self.chain_size(child)?;
                w += size.w + m.pad();
                h = h.max(size.h + m.pad() * 2.0);
            }
        }
        Ok(Size { w, h })
    }

    fn block_size(&self, key: BlockKey) -> RenderResult<Size> {
        let block = self.ws.get(key)?;
        let row = self.row_size(block)?;
        if block.is_collapsed() {
            return Ok(row);
        }
        let mut size = row;
        for input in block.inputs() {
            if input.kind != InputKind::Statement {
                continue;
            }
            let body = match input.child {
                Some(child) => self.chain_size(child)?,
                None => self.m.empty_statement(),
            };
            size.w = size.w.max(self.m.indent() + body.w);
            size.h += body.h + self.m.pad();
        }
        Ok(size)
    }

    fn chain_size(&self, head: BlockKey) -> RenderResult<Size> {
        let mut total = Size { w: 0.0, h: 0.0 };
        let mut current = Some(head);
        while let Some(key) = current {
            let size = self.block_size(key)?;
            total.w = total.w.max(size.w);
            total.h += size.h;
            current = self.ws.next_block(key);
        }
        Ok(total)
    }

    fn draw_chain(
        &self,
        head: BlockKey,
        x: f64,
        y: f64,
        disabled: bool,
        out: &mut XmlElement,
    ) -> RenderResult<Size> {
        let mut total = Size { w: 0.0, h: 0.0 };
        let mut current = Some(head);
        while let Some(key) = current {
            let size = self.draw_block(key, x, y + total.h, disabled, out)?;
            total.w = total.w.max(size.w);
            total.h += size.h;
            current = self.ws.next_block(key);
        }
        Ok(total)
    }

    fn draw_block(
        &self,
        key: BlockKey,
        x: f64,
        y: f64,
        inherited_disabled: bool,
        out: &mut XmlElement,
    ) -> RenderResult<Size> {
        let m = &self.m;
        let block = self.ws.get(key)?;
        let size = self.block_size(key)?;
        let row = self.row_size(block)?;
        let disabled = inherited_disabled || block.is_disabled();
        let colour = block
            .colour()
            .unwrap_or_else(|| Colour::for_type(block.block_type()));
        let text = label(block);

        let mut rect = XmlElement::new("rect")
            .with_attr("x", px(x))
            .with_attr("y", px(y))
            .with_attr("width", px(size.w))
            .with_attr("height", px(size.h))
            .with_attr("rx", px(m.em * 0.2))
            .with_attr("fill", colour.to_hex())
            .with_attr("stroke", "#404040");
        if disabled {
            rect.set_attr("fill-opacity", "0.35");
            rect.set_attr("stroke-dasharray", "4 2");
        }
        let mut group = XmlElement::new("g")
            .with_attr("class", if disabled { "block disabled" } else { "block" })
            .with_attr("data-id", block.id().as_str())
            .with_child(rect)
            .with_child(
                XmlElement::new("text")
                    .with_attr("x", px(x + m.pad()))
                    .with_attr("y", px(y + m.line() * 0.65))
                    .with_attr("font-size", px(m.em * 0.8))
                    .with_attr("font-family", "monospace")
                    .with_text(text.as_str()),
            );

        let mut cursor_x = x + m.pad() * 2.0 + m.text_width(&text);
        for input in block.inputs() {
            if let (InputKind::Value, Some(child)) = (input.kind, input.child) {
                let used = self.draw_chain(child, cursor_x, y + m.pad(), disabled, &mut group)?;
                cursor_x += used.w + m.pad();
            }
        }

        if !block.is_collapsed() {
            let mut cursor_y = y + row.h;
            for input in block.inputs() {
                if input.kind != InputKind::Statement {
                    continue;
                }
                let body = match input.child {
                    Some(child) => {
                        self.draw_chain(child, x + m.indent(), cursor_y, disabled, &mut group)?
                    }
                    None => m.empty_statement(),
                };
                cursor_y += body.h + m.pad();
            }
        }

        out.children.push(XmlNode::Element(group));
        Ok(size)
    }
}

/// Top-left corner of every top-level chain.
fn arrange(
    ws: &Workspace,
    sizes: &[(BlockKey, Size)],
    options: &RenderOptions,
    m: &Metrics,
) -> Vec<(f64, f64)> {
    let margin = m.margin();
    match options.layout {
        BlockLayout::Stack => {
            let mut y = margin;
            sizes
                .iter()
                .map(|(_, size)| {
                    let origin = (margin, y);
                    y += size.h + m.gap();
                    origin
                })
                .collect()
        }
        BlockLayout::Flow => {
            let area: f64 = sizes
                .iter()
                .map(|(_, s)| (s.w + m.gap()) * (s.h + m.gap()))
                .sum();
            let widest = sizes.iter().map(|(_, s)| s.w).fold(0.0, f64::max);
            let ratio = if options.aspect_ratio > 0.0 {
                options.aspect_ratio
            } else {
                1.0
            };
            let target = (area / ratio).sqrt().max(widest);

            let (mut x, mut y, mut row_h) = (margin, margin, 0.0_f64);
            sizes
                .iter()
                .map(|(_, size)| {
                    if x > margin && x + size.w > margin + target {
                        x = margin;
                        y += row_h + m.gap();
                        row_h = 0.0;
                    }
                    let origin = (x, y);
                    x += size.w + m.gap();
                    row_h = row_h.max(size.h);
                    origin
                })
                .collect()
        }
        BlockLayout::Original => {
            let raw: Vec<(f64, f64)> = sizes
                .iter()
                .map(|(key, _)| {
                    ws.block(*key)
                        .and_then(Block::position)
                        .unwrap_or((0.0, 0.0))
                })
                .collect();
            let min_x = raw.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
            let min_y = raw.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
            raw.into_iter()
                .map(|(x, y)| (x - min_x + margin, y - min_y + margin))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use blockdiff_workspace::{ShapeRegistry, Toolkit};

    use super::*;

    fn workspace(xml: &str) -> Workspace {
        Toolkit::new(ShapeRegistry::new()).load_xml(xml).unwrap()
    }

    #[test]
    fn every_block_gets_a_group() {
        let ws = workspace(
            r#"<xml><block type="say" id="a"><field name="MSG">hi &amp; bye</field>
                 <value name="N"><block type="num" id="n"><field name="V">3</field></block></value>
                 <next><block type="say" id="b"/></next></block></xml>"#,
        );
        let image = SvgRenderer::new().render(&ws, &RenderOptions::default()).unwrap();
        assert!(image.svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert_eq!(image.svg.matches("class=\"block\"").count(), 3);
        assert!(image.svg.contains("say hi &amp; bye"));
        assert!(image.svg.contains("width=\"100%\""));
        assert!(image.width > 0.0 && image.height > 0.0);
    }

    #[test]
    fn disabled_blocks_are_dashed_with_their_children() {
        let ws = workspace(
            r#"<xml><block type="say" id="a" disabled="true">
                 <value name="N"><block type="num" id="n"/></value></block></xml>"#,
        );
        let image = SvgRenderer::new().render(&ws, &RenderOptions::default()).unwrap();
        assert_eq!(image.svg.matches("class=\"block disabled\"").count(), 2);
        assert!(image.svg.contains("stroke-dasharray"));
    }

    #[test]
    fn absolute_size_when_not_using_view_width() {
        let ws = workspace(r#"<xml><block type="say"/></xml>"#);
        let options = RenderOptions {
            use_view_width: false,
            ..Default::default()
        };
        let image = SvgRenderer::new().render(&ws, &options).unwrap();
        assert!(image.svg.contains(&format!("width=\"{}\"", px(image.width))));
    }

    #[test]
    fn empty_workspace_is_an_error() {
        let ws = workspace("<xml/>");
        assert!(matches!(
            SvgRenderer::new().render(&ws, &RenderOptions::default()),
            Err(RenderError::EmptyWorkspace)
        ));
    }

    #[test]
    fn stack_layout_is_one_column() {
        let ws = workspace(r#"<xml><block type="a"/><block type="b"/><block type="c"/></xml>"#);
        let m = Metrics { em: 20.0 };
        let painter = Painter { ws: &ws, m: Metrics { em: 20.0 } };
        let sizes: Vec<_> = ws
            .top_blocks()
            .into_iter()
            .map(|k| (k, painter.chain_size(k).unwrap()))
            .collect();
        let options = RenderOptions {
            layout: BlockLayout::Stack,
            ..Default::default()
        };
        let origins = arrange(&ws, &sizes, &options, &m);
        assert!(origins.iter().all(|(x, _)| *x == m.margin()));
        assert!(origins.windows(2).all(|w| w[1].1 > w[0].1));
    }

    #[test]
    fn flow_layout_wraps_rows() {
        let xml = format!(
            "<xml>{}</xml>",
            (0..9)
                .map(|i| format!(r#"<block type="block_number_{i}"/>"#))
                .collect::<String>()
        );
        let ws = workspace(&xml);
        let m = Metrics { em: 20.0 };
        let painter = Painter { ws: &ws, m: Metrics { em: 20.0 } };
        let sizes: Vec<_> = ws
            .top_blocks()
            .into_iter()
            .map(|k| (k, painter.chain_size(k).unwrap()))
            .collect();
        let origins = arrange(&ws, &sizes, &RenderOptions::default(), &m);
        let rows = origins
            .iter()
            .filter(|(x, _)| *x == m.margin())
            .count();
        assert!(rows > 1 && rows < 9);
    }

    #[test]
    fn original_layout_uses_stored_positions() {
        let ws = workspace(
            r#"<xml><block type="a" x="100" y="50"/><block type="b" x="300" y="10"/></xml>"#,
        );
        let m = Metrics { em: 20.0 };
        let painter = Painter { ws: &ws, m: Metrics { em: 20.0 } };
        let sizes: Vec<_> = ws
            .top_blocks()
            .into_iter()
            .map(|k| (k, painter.chain_size(k).unwrap()))
            .collect();
        let options = RenderOptions {
            layout: BlockLayout::Original,
            ..Default::default()
        };
        let origins = arrange(&ws, &sizes, &options, &m);
        assert_eq!(origins[0], (m.margin(), 40.0 + m.margin()));
        assert_eq!(origins[1], (200.0 + m.margin(), m.margin()));
    }
}
