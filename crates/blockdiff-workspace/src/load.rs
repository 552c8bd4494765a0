//! Materialization: interchange text -> live workspace.

use blockdiff_types::{BlockId, InputKind};
use blockdiff_xml::XmlElement;
use tracing::debug;

use crate::block::{Attachment, Block, Field, Input};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::shape::{ShapeRegistry, Slot};
use crate::toolkit::Toolkit;
use crate::workspace::Workspace;

/// How many value or statement inputs deep blocks may be plugged into each
/// other. Following chains do not count.
pub const MAX_NESTING: usize = 128;

impl Toolkit {
    /// Deserialize interchange text into a new workspace.
    pub fn load_xml(&self, text: &str) -> WorkspaceResult<Workspace> {
        let root = blockdiff_xml::parse(text)?;
        self.load_element(&root)
    }

    /// Materialize an already parsed `<xml>` root.
    pub fn load_element(&self, root: &XmlElement) -> WorkspaceResult<Workspace> {
        if root.name != "xml" {
            return Err(WorkspaceError::NotAWorkspace(root.name.clone()));
        }
        let mut ws = self.new_workspace();
        for child in root.elements() {
            if child.name == "block" {
                load_tree(&mut ws, &self.shapes, child)?;
            } else {
                ws.extras.push(child.clone());
            }
        }
        debug!(blocks = ws.len(), top = ws.top_blocks().len(), "materialized workspace");
        Ok(ws)
    }
}

/// Materialize a top block with everything nested in it and its chain.
fn load_tree(ws: &mut Workspace, shapes: &ShapeRegistry, root: &XmlElement) -> WorkspaceResult<()> {
    let mut pending = vec![(root, Slot::Top, Attachment::Top, 0)];
    while let Some((el, slot, at, nesting)) = pending.pop() {
        let (block, nested, next) = read_block(ws, shapes, el, slot)?;
        let key = ws.insert(block);
        ws.link(key, at)?;
        if let Some(inner) = next {
            pending.push((inner, Slot::Next, Attachment::Next(key), nesting));
        }
        if !nested.is_empty() && nesting >= MAX_NESTING {
            return Err(WorkspaceError::TooDeep(MAX_NESTING));
        }
        for (index, inner, child_slot) in nested.into_iter().rev() {
            pending.push((inner, child_slot, Attachment::Input { parent: key, index }, nesting + 1));
        }
    }
    Ok(())
}

/// A block element's own block, the blocks plugged into its inputs (by
/// input index), and the block following it.
type ReadBlock<'a> = (Block, Vec<(usize, &'a XmlElement, Slot)>, Option<&'a XmlElement>);

fn read_block<'a>(
    ws: &Workspace,
    shapes: &ShapeRegistry,
    el: &'a XmlElement,
    slot: Slot,
) -> WorkspaceResult<ReadBlock<'a>> {
    let block_type = el.attr("type").ok_or(WorkspaceError::MissingType)?;
    let has_next = el.first_element("next").is_some();
    let (connections, declared) = shapes.resolve(block_type, slot, has_next);

    let mismatch = match slot {
        Slot::Value if !connections.output => Some("plugged into a value input without an output connection"),
        Slot::Statement | Slot::Next if !connections.previous => {
            Some("chained without a previous connection")
        }
        _ if has_next && !connections.next => Some("followed by a block without a next connection"),
        _ => None,
    };
    if let Some(reason) = mismatch {
        return Err(WorkspaceError::InvalidConnection {
            block_type: block_type.to_string(),
            reason: reason.to_string(),
        });
    }

    let wanted = el.attr("id").and_then(|id| BlockId::new(id).ok());
    let mut block = Block::new(ws.unique_id(wanted), block_type, connections);
    block.disabled = el.attr("disabled") == Some("true") || el.attr("enabled") == Some("false");
    block.collapsed = el.attr("collapsed") == Some("true");
    block.deletable = el.attr("deletable") != Some("false");
    block.editable = el.attr("editable") != Some("false");
    block.movable = el.attr("movable") != Some("false");
    if slot == Slot::Top {
        let coord = |name: &str| el.attr(name).and_then(|v| v.parse::<f64>().ok());
        block.position = coord("x").zip(coord("y"));
    }
    block.inputs = declared
        .iter()
        .map(|spec| Input {
            name: spec.name.clone(),
            kind: spec.kind,
            child: None,
            shadow: None,
        })
        .collect();

    let mut nested: Vec<(usize, &XmlElement, Slot)> = Vec::new();
    let mut next = None;
    for child in el.elements() {
        match child.name.as_str() {
            "field" => {
                let name = required_name(child, block_type)?;
                block.fields.push(Field {
                    name: name.to_string(),
                    value: child.text(),
                });
            }
            "value" | "statement" => {
                let (kind, child_slot) = if child.name == "value" {
                    (InputKind::Value, Slot::Value)
                } else {
                    (InputKind::Statement, Slot::Statement)
                };
                let name = required_name(child, block_type)?;
                let index = match block.input_index(name) {
                    Some(index) if block.inputs[index].kind == kind => index,
                    Some(_) => {
                        return Err(WorkspaceError::InvalidConnection {
                            block_type: block_type.to_string(),
                            reason: format!("input {name} is not a {kind} input"),
                        })
                    }
                    None => {
                        block.inputs.push(Input {
                            name: name.to_string(),
                            kind,
                            child: None,
                            shadow: None,
                        });
                        block.inputs.len() - 1
                    }
                };
                block.inputs[index].shadow = child.first_element("shadow").cloned();
                if let Some(inner) = child.first_element("block") {
                    nested.push((index, inner, child_slot));
                }
            }
            "next" => next = child.first_element("block"),
            _ => block.extras.push(child.clone()),
        }
    }

    Ok((block, nested, next))
}

fn required_name<'a>(el: &'a XmlElement, block_type: &str) -> WorkspaceResult<&'a str> {
    el.attr("name").ok_or_else(|| WorkspaceError::MissingName {
        element: el.name.clone(),
        block_type: block_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::BlockShape;

    fn toolkit() -> Toolkit {
        Toolkit::new(ShapeRegistry::new().with(
            "on_start",
            BlockShape::hat().with_input("HANDLER", InputKind::Statement),
        ))
    }

    #[test]
    fn loads_fields_inputs_and_flags() {
        let ws = toolkit()
            .load_xml(
                r#"<xml xmlns="https://developers.google.com/blockly/xml">
                     <variables><variable id="v1">item</variable></variables>
                     <block type="say" id="s" x="10" y="-4.5" disabled="true" movable="false">
                       <mutation count="1"/>
                       <field name="MSG">hello</field>
                       <value name="N"><shadow type="math_number"><field name="NUM">1</field></shadow></value>
                     </block>
                   </xml>"#,
            )
            .unwrap();
        assert_eq!(ws.len(), 1);
        let block = ws.get(ws.top_blocks()[0]).unwrap();
        assert_eq!(block.field("MSG"), Some("hello"));
        assert!(block.is_disabled());
        assert_eq!(block.position(), Some((10.0, -4.5)));
        assert_eq!(block.extras().len(), 1);
        assert!(block.inputs()[0].shadow.is_some());
        assert_eq!(ws.extras.len(), 1);
    }

    #[test]
    fn declared_inputs_exist_even_when_empty() {
        let ws = toolkit()
            .load_xml(r#"<xml><block type="on_start" id="h"/></xml>"#)
            .unwrap();
        let block = ws.get(ws.top_blocks()[0]).unwrap();
        assert_eq!(block.inputs().len(), 1);
        assert_eq!(block.inputs()[0].name, "HANDLER");
    }

    #[test]
    fn missing_ids_are_generated_and_duplicates_replaced() {
        let ws = toolkit()
            .load_xml(r#"<xml><block type="a"/><block type="b" id="d"/><block type="c" id="d"/></xml>"#)
            .unwrap();
        assert_eq!(ws.len(), 3);
        let tops = ws.top_blocks();
        assert_eq!(ws.get(tops[1]).unwrap().id().as_str(), "d");
        assert_ne!(ws.get(tops[2]).unwrap().id().as_str(), "d");
    }

    #[test]
    fn next_under_hat_is_rejected() {
        let err = toolkit()
            .load_xml(r#"<xml><block type="on_start"><next><block type="say"/></next></block></xml>"#)
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidConnection { .. }));
    }

    #[test]
    fn non_workspace_root_is_rejected() {
        let err = toolkit().load_xml(r#"<block type="a"/>"#).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotAWorkspace(name) if name == "block"));
    }

    #[test]
    fn block_without_type_is_rejected() {
        let err = toolkit().load_xml(r#"<xml><block id="x"/></xml>"#).unwrap_err();
        assert!(matches!(err, WorkspaceError::MissingType));
    }

    #[test]
    fn long_chains_load_in_order() {
        let levels = 10_000;
        let text = format!(
            "<xml>{}<block type=\"say\" id=\"last\"/>{}</xml>",
            "<block type=\"say\"><next>".repeat(levels),
            "</next></block>".repeat(levels),
        );
        let ws = toolkit().load_xml(&text).unwrap();
        assert_eq!(ws.len(), levels + 1);
        let head = ws.top_blocks()[0];
        assert_eq!(ws.last_in_chain(head), ws.block_by_id(&BlockId::new("last").unwrap()).unwrap());
        assert_eq!(ws.all_blocks()[0], head);
    }

    #[test]
    fn nesting_beyond_the_limit_is_rejected() {
        let nested = |levels: usize| {
            format!(
                "<xml>{}<block type=\"say\"/>{}</xml>",
                "<block type=\"loop\"><statement name=\"DO\">".repeat(levels),
                "</statement></block>".repeat(levels),
            )
        };
        let ws = toolkit().load_xml(&nested(MAX_NESTING)).unwrap();
        assert_eq!(ws.len(), MAX_NESTING + 1);
        let err = toolkit().load_xml(&nested(MAX_NESTING + 1)).unwrap_err();
        assert!(matches!(err, WorkspaceError::TooDeep(MAX_NESTING)));
    }

    #[test]
    fn malformed_text_is_an_xml_error() {
        let err = toolkit().load_xml("<xml><block").unwrap_err();
        assert!(matches!(err, WorkspaceError::Xml(_)));
    }
}
