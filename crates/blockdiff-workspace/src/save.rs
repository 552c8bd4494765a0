//! Serialization: live workspace -> interchange tree.

use blockdiff_xml::{XmlElement, XmlNode};

use crate::block::BlockKey;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::workspace::Workspace;

const XMLNS: &str = "https://developers.google.com/blockly/xml";

/// What [`Workspace::block_to_xml`] includes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveOptions {
    /// Emit `id` attributes.
    pub ids: bool,
    /// Emit the following chain under `<next>`.
    pub next: bool,
    /// Emit `<statement>` inputs.
    pub statements: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            ids: true,
            next: true,
            statements: true,
        }
    }
}

/// A block element waiting for the elements of its child blocks.
struct Pending {
    el: XmlElement,
    /// Index of the wrapping `<value>`, `<statement>` or `<next>` element in
    /// the parent's children.
    slot: usize,
    /// Child blocks still to serialize, last first.
    children: Vec<(usize, BlockKey, SaveOptions)>,
}

impl Workspace {
    /// Serialize one block and everything nested in it.
    pub fn block_to_xml(&self, key: BlockKey, options: SaveOptions) -> WorkspaceResult<XmlElement> {
        let mut finished = None;
        let mut stack = vec![self.block_shell(key, options, 0)?];
        while let Some(top) = stack.last_mut() {
            if let Some((slot, child, child_options)) = top.children.pop() {
                let shell = self.block_shell(child, child_options, slot)?;
                stack.push(shell);
                continue;
            }
            let Some(done) = stack.pop() else {
                break;
            };
            match stack.last_mut() {
                Some(parent) => {
                    if let Some(XmlNode::Element(wrapper)) = parent.el.children.get_mut(done.slot) {
                        wrapper.children.push(XmlNode::Element(done.el));
                    }
                }
                None => finished = Some(done.el),
            }
        }
        finished.ok_or(WorkspaceError::UnknownBlock(key))
    }

    /// The element of one block with empty wrappers where its child blocks go.
    fn block_shell(&self, key: BlockKey, options: SaveOptions, slot: usize) -> WorkspaceResult<Pending> {
        let block = self.get(key)?;
        let mut el = XmlElement::new("block").with_attr("type", block.block_type());
        if options.ids {
            el.set_attr("id", block.id().as_str());
        }
        if block.disabled {
            el.set_attr("disabled", "true");
        }
        if block.collapsed {
            el.set_attr("collapsed", "true");
        }
        if !block.deletable {
            el.set_attr("deletable", "false");
        }
        if !block.movable {
            el.set_attr("movable", "false");
        }
        if !block.editable {
            el.set_attr("editable", "false");
        }
        if let (true, Some((x, y))) = (block.is_top(), block.position) {
            el.set_attr("x", x.to_string());
            el.set_attr("y", y.to_string());
        }

        for extra in &block.extras {
            el = el.with_child(extra.clone());
        }
        for field in &block.fields {
            el = el.with_child(
                XmlElement::new("field")
                    .with_attr("name", field.name.as_str())
                    .with_text(field.value.as_str()),
            );
        }

        let mut children = Vec::new();
        for input in &block.inputs {
            let Some(tag) = input.kind.tag() else {
                continue;
            };
            if input.kind.is_statement() && !options.statements {
                continue;
            }
            if input.child.is_none() && input.shadow.is_none() {
                continue;
            }
            let mut input_el = XmlElement::new(tag).with_attr("name", input.name.as_str());
            if let Some(shadow) = &input.shadow {
                input_el = input_el.with_child(shadow.clone());
            }
            if let Some(child) = input.child {
                children.push((el.children.len(), child, SaveOptions { next: true, ..options }));
            }
            el = el.with_child(input_el);
        }
        if let (true, Some(next)) = (options.next, block.next) {
            children.push((el.children.len(), next, options));
            el = el.with_child(XmlElement::new("next"));
        }
        children.reverse();
        Ok(Pending { el, slot, children })
    }

    /// The whole workspace as an `<xml>` tree.
    pub fn to_xml_element(&self) -> WorkspaceResult<XmlElement> {
        let mut root = XmlElement::new("xml").with_attr("xmlns", XMLNS);
        for extra in &self.extras {
            root = root.with_child(extra.clone());
        }
        for key in self.top_blocks() {
            root = root.with_child(self.block_to_xml(key, SaveOptions::default())?);
        }
        Ok(root)
    }

    /// The whole workspace as interchange text.
    pub fn to_xml(&self) -> WorkspaceResult<String> {
        Ok(self.to_xml_element()?.to_compact())
    }
}
