//! Reading interchange text into an owned tree.

use crate::element::{XmlElement, XmlNode};
use crate::error::{XmlError, XmlResult};

/// Parse interchange text and return its root element.
///
/// Namespaces are dropped (only local names are kept), comments and
/// processing instructions are skipped, and whitespace-only text is removed
/// from elements that also contain child elements.
pub fn parse(text: &str) -> XmlResult<XmlElement> {
    if text.trim().is_empty() {
        return Err(XmlError::Empty);
    }
    let doc = roxmltree::Document::parse(text)?;
    Ok(convert(doc.root_element()))
}

/// An element being converted, with the source children not yet visited.
struct Frame<'a, 'input> {
    element: XmlElement,
    children: roxmltree::Children<'a, 'input>,
    has_elements: bool,
}

impl<'a, 'input> Frame<'a, 'input> {
    fn open(node: roxmltree::Node<'a, 'input>) -> Self {
        let mut element = XmlElement::new(node.tag_name().name());
        element.attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect();
        Self {
            element,
            children: node.children(),
            has_elements: node.children().any(|c| c.is_element()),
        }
    }

    fn push_text(&mut self, node: roxmltree::Node<'_, '_>) {
        if !node.is_text() {
            return;
        }
        let text = node.text().unwrap_or_default();
        if self.has_elements && text.trim().is_empty() {
            return;
        }
        self.element.children.push(XmlNode::Text(text.to_string()));
    }
}

fn convert(root: roxmltree::Node<'_, '_>) -> XmlElement {
    let mut converted = XmlElement::default();
    let mut stack = vec![Frame::open(root)];
    while let Some(frame) = stack.last_mut() {
        match frame.children.next() {
            Some(child) if child.is_element() => stack.push(Frame::open(child)),
            Some(child) => frame.push_text(child),
            None => {
                if let Some(done) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.element.children.push(XmlNode::Element(done.element)),
                        None => converted = done.element,
                    }
                }
            }
        }
    }
    converted
}
