//! Owned element tree.
//!
//! Block chains nest one `<next>` level per statement, so trees can be
//! thousands of levels deep. Every walk here (including clone, comparison
//! and drop) keeps its own work stack instead of recursing.

/// A node in the interchange tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with ordered attributes and children.
///
/// Attribute order is preserved from the source, so writing a tree that was
/// produced by the same code path always yields the same bytes.
#[derive(Debug, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text child.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attr(&mut self, key: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(k, _)| k != key);
        before != self.attributes.len()
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Child elements with the given name.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn first_element(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// Concatenated text content of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Remove every descendant element (at any depth) for which `pred`
    /// returns `true`. Removed elements are not visited further.
    pub fn remove_elements_where(&mut self, pred: &dyn Fn(&XmlElement) -> bool) {
        let mut pending = vec![self];
        while let Some(e) = pending.pop() {
            e.children.retain(|n| match n {
                XmlNode::Element(c) => !pred(c),
                XmlNode::Text(_) => true,
            });
            pending.extend(e.children.iter_mut().filter_map(|n| match n {
                XmlNode::Element(c) => Some(c),
                XmlNode::Text(_) => None,
            }));
        }
    }

    /// Visit this element and every descendant element, parents first and
    /// in document order. Children added or removed by `f` are taken into
    /// account.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut XmlElement)) {
        let mut pending = vec![self];
        while let Some(e) = pending.pop() {
            f(e);
            for child in e.children.iter_mut().rev() {
                if let XmlNode::Element(c) = child {
                    pending.push(c);
                }
            }
        }
    }

    /// Number of element levels from this element down to its deepest
    /// descendant, counting this element.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((e, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(e.elements().map(|c| (c, level + 1)));
        }
        deepest
    }

    fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: Vec::with_capacity(self.children.len()),
        }
    }
}

impl Clone for XmlElement {
    fn clone(&self) -> Self {
        let mut root = XmlElement::default();
        let mut stack = vec![(self.children.iter(), self.shallow_clone())];
        while let Some((children, copy)) = stack.last_mut() {
            match children.next() {
                Some(XmlNode::Element(e)) => stack.push((e.children.iter(), e.shallow_clone())),
                Some(XmlNode::Text(t)) => copy.children.push(XmlNode::Text(t.clone())),
                None => {
                    if let Some((_, done)) = stack.pop() {
                        match stack.last_mut() {
                            Some((_, parent)) => parent.children.push(XmlNode::Element(done)),
                            None => root = done,
                        }
                    }
                }
            }
        }
        root
    }
}

impl PartialEq for XmlElement {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if a.name != b.name
                || a.attributes != b.attributes
                || a.children.len() != b.children.len()
            {
                return false;
            }
            for pair in a.children.iter().zip(&b.children) {
                match pair {
                    (XmlNode::Element(x), XmlNode::Element(y)) => pending.push((x, y)),
                    (XmlNode::Text(x), XmlNode::Text(y)) if x == y => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Eq for XmlElement {}

impl Drop for XmlElement {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let XmlNode::Element(mut e) = node {
                pending.append(&mut e.children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> XmlElement {
        XmlElement::new("block")
            .with_attr("type", "a")
            .with_attr("id", "1")
            .with_child(XmlElement::new("field").with_attr("name", "N").with_text("5"))
            .with_child(
                XmlElement::new("next").with_child(
                    XmlElement::new("block")
                        .with_attr("type", "b")
                        .with_attr("id", "2"),
                ),
            )
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut e = sample();
        e.set_attr("type", "z");
        assert_eq!(e.attributes[0], ("type".into(), "z".into()));
        assert_eq!(e.attributes.len(), 2);
    }

    #[test]
    fn remove_attr_reports_presence() {
        let mut e = sample();
        assert!(e.remove_attr("id"));
        assert!(!e.remove_attr("id"));
        assert_eq!(e.attr("id"), None);
    }

    #[test]
    fn visit_reaches_nested_elements() {
        let mut e = sample();
        e.visit_mut(&mut |el| {
            el.remove_attr("id");
        });
        let next = e.first_element("next").unwrap();
        assert_eq!(next.first_element("block").unwrap().attr("id"), None);
    }

    #[test]
    fn remove_elements_where_drops_subtrees() {
        let mut e = sample();
        e.remove_elements_where(&|el| el.name == "next");
        assert!(e.first_element("next").is_none());
        assert_eq!(e.elements().count(), 1);
    }

    /// `<a><next><a><next>...` nested `levels` times.
    fn deep(levels: usize) -> XmlElement {
        let mut e = XmlElement::new("block").with_attr("type", "a");
        for _ in 1..levels {
            e = XmlElement::new("block")
                .with_attr("type", "a")
                .with_child(XmlElement::new("next").with_child(e));
        }
        e
    }

    #[test]
    fn deep_trees_clone_compare_and_drop() {
        let e = deep(50_000);
        assert_eq!(e.depth(), 2 * 50_000 - 1);
        let mut copy = e.clone();
        assert_eq!(copy, e);
        copy.visit_mut(&mut |el| {
            el.remove_attr("type");
        });
        assert_ne!(copy, e);
        copy.remove_elements_where(&|el| el.name == "next");
        assert_eq!(copy.depth(), 1);
        drop(e);
    }

    #[test]
    fn visit_is_parents_first_in_document_order() {
        let mut e = sample();
        let mut seen = Vec::new();
        e.visit_mut(&mut |el| seen.push(el.name.clone()));
        assert_eq!(seen, ["block", "field", "next", "block"]);
    }

    #[test]
    fn text_content() {
        let e = sample();
        assert_eq!(e.first_element("field").unwrap().text(), "5");
    }
}
