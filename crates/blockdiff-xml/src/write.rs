//! Writing an element tree back to text.

use std::fmt::Write as _;

use crate::element::{XmlElement, XmlNode};

impl XmlElement {
    /// Compact text with no insignificant whitespace. This is the canonical
    /// form: equal trees always produce equal bytes.
    pub fn to_compact(&self) -> String {
        let mut out = String::new();
        write_compact(self, &mut out);
        out
    }

    /// Indented text, one element per line. Elements holding only text stay
    /// on a single line.
    pub fn to_pretty(&self) -> String {
        let mut out = String::new();
        write_pretty(self, &mut out);
        out
    }
}

fn write_open(e: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&e.name);
    for (key, value) in &e.attributes {
        let _ = write!(out, " {}=\"{}\"", key, escape_attr(value));
    }
}

/// One step of an iterative write.
enum Step<'a> {
    Open(&'a XmlElement, usize),
    Text(&'a str, usize),
    Close(&'a XmlElement, usize),
}

/// Schedule the children of `e` (at `depth + 1`) followed by its closing tag.
fn push_children<'a>(e: &'a XmlElement, depth: usize, pending: &mut Vec<Step<'a>>) {
    pending.push(Step::Close(e, depth));
    for child in e.children.iter().rev() {
        pending.push(match child {
            XmlNode::Element(c) => Step::Open(c, depth + 1),
            XmlNode::Text(t) => Step::Text(t, depth + 1),
        });
    }
}

fn write_compact(root: &XmlElement, out: &mut String) {
    let mut pending = vec![Step::Open(root, 0)];
    while let Some(step) = pending.pop() {
        match step {
            Step::Open(e, depth) => {
                write_open(e, out);
                if e.children.is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    push_children(e, depth, &mut pending);
                }
            }
            Step::Text(t, _) => out.push_str(&escape_text(t)),
            Step::Close(e, _) => {
                let _ = write!(out, "</{}>", e.name);
            }
        }
    }
}

fn write_pretty(root: &XmlElement, out: &mut String) {
    let mut pending = vec![Step::Open(root, 0)];
    while let Some(step) = pending.pop() {
        match step {
            Step::Open(e, depth) => {
                out.push_str(&"  ".repeat(depth));
                write_open(e, out);
                if e.children.is_empty() {
                    out.push_str("/>\n");
                } else if e.elements().next().is_none() {
                    out.push('>');
                    out.push_str(&escape_text(&e.text()));
                    let _ = writeln!(out, "</{}>", e.name);
                } else {
                    out.push_str(">\n");
                    push_children(e, depth, &mut pending);
                }
            }
            Step::Text(t, depth) => {
                let _ = writeln!(out, "{}{}", "  ".repeat(depth), escape_text(t));
            }
            Step::Close(e, depth) => {
                let _ = writeln!(out, "{}</{}>", "  ".repeat(depth), e.name);
            }
        }
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            _ => out.push(c),
        }
    }
    out
}
