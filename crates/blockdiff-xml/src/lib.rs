//! Interchange tree for block workspaces.
//!
//! Workspaces travel as XML-like text. This crate parses that text into an
//! owned, mutable [`XmlElement`] tree and writes it back out either compactly
//! (the canonical form used for signatures) or indented (for human diffs).

pub mod element;
pub mod error;
pub mod parse;
pub mod write;

pub use element::{XmlElement, XmlNode};
pub use error::{XmlError, XmlResult};
pub use parse::parse;
