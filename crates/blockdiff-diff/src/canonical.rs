//! Canonical block signatures.
//!
//! A signature is the interchange form of a block with everything that does
//! not change what the program means stripped out: ids, positions, and
//! editing permissions. Signatures are compared for equality and used as
//! hash keys when ids did not survive a round-trip.

use blockdiff_types::Signature;
use blockdiff_workspace::{BlockKey, SaveOptions, Workspace};
use blockdiff_xml::{XmlElement, XmlNode};

use crate::error::EngineResult;

/// Attributes that never take part in a signature.
const NON_SEMANTIC: [&str; 6] = ["id", "x", "y", "deletable", "editable", "movable"];

/// The stripped interchange tree of a block.
///
/// With `keep_children` the tree holds everything nested in the block and its
/// following chain. Without it, `next` and `statement` subtrees are removed
/// at every depth, leaving the block's own shape and its plugged reporters.
pub fn canonical_element(
    ws: &Workspace,
    key: BlockKey,
    keep_children: bool,
) -> EngineResult<XmlElement> {
    let options = SaveOptions {
        ids: true,
        next: keep_children,
        statements: keep_children,
    };
    let mut el = ws.block_to_xml(key, options)?;
    el.visit_mut(&mut |e: &mut XmlElement| {
        for attr in NON_SEMANTIC {
            e.remove_attr(attr);
        }
        if !keep_children {
            e.children.retain(|child| {
                !matches!(child, XmlNode::Element(c) if c.name == "next" || c.name == "statement")
            });
        }
    });
    Ok(el)
}

/// Canonical signature of a block. See [`canonical_element`].
pub fn canonical_signature(
    ws: &Workspace,
    key: BlockKey,
    keep_children: bool,
) -> EngineResult<Signature> {
    Ok(Signature::new(
        canonical_element(ws, key, keep_children)?.to_compact(),
    ))
}
