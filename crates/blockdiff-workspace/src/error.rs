//! Error types for workspace operations.

use blockdiff_types::TypeError;
use blockdiff_xml::XmlError;

use crate::block::BlockKey;

/// Errors that can occur while materializing or mutating a workspace.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// The interchange text could not be read.
    #[error("interchange error: {0}")]
    Xml(#[from] XmlError),

    /// The root element is not a workspace.
    #[error("expected <xml> workspace root, found <{0}>")]
    NotAWorkspace(String),

    /// A block element has no `type` attribute.
    #[error("block element without a type attribute")]
    MissingType,

    /// A `field`, `value`, or `statement` element has no `name` attribute.
    #[error("<{element}> without a name attribute in block {block_type}")]
    MissingName {
        element: String,
        block_type: String,
    },

    /// A block is attached through a connection its shape does not have.
    #[error("block {block_type} cannot be attached: {reason}")]
    InvalidConnection { block_type: String, reason: String },

    /// A key does not address a live block in this workspace.
    #[error("unknown block {0}")]
    UnknownBlock(BlockKey),

    /// A connection would make a block its own ancestor.
    #[error("connecting {child} under {parent} would create a cycle")]
    WouldCycle { parent: BlockKey, child: BlockKey },

    /// Blocks are plugged into each other's inputs deeper than the limit.
    #[error("blocks nested more than {0} inputs deep")]
    TooDeep(usize),

    /// Malformed identifier or colour.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

/// Convenience alias for workspace results.
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
