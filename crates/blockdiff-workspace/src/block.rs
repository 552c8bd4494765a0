//! Block entities stored in a workspace arena.

use std::fmt;

use blockdiff_types::{BlockId, Colour, InputKind};
use blockdiff_xml::XmlElement;

/// Arena index of a block inside one workspace.
///
/// Keys are never reused within a workspace, so a key held after its block
/// was disposed simply stops resolving.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey(pub(crate) u32);

impl fmt::Debug for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockKey({})", self.0)
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which connections a block exposes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Connections {
    /// Plugs into a value input (reporter blocks).
    pub output: bool,
    /// Can follow another block or head a statement input.
    pub previous: bool,
    /// Can be followed by another block.
    pub next: bool,
}

impl Connections {
    pub const STATEMENT: Connections = Connections {
        output: false,
        previous: true,
        next: true,
    };

    pub const REPORTER: Connections = Connections {
        output: true,
        previous: false,
        next: false,
    };
}

/// An editable name/value pair on a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// An input slot, optionally holding a child block.
#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    pub name: String,
    pub kind: InputKind,
    pub child: Option<BlockKey>,
    /// Shadow element kept verbatim; shadows render but are not diffed.
    pub shadow: Option<XmlElement>,
}

/// Where a block hangs in its workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attachment {
    /// Root of a chain.
    Top,
    /// Follows the given block through its next connection.
    Next(BlockKey),
    /// Sits in input `index` of `parent`.
    Input { parent: BlockKey, index: usize },
}

/// A block in a workspace.
#[derive(Clone, Debug)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) block_type: String,
    pub(crate) fields: Vec<Field>,
    pub(crate) inputs: Vec<Input>,
    pub(crate) next: Option<BlockKey>,
    pub(crate) attachment: Attachment,
    pub(crate) connections: Connections,
    pub(crate) disabled: bool,
    pub(crate) collapsed: bool,
    pub(crate) deletable: bool,
    pub(crate) editable: bool,
    pub(crate) movable: bool,
    pub(crate) colour: Option<Colour>,
    pub(crate) position: Option<(f64, f64)>,
    /// `mutation`, `comment`, `data` and other elements carried verbatim.
    pub(crate) extras: Vec<XmlElement>,
}

impl Block {
    pub(crate) fn new(id: BlockId, block_type: impl Into<String>, connections: Connections) -> Self {
        Self {
            id,
            block_type: block_type.into(),
            fields: Vec::new(),
            inputs: Vec::new(),
            next: None,
            attachment: Attachment::Top,
            connections,
            disabled: false,
            collapsed: false,
            deletable: true,
            editable: true,
            movable: true,
            colour: None,
            position: None,
            extras: Vec::new(),
        }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Value of the named field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|i| i.name == name)
    }

    /// Block following this one in its chain.
    pub fn next(&self) -> Option<BlockKey> {
        self.next
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn is_top(&self) -> bool {
        self.attachment == Attachment::Top
    }

    pub fn connections(&self) -> Connections {
        self.connections
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn colour(&self) -> Option<Colour> {
        self.colour
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.position
    }

    pub fn extras(&self) -> &[XmlElement] {
        &self.extras
    }

    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        let mut out = format!("{}:{}", self.block_type, self.id);
        for field in &self.fields {
            out.push_str(&format!(" {}={}", field.name, field.value));
        }
        out
    }
}
