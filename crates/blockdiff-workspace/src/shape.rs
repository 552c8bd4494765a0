//! Connection shapes per block type.
//!
//! The interchange format does not say which connections a block has; the
//! host editor knows that from its block definitions. Hosts register shapes
//! for the types they care about. Unregistered types get a shape inferred
//! from where the block sits.

use std::collections::HashMap;

use blockdiff_types::InputKind;
use serde::{Deserialize, Serialize};

use crate::block::Connections;

/// Where a block element was found while materializing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Top,
    Value,
    Statement,
    Next,
}

/// Declared input of a block type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub kind: InputKind,
}

/// Connections and inputs of one block type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockShape {
    pub output: bool,
    pub previous: bool,
    pub next: bool,
    /// Inputs in display order. Inputs found in the interchange text but not
    /// declared here are appended after them.
    pub inputs: Vec<InputSpec>,
}

impl BlockShape {
    /// A chainable statement block.
    pub fn statement() -> Self {
        Self {
            previous: true,
            next: true,
            ..Default::default()
        }
    }

    /// A reporter block.
    pub fn reporter() -> Self {
        Self {
            output: true,
            ..Default::default()
        }
    }

    /// A hat block (event handler) with no chain connections.
    pub fn hat() -> Self {
        Self::default()
    }

    /// Builder-style input declaration.
    pub fn with_input(mut self, name: impl Into<String>, kind: InputKind) -> Self {
        self.inputs.push(InputSpec {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn connections(&self) -> Connections {
        Connections {
            output: self.output,
            previous: self.previous,
            next: self.next,
        }
    }
}

/// Shapes keyed by block type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeRegistry {
    shapes: HashMap<String, BlockShape>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, block_type: impl Into<String>, shape: BlockShape) {
        self.shapes.insert(block_type.into(), shape);
    }

    /// Builder-style registration.
    pub fn with(mut self, block_type: impl Into<String>, shape: BlockShape) -> Self {
        self.register(block_type, shape);
        self
    }

    pub fn get(&self, block_type: &str) -> Option<&BlockShape> {
        self.shapes.get(block_type)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Connections and declared inputs for a block of `block_type` found at
    /// `slot`. `has_next` tells whether the element carries a `<next>`.
    pub fn resolve(&self, block_type: &str, slot: Slot, has_next: bool) -> (Connections, &[InputSpec]) {
        match self.shapes.get(block_type) {
            Some(shape) => (shape.connections(), &shape.inputs),
            None => {
                let reporter = slot == Slot::Value;
                let connections = Connections {
                    output: reporter,
                    previous: !reporter,
                    next: !reporter || has_next,
                };
                (connections, &[])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_shape_wins() {
        let reg = ShapeRegistry::new().with(
            "on_start",
            BlockShape::hat().with_input("HANDLER", InputKind::Statement),
        );
        let (conn, inputs) = reg.resolve("on_start", Slot::Top, false);
        assert_eq!(conn, Connections::default());
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].kind, InputKind::Statement);
    }

    #[test]
    fn unregistered_value_block_is_a_reporter() {
        let reg = ShapeRegistry::new();
        let (conn, inputs) = reg.resolve("math_number", Slot::Value, false);
        assert_eq!(conn, Connections::REPORTER);
        assert!(inputs.is_empty());
    }

    #[test]
    fn unregistered_top_block_is_a_statement() {
        let reg = ShapeRegistry::new();
        let (conn, _) = reg.resolve("say", Slot::Top, false);
        assert_eq!(conn, Connections::STATEMENT);
    }

    #[test]
    fn shapes_deserialize_from_toml() {
        let reg: ShapeRegistry = toml::from_str(
            r#"
            [pxt-on-start]
            inputs = [{ name = "HANDLER", kind = "statement" }]

            [math_number]
            output = true
            "#,
        )
        .unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("math_number"), Some(&BlockShape::reporter()));
        let hat = reg.get("pxt-on-start").unwrap();
        assert!(!hat.next && !hat.previous);
        assert_eq!(hat.inputs[0].name, "HANDLER");
    }
}
