use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical signature of a block (optionally with its descendants).
///
/// The text is the interchange form of the block with ids, positions, and
/// editing permissions stripped. Two blocks with the same type, fields, and
/// (when children are kept) the same descendant structure have byte-identical
/// signatures. The BLAKE3 digest of the text is kept alongside for compact
/// logging.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    text: String,
    digest: [u8; 32],
}

impl Signature {
    /// Build a signature from canonical text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let digest = *blake3::hash(text.as_bytes()).as_bytes();
        Self { text, digest }
    }

    /// The canonical text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The raw 32-byte digest of the canonical text.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.digest[..4])
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.short_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_text_same_signature() {
        let a = Signature::new("<block type=\"a\"/>");
        let b = Signature::new("<block type=\"a\"/>");
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn different_text_different_digest() {
        let a = Signature::new("<block type=\"a\"/>");
        let b = Signature::new("<block type=\"b\"/>");
        assert_ne!(a, b);
        assert_ne!(a.short_hex(), b.short_hex());
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(Signature::new("x").short_hex().len(), 8);
    }

    proptest! {
        #[test]
        fn signing_is_deterministic(text in ".*") {
            let a = Signature::new(text.clone());
            let b = Signature::new(text);
            prop_assert_eq!(a, b);
        }
    }
}
