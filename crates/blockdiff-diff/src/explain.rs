//! Line diff of two own-shape signatures.
//!
//! Signatures are compact one-line XML; both sides are pretty-printed first
//! so that the `similar` (Myers) line diff points at the field or reporter
//! that differs.

use std::fmt;

use blockdiff_types::Signature;
use similar::{ChangeTag, TextDiff};

/// A single line of a [`SignatureDiff`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// Present on both sides.
    Context(String),
    /// Only in the new signature.
    Added(String),
    /// Only in the old signature.
    Removed(String),
}

/// Explains why the changed pass flagged a block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureDiff {
    pub lines: Vec<DiffLine>,
}

impl SignatureDiff {
    pub fn between(old: &Signature, new: &Signature) -> Self {
        let old_text = pretty(old);
        let new_text = pretty(new);
        if old_text == new_text {
            return Self::default();
        }
        let lines = TextDiff::from_lines(&old_text, &new_text)
            .iter_all_changes()
            .map(|change| {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => DiffLine::Context(text),
                    ChangeTag::Delete => DiffLine::Removed(text),
                    ChangeTag::Insert => DiffLine::Added(text),
                }
            })
            .collect();
        Self { lines }
    }

    /// `true` if both signatures are identical.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Added(_)))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Removed(_)))
            .count()
    }
}

impl fmt::Display for SignatureDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                DiffLine::Context(text) => writeln!(f, "  {text}")?,
                DiffLine::Added(text) => writeln!(f, "+ {text}")?,
                DiffLine::Removed(text) => writeln!(f, "- {text}")?,
            }
        }
        Ok(())
    }
}

fn pretty(signature: &Signature) -> String {
    match blockdiff_xml::parse(signature.as_str()) {
        Ok(el) => el.to_pretty(),
        Err(_) => signature.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_signatures_have_no_lines() {
        let s = Signature::new(r#"<block type="a"/>"#);
        assert!(SignatureDiff::between(&s, &s.clone()).is_empty());
    }

    #[test]
    fn points_at_the_changed_field() {
        let old = Signature::new(
            r#"<block type="say"><field name="A">1</field><field name="MSG">hi</field></block>"#,
        );
        let new = Signature::new(
            r#"<block type="say"><field name="A">1</field><field name="MSG">ho</field></block>"#,
        );
        let diff = SignatureDiff::between(&old, &new);
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.deletions(), 1);
        assert!(diff
            .lines
            .contains(&DiffLine::Removed(r#"  <field name="MSG">hi</field>"#.into())));
        let text = diff.to_string();
        assert!(text.contains(r#"+   <field name="MSG">ho</field>"#));
        assert!(text.contains(r#"    <field name="A">1</field>"#));
    }
}
