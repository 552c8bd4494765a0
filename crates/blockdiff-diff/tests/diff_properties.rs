//! End-to-end properties of the block diff.
//!
//! Every test goes through [`DiffEngine::diff_xml`], the same entry point
//! the CLI uses: interchange text in, [`DiffResult`] out.

use blockdiff_diff::{
    canonical_signature, BlockChange, DiffEngine, DiffOptions, DiffOutcome, DiffResult,
    MSG_CORRUPTED, MSG_JUST_MOVED,
};
use blockdiff_types::{BlockId, InputKind};
use blockdiff_workspace::{BlockKey, BlockShape, ShapeRegistry, Toolkit, Workspace, MAX_NESTING};
use proptest::prelude::*;

// ============================================================================
// Shared setup
// ============================================================================

fn toolkit() -> Toolkit {
    Toolkit::new(
        ShapeRegistry::new()
            .with(
                "on_start",
                BlockShape::hat().with_input("HANDLER", InputKind::Statement),
            )
            .with(
                "controls_if",
                BlockShape::statement().with_input("DO", InputKind::Statement),
            )
            .with("math_number", BlockShape::reporter()),
    )
}

fn diff(old: &str, new: &str) -> DiffResult {
    diff_with(old, new, &DiffOptions::default())
}

fn diff_with(old: &str, new: &str, options: &DiffOptions) -> DiffResult {
    DiffEngine::new(toolkit()).diff_xml(old, new, options)
}

fn id(s: &str) -> BlockId {
    BlockId::new(s).unwrap()
}

fn key(ws: &Workspace, s: &str) -> BlockKey {
    ws.block_by_id(&id(s)).unwrap()
}

fn has_change(r: &DiffResult, kind: &str, block: &str) -> bool {
    r.changes_of(kind).any(|c| c.id().as_str() == block)
}

const PROGRAM: &str = r#"<xml>
  <block type="on_start" id="start" x="20" y="20">
    <statement name="HANDLER">
      <block type="show_number" id="s1">
        <value name="NUM"><block type="math_number" id="n1"><field name="NUM">1</field></block></value>
        <next><block type="pause" id="s2"><field name="MS">100</field></block></next>
      </block>
    </statement>
  </block>
  <block type="forever" id="loop" x="300" y="20"/>
</xml>"#;

// ============================================================================
// Elision
// ============================================================================

#[test]
fn identical_programs_are_just_moved() {
    let r = diff(PROGRAM, PROGRAM);
    assert_eq!((r.added, r.deleted), (0, 0));
    assert_eq!(r.outcome, DiffOutcome::JustMoved);
    assert_eq!(r.message.as_deref(), Some(MSG_JUST_MOVED));
}

#[test]
fn identical_programs_with_fresh_ids_and_positions_are_just_moved() {
    let moved = PROGRAM
        .replace("id=\"", "id=\"renamed-")
        .replace("x=\"300\"", "x=\"-80\"");
    let r = diff(PROGRAM, &moved);
    assert_eq!((r.added, r.deleted), (0, 0));
    assert_eq!(r.outcome, DiffOutcome::JustMoved);
}

// ============================================================================
// Additions and deletions
// ============================================================================

#[test]
fn pure_addition() {
    let new = PROGRAM.replace("</xml>", r#"<block type="on_shake" id="extra"/></xml>"#);
    let r = diff(PROGRAM, &new);
    assert_eq!((r.added, r.deleted, r.modified), (1, 0, 0));
    assert!(r.is_rendered());
    assert!(has_change(&r, "added", "extra"));
    let ws = r.ws.unwrap();
    assert_eq!(ws.len(), 1);
    assert!(!ws.get(key(&ws, "extra")).unwrap().is_disabled());
}

#[test]
fn pure_deletion_leaves_one_ghost() {
    let new = PROGRAM.replace(r#"<block type="forever" id="loop" x="300" y="20"/>"#, "");
    let r = diff(PROGRAM, &new);
    assert_eq!((r.added, r.deleted), (0, 1));
    let ws = r.ws.unwrap();
    assert_eq!(ws.len(), 1);
    let ghost = ws.get(key(&ws, "loop")).unwrap();
    assert!(ghost.is_disabled());
    assert!(ghost.is_top());
}

#[test]
fn hidden_deleted_top_blocks_are_still_ghosted_by_the_statement_pass() {
    let new = r#"<xml><block type="forever" id="loop" x="300" y="20"/></xml>"#;
    let r = diff_with(
        PROGRAM,
        new,
        &DiffOptions {
            hide_deleted_top_blocks: true,
            ..Default::default()
        },
    );
    assert_eq!((r.added, r.deleted), (0, 4));
    assert_eq!(r.outcome, DiffOutcome::Rendered);

    let ws = r.ws.unwrap();
    let (start, s1, s2) = (key(&ws, "start"), key(&ws, "s1"), key(&ws, "s2"));
    assert_eq!(ws.top_blocks(), vec![start]);
    assert_eq!(ws.len(), 4);
    assert_eq!(ws.get(start).unwrap().inputs()[0].child, Some(s1));
    assert_eq!(ws.next_block(s1), Some(s2));
    for ghost in [start, s1, s2] {
        assert!(ws.get(ghost).unwrap().is_disabled());
    }
}

// ============================================================================
// Changes and moves
// ============================================================================

#[test]
fn field_edit_is_found_by_the_changed_pass() {
    let new = PROGRAM.replace(">100<", ">250<");
    let r = diff(PROGRAM, &new);
    assert!(r.modified >= 1);
    assert!(has_change(&r, "changed", "s2"));
    assert!(!has_change(&r, "moved", "s2"));
    let Some(BlockChange::Changed {
        old_signature,
        new_signature,
        ..
    }) = r.changes_of("changed").next()
    else {
        panic!("expected a changed record");
    };
    assert!(old_signature.as_str().contains(">100<"));
    assert!(new_signature.as_str().contains(">250<"));
}

#[test]
fn relocated_block_is_found_by_the_moved_pass() {
    let old = r#"<xml>
      <block type="p" id="p"><next><block type="q" id="q"><next><block type="r" id="r"/></next></block></next></block>
      <block type="z" id="z"/>
    </xml>"#;
    let new = r#"<xml>
      <block type="p" id="p"><next><block type="r" id="r"/></next></block>
      <block type="z" id="z"><next><block type="q" id="q"/></next></block>
    </xml>"#;
    let r = diff(old, new);
    assert!(r.modified >= 1);
    assert_eq!((r.added, r.deleted), (0, 0));
    assert!(has_change(&r, "moved", "q"));
    assert_eq!(r.changes_of("changed").count(), 0);

    let toolkit = toolkit();
    let old_ws = toolkit.load_xml(old).unwrap();
    let new_ws = toolkit.load_xml(new).unwrap();
    assert_eq!(
        canonical_signature(&old_ws, key(&old_ws, "q"), false).unwrap(),
        canonical_signature(&new_ws, key(&new_ws, "q"), false).unwrap()
    );
}

// ============================================================================
// Stitching
// ============================================================================

#[test]
fn deleting_a_middle_statement_keeps_the_chain() {
    let old = r#"<xml><block type="a" id="A"><next><block type="b" id="B"><next>
                   <block type="c" id="C"/></next></block></next></block></xml>"#;
    let new = r#"<xml><block type="a" id="A"><next><block type="c" id="C"/></next></block></xml>"#;
    let r = diff(old, new);
    assert_eq!((r.added, r.deleted), (0, 1));

    let ws = r.ws.unwrap();
    let (a, b, c) = (key(&ws, "A"), key(&ws, "B"), key(&ws, "C"));
    assert_eq!(ws.top_blocks(), vec![a]);
    assert_eq!(ws.next_block(a), Some(b));
    assert_eq!(ws.next_block(b), Some(c));
    assert_eq!(ws.previous_block(b), Some(a));
    assert_eq!(ws.previous_block(c), Some(b));
    assert_eq!(ws.next_block(c), None);
    assert!(ws.get(b).unwrap().is_disabled());
    assert!(!ws.get(c).unwrap().is_disabled());
}

#[test]
fn deleted_statement_inside_a_handler_is_stitched_back() {
    let new = PROGRAM.replace(
        r#"<next><block type="pause" id="s2"><field name="MS">100</field></block></next>"#,
        "",
    );
    let r = diff(PROGRAM, &new);
    assert_eq!(r.deleted, 1);
    let ws = r.ws.unwrap();
    let s1 = key(&ws, "s1");
    let s2 = ws.next_block(s1).unwrap();
    assert_eq!(ws.get(s2).unwrap().block_type(), "pause");
    assert!(ws.get(s2).unwrap().is_disabled());
}

// ============================================================================
// Robustness
// ============================================================================

#[test]
fn malformed_input_never_throws() {
    let cases = [
        ("", PROGRAM),
        (PROGRAM, ""),
        ("<xml><block x=\"1\"/></xml>", PROGRAM),
        (PROGRAM, "<svg/>"),
        (PROGRAM, "<xml><block type=\"a\"><value name=\"V\"><block type=\"on_start\"/></value></block></xml>"),
        ("not xml at all", "<xml"),
    ];
    for (old, new) in cases {
        let r = diff(old, new);
        assert!(r.message.is_some(), "no message for {old:?} / {new:?}");
        assert!(r.ws.is_none());
    }
}

/// One chain of `len` statements; block `edited` gets a different field.
fn long_chain(len: usize, edited: Option<usize>) -> String {
    let mut xml = String::from("<xml>");
    for i in 0..len {
        let value = if edited == Some(i) { "edited".to_string() } else { i.to_string() };
        xml.push_str(&format!(r#"<block type="s" id="s{i}"><field name="N">{value}</field>"#));
        if i + 1 < len {
            xml.push_str("<next>");
        }
    }
    for i in (0..len).rev() {
        xml.push_str("</block>");
        if i > 0 {
            xml.push_str("</next>");
        }
    }
    xml.push_str("</xml>");
    xml
}

#[test]
fn very_long_chains_are_diffed() {
    let len = 5_000;
    let r = diff(&long_chain(len, None), &long_chain(len, Some(2_500)));
    assert_eq!(r.outcome, DiffOutcome::Rendered);
    assert_eq!((r.added, r.deleted, r.modified), (0, 0, 1));
    assert!(has_change(&r, "changed", "s2500"));
    assert_eq!(r.ws.unwrap().len(), len);

    let r = diff(&long_chain(len, None), &long_chain(len, None));
    assert_eq!(r.outcome, DiffOutcome::JustMoved);
}

#[test]
fn nesting_past_the_limit_is_reported_as_corrupted() {
    let levels = MAX_NESTING + 1;
    let nested = format!(
        "<xml>{}<block type=\"s\"/>{}</xml>",
        r#"<block type="controls_if"><statement name="DO">"#.repeat(levels),
        "</statement></block>".repeat(levels),
    );
    let r = diff(PROGRAM, &nested);
    assert_eq!(r.outcome, DiffOutcome::Corrupted);
    assert_eq!(r.message.as_deref(), Some(MSG_CORRUPTED));
}

proptest! {
    #[test]
    fn arbitrary_text_never_throws(old in ".{0,64}", new in "(<xml>)?.{0,64}") {
        let r = diff(&old, &new);
        prop_assert!(r.message.is_some() || r.svg.is_some());
    }
}

// ============================================================================
// Disabled blocks
// ============================================================================

#[test]
fn blocks_disabled_in_the_new_snapshot_are_invisible() {
    let new = PROGRAM.replace(
        "</xml>",
        r#"<block type="ghostly" id="off" disabled="true"/><block type="on_shake" id="on"/></xml>"#,
    );
    let r = diff(PROGRAM, &new);
    assert_eq!((r.added, r.deleted, r.modified), (1, 0, 0));
    assert!(!has_change(&r, "added", "off"));
    let svg = r.svg.unwrap().svg;
    assert!(svg.contains(r#"data-id="on""#));
    assert!(!svg.contains(r#"data-id="off""#));
}

#[test]
fn blocks_disabled_in_the_old_snapshot_are_not_counted() {
    let old = PROGRAM.replace(
        "</xml>",
        r#"<block type="ghostly" id="off" disabled="true"/></xml>"#,
    );
    let r = diff(&old, PROGRAM);
    assert_eq!((r.added, r.deleted), (0, 0));
    assert_eq!(r.outcome, DiffOutcome::JustMoved);

    let old = r#"<xml><block type="s" id="s"><next><block type="t" id="t" disabled="true"><field name="F">1</field></block></next></block></xml>"#;
    let new = r#"<xml><block type="s" id="s"><next><block type="t" id="t"><field name="F">2</field></block></next></block></xml>"#;
    let r = diff(old, new);
    assert_eq!((r.added, r.deleted, r.modified), (0, 0, 0));
    assert!(r.changes.is_empty());
}

#[test]
fn summary_is_json_friendly() {
    let new = PROGRAM.replace(">100<", ">250<");
    let r = diff(PROGRAM, &new);
    let json = serde_json::to_value(r.summary()).unwrap();
    assert_eq!(json["outcome"], "rendered");
    assert_eq!(json["modified"], 1);
    assert_eq!(json["changes"][0]["kind"], "changed");
    assert_eq!(json["changes"][0]["id"], "s2");
}
