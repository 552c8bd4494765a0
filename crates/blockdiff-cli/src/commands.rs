use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use blockdiff_diff::{canonical_signature, BlockChange, DiffEngine, DiffLine, DiffResult, SignatureDiff};
use blockdiff_merge::{merge_xml, MergeOutcome};
use blockdiff_types::BlockId;
use blockdiff_workspace::Toolkit;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::*;
use crate::config::BlockDiffConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = BlockDiffConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &config, cli.format),
        Command::Merge(args) => cmd_merge(args, cli.format),
        Command::Canonical(args) => cmd_canonical(args, &config, cli.format),
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// diff
// ---------------------------------------------------------------------------

fn cmd_diff(args: DiffArgs, config: &BlockDiffConfig, format: OutputFormat) -> anyhow::Result<()> {
    let old = read(&args.old)?;
    let new = read(&args.new)?;
    let mut options = config.diff_options();
    options.hide_deleted_top_blocks |= args.hide_deleted_top_blocks;

    let engine = DiffEngine::new(config.toolkit());
    let result = engine.diff_xml(&old, &new, &options);
    info!(outcome = ?result.outcome, modified = result.modified, "diff finished");

    if let (Some(path), Some(image)) = (&args.svg, &result.svg) {
        fs::write(path, &image.svg).with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), width = image.width, height = image.height, "svg written");
    }

    match format {
        OutputFormat::Json => print_json(&result.summary())?,
        OutputFormat::Text => print_diff(&result, &args),
    }

    if let Some(err) = &result.error {
        bail!("diff failed: {err}");
    }
    Ok(())
}

fn print_diff(result: &DiffResult, args: &DiffArgs) {
    if let Some(message) = &result.message {
        println!("{}", message.yellow().bold());
    }
    println!(
        "{} added, {} deleted, {} modified",
        result.added.to_string().green().bold(),
        result.deleted.to_string().red().bold(),
        result.modified.to_string().cyan().bold(),
    );
    for change in &result.changes {
        println!("  {}", change_line(change));
        if let (true, BlockChange::Changed { old_signature, new_signature, .. }) = (args.explain, change) {
            print_explanation(&SignatureDiff::between(old_signature, new_signature));
        }
    }
    match (&args.svg, &result.svg) {
        (Some(path), Some(_)) => println!("{} Wrote {}", "✓".green().bold(), path.display()),
        (Some(_), None) => println!("{}", "Nothing was rendered.".dimmed()),
        _ => {}
    }
}

fn change_line(change: &BlockChange) -> String {
    let id = change.id().as_str();
    match change {
        BlockChange::Added { .. } => format!("{} {}", "added:  ".green(), id),
        BlockChange::Deleted { .. } => format!("{} {}", "deleted:".red(), id),
        BlockChange::Moved { .. } => format!("{} {}", "moved:  ".blue(), id),
        BlockChange::Changed { old_signature, new_signature, .. } => format!(
            "{} {} ({} -> {})",
            "changed:".yellow(),
            id,
            old_signature.short_hex().dimmed(),
            new_signature.short_hex().dimmed(),
        ),
    }
}

fn print_explanation(diff: &SignatureDiff) {
    for line in &diff.lines {
        match line {
            DiffLine::Context(text) => println!("      {}", text.dimmed()),
            DiffLine::Added(text) => println!("    {} {}", "+".green(), text.green()),
            DiffLine::Removed(text) => println!("    {} {}", "-".red(), text.red()),
        }
    }
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

fn cmd_merge(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let a = read(&args.a)?;
    let original = read(&args.original)?;
    let b = read(&args.b)?;
    let outcome = merge_xml(&a, &original, &b);

    if format == OutputFormat::Json {
        print_json(&outcome)?;
    }
    let side = match &outcome {
        MergeOutcome::TakeA(_) => "a",
        MergeOutcome::TakeB(_) => "b",
        MergeOutcome::Unresolved => bail!("both sides changed; merge is unresolved"),
    };
    let Some(text) = outcome.into_text() else {
        bail!("merge produced no snapshot");
    };
    match (&args.output, format) {
        (Some(path), _) => {
            fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            if format == OutputFormat::Text {
                println!("{} Took {} into {}", "✓".green().bold(), side.yellow(), path.display());
            }
        }
        (None, OutputFormat::Text) => print!("{text}"),
        (None, OutputFormat::Json) => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// canonical
// ---------------------------------------------------------------------------

/// Signature of one top block.
#[derive(Debug, Serialize)]
struct CanonicalRow {
    id: BlockId,
    block_type: String,
    digest: String,
    signature: String,
}

fn canonical_rows(toolkit: &Toolkit, text: &str, shallow: bool) -> anyhow::Result<Vec<CanonicalRow>> {
    let ws = toolkit.load_xml(text).context("materializing snapshot")?;
    let mut rows = Vec::new();
    for key in ws.top_blocks() {
        let block = ws.get(key)?;
        let signature = canonical_signature(&ws, key, !shallow)?;
        rows.push(CanonicalRow {
            id: block.id().clone(),
            block_type: block.block_type().to_string(),
            digest: signature.short_hex(),
            signature: signature.into_text(),
        });
    }
    Ok(rows)
}

fn cmd_canonical(args: CanonicalArgs, config: &BlockDiffConfig, format: OutputFormat) -> anyhow::Result<()> {
    let text = read(&args.file)?;
    let rows = canonical_rows(&config.toolkit(), &text, args.shallow)?;
    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            for row in &rows {
                println!("{} {} {}", row.digest.yellow(), row.id.as_str().bold(), row.block_type.dimmed());
                println!("  {}", row.signature);
            }
        }
    }
    Ok(())
}
