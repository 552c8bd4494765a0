use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blockdiff",
    about = "blockdiff — structural diffs of visual block programs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./blockdiff.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff two workspace snapshots
    Diff(DiffArgs),
    /// Three-way merge of workspace snapshots
    Merge(MergeArgs),
    /// Print the canonical signatures of a snapshot's top blocks
    Canonical(CanonicalArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    /// Write the rendered diff to this SVG file
    #[arg(long)]
    pub svg: Option<PathBuf>,
    /// Do not draw ghosts for deleted top blocks
    #[arg(long)]
    pub hide_deleted_top_blocks: bool,
    /// Show a line diff for every changed block
    #[arg(long)]
    pub explain: bool,
}

#[derive(Args)]
pub struct MergeArgs {
    pub a: PathBuf,
    pub original: PathBuf,
    pub b: PathBuf,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CanonicalArgs {
    pub file: PathBuf,
    /// Sign each block alone, without nested statements or its chain
    #[arg(long)]
    pub shallow: bool,
}
