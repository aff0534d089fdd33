//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vocadeck")]
#[command(
    author,
    version,
    about = "Turn vocabulary tables into illustrated flashcard decks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to VOCADECK_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a deck from a Markdown table or CSV file
    Build(BuildArgs),

    /// Convert "Key: Value" text blocks into a standard CSV
    Convert(ConvertArgs),

    /// Rewrite a Markdown table with consistent pipes
    FixTable(FixTableArgs),

    /// Inspect or reset the image cache
    Cache(CacheArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Vocabulary table (.md, .csv, .tsv)
    pub input: PathBuf,

    /// Deck name (defaults to the input file name)
    #[arg(long)]
    pub deck_name: Option<String>,

    /// Directory the deck file is written to
    #[arg(long, default_value = "ANKI")]
    pub output_dir: PathBuf,

    /// Search only with the original text
    #[arg(long)]
    pub no_synonyms: bool,

    /// Use the local synonym dictionary without online lookups
    #[arg(long)]
    pub offline_synonyms: bool,

    /// Drop stop words and lemmatize search queries
    #[arg(long)]
    pub nlp: bool,

    /// Prefer curated images, relaxing when results are sparse
    #[arg(long)]
    pub strict: bool,

    /// Take hits in provider order instead of by popularity
    #[arg(long)]
    pub no_rank: bool,

    /// Extra search term (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long)]
    pub min_likes: Option<u64>,

    #[arg(long)]
    pub min_downloads: Option<u64>,

    #[arg(long)]
    pub min_views: Option<u64>,

    #[arg(long)]
    pub min_comments: Option<u64>,

    /// Build text-only cards without searching for images
    #[arg(long)]
    pub no_images: bool,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Text file with blank-line separated "Key: Value" blocks
    pub input: PathBuf,

    /// Output CSV (defaults to csv/<input name>.csv)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct FixTableArgs {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show entry counts
    Stats,

    /// Remove expired entries
    Purge,

    /// Remove all entries
    Clear,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Cli,
    Json,
}
