use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use folio::{Op, OpenMode};

use crate::output::OutputFormat;

/// Folio - document indexing and query CLI
#[derive(Parser)]
#[command(name = "folio", version, about)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "FOLIO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Log level or flexi_logger spec (e.g. "info", "folio=debug").
    #[arg(long, env = "FOLIO_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build an index from a JSON array of document records.
    Index(IndexCommand),
    /// Run a term query over one or more indexes.
    Search(SearchCommand),
    /// Extract the text of a file.
    Convert(ConvertCommand),
    /// Suggest a spelling correction from the indexes' dictionaries.
    Suggest(SuggestCommand),
}

/// How `index` treats an existing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexMode {
    /// Discard any existing content.
    Overwrite,
    /// Add to an existing index, creating it if missing.
    Open,
    /// Fail if an index already exists.
    Create,
    /// Fail if there is no index yet.
    Existing,
}

impl From<IndexMode> for OpenMode {
    fn from(mode: IndexMode) -> Self {
        match mode {
            IndexMode::Overwrite => OpenMode::CreateOrOverwrite,
            IndexMode::Open => OpenMode::CreateOrOpen,
            IndexMode::Create => OpenMode::Create,
            IndexMode::Existing => OpenMode::Open,
        }
    }
}

/// Boolean operator joining the query terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryOp {
    And,
    Or,
    AndNot,
    Xor,
    AndMaybe,
    Filter,
}

impl From<QueryOp> for Op {
    fn from(op: QueryOp) -> Self {
        match op {
            QueryOp::And => Op::And,
            QueryOp::Or => Op::Or,
            QueryOp::AndNot => Op::AndNot,
            QueryOp::Xor => Op::Xor,
            QueryOp::AndMaybe => Op::AndMaybe,
            QueryOp::Filter => Op::Filter,
        }
    }
}

// --- Index ---

#[derive(Parser)]
pub struct IndexCommand {
    /// Index directory.
    pub db: PathBuf,

    /// JSON file holding an array of document records.
    pub documents: PathBuf,

    #[arg(long, value_enum, default_value_t = IndexMode::Overwrite)]
    pub mode: IndexMode,

    /// Commit without wrapping the build in a transaction.
    #[arg(long)]
    pub no_transaction: bool,
}

// --- Search ---

#[derive(Parser)]
pub struct SearchCommand {
    /// Index directories to merge; the first is the primary.
    #[arg(long = "db", required = true)]
    pub dbs: Vec<PathBuf>,

    /// Terms to search for.
    #[arg(required = true)]
    pub terms: Vec<String>,

    #[arg(long, value_enum, default_value_t = QueryOp::Or)]
    pub op: QueryOp,

    /// Match stemmed forms of the terms.
    #[arg(long)]
    pub stem: bool,

    /// Rank of the first result.
    #[arg(long, default_value_t = 0)]
    pub first: usize,

    /// Maximum number of results (defaults to the configured window).
    #[arg(long)]
    pub limit: Option<usize>,

    /// Sort by this value slot instead of relevance.
    #[arg(long)]
    pub sort_slot: Option<u32>,

    /// Reverse the value sort.
    #[arg(long, requires = "sort_slot")]
    pub reverse: bool,
}

// --- Convert ---

#[derive(Parser)]
pub struct ConvertCommand {
    /// File to convert.
    pub file: PathBuf,

    /// MIME type, or an extension starting with '.'.
    #[arg(long)]
    pub mime: Option<String>,
}

// --- Suggest ---

#[derive(Parser)]
pub struct SuggestCommand {
    /// Index directories whose dictionaries are consulted.
    #[arg(long = "db", required = true)]
    pub dbs: Vec<PathBuf>,

    /// Possibly misspelled word.
    pub word: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_search() {
        let cli = Cli::parse_from([
            "folio", "search", "--db", "db1", "--db", "db2", "one", "six", "--op", "and-not",
        ]);
        let Command::Search(cmd) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(cmd.dbs.len(), 2);
        assert_eq!(cmd.terms, vec!["one", "six"]);
        assert_eq!(Op::from(cmd.op), Op::AndNot);
    }
}
