use anyhow::{Context, Result};
use folio::QueryExecutor;

use crate::cli::SuggestCommand;
use crate::output::{self, OutputFormat};

/// Execute a suggest command.
pub async fn run(cmd: SuggestCommand, format: OutputFormat) -> Result<()> {
    let db = QueryExecutor::open_merged(&cmd.dbs)
        .await
        .context("Failed to open indexes")?;
    let suggestion = db.spelling_suggestion(&cmd.word);
    output::print_suggestion(&cmd.word, suggestion.as_deref(), format)
}
