use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use folio::{DocumentRecord, FolioConfig, IndexBuilder, IndexContext, IndexEvent, IndexObserver};

use crate::cli::IndexCommand;
use crate::output::{self, OutputFormat};

/// Prints each event as the build reports it.
struct Progress {
    format: OutputFormat,
}

#[async_trait]
impl IndexObserver for Progress {
    async fn on_event(&mut self, event: IndexEvent) {
        output::print_event(&event, self.format);
    }
}

fn read_records(path: &Path) -> Result<Vec<DocumentRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse document records in {}", path.display()))
}

/// Execute an index command.
pub async fn run(cmd: IndexCommand, config: &FolioConfig, format: OutputFormat) -> Result<()> {
    let records = read_records(&cmd.documents)?;
    let context = IndexContext::from_config(config).context("Invalid analysis configuration")?;

    let mut progress = Progress { format };
    let summary = IndexBuilder::new(&context)
        .mode(cmd.mode.into())
        .transactional(!cmd.no_transaction)
        .build(&cmd.db, &records, &mut progress)
        .await
        .with_context(|| format!("Failed to build index at {}", cmd.db.display()))?;

    output::print_summary(&summary, format)
}
