use anyhow::{Context, Result};
use folio::FolioConfig;

use crate::cli::ConvertCommand;
use crate::output::{self, OutputFormat};

/// Execute a convert command.
pub async fn run(cmd: ConvertCommand, config: &FolioConfig, format: OutputFormat) -> Result<()> {
    let converted = config
        .converter()
        .convert(&cmd.file, cmd.mime.as_deref())
        .await
        .with_context(|| format!("Failed to convert {}", cmd.file.display()))?;
    output::print_converted(&converted, format)
}
