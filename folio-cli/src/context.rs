use std::path::Path;

use anyhow::{Context, Result};
use flexi_logger::{Logger, LoggerHandle};
use folio::FolioConfig;

/// Start logging to stderr. `RUST_LOG` overrides `spec` when set.
pub fn init_logging(spec: &str) -> Result<LoggerHandle> {
    Logger::try_with_env_or_str(spec)
        .with_context(|| format!("Invalid log specification '{spec}'"))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .context("Failed to start logger")
}

/// Load the configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<FolioConfig> {
    match path {
        Some(path) => FolioConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(FolioConfig::default()),
    }
}
