mod cli;
mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::commands::{convert, index, search, suggest};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = context::init_logging(&cli.log_level)?;
    let config = context::load_config(cli.config.as_deref())?;
    let format = cli.format;

    log::debug!("folio {} starting", folio::VERSION);

    match cli.command {
        Command::Index(cmd) => index::run(cmd, &config, format).await,
        Command::Search(cmd) => search::run(cmd, &config, format).await,
        Command::Convert(cmd) => convert::run(cmd, &config, format).await,
        Command::Suggest(cmd) => suggest::run(cmd, format).await,
    }
}
