use anyhow::{Context, Result};
use folio::analysis::STEM_PREFIX;
use folio::{Enquire, FolioConfig, Query, QueryExecutor};

use crate::cli::SearchCommand;
use crate::output::{self, OutputFormat};

/// Execute a search command.
pub async fn run(cmd: SearchCommand, config: &FolioConfig, format: OutputFormat) -> Result<()> {
    let db = QueryExecutor::open_merged(&cmd.dbs)
        .await
        .context("Failed to open indexes")?;

    let terms: Vec<String> = if cmd.stem {
        let generator = config.term_generator()?;
        cmd.terms
            .iter()
            .flat_map(|term| generator.words(term))
            .map(|word| format!("{STEM_PREFIX}{}", generator.stemmer().stem(&word)))
            .collect()
    } else {
        cmd.terms.iter().map(|term| term.to_lowercase()).collect()
    };
    let query = Query::new(cmd.op.into(), terms);
    let description = query.description();

    let mut enquire = Enquire::new(&db);
    enquire.set_query(query);
    if let Some(slot) = cmd.sort_slot {
        enquire.set_sort_by_value(slot, cmd.reverse);
    }

    let window = cmd.limit.unwrap_or(config.search.window);
    let mset = enquire.get_mset(cmd.first, window).await?;
    let hits = QueryExecutor::collect_hits(&mset)
        .await
        .context("Failed to fetch document data")?;

    output::print_hits(&description, mset.matches_estimated(), &hits, format)
}
