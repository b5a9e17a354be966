use anyhow::Result;
use clap::ValueEnum;
use folio::{BuildSummary, Converted, Hit, IndexEvent};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// JSON output.
    Json,
}

#[derive(Tabled)]
struct HitRow {
    rank: usize,
    id: u64,
    percent: String,
    weight: String,
    data: String,
}

#[derive(Tabled)]
struct FieldRow {
    field: &'static str,
    value: String,
}

/// Print one build progress event.
pub fn print_event(event: &IndexEvent, format: OutputFormat) {
    match (format, event) {
        (
            OutputFormat::Json,
            IndexEvent::DocumentIndexed {
                position,
                docid,
                data,
            },
        ) => println!(
            "{}",
            json!({ "event": "indexed", "position": position, "id": docid, "data": data })
        ),
        (OutputFormat::Json, IndexEvent::Committed { .. }) => {}
        (
            OutputFormat::Table,
            IndexEvent::DocumentIndexed {
                position,
                docid,
                data,
            },
        ) => println!("Record {position} indexed as document {docid}: {data}"),
        (OutputFormat::Table, IndexEvent::Committed { documents, .. }) => {
            println!("Committed {documents} record(s).")
        }
    }
}

pub fn print_summary(summary: &BuildSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "indexed": summary.indexed,
                "doc_count": summary.doc_count,
                "generation": summary.generation,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => println!(
            "Index holds {} document(s) at generation {}.",
            summary.doc_count, summary.generation
        ),
    }
    Ok(())
}

/// Print search results.
pub fn print_hits(
    description: &str,
    total: usize,
    hits: &[Hit],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "query": description,
                "matches_estimated": total,
                "hits": hits,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            println!("Parsed query is: {description}");
            if hits.is_empty() {
                println!("No results found.");
                return Ok(());
            }

            let rows: Vec<HitRow> = hits
                .iter()
                .map(|hit| HitRow {
                    rank: hit.rank,
                    id: hit.docid,
                    percent: format!("{}%", hit.percent),
                    weight: format!("{:.4}", hit.weight),
                    data: hit.data.clone(),
                })
                .collect();

            let table = Table::new(&rows).with(Style::rounded()).to_string();
            println!("{table}");
            println!("{} of about {total} matches.", hits.len());
        }
    }
    Ok(())
}

pub fn print_converted(converted: &Converted, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "title": converted.title,
                "author": converted.author,
                "keywords": converted.keywords,
                "mime_type": converted.mime_type,
                "checksum": converted.checksum,
                "sample": converted.sample,
                "body": converted.body,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = [
                ("title", &converted.title),
                ("author", &converted.author),
                ("keywords", &converted.keywords),
                ("mime_type", &converted.mime_type),
                ("checksum", &converted.checksum),
                ("sample", &converted.sample),
            ]
            .into_iter()
            .map(|(field, value)| FieldRow {
                field,
                value: value.clone(),
            })
            .collect();
            let table = Table::new(&rows).with(Style::rounded()).to_string();
            println!("{table}");
        }
    }
    Ok(())
}

pub fn print_suggestion(word: &str, suggestion: Option<&str>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({ "word": word, "suggestion": suggestion });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => match suggestion {
            Some(suggestion) => println!("Did you mean '{suggestion}'?"),
            None => println!("No suggestion for '{word}'."),
        },
    }
    Ok(())
}
