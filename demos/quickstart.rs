//! Build two small indexes, merge them, run an OR query and print each
//! match with its payload, then convert an HTML file.
//!
//! Run with `cargo run --example quickstart`.

use folio::{
    DocumentRecord, FolioConfig, IndexBuilder, IndexContext, IndexEvent, MimeConverter, Op, Query,
    QueryExecutor, TermLimits,
};
use tempfile::TempDir;

const HTML: &str = r#"<html><head><title>Mime test</title>
<meta name="author" content="Folio"></head>
<body><p>The gulf stream carries six warm currents north.</p></body></html>"#;

fn records(html_path: &std::path::Path) -> Vec<DocumentRecord> {
    vec![
        DocumentRecord::new("doc one")
            .add_text("text one two three four five six")
            .term_limits(TermLimits::new().max(3))
            .value(1, "stuff")
            .id_term("#dk83ndj"),
        // Same key: replaces the document above.
        DocumentRecord::new("doc one")
            .add_text("text one two three four five six")
            .value(1, "stuff")
            .id_term("#dk83ndj"),
        DocumentRecord::new("item new")
            .add_text("text four five six seven eight nine")
            .term_limits(TermLimits::new().min(2))
            .value(0, "thing"),
        DocumentRecord::new("more here")
            .add_text("text alpha beta gamma delta")
            .term_limits(TermLimits::new().min(1).max(2))
            .value(3, "hello"),
        DocumentRecord::new("then some")
            .add_text("text gulf alpha charlie")
            .term_limits(TermLimits::new().max(1))
            .value(1, "hi")
            .value(2, "you"),
        DocumentRecord::new("and two")
            .add_text("text gulf stream waters")
            .term_limits(TermLimits::new().min(1)),
        DocumentRecord::new("something")
            .add_text("text six ten eleven twelve")
            .value(0, "what")
            .source_file(html_path, None),
    ]
}

#[tokio::main]
async fn main() -> folio::Result<()> {
    let dir = TempDir::new()?;
    let html_path = dir.path().join("mime-test.html");
    std::fs::write(&html_path, HTML)?;

    let context = IndexContext::from_config(&FolioConfig::default())?;
    let records = records(&html_path);

    let mut paths = Vec::new();
    for name in ["db1", "db2"] {
        let path = dir.path().join(name);
        let mut events: Vec<IndexEvent> = Vec::new();
        let summary = IndexBuilder::new(&context)
            .build(&path, &records, &mut events)
            .await?;
        for event in &events {
            if let IndexEvent::DocumentIndexed { data, .. } = event {
                println!("added \"{data}\"");
            }
        }
        println!("committed {name} ({} documents)", summary.doc_count);
        paths.push(path);
    }

    let db = QueryExecutor::open_merged(&paths).await?;
    let query = Query::new(Op::Or, ["one", "six", "min"]);
    println!("Performing query [{}]", query.description());

    let mset = QueryExecutor::new().search(&db, query, 0).await?;
    println!("{} results found", mset.len());
    for hit in QueryExecutor::collect_hits(&mset).await? {
        println!("Document ID {}\t{}% [{}]", hit.docid, hit.percent, hit.data);
    }

    if let Some(suggestion) = db.spelling_suggestion("gulff") {
        println!("Did you mean '{suggestion}'?");
    }

    let converted = MimeConverter::new().convert(&html_path, None).await?;
    println!("{} {}", converted.title, converted.body);
    Ok(())
}
