use std::fs;

use tempfile::TempDir;

use folio::{
    ConversionStatus, Database, DocumentRecord, FolioConfig, FolioError, IndexBuilder,
    IndexContext, IndexEvent, OpenMode, Query, QueryExecutor, TermLimits,
};

fn default_context() -> IndexContext {
    IndexContext::from_config(&FolioConfig::default()).unwrap()
}

#[tokio::test]
async fn test_events_arrive_in_submission_order() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let context = default_context();
    let records = vec![
        DocumentRecord::new("first").add_text("one"),
        DocumentRecord::new("second").add_text("two"),
        DocumentRecord::new("third").add_text("three"),
    ];

    let mut events: Vec<IndexEvent> = Vec::new();
    let summary = IndexBuilder::new(&context)
        .build(temp_dir.path(), &records, &mut events)
        .await?;

    assert_eq!(summary.indexed, 3);
    assert_eq!(summary.doc_count, 3);
    assert_eq!(events.len(), 4);

    for (position, event) in events[..3].iter().enumerate() {
        match event {
            IndexEvent::DocumentIndexed {
                position: reported,
                data,
                ..
            } => {
                assert_eq!(*reported, position);
                assert_eq!(data, &records[position].data);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(
        events[3],
        IndexEvent::Committed {
            documents: 3,
            doc_count: 3
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_term_limits_shape_the_index() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let context = default_context();
    let records = vec![
        DocumentRecord::new("capped")
            .add_text("apple banana cherry")
            .term_limits(TermLimits::new().max(1)),
        DocumentRecord::new("too short")
            .add_text("damson")
            .term_limits(TermLimits::new().min(2)),
        DocumentRecord::new("long enough")
            .add_text("elder fig")
            .term_limits(TermLimits::new().min(2)),
    ];
    IndexBuilder::new(&context)
        .build(temp_dir.path(), &records, &mut ())
        .await?;

    let db = Database::open(temp_dir.path()).await?;
    assert_eq!(db.doc_count(), 3);
    assert_eq!(db.term_freq("apple"), 1);
    assert_eq!(db.term_freq("banana"), 0);
    assert_eq!(db.term_freq("damson"), 0);
    assert_eq!(db.term_freq("elder"), 1);
    assert_eq!(db.term_freq("fig"), 1);
    Ok(())
}

#[tokio::test]
async fn test_spelling_dictionary_from_build() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let context = default_context();
    let records = vec![
        DocumentRecord::new("and two").add_text("text gulf stream waters"),
        DocumentRecord::new("then some").add_text("text gulf alpha charlie"),
    ];
    IndexBuilder::new(&context)
        .build(temp_dir.path(), &records, &mut ())
        .await?;

    let db = Database::open(temp_dir.path()).await?;
    assert_eq!(db.spelling_suggestion("gulff").as_deref(), Some("gulf"));
    assert_eq!(db.spelling_suggestion("gulf"), None);
    assert_eq!(db.spelling_suggestion("zzzzzzzz"), None);
    Ok(())
}

#[tokio::test]
async fn test_spelling_can_be_disabled() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config = FolioConfig::from_toml_str("[analysis]\nspelling = false\n")?;
    let context = IndexContext::from_config(&config)?;
    IndexBuilder::new(&context)
        .build(
            temp_dir.path(),
            &[DocumentRecord::new("gulf").add_text("gulf stream")],
            &mut (),
        )
        .await?;

    let db = Database::open(temp_dir.path()).await?;
    assert_eq!(db.term_freq("gulf"), 1);
    assert_eq!(db.spelling_suggestion("gulff"), None);
    Ok(())
}

#[tokio::test]
async fn test_source_file_is_converted_and_indexed() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let html = temp_dir.path().join("mime-test.html");
    fs::write(
        &html,
        "<html><head><title>Harbour notes</title></head>\
         <body><p>Lighthouse keepers log the tides.</p></body></html>",
    )?;
    let db_path = temp_dir.path().join("db");

    let context = default_context();
    IndexBuilder::new(&context)
        .build(
            &db_path,
            &[DocumentRecord::new("with file")
                .add_text("inline")
                .source_file(&html, None)],
            &mut (),
        )
        .await?;

    let db = QueryExecutor::open_merged(&[&db_path]).await?;
    for term in ["inline", "harbour", "lighthouse", "tides"] {
        assert_eq!(db.term_freq(term), 1, "term {term}");
    }
    assert_eq!(db.term_freq("html"), 0);
    assert_eq!(db.term_freq("title"), 0);

    let mset = QueryExecutor::new()
        .search(&db, Query::term("lighthouse"), 0)
        .await?;
    let hits = QueryExecutor::collect_hits(&mset).await?;
    assert_eq!(hits[0].data, "with file");
    Ok(())
}

#[tokio::test]
async fn test_failed_record_cancels_whole_build() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let context = default_context();
    IndexBuilder::new(&context)
        .build(
            temp_dir.path(),
            &[DocumentRecord::new("existing").add_text("existing")],
            &mut (),
        )
        .await?;

    let records = vec![
        DocumentRecord::new("fine").add_text("fine"),
        DocumentRecord::new("broken").source_file(temp_dir.path().join("missing.txt"), None),
        DocumentRecord::new("never").add_text("never"),
    ];
    let mut events: Vec<IndexEvent> = Vec::new();
    let result = IndexBuilder::new(&context)
        .mode(OpenMode::Open)
        .build(temp_dir.path(), &records, &mut events)
        .await;

    assert!(matches!(
        result,
        Err(FolioError::Conversion {
            status: ConversionStatus::Filename,
            ..
        })
    ));
    assert_eq!(events.len(), 1);

    let db = Database::open(temp_dir.path()).await?;
    assert_eq!(db.doc_count(), 1);
    assert_eq!(db.term_freq("fine"), 0);
    assert_eq!(db.term_freq("never"), 0);
    Ok(())
}

#[tokio::test]
async fn test_open_mode_appends_to_existing_index() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let context = default_context();
    let builder = IndexBuilder::new(&context);

    builder
        .build(
            temp_dir.path(),
            &[DocumentRecord::new("a").add_text("a").id_term("key-a")],
            &mut (),
        )
        .await?;
    let summary = builder
        .mode(OpenMode::CreateOrOpen)
        .build(
            temp_dir.path(),
            &[
                DocumentRecord::new("a2").add_text("a").id_term("key-a"),
                DocumentRecord::new("b").add_text("b"),
            ],
            &mut (),
        )
        .await?;
    assert_eq!(summary.doc_count, 2);

    let overwritten = builder
        .build(
            temp_dir.path(),
            &[DocumentRecord::new("c").add_text("c")],
            &mut (),
        )
        .await?;
    assert_eq!(overwritten.doc_count, 1);
    Ok(())
}
