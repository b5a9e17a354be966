use tempfile::TempDir;

use folio::{
    Database, DocumentRecord, OpenMode, TermGenerator, WritableDatabase, assemble_document,
};

async fn store(db: &mut WritableDatabase, record: &DocumentRecord) -> folio::Result<u64> {
    let doc = assemble_document(&TermGenerator::new(), None, record).await?;
    match record.key_term() {
        Some(term) => db.replace_document_by_term(&term, doc).await,
        None => db.add_document(doc).await,
    }
}

#[tokio::test]
async fn test_upsert_by_key_is_idempotent() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let mut db = WritableDatabase::open(temp_dir.path(), OpenMode::CreateOrOverwrite).await?;

    let first = DocumentRecord::new("version one")
        .add_text("alpha")
        .id_term("#key");
    let second = DocumentRecord::new("version two")
        .add_text("beta")
        .id_term("#key");

    let id1 = store(&mut db, &first).await?;
    let id2 = store(&mut db, &first).await?;
    let id3 = store(&mut db, &second).await?;
    db.commit().await?;

    assert_eq!(id1, id2);
    assert_eq!(id2, id3);
    assert_eq!(db.doc_count(), 1);
    assert_eq!(db.term_freq("Q#key"), 1);
    assert_eq!(db.term_freq("alpha"), 0);

    db.close().await?;
    let reader = Database::open(temp_dir.path()).await?;
    assert_eq!(reader.doc_count(), 1);
    assert_eq!(reader.document(id3)?.get_data().await?, "version two");
    Ok(())
}

#[tokio::test]
async fn test_keyless_records_always_insert() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let mut db = WritableDatabase::open(temp_dir.path(), OpenMode::CreateOrOverwrite).await?;

    let record = DocumentRecord::new("same").add_text("same text");
    let empty_key = DocumentRecord::new("same").add_text("same text").id_term("");

    for expected in 1..=3 {
        store(&mut db, &record).await?;
        assert_eq!(db.doc_count(), expected);
    }
    store(&mut db, &empty_key).await?;
    assert_eq!(db.doc_count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_key_never_matches_text_words() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let mut db = WritableDatabase::open(temp_dir.path(), OpenMode::CreateOrOverwrite).await?;

    let plain = store(&mut db, &DocumentRecord::new("plain").add_text("alpha beta")).await?;
    let keyed = store(
        &mut db,
        &DocumentRecord::new("keyed").add_text("gamma").id_term("alpha"),
    )
    .await?;
    db.commit().await?;

    assert_ne!(plain, keyed);
    assert_eq!(db.doc_count(), 2);
    assert_eq!(db.document(plain).map(|doc| doc.data()), Some("plain"));
    assert_eq!(db.term_freq("alpha"), 1);
    assert_eq!(db.term_freq("Qalpha"), 1);

    // Only the keyed document is replaced.
    store(
        &mut db,
        &DocumentRecord::new("keyed again").add_text("delta").id_term("alpha"),
    )
    .await?;
    db.close().await?;

    let reader = Database::open(temp_dir.path()).await?;
    assert_eq!(reader.doc_count(), 2);
    assert_eq!(reader.document(plain)?.get_data().await?, "plain");
    assert_eq!(reader.document(keyed)?.get_data().await?, "keyed again");
    Ok(())
}

#[tokio::test]
async fn test_empty_transaction_leaves_count_unchanged() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let mut db = WritableDatabase::open(temp_dir.path(), OpenMode::CreateOrOverwrite).await?;
    store(&mut db, &DocumentRecord::new("a").add_text("a")).await?;
    db.commit().await?;
    let generation = db.generation();

    db.begin_transaction(true).await?;
    db.commit_transaction().await?;

    assert_eq!(db.doc_count(), 1);
    assert_eq!(db.generation(), generation);
    assert_eq!(Database::open(temp_dir.path()).await?.doc_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_transaction_leaves_no_trace() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let mut db = WritableDatabase::open(temp_dir.path(), OpenMode::CreateOrOverwrite).await?;
    store(
        &mut db,
        &DocumentRecord::new("kept").add_text("kept").id_term("k1"),
    )
    .await?;
    db.commit().await?;

    db.begin_transaction(true).await?;
    store(&mut db, &DocumentRecord::new("gone").add_text("gone")).await?;
    let replaced = DocumentRecord::new("replaced").add_text("kept").id_term("k1");
    assert_eq!(store(&mut db, &replaced).await?, 1);
    assert_eq!(db.doc_count(), 2);
    db.cancel_transaction().await?;
    db.close().await?;

    let reader = Database::open(temp_dir.path()).await?;
    assert_eq!(reader.doc_count(), 1);
    assert_eq!(reader.term_freq("gone"), 0);
    assert_eq!(reader.document(1)?.get_data().await?, "kept");
    Ok(())
}

#[tokio::test]
async fn test_uncommitted_changes_are_invisible_to_readers() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let mut db = WritableDatabase::open(temp_dir.path(), OpenMode::CreateOrOverwrite).await?;
    store(&mut db, &DocumentRecord::new("pending").add_text("pending")).await?;

    let mut reader = Database::open(temp_dir.path()).await?;
    assert_eq!(reader.doc_count(), 0);

    db.commit().await?;
    reader.reopen().await?;
    assert_eq!(reader.doc_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_open_missing_index_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nothing-here");

    assert!(matches!(
        WritableDatabase::open(&missing, OpenMode::Open).await,
        Err(folio::FolioError::Io(_))
    ));
    assert!(matches!(
        Database::open(&missing).await,
        Err(folio::FolioError::Io(_))
    ));
}

#[tokio::test]
async fn test_overwrite_discards_corrupt_index() -> folio::Result<()> {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("manifest.json"), b"not json")?;

    assert!(Database::open(temp_dir.path()).await.is_err());

    let mut db = WritableDatabase::open(temp_dir.path(), OpenMode::CreateOrOverwrite).await?;
    assert_eq!(db.doc_count(), 0);
    store(&mut db, &DocumentRecord::new("fresh").add_text("fresh")).await?;
    db.close().await?;

    let reader = Database::open(temp_dir.path()).await?;
    assert_eq!(reader.doc_count(), 1);
    assert_eq!(reader.term_freq("fresh"), 1);
    Ok(())
}
