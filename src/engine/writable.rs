//! Writable index: document changes, commits and transactions.

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::config::IndexConfig;
use crate::engine::document::Document;
use crate::engine::generation::{self, EncodedGeneration};
use crate::engine::index::IndexState;
use crate::error::{FolioError, Result};
use crate::storage::{FileStorageConfig, Storage, StorageConfig, StorageFactory};

/// Number of uncommitted changes after which a writer commits on its own.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 10_000;

/// How [`WritableDatabase::open`] treats an existing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Start empty, discarding any existing content.
    CreateOrOverwrite,
    /// Open the existing index, or create an empty one.
    #[default]
    CreateOrOpen,
    /// Create a new index; fail if one exists.
    Create,
    /// Open an existing index; fail if there is none.
    Open,
}

#[derive(Debug)]
struct Transaction {
    base: IndexState,
    base_pending: usize,
}

/// A writable index.
///
/// Changes accumulate in memory and become visible to readers when they
/// are committed. Inside a transaction nothing is committed until
/// [`commit_transaction`](Self::commit_transaction); cancelling or a failed
/// commit restores the state from before the transaction began.
///
/// Every mutating method takes `&mut self`, so a writer cannot be asked to
/// do two things at once.
#[derive(Debug)]
pub struct WritableDatabase {
    storage: Arc<dyn Storage>,
    generation: u64,
    state: IndexState,
    transaction: Option<Transaction>,
    pending: usize,
    flush_threshold: usize,
}

impl WritableDatabase {
    /// Open the index directory at `path`.
    pub async fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Self::open_with_config(path, mode, &IndexConfig::default()).await
    }

    /// Open the index directory at `path` with explicit write settings.
    pub async fn open_with_config(
        path: impl AsRef<Path>,
        mode: OpenMode,
        config: &IndexConfig,
    ) -> Result<Self> {
        let storage_config = StorageConfig::File(FileStorageConfig {
            path: path.as_ref().to_path_buf(),
            sync_writes: config.sync_writes,
        });
        let storage = tokio::task::spawn_blocking(move || match mode {
            OpenMode::Open => StorageFactory::open(storage_config),
            _ => StorageFactory::create(storage_config),
        })
        .await??;

        let mut db = Self::open_with_storage(storage, mode).await?;
        db.set_flush_threshold(config.flush_threshold);
        Ok(db)
    }

    /// Open an index held in `storage`.
    pub async fn open_with_storage(storage: Arc<dyn Storage>, mode: OpenMode) -> Result<Self> {
        let task_storage = Arc::clone(&storage);
        let (generation, state) =
            tokio::task::spawn_blocking(move || load_for_mode(task_storage.as_ref(), mode))
                .await??;

        log::info!(
            "opened writable index at generation {generation} with {} documents ({mode:?})",
            state.doc_count()
        );

        Ok(Self {
            storage,
            generation,
            state,
            transaction: None,
            pending: 0,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        })
    }

    /// Commit automatically after this many changes outside a transaction.
    /// Zero disables automatic commits.
    pub fn set_flush_threshold(&mut self, threshold: usize) {
        self.flush_threshold = threshold;
    }

    pub fn doc_count(&self) -> u64 {
        self.state.doc_count()
    }

    /// Number of documents indexed by `term`, including uncommitted changes.
    pub fn term_freq(&self, term: &str) -> u64 {
        self.state.index.term_freq(term)
    }

    pub fn document(&self, docid: u64) -> Option<&Document> {
        self.state.document(docid)
    }

    /// Generation of the last successful commit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Whether there are changes that have not been committed.
    pub fn has_pending_changes(&self) -> bool {
        self.pending > 0
    }

    /// Start a transaction.
    ///
    /// With `flushed`, pending changes are committed first and the
    /// transaction is committed on its own. Without it, pending changes
    /// become part of the transaction's commit, but only the changes made
    /// inside the transaction are undone by a cancel.
    pub async fn begin_transaction(&mut self, flushed: bool) -> Result<()> {
        if self.transaction.is_some() {
            return Err(FolioError::transaction("a transaction is already open"));
        }
        if flushed && self.pending > 0 {
            self.write_commit().await?;
        }
        self.transaction = Some(Transaction {
            base: self.state.clone(),
            base_pending: self.pending,
        });
        log::debug!("transaction started (flushed: {flushed})");
        Ok(())
    }

    /// Commit everything and end the transaction.
    ///
    /// On failure the changes made inside the transaction are discarded
    /// and the transaction is closed.
    pub async fn commit_transaction(&mut self) -> Result<()> {
        let Some(transaction) = self.transaction.take() else {
            return Err(FolioError::transaction("no transaction is open"));
        };

        if self.pending == 0 {
            log::debug!("empty transaction committed");
            return Ok(());
        }

        if let Err(err) = self.write_commit().await {
            log::warn!("transaction commit failed, discarding its changes: {err}");
            self.state = transaction.base;
            self.pending = transaction.base_pending;
            return Err(err);
        }
        Ok(())
    }

    /// Discard the changes made inside the transaction and end it.
    pub async fn cancel_transaction(&mut self) -> Result<()> {
        let Some(transaction) = self.transaction.take() else {
            return Err(FolioError::transaction("no transaction is open"));
        };
        log::warn!(
            "transaction cancelled, discarding {} change(s)",
            self.pending - transaction.base_pending
        );
        self.state = transaction.base;
        self.pending = transaction.base_pending;
        Ok(())
    }

    /// Commit pending changes. Not allowed inside a transaction.
    pub async fn commit(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(FolioError::transaction(
                "commit inside a transaction; use commit_transaction",
            ));
        }
        if self.pending == 0 {
            return Ok(());
        }
        self.write_commit().await
    }

    /// Add a document under a new id. Returns the id.
    pub async fn add_document(&mut self, doc: Document) -> Result<u64> {
        let docid = self.state.add_document(doc)?;
        log::debug!("added document {docid}");
        self.changed().await?;
        Ok(docid)
    }

    /// Replace every document indexed by `term` with `doc`.
    ///
    /// The new document takes the lowest of the replaced ids, or a new id
    /// when nothing matched. Returns the id. Record keys are looked up by
    /// their [`DocumentRecord::key_term`](crate::data::DocumentRecord::key_term).
    pub async fn replace_document_by_term(&mut self, term: &str, doc: Document) -> Result<u64> {
        if term.is_empty() {
            return Err(FolioError::invalid_argument("empty unique term"));
        }

        let matches = self.state.docids_for_term(term);
        let docid = match matches.split_first() {
            Some((&first, rest)) => {
                for &docid in rest {
                    self.state.delete_document(docid);
                }
                self.state.replace_document(first, doc)?;
                log::debug!(
                    "replaced document {first} by term {term:?} ({} duplicate(s) removed)",
                    rest.len()
                );
                first
            }
            None => {
                let docid = self.state.add_document(doc)?;
                log::debug!("added document {docid} under term {term:?}");
                docid
            }
        };

        self.changed().await?;
        Ok(docid)
    }

    /// Store `doc` under `docid`, replacing any document already there.
    pub async fn replace_document(&mut self, docid: u64, doc: Document) -> Result<()> {
        self.state.replace_document(docid, doc)?;
        self.changed().await
    }

    pub async fn delete_document(&mut self, docid: u64) -> Result<()> {
        if !self.state.delete_document(docid) {
            return Err(FolioError::document(format!("document {docid} not found")));
        }
        self.changed().await
    }

    /// Delete every document indexed by `term`. Returns how many went.
    pub async fn delete_documents_by_term(&mut self, term: &str) -> Result<usize> {
        let matches = self.state.docids_for_term(term);
        for &docid in &matches {
            self.state.delete_document(docid);
        }
        if !matches.is_empty() {
            self.changed().await?;
        }
        Ok(matches.len())
    }

    /// Cancel any open transaction, commit pending changes and release the index.
    pub async fn close(mut self) -> Result<()> {
        if self.transaction.is_some() {
            self.cancel_transaction().await?;
        }
        self.commit().await?;
        log::info!("closed writable index at generation {}", self.generation);
        Ok(())
    }

    async fn changed(&mut self) -> Result<()> {
        self.pending += 1;
        if self.transaction.is_none()
            && self.flush_threshold > 0
            && self.pending >= self.flush_threshold
        {
            log::debug!("{} pending changes, committing", self.pending);
            self.write_commit().await?;
        }
        Ok(())
    }

    async fn write_commit(&mut self) -> Result<()> {
        let generation = self.generation + 1;
        let encoded = EncodedGeneration::encode(generation, &self.state)?;
        let storage = Arc::clone(&self.storage);
        let cleanup = tokio::task::spawn_blocking(move || {
            generation::write_generation(storage.as_ref(), &encoded)?;
            Ok::<_, FolioError>(generation::remove_stale_generations(
                storage.as_ref(),
                generation,
            ))
        })
        .await??;

        // The manifest is published: the commit stands whatever cleanup did.
        self.generation = generation;
        self.pending = 0;
        log::info!(
            "committed generation {generation} ({} documents)",
            self.state.doc_count()
        );
        if let Err(err) = cleanup {
            log::warn!("could not remove stale generations: {err}");
        }
        Ok(())
    }
}

fn load_for_mode(storage: &dyn Storage, mode: OpenMode) -> Result<(u64, IndexState)> {
    let exists = generation::has_manifest(storage);

    match mode {
        OpenMode::Open | OpenMode::CreateOrOpen if exists => {
            let manifest = generation::read_manifest(storage)?;
            let state = generation::read_state(storage, &manifest)?;
            Ok((manifest.generation, state))
        }
        OpenMode::Open => Err(FolioError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "no index to open",
        ))),
        OpenMode::Create if exists => Err(FolioError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "an index already exists",
        ))),
        _ => {
            let previous = match generation::read_manifest(storage) {
                Ok(manifest) => manifest.generation,
                Err(err) => {
                    if exists {
                        log::warn!("overwriting unreadable index: {err}");
                    }
                    generation::latest_generation_file(storage)?
                }
            };
            let generation = previous + 1;
            let state = IndexState::default();
            let encoded = EncodedGeneration::encode(generation, &state)?;
            generation::write_generation(storage, &encoded)?;
            if let Err(err) = generation::remove_stale_generations(storage, generation) {
                log::warn!("could not remove stale generations: {err}");
            }
            Ok((generation, state))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Database;
    use crate::storage::{MemoryStorage, MemoryStorageConfig};

    fn doc(data: &str, term: &str) -> Document {
        let mut doc = Document::new();
        doc.set_data(data);
        doc.add_term(term, 1);
        doc
    }

    async fn memory_db() -> (MemoryStorage, WritableDatabase) {
        let storage = MemoryStorage::default();
        let db = WritableDatabase::open_with_storage(
            Arc::new(storage.clone()),
            OpenMode::CreateOrOverwrite,
        )
        .await
        .unwrap();
        (storage, db)
    }

    #[tokio::test]
    async fn test_transaction_state_errors() {
        let (_, mut db) = memory_db().await;

        assert!(matches!(
            db.commit_transaction().await,
            Err(FolioError::Transaction(_))
        ));
        db.begin_transaction(true).await.unwrap();
        assert!(matches!(
            db.begin_transaction(false).await,
            Err(FolioError::Transaction(_))
        ));
        assert!(matches!(db.commit().await, Err(FolioError::Transaction(_))));
        db.cancel_transaction().await.unwrap();
        assert!(!db.in_transaction());
    }

    #[tokio::test]
    async fn test_unflushed_cancel_keeps_earlier_changes() {
        let (_, mut db) = memory_db().await;
        db.add_document(doc("before", "a")).await.unwrap();

        db.begin_transaction(false).await.unwrap();
        db.add_document(doc("inside", "b")).await.unwrap();
        db.cancel_transaction().await.unwrap();

        assert_eq!(db.doc_count(), 1);
        assert!(db.has_pending_changes());
        assert_eq!(db.term_freq("b"), 0);
    }

    #[tokio::test]
    async fn test_replace_by_term_collapses_duplicates() {
        let (_, mut db) = memory_db().await;
        db.add_document(doc("one", "key")).await.unwrap();
        db.add_document(doc("two", "key")).await.unwrap();

        let docid = db
            .replace_document_by_term("key", doc("three", "key"))
            .await
            .unwrap();
        assert_eq!(docid, 1);
        assert_eq!(db.doc_count(), 1);
        assert_eq!(db.document(1).unwrap().data(), "three");

        assert!(matches!(
            db.replace_document_by_term("", Document::new()).await,
            Err(FolioError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_auto_flush_commits() {
        let (storage, mut db) = memory_db().await;
        db.set_flush_threshold(2);
        let start = db.generation();

        db.add_document(doc("a", "a")).await.unwrap();
        assert_eq!(db.generation(), start);
        db.add_document(doc("b", "b")).await.unwrap();
        assert_eq!(db.generation(), start + 1);
        assert!(!db.has_pending_changes());

        let manifest = generation::read_manifest(&storage).unwrap();
        assert_eq!(manifest.doc_count, 2);
    }

    #[tokio::test]
    async fn test_failed_commit_discards_transaction() {
        let storage = MemoryStorage::default();
        let mut db = WritableDatabase::open_with_storage(
            Arc::new(storage.clone()),
            OpenMode::CreateOrOverwrite,
        )
        .await
        .unwrap();
        db.add_document(doc("kept", "k")).await.unwrap();
        db.commit().await.unwrap();

        // Swap in a storage that refuses writes, sharing nothing with the first.
        db.storage = Arc::new(MemoryStorage::new(MemoryStorageConfig {
            fail_writes: Some(io::ErrorKind::PermissionDenied),
            ..Default::default()
        }));
        db.begin_transaction(true).await.unwrap();
        db.add_document(doc("lost", "l")).await.unwrap();
        assert!(matches!(db.commit_transaction().await, Err(FolioError::Io(_))));

        assert!(!db.in_transaction());
        assert_eq!(db.doc_count(), 1);
        assert_eq!(db.term_freq("l"), 0);
        assert_eq!(
            generation::read_manifest(&storage).unwrap().doc_count,
            1
        );
    }

    #[tokio::test]
    async fn test_commit_stands_when_cleanup_fails() {
        let storage = MemoryStorage::new(MemoryStorageConfig {
            fail_deletes: Some(io::ErrorKind::PermissionDenied),
            ..Default::default()
        });
        let mut db = WritableDatabase::open_with_storage(
            Arc::new(storage.clone()),
            OpenMode::CreateOrOverwrite,
        )
        .await
        .unwrap();
        let start = db.generation();

        // The third commit is the first that has a stale generation to delete.
        for (i, term) in ["a", "b", "c"].into_iter().enumerate() {
            db.begin_transaction(true).await.unwrap();
            db.add_document(doc(term, term)).await.unwrap();
            db.commit_transaction().await.unwrap();
            assert_eq!(db.generation(), start + i as u64 + 1);
        }

        assert_eq!(db.doc_count(), 3);
        assert!(!db.has_pending_changes());
        let manifest = generation::read_manifest(&storage).unwrap();
        assert_eq!(manifest.generation, db.generation());
        assert_eq!(manifest.doc_count, 3);
        assert!(storage.file_exists("terms_000001.json"));

        db.add_document(doc("d", "d")).await.unwrap();
        db.commit().await.unwrap();
        let reader = Database::open_with_storage(Arc::new(storage)).await.unwrap();
        assert_eq!(reader.doc_count(), 4);
        assert_eq!(reader.term_freq("c"), 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_unreadable_index() {
        let storage = MemoryStorage::default();
        for (name, bytes) in [
            (generation::MANIFEST_FILE, b"not json".as_slice()),
            ("terms_000004.json", b"{}".as_slice()),
        ] {
            let mut out = storage.create_output(name).unwrap();
            io::Write::write_all(&mut out, bytes).unwrap();
            out.flush_and_sync().unwrap();
        }

        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        assert!(
            WritableDatabase::open_with_storage(Arc::clone(&shared), OpenMode::Open)
                .await
                .is_err()
        );

        let mut db = WritableDatabase::open_with_storage(shared, OpenMode::CreateOrOverwrite)
            .await
            .unwrap();
        assert_eq!(db.generation(), 5);
        assert_eq!(db.doc_count(), 0);

        db.add_document(doc("fresh", "fresh")).await.unwrap();
        db.close().await.unwrap();
        assert_eq!(generation::read_manifest(&storage).unwrap().doc_count, 1);
    }

    #[tokio::test]
    async fn test_open_modes() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::default());

        assert!(matches!(
            WritableDatabase::open_with_storage(Arc::clone(&storage), OpenMode::Open).await,
            Err(FolioError::Io(_))
        ));

        let mut db = WritableDatabase::open_with_storage(Arc::clone(&storage), OpenMode::Create)
            .await
            .unwrap();
        db.add_document(doc("a", "a")).await.unwrap();
        db.close().await.unwrap();

        assert!(matches!(
            WritableDatabase::open_with_storage(Arc::clone(&storage), OpenMode::Create).await,
            Err(FolioError::Io(_))
        ));

        let db = WritableDatabase::open_with_storage(Arc::clone(&storage), OpenMode::Open)
            .await
            .unwrap();
        assert_eq!(db.doc_count(), 1);

        let db = WritableDatabase::open_with_storage(storage, OpenMode::CreateOrOverwrite)
            .await
            .unwrap();
        assert_eq!(db.doc_count(), 0);
    }
}
