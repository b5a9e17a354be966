//! The build phase: records in, committed index out.
//!
//! ```text
//! DocumentRecord ─ assemble_document ─▶ Document ─┬─ key?  replace_document_by_term
//!                                                 └─ else  add_document
//! ```
//!
//! Records are processed strictly in order. Each one is fully stored before
//! the next is started and before its [`IndexEvent::DocumentIndexed`] is
//! delivered, so observers see events in submission order.

use std::path::Path;

use async_trait::async_trait;

use crate::analysis::TermGenerator;
use crate::config::{FolioConfig, IndexConfig};
use crate::convert::MimeConverter;
use crate::data::DocumentRecord;
use crate::engine::{Document, OpenMode, WritableDatabase, assemble_document};
use crate::error::Result;

/// Progress notifications from an [`IndexBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    /// The record at `position` was stored under `docid`.
    DocumentIndexed {
        position: usize,
        docid: u64,
        data: String,
    },
    /// All records were committed.
    Committed { documents: usize, doc_count: u64 },
}

/// Receives [`IndexEvent`]s, one at a time, in order.
#[async_trait]
pub trait IndexObserver: Send {
    async fn on_event(&mut self, event: IndexEvent);
}

#[async_trait]
impl IndexObserver for () {
    async fn on_event(&mut self, _event: IndexEvent) {}
}

#[async_trait]
impl IndexObserver for Vec<IndexEvent> {
    async fn on_event(&mut self, event: IndexEvent) {
        self.push(event);
    }
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Records stored by this build.
    pub indexed: usize,
    /// Documents in the index after the commit.
    pub doc_count: u64,
    /// Generation written by the commit.
    pub generation: u64,
}

/// Everything a build needs besides the records: how to turn text into
/// terms, how to convert files, and how to write the index.
///
/// A context is created once and passed by reference to each build.
#[derive(Debug, Clone)]
pub struct IndexContext {
    generator: TermGenerator,
    converter: MimeConverter,
    index: IndexConfig,
}

impl IndexContext {
    pub fn new(generator: TermGenerator, converter: MimeConverter) -> Self {
        Self {
            generator,
            converter,
            index: IndexConfig::default(),
        }
    }

    pub fn from_config(config: &FolioConfig) -> Result<Self> {
        Ok(Self {
            generator: config.term_generator()?,
            converter: config.converter(),
            index: config.index.clone(),
        })
    }

    pub fn generator(&self) -> &TermGenerator {
        &self.generator
    }

    pub fn converter(&self) -> &MimeConverter {
        &self.converter
    }

    pub fn index_config(&self) -> &IndexConfig {
        &self.index
    }

    /// Build the indexable form of `record`.
    pub async fn assemble(&self, record: &DocumentRecord) -> Result<Document> {
        assemble_document(&self.generator, Some(&self.converter), record).await
    }
}

/// Feeds records into a writable index.
///
/// By default a build runs inside one flushed transaction: either every
/// record becomes visible or none does. Any failure stops the build,
/// cancels the transaction and is returned as is.
#[derive(Debug, Clone, Copy)]
pub struct IndexBuilder<'a> {
    context: &'a IndexContext,
    mode: OpenMode,
    transactional: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(context: &'a IndexContext) -> Self {
        Self {
            context,
            mode: OpenMode::CreateOrOverwrite,
            transactional: true,
        }
    }

    /// How [`build`](Self::build) opens the index.
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run the build inside a transaction (the default).
    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    /// Open the index at `path`, store `records`, commit and close.
    pub async fn build(
        &self,
        path: impl AsRef<Path>,
        records: &[DocumentRecord],
        observer: &mut dyn IndexObserver,
    ) -> Result<BuildSummary> {
        let mut db =
            WritableDatabase::open_with_config(path, self.mode, self.context.index_config())
                .await?;
        let summary = self.build_into(&mut db, records, observer).await?;
        db.close().await?;
        Ok(summary)
    }

    /// Store `records` in an already open index and commit.
    pub async fn build_into(
        &self,
        db: &mut WritableDatabase,
        records: &[DocumentRecord],
        observer: &mut dyn IndexObserver,
    ) -> Result<BuildSummary> {
        if self.transactional {
            db.begin_transaction(true).await?;
        }

        for (position, record) in records.iter().enumerate() {
            let docid = match self.store(db, record).await {
                Ok(docid) => docid,
                Err(err) => {
                    log::error!("indexing stopped at record {position}: {err}");
                    if self.transactional
                        && let Err(cancel_err) = db.cancel_transaction().await
                    {
                        log::warn!("could not cancel transaction: {cancel_err}");
                    }
                    return Err(err);
                }
            };

            observer
                .on_event(IndexEvent::DocumentIndexed {
                    position,
                    docid,
                    data: record.data.clone(),
                })
                .await;
        }

        if self.transactional {
            db.commit_transaction().await?;
        } else {
            db.commit().await?;
        }

        let summary = BuildSummary {
            indexed: records.len(),
            doc_count: db.doc_count(),
            generation: db.generation(),
        };
        log::info!(
            "indexed {} record(s), index now holds {} document(s)",
            summary.indexed,
            summary.doc_count
        );
        observer
            .on_event(IndexEvent::Committed {
                documents: summary.indexed,
                doc_count: summary.doc_count,
            })
            .await;
        Ok(summary)
    }

    async fn store(&self, db: &mut WritableDatabase, record: &DocumentRecord) -> Result<u64> {
        let doc = self.context.assemble(record).await?;
        match record.key_term() {
            Some(term) => db.replace_document_by_term(&term, doc).await,
            None => db.add_document(doc).await,
        }
    }
}
