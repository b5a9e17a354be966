//! Read-only indexes and merged views over them.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::engine::document::Document;
use crate::engine::generation;
use crate::engine::index::{TermIndex, suggest_spelling};
use crate::error::{FolioError, Result};
use crate::storage::{Storage, StorageConfig, StorageFactory};
use crate::util::id::{MAX_SHARDS, create_doc_id, get_local_id, get_shard_id};

/// Maximum edit distance for spelling suggestions.
pub const DEFAULT_SPELLING_DISTANCE: usize = 2;

/// One committed generation of one index, as seen by a reader.
#[derive(Debug)]
pub(crate) struct Shard {
    storage: Arc<dyn Storage>,
    generation: u64,
    docs_file: String,
    pub(crate) index: TermIndex,
}

impl Shard {
    fn load(storage: Arc<dyn Storage>) -> Result<Self> {
        let manifest = generation::read_manifest(storage.as_ref())?;
        let index = generation::read_term_index(storage.as_ref(), &manifest)?;
        Ok(Self {
            storage,
            generation: manifest.generation,
            docs_file: manifest.docs_file,
            index,
        })
    }
}

/// A read-only view over one or more committed indexes.
///
/// A freshly opened database holds a single index. [`add_database`]
/// appends the indexes of another view, after which queries see the
/// union. Documents keep distinct ids in the merged view: the upper bits
/// name the constituent index (see [`crate::util::id`]).
///
/// The view is a snapshot. Commits made after opening are picked up by
/// [`reopen`](Self::reopen).
///
/// [`add_database`]: Self::add_database
#[derive(Debug, Clone, Default)]
pub struct Database {
    shards: Vec<Arc<Shard>>,
}

impl Database {
    /// Open the committed index in the directory at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let config = StorageConfig::file(path.as_ref());
        let storage = tokio::task::spawn_blocking(move || StorageFactory::open(config)).await??;
        Self::open_with_storage(storage).await
    }

    pub async fn open_with_storage(storage: Arc<dyn Storage>) -> Result<Self> {
        let shard = tokio::task::spawn_blocking(move || Shard::load(storage)).await??;
        log::info!(
            "opened index generation {} with {} documents",
            shard.generation,
            shard.index.doc_count()
        );
        Ok(Self {
            shards: vec![Arc::new(shard)],
        })
    }

    /// Append the indexes of `other` to this view.
    ///
    /// Pure composition: no I/O happens here.
    pub fn add_database(&mut self, other: &Database) -> Result<()> {
        if self.shards.len() + other.shards.len() > MAX_SHARDS {
            return Err(FolioError::invalid_argument(format!(
                "a merged view holds at most {MAX_SHARDS} indexes"
            )));
        }
        self.shards.extend(other.shards.iter().cloned());
        Ok(())
    }

    /// Re-read the latest committed generation of every constituent.
    pub async fn reopen(&mut self) -> Result<()> {
        let storages: Vec<_> = self
            .shards
            .iter()
            .map(|shard| Arc::clone(&shard.storage))
            .collect();
        let shards = tokio::task::spawn_blocking(move || {
            storages
                .into_iter()
                .map(|storage| Shard::load(storage).map(Arc::new))
                .collect::<Result<Vec<_>>>()
        })
        .await??;
        self.shards = shards;
        Ok(())
    }

    /// Number of constituent indexes.
    pub fn index_count(&self) -> usize {
        self.shards.len()
    }

    pub fn doc_count(&self) -> u64 {
        self.shards.iter().map(|s| s.index.doc_count()).sum()
    }

    pub fn term_freq(&self, term: &str) -> u64 {
        self.shards.iter().map(|s| s.index.term_freq(term)).sum()
    }

    /// Sum of all document lengths.
    pub fn total_length(&self) -> u64 {
        self.shards.iter().map(|s| s.index.total_length()).sum()
    }

    /// The most likely intended word for `word`, drawn from the spelling
    /// dictionaries of every constituent.
    pub fn spelling_suggestion(&self, word: &str) -> Option<String> {
        self.spelling_suggestion_within(word, DEFAULT_SPELLING_DISTANCE)
    }

    pub fn spelling_suggestion_within(&self, word: &str, max_distance: usize) -> Option<String> {
        let dictionary = match self.shards.as_slice() {
            [single] => return suggest_spelling(single.index.spelling(), word, max_distance),
            shards => {
                let mut merged = BTreeMap::new();
                for shard in shards {
                    for (w, freq) in shard.index.spelling() {
                        *merged.entry(w.clone()).or_insert(0) += freq;
                    }
                }
                merged
            }
        };
        suggest_spelling(&dictionary, word, max_distance)
    }

    /// A handle to the document with merged-view id `docid`.
    pub fn document(&self, docid: u64) -> Result<DocumentHandle> {
        let shard = self
            .shards
            .get(get_shard_id(docid) as usize)
            .ok_or_else(|| FolioError::invalid_argument(format!("document {docid} not found")))?;
        let local_id = get_local_id(docid);
        if shard.index.doc_length(local_id).is_none() {
            return Err(FolioError::invalid_argument(format!(
                "document {docid} not found"
            )));
        }
        Ok(DocumentHandle {
            shard: Arc::clone(shard),
            docid,
            local_id,
        })
    }

    pub(crate) fn shards(&self) -> &[Arc<Shard>] {
        &self.shards
    }

    pub(crate) fn handle(&self, shard_id: usize, local_id: u64) -> DocumentHandle {
        DocumentHandle {
            shard: Arc::clone(&self.shards[shard_id]),
            docid: create_doc_id(shard_id as u16, local_id),
            local_id,
        }
    }
}

/// Lazy reference to a stored document.
///
/// Holding a handle costs nothing; the payload is read only when
/// [`get_data`](Self::get_data) or [`get_document`](Self::get_document) is
/// awaited.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    shard: Arc<Shard>,
    docid: u64,
    local_id: u64,
}

impl DocumentHandle {
    /// Id in the merged view.
    pub fn docid(&self) -> u64 {
        self.docid
    }

    /// Value slot content, served from the loaded index.
    pub fn value(&self, slot: u32) -> Option<&str> {
        self.shard.index.value(slot, self.local_id)
    }

    /// Fetch the stored payload.
    pub async fn get_data(&self) -> Result<String> {
        Ok(self.get_document().await?.data().to_string())
    }

    /// Fetch the whole stored document.
    pub async fn get_document(&self) -> Result<Document> {
        let shard = Arc::clone(&self.shard);
        let local_id = self.local_id;
        tokio::task::spawn_blocking(move || {
            generation::find_document(shard.storage.as_ref(), &shard.docs_file, local_id)
        })
        .await?
    }
}
