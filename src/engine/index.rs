//! In-memory inverted index for one generation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::document::Document;
use crate::error::{FolioError, Result};
use crate::util::id::MAX_LOCAL_ID;
use crate::util::levenshtein::bounded_distance;

/// Term statistics, value slots and spelling data of one index.
///
/// Document payloads are not held here; they live in the generation's
/// document file and are fetched on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermIndex {
    /// term → (docid → wdf)
    postings: BTreeMap<String, BTreeMap<u64, u32>>,
    /// docid → document length (sum of wdf)
    doc_lengths: BTreeMap<u64, u32>,
    /// slot → (docid → value)
    values: BTreeMap<u32, BTreeMap<u64, String>>,
    /// word → frequency
    spelling: BTreeMap<String, u32>,
    total_length: u64,
}

impl TermIndex {
    pub fn doc_count(&self) -> u64 {
        self.doc_lengths.len() as u64
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Number of documents indexed by `term`.
    pub fn term_freq(&self, term: &str) -> u64 {
        self.postings.get(term).map_or(0, |list| list.len() as u64)
    }

    pub fn postings(&self, term: &str) -> Option<&BTreeMap<u64, u32>> {
        self.postings.get(term)
    }

    pub fn doc_length(&self, docid: u64) -> Option<u32> {
        self.doc_lengths.get(&docid).copied()
    }

    pub fn docids(&self) -> impl Iterator<Item = u64> + '_ {
        self.doc_lengths.keys().copied()
    }

    pub fn value(&self, slot: u32, docid: u64) -> Option<&str> {
        self.values
            .get(&slot)
            .and_then(|slot| slot.get(&docid))
            .map(String::as_str)
    }

    pub fn spelling(&self) -> &BTreeMap<String, u32> {
        &self.spelling
    }

    fn insert(&mut self, docid: u64, doc: &Document) {
        for (term, wdf) in doc.terms() {
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(docid, *wdf);
        }
        for (slot, value) in doc.values() {
            self.values
                .entry(*slot)
                .or_default()
                .insert(docid, value.clone());
        }
        for (word, freq) in doc.spelling_words() {
            *self.spelling.entry(word.clone()).or_insert(0) += freq;
        }
        let length = doc.length();
        self.doc_lengths.insert(docid, length);
        self.total_length += u64::from(length);
    }

    fn remove(&mut self, docid: u64, doc: &Document) {
        for term in doc.terms().keys() {
            if let Some(list) = self.postings.get_mut(term) {
                list.remove(&docid);
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        for slot in doc.values().keys() {
            if let Some(values) = self.values.get_mut(slot) {
                values.remove(&docid);
                if values.is_empty() {
                    self.values.remove(slot);
                }
            }
        }
        if let Some(length) = self.doc_lengths.remove(&docid) {
            self.total_length -= u64::from(length);
        }
    }
}

/// Suggest the best correction for `word` from a spelling dictionary.
///
/// Candidates within `max_distance` edits are ranked by distance, then by
/// frequency. A word already in the dictionary gets no suggestion.
pub fn suggest_spelling(
    dictionary: &BTreeMap<String, u32>,
    word: &str,
    max_distance: usize,
) -> Option<String> {
    let word = word.to_lowercase();
    if word.is_empty() || dictionary.contains_key(&word) {
        return None;
    }

    dictionary
        .iter()
        .filter_map(|(candidate, freq)| {
            let distance = bounded_distance(&word, candidate, max_distance);
            (distance <= max_distance).then_some((distance, *freq, candidate))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(b.2)))
        .map(|(_, _, candidate)| candidate.clone())
}

/// The full mutable state of a writable index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexState {
    pub(crate) index: TermIndex,
    pub(crate) documents: BTreeMap<u64, Document>,
    pub(crate) next_doc_id: u64,
}

impl Default for IndexState {
    fn default() -> Self {
        Self {
            index: TermIndex::default(),
            documents: BTreeMap::new(),
            next_doc_id: 1,
        }
    }
}

impl IndexState {
    pub fn doc_count(&self) -> u64 {
        self.index.doc_count()
    }

    pub fn add_document(&mut self, doc: Document) -> Result<u64> {
        let docid = self.next_doc_id;
        if docid > MAX_LOCAL_ID {
            return Err(FolioError::document(format!(
                "document id space exhausted at {docid}"
            )));
        }
        self.next_doc_id += 1;
        self.index.insert(docid, &doc);
        self.documents.insert(docid, doc);
        Ok(docid)
    }

    /// Store `doc` under `docid`, replacing whatever was there.
    pub fn replace_document(&mut self, docid: u64, doc: Document) -> Result<()> {
        if docid == 0 || docid > MAX_LOCAL_ID {
            return Err(FolioError::invalid_argument(format!(
                "document id {docid} out of range"
            )));
        }
        self.delete_document(docid);
        self.index.insert(docid, &doc);
        self.documents.insert(docid, doc);
        if docid >= self.next_doc_id {
            self.next_doc_id = docid + 1;
        }
        Ok(())
    }

    pub fn delete_document(&mut self, docid: u64) -> bool {
        match self.documents.remove(&docid) {
            Some(old) => {
                self.index.remove(docid, &old);
                true
            }
            None => false,
        }
    }

    /// Ids of the documents indexed by `term`, ascending.
    pub fn docids_for_term(&self, term: &str) -> Vec<u64> {
        self.index
            .postings(term)
            .map(|list| list.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn document(&self, docid: u64) -> Option<&Document> {
        self.documents.get(&docid)
    }
}
