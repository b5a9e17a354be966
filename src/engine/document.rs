//! The indexable form of a document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A document ready to be submitted to a [`WritableDatabase`].
///
/// It carries the opaque stored payload (`data`), the terms to index with
/// their within-document frequencies, value slots, and the words collected
/// for the spelling dictionary.
///
/// [`WritableDatabase`]: crate::engine::WritableDatabase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    data: String,
    terms: BTreeMap<String, u32>,
    values: BTreeMap<u32, String>,
    #[serde(skip)]
    spelling: BTreeMap<String, u32>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Add `term`, increasing its within-document frequency by `wdf_inc`.
    pub fn add_term(&mut self, term: impl Into<String>, wdf_inc: u32) {
        *self.terms.entry(term.into()).or_insert(0) += wdf_inc;
    }

    /// Add a term that only filters and never contributes to the weight.
    pub fn add_boolean_term(&mut self, term: impl Into<String>) {
        self.terms.entry(term.into()).or_insert(0);
    }

    pub fn remove_term(&mut self, term: &str) -> bool {
        self.terms.remove(term).is_some()
    }

    pub fn term_wdf(&self, term: &str) -> Option<u32> {
        self.terms.get(term).copied()
    }

    pub fn terms(&self) -> &BTreeMap<String, u32> {
        &self.terms
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Sum of all within-document frequencies.
    pub fn length(&self) -> u32 {
        self.terms.values().sum()
    }

    pub fn add_value(&mut self, slot: u32, value: impl Into<String>) {
        self.values.insert(slot, value.into());
    }

    pub fn value(&self, slot: u32) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<u32, String> {
        &self.values
    }

    pub(crate) fn add_spelling(&mut self, word: &str) {
        *self.spelling.entry(word.to_string()).or_insert(0) += 1;
    }

    /// Words queued for the spelling dictionary, with their frequencies.
    pub fn spelling_words(&self) -> &BTreeMap<String, u32> {
        &self.spelling
    }
}
