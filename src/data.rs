//! Document records: what a caller submits to the build phase.
//!
//! A [`DocumentRecord`] is the plain description of one document: its
//! stored payload, free-text fields, optional stable key, per-field term
//! limits, value slots and an optional source file to convert. It
//! deserializes from JSON of this shape:
//!
//! ```json
//! { "data": "doc one", "text": ["text one two three"], "terms": {"max": 1},
//!   "values": {"1": "stuff"}, "id_term": "#dk83ndj" }
//! ```
//!
//! [`assemble_document`](crate::engine::assemble_document) turns a record
//! into an indexable [`Document`](crate::engine::Document).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analysis::{KEY_PREFIX, TermLimits};

/// A file whose converted text is indexed alongside a record's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// MIME type, or an extension starting with `.`; guessed from the path when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One document as submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Opaque stored payload returned by result handles.
    #[serde(default)]
    pub data: String,

    /// Free-text fields to index.
    #[serde(default)]
    pub text: Vec<String>,

    /// Stable external key. A record with a key replaces every document
    /// already indexed under it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_term: Option<String>,

    /// Term-count limits applied to each text field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<TermLimits>,

    /// Value slots (slot number → value).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<u32, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<SourceFile>,
}

impl DocumentRecord {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Add a text field.
    pub fn add_text(mut self, text: impl Into<String>) -> Self {
        self.text.push(text.into());
        self
    }

    pub fn id_term(mut self, term: impl Into<String>) -> Self {
        self.id_term = Some(term.into());
        self
    }

    pub fn term_limits(mut self, limits: TermLimits) -> Self {
        self.terms = Some(limits);
        self
    }

    pub fn value(mut self, slot: u32, value: impl Into<String>) -> Self {
        self.values.insert(slot, value.into());
        self
    }

    pub fn source_file(mut self, path: impl Into<PathBuf>, mime_type: Option<&str>) -> Self {
        self.file = Some(SourceFile {
            path: path.into(),
            mime_type: mime_type.map(str::to_string),
        });
        self
    }

    /// The key to upsert under, if any. An empty key counts as none.
    pub fn key(&self) -> Option<&str> {
        self.id_term.as_deref().filter(|term| !term.is_empty())
    }

    /// The term the key is indexed under, carrying [`KEY_PREFIX`].
    pub fn key_term(&self) -> Option<String> {
        self.key().map(|key| format!("{KEY_PREFIX}{key}"))
    }
}
