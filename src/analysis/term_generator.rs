//! Term generation from free text.

use std::ops::BitOr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::stem::Stem;
use crate::analysis::{MAX_TERM_LENGTH, STEM_PREFIX};
use crate::engine::document::Document;

/// Behaviour switches for a [`TermGenerator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Record every indexed word in the index's spelling dictionary.
    pub const SPELLING: Flags = Flags(1);

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Per-field controls on how many words get indexed.
///
/// - `min`: a field with fewer words than this is not indexed at all.
/// - `max`: indexing stops after this many words of the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl TermLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Number of the field's `word_count` words that should be indexed.
    pub fn indexed_count(&self, word_count: usize) -> usize {
        if self.min.is_some_and(|min| word_count < min) {
            return 0;
        }
        match self.max {
            Some(max) => word_count.min(max),
            None => word_count,
        }
    }
}

/// Extracts normalized terms from text and adds them to a [`Document`].
///
/// A generator holds only configuration. Spelling data is collected on the
/// document and folded into the index when the document is submitted, so
/// one generator can feed any number of indexes.
#[derive(Debug, Clone)]
pub struct TermGenerator {
    stemmer: Stem,
    flags: Flags,
}

impl TermGenerator {
    /// A generator without stemming or flags.
    pub fn new() -> Self {
        Self {
            stemmer: Stem::none(),
            flags: Flags::NONE,
        }
    }

    pub fn with_stemmer(stemmer: Stem) -> Self {
        Self {
            stemmer,
            flags: Flags::NONE,
        }
    }

    pub fn set_stemmer(&mut self, stemmer: Stem) {
        self.stemmer = stemmer;
    }

    pub fn stemmer(&self) -> &Stem {
        &self.stemmer
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Split `text` into normalized words (NFKC, lower case).
    pub fn words(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|word| word.nfkc().collect::<String>().to_lowercase())
            .filter(|word| !word.is_empty() && word.len() <= MAX_TERM_LENGTH)
            .collect()
    }

    /// Index every word of `text`. Returns the number of words indexed.
    pub fn index_text(&self, doc: &mut Document, text: &str) -> usize {
        self.index_text_with_limits(doc, text, &TermLimits::default())
    }

    /// Index the words of `text` that `limits` allow.
    pub fn index_text_with_limits(
        &self,
        doc: &mut Document,
        text: &str,
        limits: &TermLimits,
    ) -> usize {
        let words = self.words(text);
        let count = limits.indexed_count(words.len());
        let spelling = self.flags.contains(Flags::SPELLING);

        for word in words.into_iter().take(count) {
            if !self.stemmer.is_none() {
                let stemmed = self.stemmer.stem(&word);
                doc.add_term(format!("{STEM_PREFIX}{stemmed}"), 1);
            }
            if spelling {
                doc.add_spelling(&word);
            }
            doc.add_term(word, 1);
        }

        count
    }
}

impl Default for TermGenerator {
    fn default() -> Self {
        Self::new()
    }
}
