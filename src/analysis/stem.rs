//! Language-tagged stemmers.

use std::fmt;
use std::sync::Arc;

use rust_stemmers::{Algorithm, Stemmer};

use crate::error::{FolioError, Result};

/// A stemmer for one language, cheap to clone.
///
/// `Stem::new("none")` builds a stemmer that leaves words untouched.
#[derive(Clone)]
pub struct Stem {
    language: String,
    stemmer: Option<Arc<Stemmer>>,
}

impl Stem {
    /// Create a stemmer from a language name or ISO 639-1 code.
    pub fn new(language: &str) -> Result<Self> {
        let language = language.trim().to_lowercase();
        if language.is_empty() || language == "none" {
            return Ok(Self::none());
        }
        let algorithm = algorithm_for(&language).ok_or_else(|| {
            FolioError::invalid_argument(format!("unsupported stemmer language: {language}"))
        })?;
        Ok(Self {
            language,
            stemmer: Some(Arc::new(Stemmer::create(algorithm))),
        })
    }

    /// A stemmer that returns every word unchanged.
    pub fn none() -> Self {
        Self {
            language: "none".to_string(),
            stemmer: None,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_none(&self) -> bool {
        self.stemmer.is_none()
    }

    /// Reduce `word` to its root form.
    pub fn stem(&self, word: &str) -> String {
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(word).into_owned(),
            None => word.to_string(),
        }
    }

    /// Human-readable description, e.g. `Stem(english)`.
    pub fn description(&self) -> String {
        format!("Stem({})", self.language)
    }
}

impl fmt::Debug for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stem")
            .field("language", &self.language)
            .finish()
    }
}

fn algorithm_for(language: &str) -> Option<Algorithm> {
    let algorithm = match language {
        "arabic" | "ar" => Algorithm::Arabic,
        "danish" | "da" => Algorithm::Danish,
        "dutch" | "nl" => Algorithm::Dutch,
        "english" | "en" => Algorithm::English,
        "finnish" | "fi" => Algorithm::Finnish,
        "french" | "fr" => Algorithm::French,
        "german" | "de" => Algorithm::German,
        "greek" | "el" => Algorithm::Greek,
        "hungarian" | "hu" => Algorithm::Hungarian,
        "italian" | "it" => Algorithm::Italian,
        "norwegian" | "no" | "nb" => Algorithm::Norwegian,
        "portuguese" | "pt" => Algorithm::Portuguese,
        "romanian" | "ro" => Algorithm::Romanian,
        "russian" | "ru" => Algorithm::Russian,
        "spanish" | "es" => Algorithm::Spanish,
        "swedish" | "sv" => Algorithm::Swedish,
        "tamil" | "ta" => Algorithm::Tamil,
        "turkish" | "tr" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algorithm)
}
