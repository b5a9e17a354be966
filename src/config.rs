//! Configuration loaded from TOML.
//!
//! Every section and key is optional:
//!
//! ```toml
//! [analysis]
//! language = "english"
//! spelling = true
//!
//! [search]
//! window = 10
//!
//! [convert]
//! sample_size = 512
//! ignore = ["bak"]
//!
//! [convert.mime_types]
//! log = "text/plain"
//!
//! [index]
//! flush_threshold = 10000
//! sync_writes = true
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::{Flags, Stem, TermGenerator};
use crate::convert::{DEFAULT_SAMPLE_SIZE, MimeConverter};
use crate::engine::writable::DEFAULT_FLUSH_THRESHOLD;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub analysis: AnalysisConfig,
    pub search: SearchConfig,
    pub convert: ConvertConfig,
    pub index: IndexConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Stemmer language; `"none"` disables stemming.
    pub language: String,
    /// Feed indexed words into the spelling dictionary.
    pub spelling: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            language: "english".to_string(),
            spelling: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default number of matches per result window.
    pub window: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { window: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub sample_size: usize,
    /// Extra extension → MIME type mappings.
    pub mime_types: BTreeMap<String, String>,
    /// Extensions to refuse.
    pub ignore: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            mime_types: BTreeMap::new(),
            ignore: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Uncommitted changes after which a writer commits on its own.
    pub flush_threshold: usize,
    /// `fsync` index files on commit.
    pub sync_writes: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            sync_writes: true,
        }
    }
}

impl FolioConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// A term generator with the configured stemmer and flags.
    pub fn term_generator(&self) -> Result<TermGenerator> {
        let mut generator = TermGenerator::with_stemmer(Stem::new(&self.analysis.language)?);
        if self.analysis.spelling {
            generator.set_flags(Flags::SPELLING);
        }
        Ok(generator)
    }

    /// A converter with the configured sample size and extension rules.
    pub fn converter(&self) -> MimeConverter {
        let mut converter = MimeConverter::new().with_sample_size(self.convert.sample_size);
        for (extension, mime_type) in &self.convert.mime_types {
            converter.set_mime_type(extension, mime_type);
        }
        for extension in &self.convert.ignore {
            converter.ignore_extension(extension);
        }
        converter
    }
}
