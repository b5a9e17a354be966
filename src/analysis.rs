//! Text analysis for indexing.
//!
//! Free text is split into Unicode words, normalized (NFKC, lower case) and
//! turned into terms by a [`TermGenerator`]. When a [`Stem`] is bound, every
//! word also yields a stemmed term carrying the [`STEM_PREFIX`], so a query
//! can match either the literal word or its root form.
//!
//! ```text
//! Text → Words → Normalized terms (+ Z-prefixed stems) → Document
//! ```

pub mod stem;
pub mod term_generator;

pub use stem::Stem;
pub use term_generator::{Flags, TermGenerator, TermLimits};

/// Prefix marking a stemmed term.
pub const STEM_PREFIX: &str = "Z";

/// Prefix marking a document's upsert key. Indexed words are lower case,
/// so keyed terms never collide with them.
pub const KEY_PREFIX: &str = "Q";

/// Terms longer than this many bytes are skipped.
pub const MAX_TERM_LENGTH: usize = 64;
