//! Shared utility modules used across Folio components.

pub mod id;
pub mod levenshtein;
