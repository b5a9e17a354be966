//! The index engine.
//!
//! A deliberately small inverted-term engine with the capabilities the
//! build and query phases need:
//!
//! - [`WritableDatabase`]: document add/replace/delete, commits and
//!   transactions, persisted as generations in a [`Storage`].
//! - [`Database`]: read-only snapshots, merged with
//!   [`Database::add_database`].
//! - [`Query`] and [`Enquire`]: boolean term queries ranked with BM25
//!   into an [`MSet`] window whose items fetch their payload lazily.
//!
//! [`Storage`]: crate::storage::Storage

pub mod assemble;
pub mod database;
pub mod document;
pub mod enquire;
mod generation;
mod index;
pub mod query;
pub mod writable;

pub use assemble::assemble_document;
pub use database::{Database, DocumentHandle};
pub use document::Document;
pub use enquire::{Enquire, MSet, MSetItem, SortOrder};
pub use query::{Op, Query};
pub use writable::{OpenMode, WritableDatabase};
