//! # Folio
//!
//! An asynchronous document indexing and query library.
//!
//! ## Features
//!
//! - Transactional writable indexes with upsert by external key
//! - Unicode word segmentation with Snowball stemming
//! - Per-field term limits, value slots and a spelling dictionary
//! - Text extraction from plain text, Markdown, HTML and CSV files
//! - Merged read-only views over several indexes
//! - Boolean term queries ranked with BM25, with relevance percentages
//! - Lazy, strictly sequential payload retrieval
//!
//! ## Example
//!
//! ```no_run
//! use folio::{
//!     DocumentRecord, FolioConfig, IndexBuilder, IndexContext, Op, Query, QueryExecutor,
//! };
//!
//! # async fn run() -> folio::Result<()> {
//! let context = IndexContext::from_config(&FolioConfig::default())?;
//! let records = vec![DocumentRecord::new("doc one").add_text("text one two three")];
//! IndexBuilder::new(&context)
//!     .build("/tmp/db1", &records, &mut ())
//!     .await?;
//!
//! let db = QueryExecutor::open_merged(&["/tmp/db1"]).await?;
//! let mset = QueryExecutor::new()
//!     .search(&db, Query::new(Op::Or, ["one", "six"]), 0)
//!     .await?;
//! for hit in QueryExecutor::collect_hits(&mset).await? {
//!     println!("{} {}% {}", hit.docid, hit.percent, hit.data);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod builder;
pub mod config;
pub mod convert;
pub mod data;
pub mod engine;
mod error;
pub mod executor;
pub mod storage;
pub mod util;

pub use analysis::{Flags, Stem, TermGenerator, TermLimits};
pub use builder::{BuildSummary, IndexBuilder, IndexContext, IndexEvent, IndexObserver};
pub use config::FolioConfig;
pub use convert::{Converted, MimeConverter};
pub use data::{DocumentRecord, SourceFile};
pub use engine::{
    Database, Document, DocumentHandle, Enquire, MSet, MSetItem, Op, OpenMode, Query, SortOrder,
    WritableDatabase, assemble_document,
};
pub use error::{ConversionStatus, FolioError, Result};
pub use executor::{Hit, QueryExecutor};
pub use storage::{Storage, StorageConfig, StorageFactory};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
