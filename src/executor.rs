//! The query phase: merged open, ranked window, sequential payloads.

use std::future;
use std::path::Path;

use futures::future::try_join_all;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::engine::{Database, Enquire, MSet, MSetItem, Query};
use crate::error::{FolioError, Result};

/// Default number of matches per window.
pub const DEFAULT_WINDOW: usize = 10;

/// A match with its payload fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub docid: u64,
    pub rank: usize,
    pub percent: u32,
    pub weight: f64,
    pub data: String,
}

impl Hit {
    fn new(item: &MSetItem, data: String) -> Self {
        Self {
            docid: item.docid,
            rank: item.rank,
            percent: item.percent,
            weight: item.weight,
            data,
        }
    }
}

/// Runs queries over merged read-only indexes.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    window: usize,
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }

    pub fn with_window(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Open every index in `paths` and merge them in argument order.
    ///
    /// The first index is opened on its own; the rest are opened
    /// concurrently. Any failure aborts the merge.
    pub async fn open_merged<P: AsRef<Path>>(paths: &[P]) -> Result<Database> {
        let (primary, rest) = paths
            .split_first()
            .ok_or_else(|| FolioError::invalid_argument("no index to open"))?;

        let mut db = Database::open(primary).await?;
        let others = try_join_all(rest.iter().map(Database::open)).await?;
        for other in &others {
            db.add_database(other)?;
        }
        log::info!(
            "merged {} index(es) holding {} document(s)",
            db.index_count(),
            db.doc_count()
        );
        Ok(db)
    }

    /// The window of matches for `query` starting at rank `first`.
    pub async fn search(&self, db: &Database, query: Query, first: usize) -> Result<MSet> {
        log::debug!("running {}", query.description());
        let mut enquire = Enquire::new(db);
        enquire.set_query(query);
        enquire.get_mset(first, self.window).await
    }

    /// Fetch the payload of every match, strictly one after another in rank
    /// order. The stream ends after the first error.
    pub fn payloads(mset: &MSet) -> impl Stream<Item = Result<Hit>> + '_ {
        stream::iter(mset.iter())
            .then(|item| async move {
                let data = item.document.get_data().await?;
                Ok::<_, FolioError>(Hit::new(item, data))
            })
            .scan(false, |failed, result| {
                if *failed {
                    return future::ready(None);
                }
                *failed = result.is_err();
                future::ready(Some(result))
            })
    }

    /// All payloads of `mset`, or the first error.
    pub async fn collect_hits(mset: &MSet) -> Result<Vec<Hit>> {
        Self::payloads(mset).try_collect().await
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Document, Op, OpenMode, WritableDatabase};
    use tempfile::TempDir;

    async fn build(dir: &Path, docs: &[(&str, &str)]) {
        let mut db = WritableDatabase::open(dir, OpenMode::CreateOrOverwrite)
            .await
            .unwrap();
        for (data, terms) in docs {
            let mut doc = Document::new();
            doc.set_data(*data);
            for term in terms.split_whitespace() {
                doc.add_term(term, 1);
            }
            db.add_document(doc).await.unwrap();
        }
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_merged_requires_a_path() {
        let paths: Vec<&Path> = Vec::new();
        assert!(matches!(
            QueryExecutor::open_merged(&paths).await,
            Err(FolioError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_open_merged_fails_on_missing_constituent() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good");
        build(&good, &[("a", "x")]).await;
        let missing = dir.path().join("missing");

        assert!(QueryExecutor::open_merged(&[good, missing]).await.is_err());
    }

    #[tokio::test]
    async fn test_window_and_payloads() {
        let dir = TempDir::new().unwrap();
        let (a, b) = (dir.path().join("a"), dir.path().join("b"));
        build(&a, &[("a1", "x y"), ("a2", "x")]).await;
        build(&b, &[("b1", "x"), ("b2", "y")]).await;

        let db = QueryExecutor::open_merged(&[&a, &b]).await.unwrap();
        let executor = QueryExecutor::with_window(2);
        let mset = executor
            .search(&db, Query::new(Op::Or, ["x", "y"]), 0)
            .await
            .unwrap();

        assert_eq!(mset.matches_estimated(), 4);
        assert_eq!(mset.len(), 2);

        let hits = QueryExecutor::collect_hits(&mset).await.unwrap();
        assert_eq!(hits[0].data, "a1");
        assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_payload_stream_stops_at_first_error() {
        let dir = TempDir::new().unwrap();
        build(dir.path(), &[("one", "x"), ("two", "x")]).await;

        let db = Database::open(dir.path()).await.unwrap();
        let mset = QueryExecutor::new()
            .search(&db, Query::term("x"), 0)
            .await
            .unwrap();

        // Two more commits retire the generation the match set points at.
        let mut writer = WritableDatabase::open(dir.path(), OpenMode::Open)
            .await
            .unwrap();
        for term in ["p", "q"] {
            let mut doc = Document::new();
            doc.add_term(term, 1);
            writer.add_document(doc).await.unwrap();
            writer.commit().await.unwrap();
        }

        let results: Vec<_> = QueryExecutor::payloads(&mset).collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(FolioError::Payload(_))));
    }
}
