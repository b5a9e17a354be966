//! Query execution against a [`Database`] view.
//!
//! Matching documents are weighted with BM25 over the statistics of the
//! whole merged view, so a term that is rare across all constituents
//! counts for more than a common one no matter which index holds it.
//!
//! Each match also gets a percentage. The best match scores the share of
//! the query's weighted terms it matched; every other match is scaled
//! against it by weight:
//!
//! ```text
//! percent(d) = weight(d) / max_weight * matched_terms(top) / query_terms * 100
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::engine::database::{Database, DocumentHandle};
use crate::engine::query::{Op, Query};
use crate::error::{FolioError, Result};
use crate::util::id::{create_doc_id, get_local_id, get_shard_id};

const K1: f64 = 1.0;
const B: f64 = 0.5;

/// Result ordering for an [`Enquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Highest weight first.
    #[default]
    Relevance,
    /// By the value in `slot` (ascending unless `reverse`), ties by relevance.
    Value { slot: u32, reverse: bool },
}

/// Binds a query to a database view and produces ranked windows.
#[derive(Debug, Clone)]
pub struct Enquire {
    db: Database,
    query: Option<Query>,
    sort: SortOrder,
}

impl Enquire {
    /// The view is captured as it is now; a later [`Database::reopen`]
    /// does not affect this enquire.
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            query: None,
            sort: SortOrder::Relevance,
        }
    }

    pub fn set_query(&mut self, query: Query) {
        self.query = Some(query);
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn set_sort_by_value(&mut self, slot: u32, reverse: bool) {
        self.sort = SortOrder::Value { slot, reverse };
    }

    pub fn set_sort_by_relevance(&mut self) {
        self.sort = SortOrder::Relevance;
    }

    /// Compute the ranked window of at most `max_items` matches starting at
    /// rank `first`.
    pub async fn get_mset(&self, first: usize, max_items: usize) -> Result<MSet> {
        let query = self
            .query
            .clone()
            .ok_or_else(|| FolioError::query("no query set"))?;
        let db = self.db.clone();
        let sort = self.sort;
        tokio::task::spawn_blocking(move || run(&db, &query, sort, first, max_items)).await?
    }
}

/// One ranked match.
#[derive(Debug, Clone)]
pub struct MSetItem {
    /// Id in the merged view.
    pub docid: u64,
    /// Zero-based position in the full ranking.
    pub rank: usize,
    pub weight: f64,
    /// Relevance percentage, 0 to 100.
    pub percent: u32,
    pub document: DocumentHandle,
}

/// A window of ranked matches.
#[derive(Debug, Clone, Default)]
pub struct MSet {
    items: Vec<MSetItem>,
    first: usize,
    matches_estimated: usize,
}

impl MSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rank of the first item in the window.
    pub fn first(&self) -> usize {
        self.first
    }

    /// Total number of matching documents.
    pub fn matches_estimated(&self) -> usize {
        self.matches_estimated
    }

    pub fn items(&self) -> &[MSetItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MSetItem> {
        self.items.iter()
    }
}

impl IntoIterator for MSet {
    type Item = MSetItem;
    type IntoIter = std::vec::IntoIter<MSetItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a MSet {
    type Item = &'a MSetItem;
    type IntoIter = std::slice::Iter<'a, MSetItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Hit {
    weight: f64,
    leaves: usize,
}

impl Hit {
    fn merge(&mut self, other: Hit) {
        self.weight += other.weight;
        self.leaves += other.leaves;
    }
}

type Matches = BTreeMap<u64, Hit>;

struct Scorer<'a> {
    db: &'a Database,
    doc_count: f64,
    avg_length: f64,
}

impl<'a> Scorer<'a> {
    fn new(db: &'a Database) -> Self {
        let doc_count = db.doc_count() as f64;
        let total_length = db.total_length() as f64;
        let avg_length = if doc_count > 0.0 && total_length > 0.0 {
            total_length / doc_count
        } else {
            1.0
        };
        Self {
            db,
            doc_count,
            avg_length,
        }
    }

    fn term(&self, term: &str) -> Matches {
        let n = self.db.term_freq(term) as f64;
        let idf = ((self.doc_count - n + 0.5) / (n + 0.5) + 1.0).ln();

        let mut matches = Matches::new();
        for (shard_id, shard) in self.db.shards().iter().enumerate() {
            let Some(postings) = shard.index.postings(term) else {
                continue;
            };
            for (&local_id, &wdf) in postings {
                let weight = if wdf == 0 {
                    0.0
                } else {
                    let length = f64::from(shard.index.doc_length(local_id).unwrap_or(0));
                    let wdf = f64::from(wdf);
                    let norm = K1 * ((1.0 - B) + B * length / self.avg_length);
                    idf * wdf * (K1 + 1.0) / (wdf + norm)
                };
                matches.insert(
                    create_doc_id(shard_id as u16, local_id),
                    Hit { weight, leaves: 1 },
                );
            }
        }
        matches
    }

    fn all(&self) -> Matches {
        let mut matches = Matches::new();
        for (shard_id, shard) in self.db.shards().iter().enumerate() {
            for local_id in shard.index.docids() {
                matches.insert(create_doc_id(shard_id as u16, local_id), Hit::default());
            }
        }
        matches
    }

    fn eval(&self, query: &Query) -> Matches {
        match query {
            Query::Term(term) => self.term(term),
            Query::MatchAll => self.all(),
            Query::Combine { op, subqueries } => {
                let mut parts = subqueries.iter().map(|q| self.eval(q));
                let Some(mut acc) = parts.next() else {
                    return Matches::new();
                };
                match op {
                    Op::Or => {
                        for part in parts {
                            for (docid, hit) in part {
                                acc.entry(docid).or_default().merge(hit);
                            }
                        }
                        acc
                    }
                    Op::And => {
                        for part in parts {
                            acc.retain(|docid, _| part.contains_key(docid));
                            for (docid, hit) in acc.iter_mut() {
                                if let Some(other) = part.get(docid) {
                                    hit.merge(*other);
                                }
                            }
                        }
                        acc
                    }
                    Op::Xor => {
                        let mut counts: BTreeMap<u64, usize> =
                            acc.keys().map(|docid| (*docid, 1)).collect();
                        for part in parts {
                            for (docid, hit) in part {
                                acc.entry(docid).or_default().merge(hit);
                                *counts.entry(docid).or_insert(0) += 1;
                            }
                        }
                        acc.retain(|docid, _| counts.get(docid).is_some_and(|c| c % 2 == 1));
                        acc
                    }
                    Op::AndNot => {
                        for part in parts {
                            acc.retain(|docid, _| !part.contains_key(docid));
                        }
                        acc
                    }
                    Op::AndMaybe => {
                        for part in parts {
                            for (docid, hit) in acc.iter_mut() {
                                if let Some(other) = part.get(docid) {
                                    hit.merge(*other);
                                }
                            }
                        }
                        acc
                    }
                    Op::Filter => {
                        for part in parts {
                            acc.retain(|docid, _| part.contains_key(docid));
                        }
                        acc
                    }
                }
            }
        }
    }
}

fn by_relevance(a: &(u64, Hit), b: &(u64, Hit)) -> Ordering {
    b.1.weight.total_cmp(&a.1.weight).then(a.0.cmp(&b.0))
}

fn run(
    db: &Database,
    query: &Query,
    sort: SortOrder,
    first: usize,
    max_items: usize,
) -> Result<MSet> {
    let matches = Scorer::new(db).eval(query);
    let matches_estimated = matches.len();
    let mut ranked: Vec<(u64, Hit)> = matches.into_iter().collect();
    ranked.sort_by(by_relevance);

    // Percentages are anchored on the best-weighted match, whatever the sort.
    let scale = match ranked.first() {
        Some((_, top)) if top.weight > 0.0 => {
            let leaves = query.weighted_leaves().max(1) as f64;
            Some((top.leaves as f64 / leaves).min(1.0) / top.weight)
        }
        _ => None,
    };

    if let SortOrder::Value { slot, reverse } = sort {
        let value_of = |docid: u64| {
            db.shards()
                .get(get_shard_id(docid) as usize)
                .and_then(|shard| shard.index.value(slot, get_local_id(docid)))
        };
        ranked.sort_by(|a, b| {
            let ordering = value_of(a.0).cmp(&value_of(b.0));
            let ordering = if reverse { ordering.reverse() } else { ordering };
            ordering.then_with(|| by_relevance(a, b))
        });
    }

    let items = ranked
        .into_iter()
        .enumerate()
        .skip(first)
        .take(max_items)
        .map(|(rank, (docid, hit))| MSetItem {
            docid,
            rank,
            weight: hit.weight,
            percent: percent(hit.weight, scale),
            document: db.handle(get_shard_id(docid) as usize, get_local_id(docid)),
        })
        .collect();

    Ok(MSet {
        items,
        first,
        matches_estimated,
    })
}

fn percent(weight: f64, scale: Option<f64>) -> u32 {
    let Some(scale) = scale else {
        return 100;
    };
    let percent = (weight * scale * 100.0).round().clamp(0.0, 100.0) as u32;
    if percent == 0 && weight > 0.0 { 1 } else { percent }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::document::Document;
    use crate::engine::writable::{OpenMode, WritableDatabase};
    use crate::storage::MemoryStorage;

    async fn database(docs: &[(&str, &str, Option<&str>)]) -> Database {
        let storage = MemoryStorage::default();
        let mut writer = WritableDatabase::open_with_storage(
            Arc::new(storage.clone()),
            OpenMode::CreateOrOverwrite,
        )
        .await
        .unwrap();
        for (data, terms, value) in docs {
            let mut doc = Document::new();
            doc.set_data(*data);
            for term in terms.split_whitespace() {
                doc.add_term(term, 1);
            }
            if let Some(value) = value {
                doc.add_value(0, *value);
            }
            writer.add_document(doc).await.unwrap();
        }
        writer.close().await.unwrap();
        Database::open_with_storage(Arc::new(storage)).await.unwrap()
    }

    async fn docids(db: &Database, query: Query) -> Vec<u64> {
        let mut enquire = Enquire::new(db);
        enquire.set_query(query);
        let mset = enquire.get_mset(0, 10).await.unwrap();
        mset.iter().map(|item| item.docid).collect()
    }

    #[tokio::test]
    async fn test_boolean_operators() {
        let db = database(&[
            ("1", "a b", None),
            ("2", "a", None),
            ("3", "b", None),
        ])
        .await;

        let mut and = docids(&db, Query::new(Op::And, ["a", "b"])).await;
        and.sort();
        assert_eq!(and, vec![1]);

        let mut xor = docids(&db, Query::new(Op::Xor, ["a", "b"])).await;
        xor.sort();
        assert_eq!(xor, vec![2, 3]);

        assert_eq!(docids(&db, Query::new(Op::AndNot, ["a", "b"])).await, vec![2]);
        assert_eq!(docids(&db, Query::new(Op::Filter, ["b", "a"])).await, vec![1]);

        let maybe = docids(&db, Query::new(Op::AndMaybe, ["a", "b"])).await;
        assert_eq!(maybe, vec![1, 2]);

        assert_eq!(docids(&db, Query::new(Op::Or, ["missing"])).await.len(), 0);
        assert_eq!(docids(&db, Query::match_all()).await.len(), 3);
    }

    #[tokio::test]
    async fn test_window_and_percentages() {
        let db = database(&[
            ("both", "one six filler", None),
            ("six", "six filler", None),
            ("one", "one filler filler2", None),
            ("none", "filler", None),
        ])
        .await;

        let mut enquire = Enquire::new(&db);
        enquire.set_query(Query::new(Op::Or, ["one", "six"]));

        let mset = enquire.get_mset(0, 10).await.unwrap();
        assert_eq!(mset.matches_estimated(), 3);
        assert_eq!(mset.items()[0].docid, 1);
        assert_eq!(mset.items()[0].percent, 100);
        let percents: Vec<u32> = mset.iter().map(|item| item.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] >= w[1]));
        assert!(percents.iter().all(|p| *p > 0));

        let window = enquire.get_mset(1, 1).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window.first(), 1);
        assert_eq!(window.items()[0].rank, 1);
        assert_eq!(window.items()[0].docid, mset.items()[1].docid);

        assert!(enquire.get_mset(10, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_match_scores_below_full() {
        let db = database(&[("only", "one", None)]).await;
        let mut enquire = Enquire::new(&db);
        enquire.set_query(Query::new(Op::Or, ["one", "two"]));
        let mset = enquire.get_mset(0, 10).await.unwrap();
        assert_eq!(mset.items()[0].percent, 50);
    }

    #[tokio::test]
    async fn test_sort_by_value() {
        let db = database(&[
            ("b", "x", Some("banana")),
            ("a", "x", Some("apple")),
            ("c", "x", Some("cherry")),
        ])
        .await;

        let mut enquire = Enquire::new(&db);
        enquire.set_query(Query::term("x"));
        enquire.set_sort_by_value(0, false);
        let mset = enquire.get_mset(0, 10).await.unwrap();
        let values: Vec<_> = mset
            .iter()
            .map(|item| item.document.value(0).unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["apple", "banana", "cherry"]);

        enquire.set_sort_by_value(0, true);
        let mset = enquire.get_mset(0, 1).await.unwrap();
        assert_eq!(mset.items()[0].document.get_data().await.unwrap(), "c");
    }

    #[tokio::test]
    async fn test_missing_query() {
        let db = database(&[]).await;
        let enquire = Enquire::new(&db);
        assert!(matches!(
            enquire.get_mset(0, 10).await,
            Err(FolioError::Query(_))
        ));
    }
}
