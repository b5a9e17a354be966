//! Boolean term queries.

use std::fmt;
use std::str::FromStr;

use crate::error::FolioError;

/// How the subqueries of a [`Query::Combine`] are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Documents matching every subquery.
    And,
    /// Documents matching any subquery.
    Or,
    /// Documents matching the first subquery but none of the others.
    AndNot,
    /// Documents matching an odd number of subqueries.
    Xor,
    /// Documents matching the first subquery; the others only add weight.
    AndMaybe,
    /// Like `And`, but only the first subquery contributes weight.
    Filter,
}

impl Op {
    pub fn name(self) -> &'static str {
        match self {
            Op::And => "AND",
            Op::Or => "OR",
            Op::AndNot => "AND_NOT",
            Op::Xor => "XOR",
            Op::AndMaybe => "AND_MAYBE",
            Op::Filter => "FILTER",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Op {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "AND" => Ok(Op::And),
            "OR" => Ok(Op::Or),
            "AND_NOT" => Ok(Op::AndNot),
            "XOR" => Ok(Op::Xor),
            "AND_MAYBE" => Ok(Op::AndMaybe),
            "FILTER" => Ok(Op::Filter),
            _ => Err(FolioError::query(format!("unknown query operator: {s}"))),
        }
    }
}

/// An immutable query tree over literal terms.
///
/// Building a query is pure: it does no I/O and cannot fail. Terms are
/// matched exactly as given, so a caller searching for stemmed forms
/// passes the `Z`-prefixed term.
///
/// ```
/// use folio::{Op, Query};
///
/// let query = Query::new(Op::Or, ["one", "six", "min"]);
/// assert_eq!(query.description(), "Query((one OR six OR min))");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Term(String),
    Combine { op: Op, subqueries: Vec<Query> },
    /// Every document, with zero weight.
    MatchAll,
}

impl Query {
    /// Join literal terms with `op`.
    pub fn new<I, S>(op: Op, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Combine {
            op,
            subqueries: terms.into_iter().map(|t| Query::Term(t.into())).collect(),
        }
    }

    /// Join existing queries with `op`.
    pub fn combine(op: Op, subqueries: impl IntoIterator<Item = Query>) -> Self {
        Query::Combine {
            op,
            subqueries: subqueries.into_iter().collect(),
        }
    }

    pub fn term(term: impl Into<String>) -> Self {
        Query::Term(term.into())
    }

    pub fn match_all() -> Self {
        Query::MatchAll
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Query::Term(_) | Query::MatchAll => false,
            Query::Combine { subqueries, .. } => subqueries.iter().all(Query::is_empty),
        }
    }

    /// Every distinct term the query mentions, in order of first appearance.
    pub fn terms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Query::Term(term) => {
                if !out.contains(&term.as_str()) {
                    out.push(term);
                }
            }
            Query::Combine { subqueries, .. } => {
                for q in subqueries {
                    q.collect_terms(out);
                }
            }
            Query::MatchAll => {}
        }
    }

    /// Number of term leaves that can contribute weight.
    pub(crate) fn weighted_leaves(&self) -> usize {
        match self {
            Query::Term(_) => 1,
            Query::MatchAll => 0,
            Query::Combine { op, subqueries } => match op {
                Op::AndNot | Op::Filter => subqueries.first().map_or(0, Query::weighted_leaves),
                _ => subqueries.iter().map(Query::weighted_leaves).sum(),
            },
        }
    }

    /// Human-readable form, e.g. `Query((one OR six OR min))`.
    pub fn description(&self) -> String {
        format!("Query({})", self.inner_description())
    }

    fn inner_description(&self) -> String {
        match self {
            Query::Term(term) => term.clone(),
            Query::MatchAll => "<alldocuments>".to_string(),
            Query::Combine { op, subqueries } => match subqueries.as_slice() {
                [] => String::new(),
                [single] => single.inner_description(),
                many => {
                    let parts: Vec<String> = many.iter().map(Query::inner_description).collect();
                    let separator = format!(" {op} ");
                    format!("({})", parts.join(separator.as_str()))
                }
            },
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
