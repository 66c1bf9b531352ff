//! Search request and result types
//!
//! These are the shapes exchanged with a [`crate::traits::SearchIndexer`]:
//! query options (paging, ordering, facets), ranked hits, and facet
//! aggregation results. They carry no behavior beyond construction
//! helpers; evaluation lives in the search crate.

use serde::{Deserialize, Serialize};

/// Order key: relevance score, descending
pub const ORDER_SCORE_DESC: &str = "-_score";
/// Order key: document id, descending
pub const ORDER_ID_DESC: &str = "-_id";

// ============================================================================
// Query options
// ============================================================================

/// Options for one index query
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum hits in the returned window; `0` means no window
    pub limit: usize,
    /// Zero-based offset into the ranked hit list
    pub offset: usize,
    /// Ordering keys, applied left to right. A leading `-` means
    /// descending. Supported keys: `_score`, `_id`.
    pub order_by: Vec<String>,
    /// Optional facet aggregations computed over all matches
    pub facets: Option<Facets>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            limit: 10,
            offset: 0,
            order_by: vec![ORDER_SCORE_DESC.to_string(), ORDER_ID_DESC.to_string()],
            facets: None,
        }
    }
}

impl QueryOptions {
    /// Options for a `limit`/`offset` window with the default ordering
    /// (score descending, then id descending)
    pub fn window(limit: usize, offset: usize) -> Self {
        QueryOptions {
            limit,
            offset,
            ..QueryOptions::default()
        }
    }

    /// Options returning every match, default ordering
    pub fn unbounded() -> Self {
        QueryOptions::window(0, 0)
    }

    /// Attach facet aggregations
    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = Some(facets);
        self
    }
}

// ============================================================================
// Hits
// ============================================================================

/// One ranked hit: a document id plus its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Document id (== the record's logical key)
    pub id: String,
    /// Relevance score
    pub score: f32,
}

/// Result of one index query
///
/// `total` counts every match; `hits` is the requested window into the
/// ranked list.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Total matches before paging
    pub total: u64,
    /// Ranked hits within the window
    pub hits: Vec<SearchHit>,
    /// Facet results, present only when requested
    pub facets: Vec<FacetResult>,
}

// ============================================================================
// Facets
// ============================================================================

/// Facet aggregations to compute alongside a query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Facets {
    /// Top-N term facets
    #[serde(default)]
    pub top: Vec<TermFacet>,
    /// Numeric range facets
    #[serde(default)]
    pub range: Vec<RangeFacet>,
}

/// Top-N most frequent terms of a field across all matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermFacet {
    /// Name under which the result is reported
    pub name: String,
    /// Field path (e.g. `data.status`)
    pub field: String,
    /// How many terms to report
    pub count: usize,
}

/// Counts of numeric field values falling into named ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeFacet {
    /// Name under which the result is reported
    pub name: String,
    /// Field path (e.g. `data.count`)
    pub field: String,
    /// Ranges to bucket values into
    pub ranges: Vec<NumericRange>,
}

/// One half-open numeric bucket: `min <= v < max`
///
/// A missing bound leaves that side open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericRange {
    /// Bucket name
    pub name: String,
    /// Inclusive lower bound
    pub min: Option<f64>,
    /// Exclusive upper bound
    pub max: Option<f64>,
}

/// Result of one facet aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct FacetResult {
    /// Facet name from the request
    pub name: String,
    /// Field the facet was computed over
    pub field: String,
    /// Values observed (matches with the field present)
    pub total: u64,
    /// Matches without the field
    pub missing: u64,
    /// Term counts, most frequent first (term facets)
    pub terms: Vec<TermCount>,
    /// Range counts in request order (range facets)
    pub ranges: Vec<RangeCount>,
}

/// One term and how many matches carry it
#[derive(Debug, Clone, PartialEq)]
pub struct TermCount {
    /// The term
    pub term: String,
    /// Number of matches
    pub count: u64,
}

/// One named range and how many values fell into it
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCount {
    /// Bucket name from the request
    pub name: String,
    /// Number of values in the bucket
    pub count: u64,
}
