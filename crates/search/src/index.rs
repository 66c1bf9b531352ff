//! In-memory search index
//!
//! [`MemoryIndexer`] implements the [`SearchIndexer`] contract over a
//! concurrent document table. Documents are flattened at index time
//! into `field path -> scalar values` maps (`bucket` plus `data.<path>`
//! for every leaf, array elements sharing their path); queries are
//! parsed once and evaluated against each document.
//!
//! Ranking is deterministic: hits are ordered by the requested keys
//! (default: score descending, then id descending), with an id
//! ascending tie-break after all keys compare equal.

use dashmap::DashMap;
use docstore_core::error::Result;
use docstore_core::record::IndexedDocument;
use docstore_core::search_types::{QueryOptions, SearchHit, SearchPage};
use docstore_core::traits::{IndexBatch, IndexOp, SearchIndexer};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tracing::{debug, warn};

use crate::expr::{evaluate, parse_query, FieldMap};
use crate::facets::FacetAccumulator;

/// Flatten an indexed document into its searchable fields
///
/// Nested objects extend the path with `.`; arrays contribute one value
/// per element under the same path; scalars terminate a path.
pub fn flatten_fields(doc: &IndexedDocument) -> FieldMap {
    let mut fields = FieldMap::new();
    fields
        .entry("bucket".to_string())
        .or_default()
        .push(Value::String(doc.bucket.clone()));
    flatten_into(&mut fields, "data", &doc.data);
    fields
}

fn flatten_into(fields: &mut FieldMap, path: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(fields, &format!("{path}.{k}"), v);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_into(fields, path, item);
            }
        }
        Value::Null => {}
        scalar => fields
            .entry(path.to_string())
            .or_default()
            .push(scalar.clone()),
    }
}

struct StoredDoc {
    fields: FieldMap,
}

/// In-memory [`SearchIndexer`] backed by a concurrent document table
pub struct MemoryIndexer {
    docs: DashMap<String, StoredDoc>,
    version: AtomicU64,
}

impl Default for MemoryIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndexer {
    /// Create an empty index
    pub fn new() -> Self {
        MemoryIndexer {
            docs: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }

    /// Number of indexed documents
    pub fn total_docs(&self) -> usize {
        self.docs.len()
    }

    /// Version watermark, incremented on every update
    pub fn version(&self) -> u64 {
        self.version.load(AtomicOrdering::Acquire)
    }

    fn bump(&self) {
        self.version.fetch_add(1, AtomicOrdering::Release);
    }
}

impl SearchIndexer for MemoryIndexer {
    fn index_document(&self, id: &str, doc: &IndexedDocument) -> Result<()> {
        debug!(id, bucket = %doc.bucket, "indexing document");
        self.docs.insert(
            id.to_string(),
            StoredDoc {
                fields: flatten_fields(doc),
            },
        );
        self.bump();
        Ok(())
    }

    fn unindex_document(&self, id: &str) -> Result<()> {
        debug!(id, "unindexing document");
        if self.docs.remove(id).is_some() {
            self.bump();
        }
        Ok(())
    }

    fn query(&self, query: &str, options: &QueryOptions) -> Result<SearchPage> {
        let clauses = parse_query(query)?;
        debug!(query, clauses = clauses.len(), "index query");

        let mut facet_acc = options.facets.as_ref().map(FacetAccumulator::new);
        let mut matches: Vec<SearchHit> = Vec::new();
        for entry in self.docs.iter() {
            if let Some(score) = evaluate(&clauses, &entry.value().fields) {
                if let Some(acc) = facet_acc.as_mut() {
                    acc.observe(&entry.value().fields);
                }
                matches.push(SearchHit {
                    id: entry.key().clone(),
                    score,
                });
            }
        }

        sort_hits(&mut matches, &options.order_by);

        let total = matches.len() as u64;
        let hits: Vec<SearchHit> = if options.limit == 0 {
            matches.into_iter().skip(options.offset).collect()
        } else {
            matches
                .into_iter()
                .skip(options.offset)
                .take(options.limit)
                .collect()
        };

        Ok(SearchPage {
            total,
            hits,
            facets: facet_acc.map(FacetAccumulator::finish).unwrap_or_default(),
        })
    }

    fn apply_batch(&self, batch: IndexBatch) -> Result<()> {
        debug!(ops = batch.len(), "applying index batch");
        for op in batch.into_ops() {
            match op {
                IndexOp::Index { id, doc } => {
                    self.docs.insert(
                        id,
                        StoredDoc {
                            fields: flatten_fields(&doc),
                        },
                    );
                }
                IndexOp::Unindex { id } => {
                    self.docs.remove(&id);
                }
            }
        }
        self.bump();
        Ok(())
    }
}

fn sort_hits(hits: &mut [SearchHit], order_by: &[String]) {
    hits.sort_by(|a, b| {
        for key in order_by {
            let (desc, name) = match key.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, key.as_str()),
            };
            let ord = match name {
                "_score" => a.score.total_cmp(&b.score),
                "_id" => a.id.cmp(&b.id),
                other => {
                    warn!(key = other, "unsupported order key ignored");
                    Ordering::Equal
                }
            };
            let ord = if desc { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        // Stable final tie-break so equal hits have one canonical order
        a.id.cmp(&b.id)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_core::search_types::{Facets, TermFacet};
    use serde_json::json;

    fn indexer_with(docs: &[(&str, Value)]) -> MemoryIndexer {
        let index = MemoryIndexer::new();
        for (id, data) in docs {
            index
                .index_document(id, &IndexedDocument::new("data", data.clone()))
                .unwrap();
        }
        index
    }

    #[test]
    fn test_flatten_nested_and_arrays() {
        let doc = IndexedDocument::new(
            "data",
            json!({
                "name": "ada",
                "address": {"city": "lagos"},
                "tags": ["a", "b"],
                "gone": null,
            }),
        );
        let fields = flatten_fields(&doc);
        assert_eq!(fields["bucket"], vec![json!("data")]);
        assert_eq!(fields["data.name"], vec![json!("ada")]);
        assert_eq!(fields["data.address.city"], vec![json!("lagos")]);
        assert_eq!(fields["data.tags"], vec![json!("a"), json!("b")]);
        assert!(!fields.contains_key("data.gone"));
    }

    #[test]
    fn test_query_scopes_to_bucket() {
        let index = MemoryIndexer::new();
        index
            .index_document("a", &IndexedDocument::new("users", json!({"n": 1})))
            .unwrap();
        index
            .index_document("b", &IndexedDocument::new("orders", json!({"n": 1})))
            .unwrap();

        let page = index
            .query("+bucket:users", &QueryOptions::unbounded())
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.hits[0].id, "a");
    }

    #[test]
    fn test_reindex_replaces_not_duplicates() {
        let index = indexer_with(&[("k", json!({"name": "old"}))]);
        index
            .index_document("k", &IndexedDocument::new("data", json!({"name": "new"})))
            .unwrap();

        assert_eq!(index.total_docs(), 1);
        let page = index
            .query("+bucket:data +data.name:\"new\"", &QueryOptions::unbounded())
            .unwrap();
        assert_eq!(page.total, 1);
        let stale = index
            .query("+bucket:data +data.name:\"old\"", &QueryOptions::unbounded())
            .unwrap();
        assert_eq!(stale.total, 0);
    }

    #[test]
    fn test_unindex_absent_is_noop() {
        let index = MemoryIndexer::new();
        assert!(index.unindex_document("ghost").is_ok());
    }

    #[test]
    fn test_equal_scores_order_by_id_descending() {
        let index = indexer_with(&[
            ("a", json!({"kind": "x"})),
            ("c", json!({"kind": "x"})),
            ("b", json!({"kind": "x"})),
        ]);
        let page = index
            .query("+bucket:data +data.kind:\"x\"", &QueryOptions::unbounded())
            .unwrap();
        let ids: Vec<&str> = page.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_limit_and_offset_window() {
        let index = indexer_with(&[
            ("a", json!({"kind": "x"})),
            ("b", json!({"kind": "x"})),
            ("c", json!({"kind": "x"})),
            ("d", json!({"kind": "x"})),
        ]);
        let page = index
            .query("+bucket:data", &QueryOptions::window(2, 1))
            .unwrap();
        assert_eq!(page.total, 4);
        let ids: Vec<&str> = page.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn test_query_determinism() {
        let index = indexer_with(&[
            ("a", json!({"n": 1})),
            ("b", json!({"n": 1})),
            ("c", json!({"n": 2})),
        ]);
        let first = index
            .query("+bucket:data +data.n:>=1", &QueryOptions::unbounded())
            .unwrap();
        let second = index
            .query("+bucket:data +data.n:>=1", &QueryOptions::unbounded())
            .unwrap();
        let ids = |p: &SearchPage| p.hits.iter().map(|h| h.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_batch_apply() {
        let index = indexer_with(&[("stale", json!({"k": 1}))]);
        let mut batch = IndexBatch::new();
        batch.index("n1", IndexedDocument::new("data", json!({"k": 2})));
        batch.index("n2", IndexedDocument::new("data", json!({"k": 3})));
        batch.unindex("stale");
        index.apply_batch(batch).unwrap();

        assert_eq!(index.total_docs(), 2);
        let page = index
            .query("+bucket:data", &QueryOptions::unbounded())
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_query_with_facets() {
        let index = indexer_with(&[
            ("a", json!({"status": "open"})),
            ("b", json!({"status": "open"})),
            ("c", json!({"status": "closed"})),
        ]);
        let opts = QueryOptions::unbounded().with_facets(Facets {
            top: vec![TermFacet {
                name: "status".to_string(),
                field: "data.status".to_string(),
                count: 5,
            }],
            range: vec![],
        });
        let page = index.query("+bucket:data", &opts).unwrap();
        assert_eq!(page.facets.len(), 1);
        assert_eq!(page.facets[0].terms[0].term, "open");
        assert_eq!(page.facets[0].terms[0].count, 2);
    }

    #[test]
    fn test_malformed_query_errors() {
        let index = MemoryIndexer::new();
        assert!(index
            .query("garbage without colon", &QueryOptions::default())
            .is_err());
    }
}
