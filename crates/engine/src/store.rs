//! The indexed store
//!
//! [`IndexedStore`] composes an ordered KV engine (source of truth) with
//! a search indexer (queryable view). Every mutation is a dual write in
//! a fixed order: the KV write commits first, the index write follows.
//! The dual write is best effort; an index failure after a committed KV
//! write is surfaced to the caller and the KV write stands. Filtered
//! reads tolerate the resulting drift in both directions: stale index
//! hits are unindexed on discovery, and unindexed records are simply
//! invisible to filters until reindexed.

use docstore_core::error::{Error, Result};
use docstore_core::filter::Filter;
use docstore_core::key::{scan_prefix, storage_key, validate_table};
use docstore_core::record::{IndexedDocument, Record};
use docstore_core::search_types::{QueryOptions, SearchPage};
use docstore_core::traits::{IndexBatch, KvEngine, SearchIndexer};
use docstore_search::compile_query;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::cursor::{ResultCursor, SnapshotCursor};

/// A KV store with a search index bolted to its write path
pub struct IndexedStore {
    kv: Arc<dyn KvEngine>,
    index: Arc<dyn SearchIndexer>,
    config: StoreConfig,
}

impl IndexedStore {
    /// Compose a store from its two engines
    pub fn new(kv: Arc<dyn KvEngine>, index: Arc<dyn SearchIndexer>, config: StoreConfig) -> Self {
        IndexedStore { kv, index, config }
    }

    /// The store's configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Save a document, returning its key
    ///
    /// The key is the document's `id` field when present, otherwise a
    /// generated UUID written back into the document. Saving to an
    /// existing key overwrites both the record and its index entry.
    pub fn save(&self, table: &str, doc: &mut Value) -> Result<String> {
        validate_table(table)?;
        let id = ensure_id(doc)?;
        let payload = serde_json::to_vec(doc)?;
        self.kv.set(&storage_key(table, &id), &payload)?;
        self.index
            .index_document(&id, &IndexedDocument::new(table, doc.clone()))?;
        debug!(table, id = %id, "saved document");
        Ok(id)
    }

    /// Replace an existing document; `NotFound` when the key is absent
    pub fn replace(&self, table: &str, key: &str, doc: &Value) -> Result<()> {
        validate_table(table)?;
        let raw = storage_key(table, key);
        self.kv.get(&raw)?;
        let payload = serde_json::to_vec(doc)?;
        self.kv.set(&raw, &payload)?;
        self.index
            .index_document(key, &IndexedDocument::new(table, doc.clone()))?;
        Ok(())
    }

    /// Merge `patch`'s top-level fields into an existing document
    ///
    /// Fields present in the patch overwrite; absent fields survive.
    /// `NotFound` when the key is absent.
    pub fn update(&self, table: &str, key: &str, patch: &Value) -> Result<()> {
        validate_table(table)?;
        let mut doc = self.get_json(table, key)?;
        let (Some(target), Some(fields)) = (doc.as_object_mut(), patch.as_object()) else {
            return Err(Error::InvalidArgument(
                "update requires JSON objects".to_string(),
            ));
        };
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
        let payload = serde_json::to_vec(&doc)?;
        self.kv.set(&storage_key(table, key), &payload)?;
        self.index
            .index_document(key, &IndexedDocument::new(table, doc))?;
        Ok(())
    }

    /// Store raw bytes under a key, bypassing the index
    ///
    /// The record will not match filtered reads until saved through an
    /// indexing path.
    pub fn save_raw(&self, table: &str, key: &str, payload: &[u8]) -> Result<()> {
        validate_table(table)?;
        self.kv.set(&storage_key(table, key), payload)
    }

    /// Delete a record and its index entry; `NotFound` when absent
    pub fn delete(&self, table: &str, key: &str) -> Result<()> {
        validate_table(table)?;
        self.kv.delete(&storage_key(table, key))?;
        self.index.unindex_document(key)?;
        debug!(table, key, "deleted document");
        Ok(())
    }

    /// Save several documents as one KV batch plus one index batch
    ///
    /// Missing `id` fields are filled with generated UUIDs. Returns the
    /// keys in input order.
    pub fn batch_insert(&self, table: &str, docs: &mut [Value]) -> Result<Vec<String>> {
        validate_table(table)?;
        let mut entries = Vec::with_capacity(docs.len());
        let mut batch = IndexBatch::new();
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs.iter_mut() {
            let id = ensure_id(doc)?;
            entries.push((storage_key(table, &id), serde_json::to_vec(doc)?));
            batch.index(id.clone(), IndexedDocument::new(table, doc.clone()));
            ids.push(id);
        }
        self.kv.batch_write(entries)?;
        self.index.apply_batch(batch)?;
        info!(table, rows = ids.len(), "batch insert");
        Ok(ids)
    }

    /// Insert raw records as one KV batch, optionally reindexing them
    ///
    /// This is the migration landing path: payloads are written as-is.
    /// With `reindex` set, each payload is decoded as JSON and indexed;
    /// a payload that does not decode fails the whole batch before
    /// anything is written.
    pub fn batch_insert_kv(
        &self,
        table: &str,
        rows: Vec<Record>,
        reindex: bool,
    ) -> Result<Vec<String>> {
        validate_table(table)?;
        let mut entries = Vec::with_capacity(rows.len());
        let mut batch = IndexBatch::new();
        let mut keys = Vec::with_capacity(rows.len());
        for row in rows {
            if reindex {
                let data = row.decode_json()?;
                batch.index(row.key.clone(), IndexedDocument::new(table, data));
            }
            entries.push((storage_key(table, &row.key), row.payload));
            keys.push(row.key);
        }
        self.kv.batch_write(entries)?;
        if !batch.is_empty() {
            self.index.apply_batch(batch)?;
        }
        Ok(keys)
    }

    // ========================================================================
    // Point and range reads
    // ========================================================================

    /// Read one record by key; `NotFound` when absent
    pub fn get(&self, table: &str, key: &str) -> Result<Record> {
        validate_table(table)?;
        let payload = self.kv.get(&storage_key(table, key))?;
        Ok(Record::new(key, payload))
    }

    /// Read one record by key and decode its payload as JSON
    pub fn get_json(&self, table: &str, key: &str) -> Result<Value> {
        self.get(table, key)?.decode_json()
    }

    /// Cursor over every record of a table, ascending by key
    pub fn all(&self, table: &str) -> Result<SnapshotCursor> {
        validate_table(table)?;
        let scan = self.kv.scan_from(&scan_prefix(table), None, false)?;
        Ok(SnapshotCursor::new(scan))
    }

    /// Cursor over records with keys `>= from`, ascending
    pub fn since(&self, table: &str, from: &str) -> Result<SnapshotCursor> {
        validate_table(table)?;
        let start = storage_key(table, from);
        let scan = self
            .kv
            .scan_from(&scan_prefix(table), Some(&start), false)?;
        Ok(SnapshotCursor::new(scan))
    }

    /// Cursor over records with keys `<= from`, descending
    pub fn before(&self, table: &str, from: &str) -> Result<SnapshotCursor> {
        validate_table(table)?;
        let start = storage_key(table, from);
        let scan = self.kv.scan_from(&scan_prefix(table), Some(&start), true)?;
        Ok(SnapshotCursor::new(scan))
    }

    // ========================================================================
    // Filtered reads
    // ========================================================================

    /// Best single match for a filter; `NotFound` on zero hits
    ///
    /// A top hit whose record is gone is unindexed best effort and the
    /// query is retried, so one stale entry does not hide a live match
    /// behind it.
    pub fn filter_get(&self, table: &str, filter: &Filter) -> Result<Record> {
        validate_table(table)?;
        let query = compile_query(table, filter);
        let mut offset = 0;
        loop {
            let page = self.index.query(&query, &QueryOptions::window(1, offset))?;
            let Some(hit) = page.hits.first() else {
                return Err(Error::NotFound);
            };
            match self.kv.get(&storage_key(table, &hit.id)) {
                Ok(payload) => return Ok(Record::new(hit.id.clone(), payload)),
                Err(Error::NotFound) => {
                    warn!(table, id = %hit.id, "hit without record, unindexing");
                    // A removed entry shrinks the result set; a failed
                    // removal stays, so step past it by offset. Either
                    // way the loop advances.
                    if let Err(e) = self.index.unindex_document(&hit.id) {
                        warn!(id = %hit.id, error = %e, "unindex of stale hit failed");
                        offset += 1;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Cursor over every match of a filter; `NotFound` on zero hits
    ///
    /// `limit` 0 falls back to the configured default page size.
    pub fn filter_get_all(
        &self,
        table: &str,
        filter: &Filter,
        limit: usize,
        offset: usize,
    ) -> Result<ResultCursor> {
        validate_table(table)?;
        let limit = if limit == 0 {
            self.config.default_limit
        } else {
            limit
        };
        let query = compile_query(table, filter);
        let page = self.index.query(&query, &QueryOptions::window(limit, offset))?;
        if page.total == 0 {
            return Err(Error::NotFound);
        }
        debug!(table, %query, total = page.total, window = page.hits.len(), "filtered read");
        Ok(ResultCursor::new(
            table,
            page.hits,
            Arc::clone(&self.kv),
            Arc::clone(&self.index),
        ))
    }

    /// Number of matches for a filter; `NotFound` on zero hits
    pub fn filter_count(&self, table: &str, filter: &Filter) -> Result<u64> {
        validate_table(table)?;
        let query = compile_query(table, filter);
        let page = self.index.query(&query, &QueryOptions::window(1, 0))?;
        if page.total == 0 {
            return Err(Error::NotFound);
        }
        Ok(page.total)
    }

    /// Delete every match of a filter, returning how many were removed
    ///
    /// `NotFound` on zero hits. Records already gone from the KV side
    /// still have their index entries removed and count as deleted.
    pub fn filter_delete(&self, table: &str, filter: &Filter) -> Result<usize> {
        validate_table(table)?;
        let query = compile_query(table, filter);
        let page = self.index.query(&query, &QueryOptions::unbounded())?;
        if page.total == 0 {
            return Err(Error::NotFound);
        }
        let mut removed = 0;
        for hit in &page.hits {
            match self.kv.delete(&storage_key(table, &hit.id)) {
                Ok(()) | Err(Error::NotFound) => {}
                Err(e) => return Err(e),
            }
            self.index.unindex_document(&hit.id)?;
            removed += 1;
        }
        info!(table, removed, "filter delete");
        Ok(removed)
    }

    /// Run a filter with explicit query options, exposing the raw page
    ///
    /// This is the escape hatch for ordering and facets; hits are ids
    /// and scores, not resolved records.
    pub fn search(&self, table: &str, filter: &Filter, options: &QueryOptions) -> Result<SearchPage> {
        validate_table(table)?;
        let query = compile_query(table, filter);
        self.index.query(&query, options)
    }
}

/// Read the document's `id` field, generating and injecting a UUID when
/// it is missing
fn ensure_id(doc: &mut Value) -> Result<String> {
    let Some(map) = doc.as_object_mut() else {
        return Err(Error::InvalidArgument(
            "document must be a JSON object".to_string(),
        ));
    };
    match map.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => {
            let id = Uuid::new_v4().to_string();
            map.insert("id".to_string(), Value::String(id.clone()));
            Ok(id)
        }
    }
}
