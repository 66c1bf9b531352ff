//! Pull-based row cursors
//!
//! Both cursor kinds hand rows to the caller one `next_record` call at
//! a time; nothing is produced ahead of demand, and the caller's pull
//! pace is the only pace. Each cursor owns whatever it iterates over
//! (a scan handle, or a materialized hit list) so no background task
//! and no shared iterator state exist.
//!
//! Exhaustion is `Ok(None)`, repeated on every later call. `close` is
//! idempotent and releases the underlying handle early; dropping an
//! unclosed cursor releases it too.

use docstore_core::error::{Error, Result};
use docstore_core::key::{split_storage_key, storage_key};
use docstore_core::record::Record;
use docstore_core::search_types::SearchHit;
use docstore_core::traits::{KvEngine, KvScan, SearchIndexer};
use std::sync::Arc;
use tracing::warn;

use crate::pager::ResultPager;

/// A pull-based stream of records
pub trait Cursor: Send {
    /// Produce the next record, or `None` when the stream is exhausted
    fn next_record(&mut self) -> Result<Option<Record>>;

    /// Release the underlying handle; later pulls return `None`
    fn close(&mut self);
}

// ============================================================================
// Snapshot cursor
// ============================================================================

/// Cursor over a table-scoped KV scan
///
/// Wraps the scan handle returned by [`KvEngine::scan_from`] and maps
/// physical keys back to logical ones.
pub struct SnapshotCursor {
    scan: Option<Box<dyn KvScan>>,
}

impl SnapshotCursor {
    /// Wrap a scan handle
    pub fn new(scan: Box<dyn KvScan>) -> Self {
        SnapshotCursor { scan: Some(scan) }
    }
}

impl Cursor for SnapshotCursor {
    fn next_record(&mut self) -> Result<Option<Record>> {
        let Some(scan) = self.scan.as_mut() else {
            return Ok(None);
        };
        match scan.next_entry() {
            Ok(Some((raw_key, payload))) => {
                let (_, key) = split_storage_key(&raw_key)?;
                Ok(Some(Record::new(key, payload)))
            }
            Ok(None) | Err(Error::Eof) => {
                self.scan = None;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn close(&mut self) {
        self.scan = None;
    }
}

// ============================================================================
// Result cursor
// ============================================================================

/// Cursor over the hits of a filtered read
///
/// Holds the ranked hit window and resolves each hit against the KV
/// engine on pull. A hit whose record has been deleted out from under
/// the index is skipped, and its stale index entry is removed so the
/// next query does not see it either.
pub struct ResultCursor {
    table: String,
    hits: Vec<SearchHit>,
    pager: ResultPager,
    kv: Arc<dyn KvEngine>,
    index: Arc<dyn SearchIndexer>,
    closed: bool,
}

impl std::fmt::Debug for ResultCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCursor")
            .field("table", &self.table)
            .field("hits", &self.hits)
            .field("pager", &self.pager)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ResultCursor {
    /// Build a cursor over one query's hit window
    pub fn new(
        table: impl Into<String>,
        hits: Vec<SearchHit>,
        kv: Arc<dyn KvEngine>,
        index: Arc<dyn SearchIndexer>,
    ) -> Self {
        let pager = ResultPager::new(hits.len());
        ResultCursor {
            table: table.into(),
            hits,
            pager,
            kv,
            index,
            closed: false,
        }
    }

    /// Number of hits in the window
    pub fn count(&self) -> usize {
        self.pager.count()
    }
}

impl Cursor for ResultCursor {
    fn next_record(&mut self) -> Result<Option<Record>> {
        if self.closed {
            return Ok(None);
        }
        while let Some(pos) = self.pager.advance() {
            let id = &self.hits[pos].id;
            match self.kv.get(&storage_key(&self.table, id)) {
                Ok(payload) => return Ok(Some(Record::new(id.clone(), payload))),
                Err(Error::NotFound) => {
                    warn!(table = %self.table, id = %id, "hit without record, unindexing");
                    // Best effort: a failed unindex leaves the entry for
                    // the next read to retry.
                    if let Err(e) = self.index.unindex_document(id) {
                        warn!(id = %id, error = %e, "unindex of stale hit failed");
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn close(&mut self) {
        self.closed = true;
        self.hits.clear();
    }
}
