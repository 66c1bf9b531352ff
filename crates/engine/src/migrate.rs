//! Store-to-store migration
//!
//! Rows stream from a source cursor into destination batches. The copy
//! is resumable by design: every error carries the number of rows that
//! already landed, and cancellation is polled once per batch so a stop
//! request takes effect at the next batch boundary, never mid-batch.

use docstore_core::error::{Error, Result};
use docstore_core::record::Record;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::info;

use crate::cursor::Cursor;
use crate::store::IndexedStore;

/// Cooperative cancellation flag shared between a migration and its
/// controller
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token in the not-cancelled state
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation; takes effect at the next batch boundary
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A migration failure carrying how far the copy got
///
/// Rows counted here are durably written at the destination; a retry
/// may resume after them.
#[derive(Debug, ThisError)]
#[error("migration stopped after {rows_copied} rows: {source}")]
pub struct MigrationError {
    /// Rows written to the destination before the failure
    pub rows_copied: usize,
    /// The underlying failure
    pub source: Error,
}

/// Copy at most `count` rows of `table` from `src` to `dst`
///
/// Rows land as one batch, reindexed at the destination. Returns the
/// number of rows copied, which is less than `count` when the source
/// has fewer rows.
pub fn copy_rows(
    src: &IndexedStore,
    dst: &IndexedStore,
    table: &str,
    count: usize,
) -> Result<usize> {
    let mut cursor = src.all(table)?;
    let mut rows: Vec<Record> = Vec::with_capacity(count);
    while rows.len() < count {
        match cursor.next_record()? {
            Some(record) => rows.push(record),
            None => break,
        }
    }
    if rows.is_empty() {
        return Ok(0);
    }
    let copied = rows.len();
    dst.batch_insert_kv(table, rows, true)?;
    Ok(copied)
}

/// Copy every row of `table` from `src` to `dst` in cancellable batches
///
/// `batch_size` 0 falls back to the destination's configured batch
/// size. On any failure the error reports the rows already written.
pub fn copy_store(
    src: &IndexedStore,
    dst: &IndexedStore,
    table: &str,
    batch_size: usize,
    cancel: &CancelToken,
) -> std::result::Result<usize, MigrationError> {
    let batch_size = if batch_size == 0 {
        dst.config().batch_size
    } else {
        batch_size
    };
    let mut cursor = src.all(table).map_err(|source| MigrationError {
        rows_copied: 0,
        source,
    })?;

    let mut total = 0usize;
    loop {
        if cancel.is_cancelled() {
            return Err(MigrationError {
                rows_copied: total,
                source: Error::Cancelled,
            });
        }
        let mut rows: Vec<Record> = Vec::with_capacity(batch_size);
        let mut exhausted = false;
        while rows.len() < batch_size {
            match cursor.next_record() {
                Ok(Some(record)) => rows.push(record),
                Ok(None) | Err(Error::Eof) => {
                    exhausted = true;
                    break;
                }
                Err(source) => {
                    return Err(MigrationError {
                        rows_copied: total,
                        source,
                    })
                }
            }
        }
        if !rows.is_empty() {
            let batch_len = rows.len();
            dst.batch_insert_kv(table, rows, true)
                .map_err(|source| MigrationError {
                    rows_copied: total,
                    source,
                })?;
            total += batch_len;
        }
        if exhausted {
            info!(table, rows = total, "table copy finished");
            return Ok(total);
        }
    }
}

/// Copy several tables from `src` to `dst`, returning the combined row
/// count
///
/// Tables are copied in the given order; the first failure stops the
/// clone and reports the rows copied across every table so far.
pub fn clone_store(
    src: &IndexedStore,
    dst: &IndexedStore,
    tables: &[&str],
    batch_size: usize,
    cancel: &CancelToken,
) -> std::result::Result<usize, MigrationError> {
    let mut total = 0usize;
    for table in tables {
        match copy_store(src, dst, table, batch_size, cancel) {
            Ok(rows) => total += rows,
            Err(e) => {
                return Err(MigrationError {
                    rows_copied: total + e.rows_copied,
                    source: e.source,
                })
            }
        }
    }
    info!(tables = tables.len(), rows = total, "store clone finished");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::memory::MemoryEngine;
    use docstore_core::filter::Filter;
    use docstore_search::MemoryIndexer;
    use serde_json::json;

    fn store() -> IndexedStore {
        IndexedStore::new(
            Arc::new(MemoryEngine::new()),
            Arc::new(MemoryIndexer::new()),
            StoreConfig::default(),
        )
    }

    fn seed(store: &IndexedStore, table: &str, n: usize) {
        for i in 0..n {
            store
                .save(table, &mut json!({"id": format!("k{i:03}"), "n": i}))
                .unwrap();
        }
    }

    #[test]
    fn test_copy_store_moves_every_row() {
        let src = store();
        let dst = store();
        seed(&src, "data", 10);

        // Batch size does not divide the row count; the tail batch is
        // partial and still lands.
        let copied = copy_store(&src, &dst, "data", 3, &CancelToken::new()).unwrap();
        assert_eq!(copied, 10);
        assert_eq!(dst.get_json("data", "k007").unwrap()["n"], 7);
        // Rows are reindexed at the destination
        assert_eq!(dst.filter_count("data", &Filter::new()).unwrap(), 10);
    }

    #[test]
    fn test_copy_store_empty_source() {
        let src = store();
        let dst = store();
        let copied = copy_store(&src, &dst, "data", 5, &CancelToken::new()).unwrap();
        assert_eq!(copied, 0);
    }

    #[test]
    fn test_copy_store_cancellation_reports_progress() {
        let src = store();
        let dst = store();
        seed(&src, "data", 4);

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = copy_store(&src, &dst, "data", 2, &cancel).unwrap_err();
        assert!(matches!(err.source, Error::Cancelled));
        assert_eq!(err.rows_copied, 0);
    }

    #[test]
    fn test_copy_rows_caps_at_count() {
        let src = store();
        let dst = store();
        seed(&src, "data", 5);

        assert_eq!(copy_rows(&src, &dst, "data", 3).unwrap(), 3);
        assert_eq!(dst.get_json("data", "k000").unwrap()["n"], 0);
        assert!(matches!(
            dst.get("data", "k003"),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_copy_rows_short_source() {
        let src = store();
        let dst = store();
        seed(&src, "data", 2);
        assert_eq!(copy_rows(&src, &dst, "data", 10).unwrap(), 2);
    }

    #[test]
    fn test_clone_store_combines_tables() {
        let src = store();
        let dst = store();
        seed(&src, "users", 3);
        seed(&src, "orders", 4);

        let total = clone_store(&src, &dst, &["users", "orders"], 2, &CancelToken::new()).unwrap();
        assert_eq!(total, 7);
        assert_eq!(dst.filter_count("users", &Filter::new()).unwrap(), 3);
        assert_eq!(dst.filter_count("orders", &Filter::new()).unwrap(), 4);
    }

    #[test]
    fn test_copy_preserves_payload_bytes() {
        let src = store();
        let dst = store();
        let payload = serde_json::to_vec(&json!({"name": "ada", "tags": ["x"]})).unwrap();
        src.batch_insert_kv("data", vec![Record::new("k", payload.clone())], true)
            .unwrap();

        copy_store(&src, &dst, "data", 10, &CancelToken::new()).unwrap();
        assert_eq!(dst.get("data", "k").unwrap().payload, payload);
    }
}
