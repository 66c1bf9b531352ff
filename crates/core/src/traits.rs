//! Collaborator contracts
//!
//! The store consumes two opaque engines through these narrow traits: an
//! ordered KV engine and a search indexer. Both are owned exclusively by
//! one `IndexedStore` for their lifetime. Implementations must be safe
//! for concurrent calls; scan handles and batches are single-caller
//! objects and carry no such requirement.

use crate::error::Result;
use crate::record::IndexedDocument;
use crate::search_types::{QueryOptions, SearchPage};

// ============================================================================
// KV engine
// ============================================================================

/// An ordered key-value engine
///
/// Keys sort lexicographically on their raw bytes; table-scoped
/// iteration relies on this (see [`crate::key`]).
pub trait KvEngine: Send + Sync {
    /// Read a value. `NotFound` if absent.
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Write a value, overwriting any existing one.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key. `NotFound` if absent.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Apply a list of writes atomically: all visible or none.
    fn batch_write(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()>;

    /// Open a lazy scan over keys sharing `prefix`
    ///
    /// Iteration starts at `start` when given (inclusive), otherwise at
    /// the prefix edge; `reverse` walks keys in descending order. The
    /// returned handle owns whatever snapshot or transaction state the
    /// engine needs; dropping it releases that state.
    fn scan_from(
        &self,
        prefix: &[u8],
        start: Option<&[u8]>,
        reverse: bool,
    ) -> Result<Box<dyn KvScan>>;
}

/// A pull-based scan handle produced by [`KvEngine::scan_from`]
///
/// One entry is produced per call; nothing is buffered ahead of demand.
/// `Ok(None)` signals clean exhaustion and every later call must repeat
/// it.
pub trait KvScan: Send {
    /// Produce the next `(key, value)` pair, or `None` when exhausted.
    fn next_entry(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>>;
}

// ============================================================================
// Search indexer
// ============================================================================

/// A search/index engine holding the queryable view of records
pub trait SearchIndexer: Send + Sync {
    /// Index (or re-index) one document under `id`.
    fn index_document(&self, id: &str, doc: &IndexedDocument) -> Result<()>;

    /// Remove the document indexed under `id`. Absent ids are a no-op.
    fn unindex_document(&self, id: &str) -> Result<()>;

    /// Run a compiled query string, returning ranked hits.
    fn query(&self, query: &str, options: &QueryOptions) -> Result<SearchPage>;

    /// Apply an accumulated batch of index operations as one unit.
    fn apply_batch(&self, batch: IndexBatch) -> Result<()>;
}

// ============================================================================
// Index batch
// ============================================================================

/// One buffered index operation
#[derive(Debug, Clone)]
pub enum IndexOp {
    /// Index `doc` under `id`
    Index {
        /// Document id
        id: String,
        /// Document body
        doc: IndexedDocument,
    },
    /// Remove the document under `id`
    Unindex {
        /// Document id
        id: String,
    },
}

/// An ordered batch of index operations, applied as one unit by
/// [`SearchIndexer::apply_batch`]
///
/// Built incrementally alongside a KV batch and discarded after commit
/// or on error; a failed batch is resubmitted by the caller, never
/// retried internally.
#[derive(Debug, Clone, Default)]
pub struct IndexBatch {
    ops: Vec<IndexOp>,
}

impl IndexBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        IndexBatch::default()
    }

    /// Buffer an index operation
    pub fn index(&mut self, id: impl Into<String>, doc: IndexedDocument) {
        self.ops.push(IndexOp::Index {
            id: id.into(),
            doc,
        });
    }

    /// Buffer an unindex operation
    pub fn unindex(&mut self, id: impl Into<String>) {
        self.ops.push(IndexOp::Unindex { id: id.into() });
    }

    /// Number of buffered operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consume the batch, yielding its operations in order
    pub fn into_ops(self) -> Vec<IndexOp> {
        self.ops
    }
}
