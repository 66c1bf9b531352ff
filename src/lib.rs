//! docstore: an embeddable indexed document store
//!
//! Records live in an ordered KV engine, the source of truth, and are
//! shadowed into a search index that answers declarative filters.
//! Every mutation is a KV-then-index dual write; filtered reads compile
//! a JSON filter into one query string, rank hits in the index, and
//! resolve them back against the KV side, healing stale index entries
//! as they are discovered.
//!
//! ```
//! use docstore::{open_memory, Filter};
//! use serde_json::json;
//!
//! let store = open_memory();
//! let mut doc = json!({"name": "tony emoekpere", "count": 11});
//! let id = store.save("data", &mut doc).unwrap();
//!
//! let filter: Filter = serde_json::from_value(json!({"name": "tony emoekpere"})).unwrap();
//! let hit = store.filter_get("data", &filter).unwrap();
//! assert_eq!(hit.key, id);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use docstore_core::error::{Error, Result};
pub use docstore_core::filter::{Filter, FilterTerm, RangeBound, RangeHint};
pub use docstore_core::key::{scan_prefix, split_storage_key, storage_key, validate_table};
pub use docstore_core::record::{IndexedDocument, Record};
pub use docstore_core::search_types::{
    FacetResult, Facets, NumericRange, QueryOptions, RangeCount, RangeFacet, SearchHit,
    SearchPage, TermCount, TermFacet,
};
pub use docstore_core::traits::{IndexBatch, IndexOp, KvEngine, KvScan, SearchIndexer};

pub use docstore_search::{compile_query, MemoryIndexer};

pub use docstore_engine::{
    clone_store, copy_rows, copy_store, CancelToken, Cursor, IndexedStore, MemoryEngine,
    MigrationError, ResultCursor, ResultPager, SnapshotCursor, StoreConfig,
};

use std::sync::Arc;

/// Open a store backed by in-memory engines with default configuration
///
/// Suitable for tests and ephemeral workloads; nothing is persisted.
pub fn open_memory() -> IndexedStore {
    open_memory_with(StoreConfig::default())
}

/// Open an in-memory store with explicit configuration
pub fn open_memory_with(config: StoreConfig) -> IndexedStore {
    IndexedStore::new(
        Arc::new(MemoryEngine::new()),
        Arc::new(MemoryIndexer::new()),
        config,
    )
}
