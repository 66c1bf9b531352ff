//! Core types for the docstore document store
//!
//! This crate holds everything the engine and search crates share:
//! the error taxonomy, the physical key layout, record and index-document
//! shapes, the filter model, search result types, and the collaborator
//! traits for KV engines and search indexers. It performs no I/O.

#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod key;
pub mod record;
pub mod search_types;
pub mod traits;

pub use error::{Error, Result};
pub use filter::{Filter, FilterTerm, RangeBound, RangeHint};
pub use key::{scan_prefix, split_storage_key, storage_key, validate_table};
pub use record::{IndexedDocument, Record};
pub use search_types::{
    FacetResult, Facets, NumericRange, QueryOptions, RangeCount, RangeFacet, SearchHit,
    SearchPage, TermCount, TermFacet,
};
pub use traits::{IndexBatch, IndexOp, KvEngine, KvScan, SearchIndexer};
