//! Query mini-language and search index for docstore
//!
//! This crate provides:
//! - the filter compiler: [`compile_query`] turns a declarative filter
//!   into a query string (pure, total, deterministic)
//! - the query-string parser and clause evaluator ([`expr`])
//! - [`MemoryIndexer`], an in-memory [`SearchIndexer`] implementation
//! - facet aggregation over query matches
//!
//! The compiler and the indexer speak the same grammar: whatever
//! [`compile_query`] emits, [`expr::parse_query`] consumes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod expr;
pub mod facets;
pub mod index;
pub mod query;
pub mod tokenizer;

pub use index::MemoryIndexer;
pub use query::compile_query;

// Re-exported so engine-side callers need only this crate for querying
pub use docstore_core::traits::SearchIndexer;
