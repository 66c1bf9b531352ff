//! Store orchestration for docstore
//!
//! This crate wires the pieces together:
//! - [`MemoryEngine`], an in-memory ordered KV engine
//! - [`IndexedStore`], which runs every mutation as a KV-then-index
//!   dual write and every filtered read through the compiler and index
//! - the cursor implementations ([`SnapshotCursor`], [`ResultCursor`])
//!   behind one pull-based [`Cursor`] contract
//! - the migration engine ([`copy_store`], [`clone_store`]) moving data
//!   between two stores in cancellable batches

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod cursor;
pub mod memory;
pub mod migrate;
pub mod pager;
pub mod store;

pub use config::StoreConfig;
pub use cursor::{Cursor, ResultCursor, SnapshotCursor};
pub use memory::MemoryEngine;
pub use migrate::{clone_store, copy_rows, copy_store, CancelToken, MigrationError};
pub use pager::ResultPager;
pub use store::IndexedStore;
