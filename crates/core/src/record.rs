//! Record and index-document shapes

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The primary unit of storage: a logical key plus an opaque payload
///
/// The payload is commonly a serialized JSON document, but nothing in
/// the KV path inspects it. Only indexing and filtered reads interpret
/// it as structured data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Logical key, unique within its table
    pub key: String,
    /// Opaque serialized document
    pub payload: Vec<u8>,
}

impl Record {
    /// Create a record from a key and raw payload bytes
    pub fn new(key: impl Into<String>, payload: Vec<u8>) -> Self {
        Record {
            key: key.into(),
            payload,
        }
    }

    /// Decode the payload as a JSON document
    pub fn decode_json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

/// The secondary, queryable representation of a record
///
/// Indexed under `id == Record.key`. The `bucket` field scopes queries
/// to one table; `data` carries the structured document whose fields
/// become searchable under `data.<path>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedDocument {
    /// Owning table
    pub bucket: String,
    /// Structured document body
    pub data: Value,
}

impl IndexedDocument {
    /// Build the index-side view of a record's document
    pub fn new(bucket: impl Into<String>, data: Value) -> Self {
        IndexedDocument {
            bucket: bucket.into(),
            data,
        }
    }
}
