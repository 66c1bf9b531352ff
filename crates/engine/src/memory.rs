//! In-memory ordered KV engine
//!
//! A `BTreeMap` under a `parking_lot::RwLock` gives lexicographic key
//! order and atomic batches. Scans are lazy: the handle remembers the
//! last yielded key and re-seeks past it under a short read lock on
//! every step, so no lock is held across calls and no part of the scan
//! is materialized ahead of demand. Writes landing behind the scan
//! position after the scan opened may be observed (read-committed
//! iteration); key order is still strictly monotonic per scan.

use docstore_core::error::{Error, Result};
use docstore_core::traits::{KvEngine, KvScan};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory [`KvEngine`] backed by an ordered map
#[derive(Debug, Default)]
pub struct MemoryEngine {
    data: Arc<RwLock<Map>>,
}

impl MemoryEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        MemoryEngine::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KvEngine for MemoryEngine {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.data.read().get(key).cloned().ok_or(Error::NotFound)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        match self.data.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound),
        }
    }

    fn batch_write(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        let mut map = self.data.write();
        for (key, value) in entries {
            map.insert(key, value);
        }
        Ok(())
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: Option<&[u8]>,
        reverse: bool,
    ) -> Result<Box<dyn KvScan>> {
        let position = if reverse {
            // Exclusive upper bound; starting key itself is included
            // via its immediate successor.
            Position::Reverse {
                upper: match start {
                    Some(s) => Some(successor(s)),
                    None => prefix_end(prefix),
                },
            }
        } else {
            Position::Forward {
                next: start.unwrap_or(prefix).to_vec(),
            }
        };
        Ok(Box::new(MemoryScan {
            data: Arc::clone(&self.data),
            prefix: prefix.to_vec(),
            position,
            done: false,
        }))
    }
}

enum Position {
    /// Next key to yield is the first key >= `next`
    Forward { next: Vec<u8> },
    /// Next key to yield is the last key < `upper` (`None` = unbounded)
    Reverse { upper: Option<Vec<u8>> },
}

struct MemoryScan {
    data: Arc<RwLock<Map>>,
    prefix: Vec<u8>,
    position: Position,
    done: bool,
}

impl KvScan for MemoryScan {
    fn next_entry(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        if self.done {
            return Ok(None);
        }
        let map = self.data.read();
        let entry = match &self.position {
            Position::Forward { next } => map
                .range::<Vec<u8>, _>((Bound::Included(next.clone()), Bound::Unbounded))
                .next(),
            Position::Reverse { upper } => {
                let bound = match upper {
                    Some(u) => Bound::Excluded(u.clone()),
                    None => Bound::Unbounded,
                };
                map.range::<Vec<u8>, _>((Bound::Unbounded, bound)).next_back()
            }
        };
        match entry {
            Some((key, value)) if key.starts_with(&self.prefix) => {
                let item = (key.clone(), value.clone());
                self.position = match &self.position {
                    Position::Forward { .. } => Position::Forward {
                        next: successor(key),
                    },
                    Position::Reverse { .. } => Position::Reverse {
                        upper: Some(key.clone()),
                    },
                };
                Ok(Some(item))
            }
            _ => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

/// Immediate successor of `key` in byte order: `key ++ 0x00`
fn successor(key: &[u8]) -> Vec<u8> {
    let mut next = key.to_vec();
    next.push(0);
    next
}

/// First key after every key sharing `prefix`, or `None` when the
/// prefix is all 0xFF bytes (unbounded)
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xFF {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(keys: &[&str]) -> MemoryEngine {
        let engine = MemoryEngine::new();
        for k in keys {
            engine.set(k.as_bytes(), k.as_bytes()).unwrap();
        }
        engine
    }

    fn collect_keys(mut scan: Box<dyn KvScan>) -> Vec<String> {
        let mut out = vec![];
        while let Some((k, _)) = scan.next_entry().unwrap() {
            out.push(String::from_utf8(k).unwrap());
        }
        out
    }

    #[test]
    fn test_get_set_delete() {
        let engine = MemoryEngine::new();
        assert!(matches!(engine.get(b"k"), Err(Error::NotFound)));
        engine.set(b"k", b"v").unwrap();
        assert_eq!(engine.get(b"k").unwrap(), b"v");
        engine.delete(b"k").unwrap();
        assert!(matches!(engine.delete(b"k"), Err(Error::NotFound)));
    }

    #[test]
    fn test_batch_write_visible_together() {
        let engine = MemoryEngine::new();
        engine
            .batch_write(vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"b".to_vec(), b"2".to_vec()),
            ])
            .unwrap();
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_forward_scan_stays_in_prefix() {
        let engine = engine_with(&["t$a|1", "t$a|2", "t$b|1", "t$ab|1"]);
        let scan = engine.scan_from(b"t$a|", None, false).unwrap();
        assert_eq!(collect_keys(scan), vec!["t$a|1", "t$a|2"]);
    }

    #[test]
    fn test_scan_with_start_key() {
        let engine = engine_with(&["t$a|1", "t$a|2", "t$a|3"]);
        let scan = engine.scan_from(b"t$a|", Some(b"t$a|2"), false).unwrap();
        assert_eq!(collect_keys(scan), vec!["t$a|2", "t$a|3"]);
    }

    #[test]
    fn test_reverse_scan() {
        let engine = engine_with(&["t$a|1", "t$a|2", "t$a|3", "t$b|9"]);
        let scan = engine.scan_from(b"t$a|", None, true).unwrap();
        assert_eq!(collect_keys(scan), vec!["t$a|3", "t$a|2", "t$a|1"]);
    }

    #[test]
    fn test_reverse_scan_from_start_is_inclusive() {
        let engine = engine_with(&["t$a|1", "t$a|2", "t$a|3"]);
        let scan = engine.scan_from(b"t$a|", Some(b"t$a|2"), true).unwrap();
        assert_eq!(collect_keys(scan), vec!["t$a|2", "t$a|1"]);
    }

    #[test]
    fn test_exhausted_scan_stays_exhausted() {
        let engine = engine_with(&["t$a|1"]);
        let mut scan = engine.scan_from(b"t$a|", None, false).unwrap();
        assert!(scan.next_entry().unwrap().is_some());
        assert!(scan.next_entry().unwrap().is_none());
        assert!(scan.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_scan_does_not_block_writes() {
        let engine = engine_with(&["t$a|1", "t$a|2"]);
        let mut scan = engine.scan_from(b"t$a|", None, false).unwrap();
        assert!(scan.next_entry().unwrap().is_some());
        // No lock is held between steps
        engine.set(b"t$a|9", b"late").unwrap();
        let rest = collect_keys(scan);
        assert_eq!(rest, vec!["t$a|2", "t$a|9"]);
    }

    #[test]
    fn test_prefix_end() {
        assert_eq!(prefix_end(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_end(&[0x61, 0xFF]), Some(vec![0x62]));
        assert_eq!(prefix_end(&[0xFF, 0xFF]), None);
        assert_eq!(prefix_end(b""), None);
    }
}
