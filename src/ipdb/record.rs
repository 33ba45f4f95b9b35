//! Data segment record resolution
//!
//! A leaf reference `r` (greater than `node_count`) addresses the record
//! at payload offset `r - node_count + node_count * 8`. Each record is a
//! 2-byte big-endian length followed by that many bytes of UTF-8 text.

use super::trie::TrieStore;
use super::types::DATA_LENGTH_BYTES;
use crate::error::{IpdbError, Result};
use zerocopy::byteorder::big_endian::U16;
use zerocopy::FromBytes;

/// Resolves leaf references to record text
#[derive(Clone, Copy)]
pub struct RecordResolver<'a> {
    payload: &'a [u8],
    node_count: u32,
    table_size: usize,
}

impl<'a> RecordResolver<'a> {
    /// Create a resolver over the whole payload (node table included)
    pub fn new(payload: &'a [u8], trie: &TrieStore<'_>) -> Self {
        Self {
            payload,
            node_count: trie.node_count(),
            table_size: trie.table_size(),
        }
    }

    /// Payload offset of the record a leaf reference points to
    pub fn record_offset(&self, node: u32) -> Result<usize> {
        let relative = node.checked_sub(self.node_count).ok_or_else(|| {
            IpdbError::DatabaseCorrupt(format!(
                "reference {} is not a data pointer (node_count = {})",
                node, self.node_count
            ))
        })?;
        Ok(relative as usize + self.table_size)
    }

    /// Record text for a terminal reference
    ///
    /// Malformed UTF-8 is reported as `DatabaseCorrupt`.
    pub fn resolve(&self, node: u32) -> Result<&'a str> {
        let offset = self.record_offset(node)?;
        let tail = self.payload.get(offset..).ok_or_else(|| {
            IpdbError::DatabaseCorrupt(format!(
                "record offset {} outside buffer of {} bytes",
                offset,
                self.payload.len()
            ))
        })?;

        let (size, body) = U16::read_from_prefix(tail).map_err(|_| {
            IpdbError::DatabaseCorrupt(format!(
                "record length at offset {} truncated",
                offset
            ))
        })?;
        let size = size.get() as usize;

        let bytes = body.get(..size).ok_or_else(|| {
            IpdbError::DatabaseCorrupt(format!(
                "record at offset {} needs {} bytes, buffer has {}",
                offset,
                DATA_LENGTH_BYTES + size,
                tail.len()
            ))
        })?;

        std::str::from_utf8(bytes).map_err(|e| {
            IpdbError::DatabaseCorrupt(format!("record at offset {} is not UTF-8: {}", offset, e))
        })
    }
}
