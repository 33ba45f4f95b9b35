//! Fixed-width node table
//!
//! Each node is two big-endian `u32` child references: index 0 for an
//! address bit of 0, index 1 for a bit of 1. A reference below
//! `node_count` names another node, `node_count` itself marks an empty
//! branch, and anything above it points into the data segment.

use super::types::{IPV4_MAPPED_DEPTH, IPV4_MAPPED_ZERO_BITS, NODE_BYTES};
use crate::error::{IpdbError, Result};
use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// On-disk node layout (8 bytes, no alignment requirement)
#[derive(FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawNode {
    children: [U32; 2],
}

/// Read-only view over the node table at the start of the payload
#[derive(Clone, Copy)]
pub struct TrieStore<'a> {
    nodes: &'a [RawNode],
    node_count: u32,
}

impl<'a> TrieStore<'a> {
    /// Borrow the first `node_count * 8` bytes of `payload` as the node table
    pub fn new(payload: &'a [u8], node_count: u32) -> Result<Self> {
        let (nodes, _data) =
            <[RawNode]>::ref_from_prefix_with_elems(payload, node_count as usize).map_err(
                |_| {
                    IpdbError::DatabaseCorrupt(format!(
                        "node table needs {} bytes, payload has {}",
                        node_count as usize * NODE_BYTES,
                        payload.len()
                    ))
                },
            )?;
        Ok(Self { nodes, node_count })
    }

    /// Number of nodes in the table
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Length of the node table in bytes
    pub fn table_size(&self) -> usize {
        self.node_count as usize * NODE_BYTES
    }

    /// Child reference of `node` for address bit `bit`
    #[inline]
    pub fn child_of(&self, node: u32, bit: u8) -> Result<u32> {
        let raw = self.nodes.get(node as usize).ok_or_else(|| {
            IpdbError::DatabaseCorrupt(format!(
                "node index {} exceeds node count {}",
                node, self.node_count
            ))
        })?;
        Ok(raw.children[(bit & 1) as usize].get())
    }

    /// Find the node that roots the IPv4 address space
    ///
    /// Walks 80 zero bits then 16 one bits from the root (the
    /// `::ffff:0:0/96` prefix). Stops early once the walk leaves the node
    /// table.
    pub fn ipv4_entry(&self) -> Result<u32> {
        let mut node = 0u32;
        for depth in 0..IPV4_MAPPED_DEPTH {
            if node >= self.node_count {
                break;
            }
            let bit = u8::from(depth >= IPV4_MAPPED_ZERO_BITS);
            node = self.child_of(node, bit)?;
        }
        Ok(node)
    }
}
