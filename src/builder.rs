//! Database Builder
//!
//! Writes IPDB files from CIDR blocks and tab-joined records. Used to
//! produce fixtures for tests, benchmarks and fuzzing; reading never
//! depends on it.
//!
//! IPv4 blocks are placed under `::ffff:0:0/96` so a single trie serves
//! both families. Identical records are stored once and share a leaf
//! reference.

use crate::error::{IpdbError, Result};
use crate::ipdb::types::{
    DATA_LENGTH_BYTES, IPV4, IPV4_MAPPED_DEPTH, IPV6, NODE_BYTES,
};
use crate::ipdb::{MetaData, FIELD_SEPARATOR};
use std::collections::HashMap;
use std::net::IpAddr;

/// A node in the trie arena
#[derive(Debug, Clone)]
struct Node {
    left: NodePointer,
    right: NodePointer,
}

impl Node {
    fn new_empty() -> Self {
        Self {
            left: NodePointer::Empty,
            right: NodePointer::Empty,
        }
    }

    fn child(&self, bit: u8) -> NodePointer {
        if bit == 0 {
            self.left
        } else {
            self.right
        }
    }

    fn set_child(&mut self, bit: u8, pointer: NodePointer) {
        if bit == 0 {
            self.left = pointer;
        } else {
            self.right = pointer;
        }
    }
}

/// Child pointer during building
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodePointer {
    /// Another node in the arena
    Node(u32),
    /// Record index and the prefix length that placed it
    Data(u32, u8),
    /// No data
    Empty,
}

/// Builder for IPDB files
pub struct DatabaseBuilder {
    fields: Vec<String>,
    languages: Vec<String>,
    build: i64,
    ip_version: Option<u16>,
    seen_families: u16,
    nodes: Vec<Node>,
    records: Vec<String>,
    record_ids: HashMap<String, u32>,
}

impl DatabaseBuilder {
    /// Create a builder for records with the given column names
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            languages: Vec::new(),
            build: 0,
            ip_version: None,
            seen_families: 0,
            nodes: vec![Node::new_empty()],
            records: Vec::new(),
            record_ids: HashMap::new(),
        }
    }

    /// Declare a language; blocks are laid out in declaration order
    pub fn language(mut self, code: &str) -> Self {
        self.languages.push(code.to_string());
        self
    }

    /// Set the build timestamp
    pub fn build_time(mut self, epoch: i64) -> Self {
        self.build = epoch;
        self
    }

    /// Override the `ip_version` bitmask (defaults to the families inserted)
    pub fn ip_version(mut self, mask: u16) -> Self {
        self.ip_version = Some(mask);
        self
    }

    /// Insert a CIDR block (`1.1.1.0/24`, `2001:db8::/32`, or a bare address)
    ///
    /// `values` holds every language's columns back to back, in language
    /// declaration order.
    pub fn add_entry(&mut self, cidr: &str, values: &[&str]) -> Result<()> {
        let expected = self.fields.len() * self.languages.len();
        if values.len() != expected {
            return Err(IpdbError::Build(format!(
                "{} values given, {} fields x {} languages need {}",
                values.len(),
                self.fields.len(),
                self.languages.len(),
                expected
            )));
        }

        let (addr, prefix_len) = parse_cidr(cidr)?;
        let separator = FIELD_SEPARATOR.to_string();
        let record_id = self.intern(values.join(&separator));

        let (bits, depth) = match addr {
            IpAddr::V4(v4) => {
                self.seen_families |= IPV4;
                let mapped = (0xffffu128 << 32) | u128::from(u32::from(v4));
                (mapped, IPV4_MAPPED_DEPTH as u8 + prefix_len)
            }
            IpAddr::V6(v6) => {
                self.seen_families |= IPV6;
                (u128::from(v6), prefix_len)
            }
        };
        self.insert_bits(bits, depth, record_id)
    }

    fn intern(&mut self, record: String) -> u32 {
        if let Some(&id) = self.record_ids.get(&record) {
            return id;
        }
        let id = self.records.len() as u32;
        self.records.push(record.clone());
        self.record_ids.insert(record, id);
        id
    }

    fn allocate_node(&mut self) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Node::new_empty());
        id
    }

    fn insert_bits(&mut self, bits: u128, prefix_len: u8, record_id: u32) -> Result<()> {
        if prefix_len == 0 {
            return Err(IpdbError::Build(
                "a zero-length prefix cannot be stored in the trie".to_string(),
            ));
        }

        let mut node_id = 0u32;
        for depth in 0..prefix_len {
            let bit = ((bits >> (127 - depth)) & 1) as u8;
            let child = self.nodes[node_id as usize].child(bit);

            if depth + 1 == prefix_len {
                match child {
                    NodePointer::Empty => {
                        self.nodes[node_id as usize]
                            .set_child(bit, NodePointer::Data(record_id, prefix_len));
                    }
                    NodePointer::Data(_, existing_len) => {
                        if prefix_len >= existing_len {
                            self.nodes[node_id as usize]
                                .set_child(bit, NodePointer::Data(record_id, prefix_len));
                        }
                    }
                    NodePointer::Node(child_id) => {
                        // More specific blocks already live below; fill around them.
                        self.backfill(child_id, record_id, prefix_len);
                    }
                }
                return Ok(());
            }

            node_id = match child {
                NodePointer::Empty => {
                    let new_id = self.allocate_node();
                    self.nodes[node_id as usize].set_child(bit, NodePointer::Node(new_id));
                    new_id
                }
                NodePointer::Node(child_id) => child_id,
                NodePointer::Data(existing_id, existing_len) => {
                    // Split a less specific leaf so the new block can go deeper.
                    let new_id = self.allocate_node();
                    let inherited = NodePointer::Data(existing_id, existing_len);
                    self.nodes[new_id as usize].left = inherited;
                    self.nodes[new_id as usize].right = inherited;
                    self.nodes[node_id as usize].set_child(bit, NodePointer::Node(new_id));
                    new_id
                }
            };
        }
        Ok(())
    }

    fn backfill(&mut self, node_id: u32, record_id: u32, prefix_len: u8) {
        for bit in [0u8, 1] {
            match self.nodes[node_id as usize].child(bit) {
                NodePointer::Empty => {
                    self.nodes[node_id as usize]
                        .set_child(bit, NodePointer::Data(record_id, prefix_len));
                }
                NodePointer::Data(_, existing_len) if prefix_len > existing_len => {
                    self.nodes[node_id as usize]
                        .set_child(bit, NodePointer::Data(record_id, prefix_len));
                }
                NodePointer::Data(..) => {}
                NodePointer::Node(child_id) => self.backfill(child_id, record_id, prefix_len),
            }
        }
    }

    /// Serialize the database
    pub fn build(&self) -> Result<Vec<u8>> {
        if self.languages.is_empty() {
            return Err(IpdbError::Build("no languages declared".to_string()));
        }

        let node_count = self.nodes.len() as u32;

        // Data offset 0 would encode as `node_count`, the empty marker, so
        // the segment opens with an empty record.
        let mut data = vec![0u8; DATA_LENGTH_BYTES];
        let mut record_offsets = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let len = u16::try_from(record.len()).map_err(|_| {
                IpdbError::Build(format!("record of {} bytes is too long", record.len()))
            })?;
            record_offsets.push(data.len());
            data.extend_from_slice(&len.to_be_bytes());
            data.extend_from_slice(record.as_bytes());
        }

        let encode = |pointer: NodePointer| -> Result<u32> {
            match pointer {
                NodePointer::Empty => Ok(node_count),
                NodePointer::Node(id) => Ok(id),
                NodePointer::Data(record_id, _) => {
                    let offset = record_offsets[record_id as usize];
                    u32::try_from(offset)
                        .ok()
                        .and_then(|o| o.checked_add(node_count))
                        .ok_or_else(|| {
                            IpdbError::Build(format!("data offset {} overflows u32", offset))
                        })
                }
            }
        };

        let mut payload = Vec::with_capacity(self.nodes.len() * NODE_BYTES + data.len());
        for node in &self.nodes {
            payload.extend_from_slice(&encode(node.left)?.to_be_bytes());
            payload.extend_from_slice(&encode(node.right)?.to_be_bytes());
        }
        payload.extend_from_slice(&data);

        let width = self.fields.len();
        let meta = MetaData {
            build: self.build,
            ip_version: self.ip_version.unwrap_or(self.seen_families),
            languages: self
                .languages
                .iter()
                .enumerate()
                .map(|(i, code)| (code.clone(), i * width))
                .collect(),
            node_count,
            total_size: payload.len(),
            fields: self.fields.clone(),
        };
        let meta_bytes =
            serde_json::to_vec(&meta).map_err(|e| IpdbError::Build(e.to_string()))?;

        let mut out = Vec::with_capacity(4 + meta_bytes.len() + payload.len());
        out.extend_from_slice(&(meta_bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(&meta_bytes);
        out.extend_from_slice(&payload);
        Ok(out)
    }
}

fn parse_cidr(cidr: &str) -> Result<(IpAddr, u8)> {
    let invalid = || IpdbError::InvalidAddress(cidr.to_string());
    let (addr, prefix) = match cidr.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (cidr, None),
    };
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    let prefix_len = match prefix {
        Some(p) => p.parse::<u8>().map_err(|_| invalid())?,
        None => max,
    };
    if prefix_len > max {
        return Err(invalid());
    }
    Ok((addr, prefix_len))
}
