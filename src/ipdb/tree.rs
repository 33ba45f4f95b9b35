//! IPDB Search Tree Traversal
//!
//! Walks the node table one address bit at a time (most significant bit
//! first) until a child reference leaves the table. IPv4 addresses share
//! the IPv6 trie: their walk starts at the precomputed IPv4 entry node
//! instead of the root.

use super::trie::TrieStore;
use super::types::AddressFamily;
use crate::error::{IpdbError, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Network block that produced a lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNetwork {
    /// First address of the block
    pub start: IpAddr,
    /// Last address of the block; only computed for IPv4
    pub end: Option<IpAddr>,
    /// Number of address bits consumed before the leaf
    pub prefix_len: u8,
}

impl IpNetwork {
    fn v4(addr: Ipv4Addr, prefix_len: u8) -> Self {
        let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
        let start = u32::from(addr) & mask;
        Self {
            start: IpAddr::V4(Ipv4Addr::from(start)),
            end: Some(IpAddr::V4(Ipv4Addr::from(start | !mask))),
            prefix_len,
        }
    }

    fn v6(addr: Ipv6Addr, prefix_len: u8) -> Self {
        let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
        Self {
            start: IpAddr::V6(Ipv6Addr::from(u128::from(addr) & mask)),
            end: None,
            prefix_len,
        }
    }

    /// Last address of an IPv4 block
    pub fn end_v4(&self) -> Option<Ipv4Addr> {
        match self.end {
            Some(IpAddr::V4(end)) => Some(end),
            _ => None,
        }
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.prefix_len)
    }
}

/// Result of a successful walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    /// Terminal child reference (always greater than `node_count`)
    pub node: u32,
    /// Block the address belongs to
    pub network: IpNetwork,
}

/// Search tree for IP address lookups
#[derive(Clone, Copy)]
pub struct SearchTree<'a> {
    trie: TrieStore<'a>,
    ipv4_entry: u32,
}

impl<'a> SearchTree<'a> {
    /// Create a search tree over a node table with a known IPv4 entry node
    pub fn new(trie: TrieStore<'a>, ipv4_entry: u32) -> Self {
        Self { trie, ipv4_entry }
    }

    /// Look up an IP address
    pub fn lookup(&self, ip: IpAddr) -> Result<SearchHit> {
        match ip {
            IpAddr::V4(addr) => self.lookup_v4(addr),
            IpAddr::V6(addr) => self.lookup_v6(addr),
        }
    }

    /// Look up an IPv4 address
    pub fn lookup_v4(&self, addr: Ipv4Addr) -> Result<SearchHit> {
        let (node, depth) = self
            .walk(&addr.octets(), AddressFamily::V4)
            .map_err(|e| not_found(e, addr.into()))?;
        Ok(SearchHit {
            node,
            network: IpNetwork::v4(addr, depth),
        })
    }

    /// Look up an IPv6 address
    pub fn lookup_v6(&self, addr: Ipv6Addr) -> Result<SearchHit> {
        let (node, depth) = self
            .walk(&addr.octets(), AddressFamily::V6)
            .map_err(|e| not_found(e, addr.into()))?;
        Ok(SearchHit {
            node,
            network: IpNetwork::v6(addr, depth),
        })
    }

    /// Walk the trie for `bits` and return (terminal reference, prefix length)
    ///
    /// `DataNotFound` is returned with an empty message and filled in by
    /// the caller, which knows the address.
    fn walk(&self, bits: &[u8], family: AddressFamily) -> Result<(u32, u8)> {
        let node_count = self.trie.node_count();
        let width = family.bit_width();

        let mut node = match family {
            AddressFamily::V4 => self.ipv4_entry,
            AddressFamily::V6 => 0,
        };
        let mut depth = width;

        for i in 0..width {
            if node > node_count {
                depth = i;
                break;
            }
            if node == node_count {
                return Err(IpdbError::DataNotFound(String::new()));
            }
            let bit = (bits[i >> 3] >> (7 - (i & 7))) & 1;
            node = self.trie.child_of(node, bit)?;
        }

        if node <= node_count {
            return Err(IpdbError::DataNotFound(String::new()));
        }

        Ok((node, depth as u8))
    }
}

fn not_found(err: IpdbError, addr: IpAddr) -> IpdbError {
    match err {
        IpdbError::DataNotFound(_) => IpdbError::DataNotFound(addr.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipdb::types::{IPV4_MAPPED_DEPTH, IPV4_MAPPED_ZERO_BITS};

    /// Node table with a 96-node IPv4-mapped chain; `v4` nodes are appended
    /// after it and may refer to each other relative to the entry node.
    fn mapped_table(v4: &[[u32; 2]], extra_nodes: u32) -> (Vec<u8>, u32) {
        let entry = IPV4_MAPPED_DEPTH as u32;
        let count = entry + v4.len() as u32 + extra_nodes;
        let mut nodes = vec![[count, count]; count as usize];
        for (i, node) in nodes.iter_mut().enumerate().take(IPV4_MAPPED_DEPTH) {
            let next = i as u32 + 1;
            if i < IPV4_MAPPED_ZERO_BITS {
                node[0] = next;
            } else {
                node[1] = next;
            }
        }
        for (i, children) in v4.iter().enumerate() {
            nodes[entry as usize + i] = *children;
        }
        let bytes = nodes
            .iter()
            .flat_map(|n| n.iter().flat_map(|c| c.to_be_bytes()))
            .collect();
        (bytes, count)
    }

    #[test]
    fn test_half_split_ipv4() {
        // Entry node 96: left half -> leaf count+10, right half -> leaf count+20.
        let count = 97;
        let (bytes, n) = mapped_table(&[[count + 10, count + 20]], 0);
        assert_eq!(n, count);
        let trie = TrieStore::new(&bytes, n).unwrap();
        let tree = SearchTree::new(trie, trie.ipv4_entry().unwrap());

        let hit = tree.lookup_v4(Ipv4Addr::new(10, 1, 2, 3)).unwrap();
        assert_eq!(hit.node, count + 10);
        assert_eq!(hit.network.prefix_len, 1);
        assert_eq!(hit.network.start, IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        assert_eq!(
            hit.network.end_v4(),
            Some(Ipv4Addr::new(127, 255, 255, 255))
        );

        let hit = tree.lookup_v4(Ipv4Addr::new(200, 0, 0, 1)).unwrap();
        assert_eq!(hit.node, count + 20);
        assert_eq!(hit.network.to_string(), "128.0.0.0/1");
        assert_eq!(
            hit.network.end_v4(),
            Some(Ipv4Addr::new(255, 255, 255, 255))
        );
    }

    #[test]
    fn test_empty_branch_is_not_found() {
        let count = 97;
        let (bytes, n) = mapped_table(&[[count, count + 5]], 0);
        let trie = TrieStore::new(&bytes, n).unwrap();
        let tree = SearchTree::new(trie, trie.ipv4_entry().unwrap());

        let err = tree.lookup_v4(Ipv4Addr::new(1, 2, 3, 4)).unwrap_err();
        match err {
            IpdbError::DataNotFound(addr) => assert_eq!(addr, "1.2.3.4"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(tree.lookup_v4(Ipv4Addr::new(129, 0, 0, 0)).is_ok());
    }

    #[test]
    fn test_trie_deeper_than_address_is_not_found() {
        // Node 96 points to itself forever: 32 bits run out before any leaf.
        let (bytes, n) = mapped_table(&[[96, 96]], 0);
        let trie = TrieStore::new(&bytes, n).unwrap();
        let tree = SearchTree::new(trie, trie.ipv4_entry().unwrap());
        assert!(matches!(
            tree.lookup_v4(Ipv4Addr::new(8, 8, 8, 8)),
            Err(IpdbError::DataNotFound(_))
        ));
    }

    #[test]
    fn test_leaf_on_last_bit_is_full_prefix() {
        // A chain of 32 nodes for 1.2.3.4 exactly; the final child is a leaf.
        let addr = u32::from(Ipv4Addr::new(1, 2, 3, 4));
        let base = IPV4_MAPPED_DEPTH as u32;
        let count = base + 32;
        let leaf = count + 42;
        let mut v4 = vec![[count, count]; 32];
        for (i, node) in v4.iter_mut().enumerate() {
            let bit = ((addr >> (31 - i)) & 1) as usize;
            node[bit] = if i == 31 { leaf } else { base + i as u32 + 1 };
        }
        let (bytes, n) = mapped_table(&v4, 0);
        assert_eq!(n, count);
        let trie = TrieStore::new(&bytes, n).unwrap();
        let tree = SearchTree::new(trie, trie.ipv4_entry().unwrap());

        let hit = tree.lookup_v4(Ipv4Addr::new(1, 2, 3, 4)).unwrap();
        assert_eq!(hit.node, leaf);
        assert_eq!(hit.network.prefix_len, 32);
        assert_eq!(hit.network.start, IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)));
        assert_eq!(hit.network.end_v4(), Some(Ipv4Addr::new(1, 2, 3, 4)));

        assert!(tree.lookup_v4(Ipv4Addr::new(1, 2, 3, 5)).is_err());
    }

    #[test]
    fn test_ipv6_lookup_from_root() {
        // Root: 0xxx -> node 1, 1xxx -> leaf. Node 1: 00xx -> leaf, 01xx -> empty.
        let count = 2u32;
        let nodes: [[u32; 2]; 2] = [[1, count + 7], [count + 3, count]];
        let bytes: Vec<u8> = nodes
            .iter()
            .flat_map(|n| n.iter().flat_map(|c| c.to_be_bytes()))
            .collect();
        let trie = TrieStore::new(&bytes, count).unwrap();
        let tree = SearchTree::new(trie, trie.ipv4_entry().unwrap());

        let hit = tree.lookup_v6("2001:db8::1".parse().unwrap()).unwrap();
        assert_eq!(hit.node, count + 3);
        assert_eq!(hit.network.prefix_len, 2);
        assert_eq!(hit.network.start, "::".parse::<IpAddr>().unwrap());
        assert_eq!(hit.network.end, None);

        let hit = tree.lookup_v6("8000::1".parse().unwrap()).unwrap();
        assert_eq!(hit.node, count + 7);
        assert_eq!(hit.network.to_string(), "8000::/1");

        assert!(matches!(
            tree.lookup_v6("4000::".parse().unwrap()),
            Err(IpdbError::DataNotFound(_))
        ));
    }
}
