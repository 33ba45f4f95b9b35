//! IPDB Reader
//!
//! Decoding for the IPDB geolocation format: a JSON metadata header, a
//! binary trie over address bits with 32-bit child references, and a data
//! segment of tab-separated, length-prefixed text records.
//!
//! ## Architecture
//!
//! - **types**: constants and the address family enum
//! - **format**: metadata header parsing and size validation
//! - **trie**: typed view over the node table, IPv4 entry node
//! - **tree**: bit-by-bit search and network reconstruction
//! - **record**: leaf reference to record text
//! - **fields**: per-language column projection

pub mod fields;
pub mod format;
pub mod record;
pub mod tree;
pub mod trie;
pub mod types;

pub use fields::{FieldProjector, FIELD_SEPARATOR};
pub use format::{parse_header, MetaData};
pub use record::RecordResolver;
pub use tree::{IpNetwork, SearchHit, SearchTree};
pub use trie::TrieStore;
pub use types::{AddressFamily, IPV4, IPV6};
