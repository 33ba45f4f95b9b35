//! ipdb - Reader for IPDB geolocation databases
//!
//! An IPDB file holds a JSON metadata header, a binary trie over address
//! bits and a data segment of tab-separated text records, one column
//! block per language. A [`Database`] is loaded once and then answers
//! point lookups for IPv4 and IPv6 addresses.
//!
//! # Quick Start
//!
//! ```rust
//! use ipdb::{Database, DatabaseBuilder};
//!
//! let mut builder = DatabaseBuilder::new(&["country", "region"]).language("CN");
//! builder.add_entry("0.0.0.0/1", &["保留", ""])?;
//! builder.add_entry("128.0.0.0/1", &["保留", ""])?;
//! builder.add_entry("1.1.1.0/24", &["China", "Guangdong"])?;
//!
//! let db = Database::from_bytes(builder.build()?)?;
//! let row = db.lookup("1.1.1.5", "CN")?;
//! assert_eq!(&row[1..], &["1.1.1.0", "1.1.1.255", "China", "Guangdong"]);
//! # Ok::<(), ipdb::IpdbError>(())
//! ```
//!
//! # File Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  4-byte metadata length L            │
//! │  JSON metadata (L bytes)             │
//! │  Node table (node_count * 8 bytes)   │
//! │  Data segment ([u16 len][UTF-8])*    │
//! └──────────────────────────────────────┘
//! ```
//!
//! # Export
//!
//! [`Database::export_ranges`] walks the IPv4 space and yields one
//! [`MergedRange`] per run of addresses sharing a record.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Writer for IPDB files
pub mod builder;
/// Typed city record
pub mod city;
/// Database handle and lookups
pub mod database;
/// Error types
pub mod error;
/// Merged IPv4 range export
pub mod export;
/// IPDB format implementation
pub mod ipdb;

pub use crate::builder::DatabaseBuilder;
pub use crate::city::CityInfo;
pub use crate::database::{parse_address, Database, LookupResult};
pub use crate::error::{IpdbError, Result};
pub use crate::export::{MergedRange, RangeExport, EMPTY_PLACEHOLDER};
pub use crate::ipdb::{IpNetwork, MetaData};

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
