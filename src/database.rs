//! Database API
//!
//! [`Database`] owns the file bytes (mapped or on the heap), the parsed
//! metadata and the precomputed IPv4 entry node. Nothing is mutated after
//! construction, so one instance can serve lookups from many threads.
//! To reload, open a new instance and swap it in.

use crate::error::{IpdbError, Result};
use crate::export::RangeExport;
use crate::ipdb::{
    parse_header, AddressFamily, FieldProjector, IpNetwork, MetaData, RecordResolver, SearchTree,
    TrieStore,
};
use memmap2::Mmap;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::File;
use std::net::IpAddr;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, trace};

/// Key for the leaf reference in [`Database::lookup_map`]
pub const KEY_NODE: &str = "node";
/// Key for the block's first address in [`Database::lookup_map`]
pub const KEY_IP_START: &str = "ip_start";
/// Key for the block's last address in [`Database::lookup_map`]
pub const KEY_IP_END: &str = "ip_end";

/// Storage for database data - either owned or memory-mapped
enum DatabaseStorage {
    Owned(Vec<u8>),
    Mmap(Mmap),
}

impl DatabaseStorage {
    fn as_slice(&self) -> &[u8] {
        match self {
            DatabaseStorage::Owned(v) => v.as_slice(),
            DatabaseStorage::Mmap(m) => &m[..],
        }
    }
}

/// One lookup: the leaf, its network block and the projected columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult<'a> {
    /// Leaf reference the address resolved to
    pub node: u32,
    /// Block containing the address
    pub network: IpNetwork,
    /// Columns for the requested language, in declared field order
    pub values: Vec<&'a str>,
}

impl LookupResult<'_> {
    /// First address of the block
    pub fn ip_start(&self) -> String {
        self.network.start.to_string()
    }

    /// Last address of the block, or an empty string for IPv6
    pub fn ip_end(&self) -> String {
        self.network.end.map(|e| e.to_string()).unwrap_or_default()
    }

    /// `[node, ip_start, ip_end, field_1, ..., field_N]`
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.values.len() + 3);
        row.push(self.node.to_string());
        row.push(self.ip_start());
        row.push(self.ip_end());
        row.extend(self.values.iter().map(|v| v.to_string()));
        row
    }
}

/// A loaded IPDB database
pub struct Database {
    data: DatabaseStorage,
    meta: MetaData,
    payload_offset: usize,
    ipv4_entry: u32,
}

impl Database {
    /// Open a database file using memory mapping
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the mapping is read-only and never handed out mutably; the
        // file must not be truncated while the database is alive.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_storage(DatabaseStorage::Mmap(mmap))
    }

    /// Read a database file fully into memory
    pub fn open_in_memory<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(std::fs::read(path.as_ref())?)
    }

    /// Create database from raw bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_storage(DatabaseStorage::Owned(data))
    }

    fn from_storage(storage: DatabaseStorage) -> Result<Self> {
        let data = storage.as_slice();
        let (meta, payload) = parse_header(data)?;
        let payload_offset = data.len() - payload.len();

        let trie = TrieStore::new(payload, meta.node_count)?;
        let ipv4_entry = trie.ipv4_entry()?;

        debug!(
            node_count = meta.node_count,
            build = meta.build,
            ip_version = meta.ip_version,
            languages = ?meta.languages,
            ipv4_entry,
            "loaded database"
        );

        Ok(Self {
            data: storage,
            meta,
            payload_offset,
            ipv4_entry,
        })
    }

    fn payload(&self) -> &[u8] {
        &self.data.as_slice()[self.payload_offset..]
    }

    fn trie(&self) -> Result<TrieStore<'_>> {
        TrieStore::new(self.payload(), self.meta.node_count)
    }

    /// Parsed metadata
    pub fn metadata(&self) -> &MetaData {
        &self.meta
    }

    /// When the database was generated
    pub fn build_time(&self) -> SystemTime {
        self.meta.build_time()
    }

    /// Supported language codes, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.meta.languages.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Declared column names
    pub fn fields(&self) -> &[String] {
        &self.meta.fields
    }

    /// Whether IPv4 lookups are enabled
    pub fn is_ipv4_supported(&self) -> bool {
        self.meta.supports(AddressFamily::V4)
    }

    /// Whether IPv6 lookups are enabled
    pub fn is_ipv6_supported(&self) -> bool {
        self.meta.supports(AddressFamily::V6)
    }

    /// Node that roots the IPv4 address space
    pub fn ipv4_entry(&self) -> u32 {
        self.ipv4_entry
    }

    /// Size of the underlying file in bytes
    pub fn size(&self) -> usize {
        self.data.as_slice().len()
    }

    /// Ordered columns for an address: `[node, ip_start, ip_end, fields...]`
    pub fn lookup(&self, addr: &str, language: &str) -> Result<Vec<String>> {
        let ip = parse_address(addr)?;
        Ok(self.lookup_ip(ip, language)?.to_row())
    }

    /// Columns for an address keyed by field name, plus `node`, `ip_start`, `ip_end`
    pub fn lookup_map(&self, addr: &str, language: &str) -> Result<BTreeMap<String, String>> {
        let ip = parse_address(addr)?;
        let result = self.lookup_ip(ip, language)?;

        let mut map = BTreeMap::new();
        map.insert(KEY_NODE.to_string(), result.node.to_string());
        map.insert(KEY_IP_START.to_string(), result.ip_start());
        map.insert(KEY_IP_END.to_string(), result.ip_end());
        for (name, value) in self.meta.fields.iter().zip(&result.values) {
            map.insert(name.clone(), value.to_string());
        }
        Ok(map)
    }

    /// Deserialize the keyed columns of an address into `T`
    ///
    /// ```no_run
    /// use ipdb::{CityInfo, Database};
    ///
    /// let db = Database::open("city.ipdb")?;
    /// let info: CityInfo = db.lookup_info("1.1.1.1", "CN")?;
    /// println!("{}", info.country_name);
    /// # Ok::<(), ipdb::IpdbError>(())
    /// ```
    pub fn lookup_info<T: DeserializeOwned>(&self, addr: &str, language: &str) -> Result<T> {
        let map = self.lookup_map(addr, language)?;
        let object: serde_json::Map<String, serde_json::Value> = map
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        Ok(serde_json::from_value(serde_json::Value::Object(object))?)
    }

    /// Look up a parsed address
    pub fn lookup_ip(&self, ip: IpAddr, language: &str) -> Result<LookupResult<'_>> {
        let projector = FieldProjector::for_language(&self.meta, language)?;
        self.find(ip, &projector)
    }

    /// Walk, resolve and project with a prepared projector
    pub(crate) fn find(&self, ip: IpAddr, projector: &FieldProjector) -> Result<LookupResult<'_>> {
        let ip = normalize(ip);
        let family = match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        };
        if !self.meta.supports(family) {
            return Err(IpdbError::UnsupportedAddressFamily(family.name()));
        }

        let trie = self.trie()?;
        let hit = SearchTree::new(trie, self.ipv4_entry).lookup(ip)?;
        let record = RecordResolver::new(self.payload(), &trie).resolve(hit.node)?;
        let values = projector.project(record)?;

        trace!(%ip, node = hit.node, network = %hit.network, "lookup");

        Ok(LookupResult {
            node: hit.node,
            network: hit.network,
            values,
        })
    }

    /// Merged IPv4 ranges for a language, in address order
    ///
    /// See [`RangeExport`].
    pub fn export_ranges(&self, language: &str) -> Result<RangeExport<'_>> {
        let projector = FieldProjector::for_language(&self.meta, language)?;
        if !self.is_ipv4_supported() {
            return Err(IpdbError::UnsupportedAddressFamily(AddressFamily::V4.name()));
        }
        Ok(RangeExport::new(self, projector))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("size", &self.size())
            .field("node_count", &self.meta.node_count)
            .field("ip_version", &self.meta.ip_version)
            .field("ipv4_entry", &self.ipv4_entry)
            .finish()
    }
}

/// Parse an address string; IPv4-mapped IPv6 forms become IPv4
pub fn parse_address(addr: &str) -> Result<IpAddr> {
    addr.parse::<IpAddr>()
        .map(normalize)
        .map_err(|_| IpdbError::InvalidAddress(addr.to_string()))
}

fn normalize(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        v4 => v4,
    }
}
