//! IPDB Binary Format Parsing
//!
//! The file starts with a 4-byte big-endian length `L`, followed by `L`
//! bytes of JSON metadata. Everything after that is the payload: the node
//! table (`node_count * 8` bytes) and then the data segment.
//!
//! ```text
//! ┌──────────┬──────────────┬──────────────────┬──────────────────────┐
//! │ L (u32)  │ metadata (L) │ node table       │ data segment         │
//! └──────────┴──────────────┴──────────────────┴──────────────────────┘
//!            total file length == 4 + L + total_size
//! ```

use super::types::{AddressFamily, META_LENGTH_BYTES};
use crate::error::{IpdbError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use zerocopy::byteorder::big_endian::U32;
use zerocopy::FromBytes;

/// Parsed metadata block
///
/// Immutable once loaded. Every key is required; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    /// Unix timestamp of database generation
    pub build: i64,
    /// Bitmask of supported families (see [`IPV4`](super::types::IPV4), [`IPV6`](super::types::IPV6))
    pub ip_version: u16,
    /// Language code -> index of that language's first field in a record
    pub languages: HashMap<String, usize>,
    /// Number of trie nodes
    pub node_count: u32,
    /// Byte length of everything after the metadata block
    pub total_size: usize,
    /// Column names shared by every language's field block
    pub fields: Vec<String>,
}

impl MetaData {
    /// Whether lookups for `family` are enabled
    pub fn supports(&self, family: AddressFamily) -> bool {
        self.ip_version & family.flag() == family.flag()
    }

    /// Field offset for a language code
    pub fn language_offset(&self, language: &str) -> Result<usize> {
        self.languages
            .get(language)
            .copied()
            .ok_or_else(|| IpdbError::UnsupportedLanguage(language.to_string()))
    }

    /// Build timestamp as a `SystemTime`
    pub fn build_time(&self) -> SystemTime {
        let secs = Duration::from_secs(self.build.unsigned_abs());
        if self.build >= 0 {
            UNIX_EPOCH + secs
        } else {
            UNIX_EPOCH - secs
        }
    }
}

/// Parse and validate the metadata header
///
/// Returns the metadata and the payload slice (node table + data segment).
pub fn parse_header(data: &[u8]) -> Result<(MetaData, &[u8])> {
    let (meta_length, rest) = U32::read_from_prefix(data).map_err(|_| {
        IpdbError::FileSize(format!(
            "file is {} bytes, need at least {}",
            data.len(),
            META_LENGTH_BYTES
        ))
    })?;
    let meta_length = meta_length.get() as usize;

    if rest.len() < meta_length {
        return Err(IpdbError::FileSize(format!(
            "metadata length {} exceeds file size {}",
            meta_length,
            data.len()
        )));
    }
    let (meta_bytes, payload) = rest.split_at(meta_length);

    let meta: MetaData = serde_json::from_slice(meta_bytes)
        .map_err(|e| IpdbError::Metadata(format!("failed to decode metadata: {}", e)))?;

    if meta.languages.is_empty() {
        return Err(IpdbError::Metadata("no languages declared".to_string()));
    }
    if meta.fields.is_empty() {
        return Err(IpdbError::Metadata("no fields declared".to_string()));
    }
    if meta.node_count == 0 {
        return Err(IpdbError::Metadata("node_count must be positive".to_string()));
    }

    if payload.len() != meta.total_size {
        return Err(IpdbError::FileSize(format!(
            "file is {} bytes, header declares {}",
            data.len(),
            META_LENGTH_BYTES + meta_length + meta.total_size
        )));
    }

    Ok((meta, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipdb::types::{IPV4, IPV6};

    fn frame(meta: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = (meta.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(meta.as_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn meta_json(total_size: usize) -> String {
        format!(
            r#"{{"build":1700000000,"ip_version":1,"languages":{{"CN":0}},"node_count":1,"total_size":{},"fields":["country"]}}"#,
            total_size
        )
    }

    #[test]
    fn test_parse_valid_header() {
        let data = frame(&meta_json(8), &[0u8; 8]);
        let (meta, payload) = parse_header(&data).unwrap();
        assert_eq!(meta.node_count, 1);
        assert_eq!(meta.fields, vec!["country".to_string()]);
        assert_eq!(meta.language_offset("CN").unwrap(), 0);
        assert_eq!(payload.len(), 8);
    }

    #[test]
    fn test_too_short_for_length_prefix() {
        let result = parse_header(&[0, 0, 1]);
        assert!(matches!(result, Err(IpdbError::FileSize(_))));
    }

    #[test]
    fn test_metadata_length_exceeds_file() {
        let mut data = 1000u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"{}");
        assert!(matches!(parse_header(&data), Err(IpdbError::FileSize(_))));
    }

    #[test]
    fn test_total_size_mismatch() {
        let data = frame(&meta_json(16), &[0u8; 8]);
        assert!(matches!(parse_header(&data), Err(IpdbError::FileSize(_))));

        let data = frame(&meta_json(4), &[0u8; 8]);
        assert!(matches!(parse_header(&data), Err(IpdbError::FileSize(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let meta = r#"{"build":1,"ip_version":1,"languages":{"CN":0},"total_size":0,"fields":["a"]}"#;
        let data = frame(meta, &[]);
        assert!(matches!(parse_header(&data), Err(IpdbError::Metadata(_))));
    }

    #[test]
    fn test_empty_languages_or_fields() {
        let meta = r#"{"build":1,"ip_version":1,"languages":{},"node_count":1,"total_size":0,"fields":["a"]}"#;
        assert!(matches!(parse_header(&frame(meta, &[])), Err(IpdbError::Metadata(_))));

        let meta = r#"{"build":1,"ip_version":1,"languages":{"CN":0},"node_count":1,"total_size":0,"fields":[]}"#;
        assert!(matches!(parse_header(&frame(meta, &[])), Err(IpdbError::Metadata(_))));
    }

    #[test]
    fn test_zero_node_count() {
        let meta = r#"{"build":1,"ip_version":1,"languages":{"CN":0},"node_count":0,"total_size":0,"fields":["a"]}"#;
        assert!(matches!(parse_header(&frame(meta, &[])), Err(IpdbError::Metadata(_))));
    }

    #[test]
    fn test_malformed_json() {
        let data = frame("{not json", &[]);
        assert!(matches!(parse_header(&data), Err(IpdbError::Metadata(_))));
    }

    #[test]
    fn test_family_flags() {
        let data = frame(&meta_json(8), &[0u8; 8]);
        let (mut meta, _) = parse_header(&data).unwrap();
        assert!(meta.supports(AddressFamily::V4));
        assert!(!meta.supports(AddressFamily::V6));

        meta.ip_version = IPV4 | IPV6;
        assert!(meta.supports(AddressFamily::V6));
    }

    #[test]
    fn test_build_time() {
        let data = frame(&meta_json(8), &[0u8; 8]);
        let (meta, _) = parse_header(&data).unwrap();
        let secs = meta
            .build_time()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert_eq!(secs, 1_700_000_000);
    }
}
