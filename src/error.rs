//! Error types for the ipdb library

use std::io;
use thiserror::Error;

/// Result type alias for ipdb operations
pub type Result<T> = std::result::Result<T, IpdbError>;

/// Main error type for loading and querying a database
///
/// Load-time variants (`FileSize`, `Metadata`, `Io`) abort construction.
/// Everything else is returned per query.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IpdbError {
    /// Failed to open or map the database file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File is shorter than its header or its length disagrees with `total_size`
    #[error("file size error: {0}")]
    FileSize(String),

    /// Metadata block is malformed or missing required fields
    #[error("metadata error: {0}")]
    Metadata(String),

    /// An offset or record points outside the buffer, or a record is malformed
    #[error("database corrupt: {0}")]
    DatabaseCorrupt(String),

    /// Requested language is not present in the metadata
    #[error("language not supported: {0}")]
    UnsupportedLanguage(String),

    /// Address family is not enabled in `ip_version`
    #[error("{0} not supported by this database")]
    UnsupportedAddressFamily(&'static str),

    /// Input is not a parseable IPv4 or IPv6 address
    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    /// Trie traversal finished without reaching a record
    #[error("no data for {0}")]
    DataNotFound(String),

    /// A record could not be converted into the requested type
    #[error("record deserialization failed: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// Builder input was rejected
    #[error("build error: {0}")]
    Build(String),
}

impl IpdbError {
    /// True for errors that can only come from a damaged or hostile file
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            IpdbError::FileSize(_) | IpdbError::Metadata(_) | IpdbError::DatabaseCorrupt(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = IpdbError::UnsupportedLanguage("XX".to_string());
        assert_eq!(err.to_string(), "language not supported: XX");

        let err = IpdbError::UnsupportedAddressFamily("IPv6");
        assert_eq!(err.to_string(), "IPv6 not supported by this database");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: IpdbError = io_err.into();
        assert!(matches!(err, IpdbError::Io(_)));
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_corruption_classification() {
        assert!(IpdbError::FileSize("short".into()).is_corruption());
        assert!(IpdbError::DatabaseCorrupt("bad".into()).is_corruption());
        assert!(!IpdbError::DataNotFound("1.2.3.4".into()).is_corruption());
    }
}
