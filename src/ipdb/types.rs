//! IPDB-specific types and constants

/// `ip_version` bit for IPv4 support
pub const IPV4: u16 = 0x01;

/// `ip_version` bit for IPv6 support
pub const IPV6: u16 = 0x02;

/// Size of the big-endian metadata length prefix at the start of the file
pub const META_LENGTH_BYTES: usize = 4;

/// Size of one child reference in the node table
pub const RECORD_BYTES: usize = 4;

/// Size of one trie node (two child references)
pub const NODE_BYTES: usize = RECORD_BYTES * 2;

/// Size of the big-endian length prefix in front of every data record
pub const DATA_LENGTH_BYTES: usize = 2;

/// Leading zero bits of the IPv4-mapped prefix (`::ffff:0:0/96`)
pub const IPV4_MAPPED_ZERO_BITS: usize = 80;

/// Total depth of the IPv4-mapped prefix
pub const IPV4_MAPPED_DEPTH: usize = 96;

/// IP address family of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    /// 32-bit addresses, looked up below the IPv4-mapped entry node
    V4,
    /// 128-bit addresses, looked up from the root
    V6,
}

impl AddressFamily {
    /// Number of address bits walked during a lookup
    pub fn bit_width(self) -> usize {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }

    /// The `ip_version` bit that enables this family
    pub fn flag(self) -> u16 {
        match self {
            AddressFamily::V4 => IPV4,
            AddressFamily::V6 => IPV6,
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_widths() {
        assert_eq!(AddressFamily::V4.bit_width(), 32);
        assert_eq!(AddressFamily::V6.bit_width(), 128);
        assert_eq!(AddressFamily::V4.flag() | AddressFamily::V6.flag(), 0x03);
    }
}
