//! Merged IPv4 range export
//!
//! Walks the IPv4 space in address order, one lookup per matched block:
//! after a lookup the next address is the block's end plus one. Adjacent
//! blocks that resolve to the same leaf are merged into a single range.
//!
//! [`RangeExport`] is an iterator, so a consumer can stop between ranges
//! simply by dropping it.

use crate::database::Database;
use crate::error::Result;
use crate::ipdb::FieldProjector;
use std::borrow::Cow;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

/// Rendering of an empty column in exported lines
pub const EMPTY_PLACEHOLDER: &str = "*";

/// A maximal run of IPv4 addresses sharing one leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRange<'a> {
    /// Leaf reference shared by the whole run
    pub node: u32,
    /// First address
    pub start: Ipv4Addr,
    /// Last address
    pub end: Ipv4Addr,
    /// Columns for the exported language
    pub values: Vec<&'a str>,
}

impl MergedRange<'_> {
    /// `ip_start, ip_end, fields...` with empty values rendered as `*`
    pub fn columns(&self) -> Vec<Cow<'_, str>> {
        let mut columns = Vec::with_capacity(self.values.len() + 2);
        columns.push(Cow::Owned(self.start.to_string()));
        columns.push(Cow::Owned(self.end.to_string()));
        columns.extend(self.values.iter().map(|v| {
            if v.is_empty() {
                Cow::Borrowed(EMPTY_PLACEHOLDER)
            } else {
                Cow::Borrowed(*v)
            }
        }));
        columns
    }
}

impl fmt::Display for MergedRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.columns().join("\t"))
    }
}

/// Iterator over merged ranges
///
/// Yields `Err` once and then stops if any lookup fails.
pub struct RangeExport<'a> {
    db: &'a Database,
    projector: FieldProjector,
    next_addr: Option<u32>,
    pending: Option<MergedRange<'a>>,
    emitted: usize,
}

impl<'a> RangeExport<'a> {
    pub(crate) fn new(db: &'a Database, projector: FieldProjector) -> Self {
        Self {
            db,
            projector,
            next_addr: Some(0),
            pending: None,
            emitted: 0,
        }
    }

    fn emit(&mut self, range: MergedRange<'a>) -> Option<Result<MergedRange<'a>>> {
        self.emitted += 1;
        Some(Ok(range))
    }
}

impl<'a> Iterator for RangeExport<'a> {
    type Item = Result<MergedRange<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(addr) = self.next_addr else {
                let last = self.pending.take()?;
                let item = self.emit(last);
                debug!(ranges = self.emitted, "export finished");
                return item;
            };

            let result = match self
                .db
                .find(IpAddr::V4(Ipv4Addr::from(addr)), &self.projector)
            {
                Ok(result) => result,
                Err(e) => {
                    self.next_addr = None;
                    self.pending = None;
                    return Some(Err(e));
                }
            };

            // IPv4 results always carry an end address.
            let end = result.network.end_v4().unwrap_or(Ipv4Addr::BROADCAST);
            self.next_addr = u32::from(end).checked_add(1);

            if let Some(prev) = self.pending.as_mut() {
                if prev.node == result.node {
                    prev.end = end;
                    continue;
                }
            }

            let range = MergedRange {
                node: result.node,
                start: Ipv4Addr::from(addr),
                end,
                values: result.values,
            };
            if let Some(prev) = self.pending.replace(range) {
                return self.emit(prev);
            }
        }
    }
}
