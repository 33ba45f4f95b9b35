//! Per-language field projection
//!
//! A record holds every language's field block back to back, tab
//! separated. A language's block starts at its declared offset and is
//! exactly `fields.len()` columns wide.

use super::format::MetaData;
use crate::error::{IpdbError, Result};

/// Separator between columns of a record
pub const FIELD_SEPARATOR: char = '\t';

/// Slices one language's columns out of a record
#[derive(Debug, Clone, Copy)]
pub struct FieldProjector {
    offset: usize,
    width: usize,
}

impl FieldProjector {
    /// Projector for `language`, or `UnsupportedLanguage`
    pub fn for_language(meta: &MetaData, language: &str) -> Result<Self> {
        Ok(Self {
            offset: meta.language_offset(language)?,
            width: meta.fields.len(),
        })
    }

    /// Return this language's columns of `record`, in declared field order
    pub fn project<'r>(&self, record: &'r str) -> Result<Vec<&'r str>> {
        let columns: Vec<&str> = record
            .split(FIELD_SEPARATOR)
            .skip(self.offset)
            .take(self.width)
            .collect();

        if columns.len() < self.width {
            return Err(IpdbError::DatabaseCorrupt(format!(
                "record has {} columns, language block needs {}..{}",
                record.split(FIELD_SEPARATOR).count(),
                self.offset,
                self.offset + self.width
            )));
        }
        Ok(columns)
    }
}
