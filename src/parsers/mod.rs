//! Value-format parsers.
//!
//! Each parser turns a raw CSV string into structured metadata entries:
//!
//! - [`multilingual`] - `lang:content|lang:content` segment grammar
//! - [`list`] - array fields (one entry holding a list) and semicolon
//!   lists (one entry per token)
//! - [`rights`] - precedence-ordered rights / access-control grammar
//!
//! Parsers never fail an item. Malformed input degrades to a plain-string
//! entry plus a warning carried in the [`ParseOutcome`].

pub mod list;
pub mod multilingual;
pub mod rights;

use crate::models::{types, MetadataEntry};
use crate::registry::{FieldMapping, ValueFormat};

/// Entries produced from one raw value, plus non-blocking warnings.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub entries: Vec<MetadataEntry>,
    pub warnings: Vec<String>,
}

impl ParseOutcome {
    pub fn single(entry: MetadataEntry) -> Self {
        Self { entries: vec![entry], warnings: Vec::new() }
    }

    pub fn warn(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }
}

/// Parse a raw value according to its field mapping.
///
/// One exhaustive match dispatches to the parser bound to each value
/// format; no string-tag comparisons anywhere downstream.
pub fn parse_value(mapping: &FieldMapping, raw: &str, default_language: &str) -> ParseOutcome {
    match mapping.value_format {
        ValueFormat::Plain => {
            let type_id = if mapping.semantic_field == "date" {
                types::DATE
            } else {
                types::STRING
            };
            ParseOutcome::single(
                MetadataEntry::text(mapping.property_id, raw.trim()).with_type(type_id),
            )
        }
        ValueFormat::Multilingual => multilingual::parse(
            mapping.property_id,
            raw,
            default_language,
            mapping.semantic_field == "keywords",
        ),
        ValueFormat::Array => list::parse_array(mapping.property_id, raw),
        ValueFormat::SemicolonList => list::parse_semicolon_list(mapping.property_id, raw),
        ValueFormat::RightsList => rights::parse(mapping.property_id, raw),
        // Data references from creation layouts are carried verbatim;
        // resolving them against storage is an outer deposit concern.
        ValueFormat::FileReference | ValueFormat::FolderPatterns => {
            ParseOutcome::single(MetadataEntry::text(mapping.property_id, raw.trim()))
        }
    }
}
