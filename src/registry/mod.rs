//! Field mapping registry.
//!
//! A static table mapping CSV column names to semantic fields, property
//! identifiers and value formats. Creation-style columns (`title`) and
//! modification-style columns (`new_title`) are aliases resolving to the
//! same semantic field, so both CSV layouts share the downstream parsers
//! and merge logic.
//!
//! The registry is process-wide immutable state, built once on first use.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::terms;

// =============================================================================
// Value formats
// =============================================================================

/// How a raw CSV value decomposes into metadata entries.
///
/// `Array` and `SemicolonList` change the remote payload shape in different
/// ways: an array field becomes ONE entry holding the whole list, while a
/// semicolon list becomes one entry PER token, all sharing a property id.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Plain,
    Multilingual,
    Array,
    SemicolonList,
    RightsList,
    FileReference,
    FolderPatterns,
}

// =============================================================================
// Field mappings
// =============================================================================

/// One CSV column mapped to a semantic field.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldMapping {
    /// CSV column name (one alias; several aliases may share a field).
    pub csv_column: &'static str,
    /// Semantic field name used in change records.
    pub semantic_field: &'static str,
    /// Stable property identifier.
    pub property_id: &'static str,
    /// Whether values use the multilingual segment grammar.
    pub multilingual: bool,
    /// Whether creation-mode validation requires this field.
    pub required_for_creation: bool,
    /// Value format driving parser dispatch.
    pub value_format: ValueFormat,
    /// Controlled vocabulary consulted for advisory warnings.
    pub controlled_vocabulary: Option<&'static str>,
}

/// The full mapping table. One row per column alias.
static MAPPINGS: &[FieldMapping] = &[
    // Core descriptive fields (with modification-mode aliases).
    map("title", "title", terms::TITLE, true, true, ValueFormat::Multilingual, None),
    map("new_title", "title", terms::TITLE, true, true, ValueFormat::Multilingual, None),
    map("creator", "creator", terms::CREATOR, false, true, ValueFormat::SemicolonList, None),
    map("new_creator", "creator", terms::CREATOR, false, true, ValueFormat::SemicolonList, None),
    map("contributor", "contributor", terms::CONTRIBUTOR, false, false, ValueFormat::Array, None),
    map("new_contributor", "contributor", terms::CONTRIBUTOR, false, false, ValueFormat::Array, None),
    map("description", "description", terms::DESCRIPTION, true, true, ValueFormat::Multilingual, None),
    map("new_description", "description", terms::DESCRIPTION, true, true, ValueFormat::Multilingual, None),
    map("keywords", "keywords", terms::SUBJECT, true, false, ValueFormat::Multilingual, None),
    map("new_keywords", "keywords", terms::SUBJECT, true, false, ValueFormat::Multilingual, None),
    // Rights and licensing.
    map("license", "license", terms::LICENSE, false, false, ValueFormat::Plain, Some("license")),
    map("new_license", "license", terms::LICENSE, false, false, ValueFormat::Plain, Some("license")),
    map("rights", "rights", terms::RIGHTS, false, false, ValueFormat::RightsList, None),
    map("new_rights", "rights", terms::RIGHTS, false, false, ValueFormat::RightsList, None),
    map("access", "rights", terms::RIGHTS, false, false, ValueFormat::RightsList, None),
    map("new_access", "rights", terms::RIGHTS, false, false, ValueFormat::RightsList, None),
    // Simple typed fields.
    map("language", "language", terms::LANGUAGE, false, false, ValueFormat::Plain, Some("language")),
    map("new_language", "language", terms::LANGUAGE, false, false, ValueFormat::Plain, Some("language")),
    map("date", "date", terms::DATE, false, false, ValueFormat::Plain, None),
    map("new_date", "date", terms::DATE, false, false, ValueFormat::Plain, None),
    map("created", "date", terms::DATE, false, false, ValueFormat::Plain, None),
    map("type", "type", terms::TYPE, false, false, ValueFormat::Plain, Some("resource_type")),
    map("new_type", "type", terms::TYPE, false, false, ValueFormat::Plain, Some("resource_type")),
    map("coverage", "coverage", terms::COVERAGE, false, false, ValueFormat::Plain, None),
    map("new_coverage", "coverage", terms::COVERAGE, false, false, ValueFormat::Plain, None),
    map("status", "status", terms::STATUS, false, false, ValueFormat::Plain, None),
    map("new_status", "status", terms::STATUS, false, false, ValueFormat::Plain, None),
    // Creation-layout data columns.
    map("file", "file", terms::SOURCE, false, false, ValueFormat::FileReference, None),
    map("folder", "folder", terms::SOURCE, false, false, ValueFormat::FolderPatterns, None),
    map("data_items", "data_items", terms::SOURCE, false, false, ValueFormat::FolderPatterns, None),
];

const fn map(
    csv_column: &'static str,
    semantic_field: &'static str,
    property_id: &'static str,
    multilingual: bool,
    required_for_creation: bool,
    value_format: ValueFormat,
    controlled_vocabulary: Option<&'static str>,
) -> FieldMapping {
    FieldMapping {
        csv_column,
        semantic_field,
        property_id,
        multilingual,
        required_for_creation,
        value_format,
        controlled_vocabulary,
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Immutable lookup over the mapping table.
pub struct FieldRegistry {
    by_column: HashMap<&'static str, &'static FieldMapping>,
    by_field: HashMap<&'static str, &'static FieldMapping>,
}

/// The process-wide registry, built once.
pub static FIELD_REGISTRY: Lazy<FieldRegistry> = Lazy::new(FieldRegistry::builtin);

impl FieldRegistry {
    /// Build the registry from the static table.
    fn builtin() -> Self {
        let mut by_column = HashMap::new();
        let mut by_field = HashMap::new();
        for mapping in MAPPINGS {
            by_column.insert(mapping.csv_column, mapping);
            // First alias wins for the reverse lookup; aliases share
            // property id and format, so the choice is immaterial.
            by_field.entry(mapping.semantic_field).or_insert(mapping);
        }
        Self { by_column, by_field }
    }

    /// Look up a CSV column (case-insensitive, trimmed).
    pub fn lookup(&self, column: &str) -> Option<&'static FieldMapping> {
        let normalized = column.trim().to_lowercase();
        self.by_column.get(normalized.as_str()).copied()
    }

    /// Reverse lookup: which mapping does a semantic field resolve to?
    ///
    /// Used by the merge engine to find which property a change touches.
    pub fn lookup_by_semantic_field(&self, field: &str) -> Option<&'static FieldMapping> {
        self.by_field.get(field).copied()
    }

    /// All mappings, for the CLI field table.
    pub fn mappings(&self) -> impl Iterator<Item = &'static FieldMapping> {
        MAPPINGS.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolves_to_same_field() {
        let direct = FIELD_REGISTRY.lookup("title").unwrap();
        let prefixed = FIELD_REGISTRY.lookup("new_title").unwrap();
        assert_eq!(direct.semantic_field, prefixed.semantic_field);
        assert_eq!(direct.property_id, prefixed.property_id);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mapping = FIELD_REGISTRY.lookup("  New_Title ").unwrap();
        assert_eq!(mapping.semantic_field, "title");
    }

    #[test]
    fn test_unknown_column_is_none() {
        assert!(FIELD_REGISTRY.lookup("favourite_color").is_none());
    }

    #[test]
    fn test_reverse_lookup() {
        let mapping = FIELD_REGISTRY.lookup_by_semantic_field("keywords").unwrap();
        assert_eq!(mapping.property_id, terms::SUBJECT);
        assert_eq!(mapping.value_format, ValueFormat::Multilingual);
    }

    #[test]
    fn test_creator_and_contributor_formats_differ() {
        // One entry per token vs one entry holding the list. The payload
        // shapes differ on the wire and must never be collapsed.
        let creator = FIELD_REGISTRY.lookup_by_semantic_field("creator").unwrap();
        let contributor = FIELD_REGISTRY.lookup_by_semantic_field("contributor").unwrap();
        assert_eq!(creator.value_format, ValueFormat::SemicolonList);
        assert_eq!(contributor.value_format, ValueFormat::Array);
    }

    #[test]
    fn test_required_for_creation_set() {
        for field in ["title", "creator", "description"] {
            let mapping = FIELD_REGISTRY.lookup_by_semantic_field(field).unwrap();
            assert!(mapping.required_for_creation, "{} must be required", field);
        }
        assert!(!FIELD_REGISTRY.lookup_by_semantic_field("keywords").unwrap().required_for_creation);
    }

    #[test]
    fn test_access_aliases_to_rights() {
        let mapping = FIELD_REGISTRY.lookup("new_access").unwrap();
        assert_eq!(mapping.semantic_field, "rights");
        assert_eq!(mapping.value_format, ValueFormat::RightsList);
    }
}
