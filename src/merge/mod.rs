//! Metadata merge engine.
//!
//! Reconciles a change record against a resource's current metadata:
//! every entry whose property is untouched by the change is retained
//! verbatim (all language variants included), and the changed fields are
//! re-parsed into fresh entries appended at the end.
//!
//! [`merge`] is a pure function of `(snapshot, change_record)`: it performs
//! no I/O, so fetch, merge and write are independently testable. The remote
//! write always replaces the full metadata collection atomically; there is
//! no partial-field patch.

use std::collections::BTreeSet;

use crate::models::{ChangeRecord, MetadataEntry, ResourceSnapshot};
use crate::parsers::parse_value;
use crate::registry::FieldRegistry;

/// Result of merging one change record into a snapshot.
#[derive(Debug)]
pub struct MergeOutcome {
    /// The new complete metadata set for the resource.
    pub metas: Vec<MetadataEntry>,
    /// Non-blocking warnings from the value parsers.
    pub warnings: Vec<String>,
}

/// Compute the new full metadata set for a resource.
///
/// Steps:
/// 1. collect the property ids implicated by the change record's semantic
///    fields (reverse registry lookup);
/// 2. retain every snapshot entry whose property id is not implicated;
/// 3. parse each changed field per its value format and append the entries.
///
/// A multilingual property is only ever replaced wholesale: touching
/// `title` replaces every title language variant at once, never a subset.
pub fn merge(
    snapshot: &ResourceSnapshot,
    change: &ChangeRecord,
    registry: &FieldRegistry,
    default_language: &str,
) -> MergeOutcome {
    let mut warnings = Vec::new();

    let implicated: BTreeSet<&str> = change
        .changes
        .keys()
        .filter_map(|field| match registry.lookup_by_semantic_field(field) {
            Some(mapping) => Some(mapping.property_id),
            None => {
                warnings.push(format!("no mapping for semantic field '{}', ignored", field));
                None
            }
        })
        .collect();

    let mut metas: Vec<MetadataEntry> = snapshot
        .metas
        .iter()
        .filter(|entry| !implicated.contains(entry.property_id.as_str()))
        .cloned()
        .collect();

    for (field, raw) in &change.changes {
        let Some(mapping) = registry.lookup_by_semantic_field(field) else {
            continue;
        };
        let outcome = parse_value(mapping, raw, default_language);
        metas.extend(outcome.entries);
        warnings.extend(outcome.warnings);
    }

    MergeOutcome { metas, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{terms, ChangeMode, MetaValue, ResourceKind};
    use crate::registry::FIELD_REGISTRY;
    use std::collections::BTreeMap;

    fn change(fields: &[(&str, &str)]) -> ChangeRecord {
        ChangeRecord {
            resource_id: "abc123".into(),
            mode: ChangeMode::Modify,
            changes: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            source_row: 1,
        }
    }

    fn snapshot(metas: Vec<MetadataEntry>) -> ResourceSnapshot {
        ResourceSnapshot {
            resource_id: "abc123".into(),
            kind: ResourceKind::Dataset,
            metas,
        }
    }

    #[test]
    fn test_untouched_properties_retained() {
        let snap = snapshot(vec![
            MetadataEntry::text(terms::TITLE, "Old title").with_language("en"),
            MetadataEntry::text(terms::DESCRIPTION, "A description").with_language("en"),
            MetadataEntry::text(terms::LICENSE, "CC-BY-4.0"),
        ]);
        let outcome = merge(&snap, &change(&[("title", "en:New title")]), &FIELD_REGISTRY, "en");

        let descriptions: Vec<_> = outcome
            .metas
            .iter()
            .filter(|e| e.property_id == terms::DESCRIPTION)
            .collect();
        let licenses: Vec<_> = outcome
            .metas
            .iter()
            .filter(|e| e.property_id == terms::LICENSE)
            .collect();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].value.as_text(), Some("A description"));
        assert_eq!(licenses.len(), 1);

        let titles: Vec<_> = outcome
            .metas
            .iter()
            .filter(|e| e.property_id == terms::TITLE)
            .collect();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].value.as_text(), Some("New title"));
    }

    #[test]
    fn test_multilingual_property_replaced_wholesale() {
        let snap = snapshot(vec![
            MetadataEntry::text(terms::TITLE, "Ancien").with_language("fr"),
            MetadataEntry::text(terms::TITLE, "Old").with_language("en"),
            MetadataEntry::text(terms::TITLE, "Alt").with_language("de"),
        ]);
        let outcome = merge(&snap, &change(&[("title", "en:New only")]), &FIELD_REGISTRY, "en");

        let titles: Vec<_> = outcome
            .metas
            .iter()
            .filter(|e| e.property_id == terms::TITLE)
            .collect();
        // All three old variants replaced by the single new one.
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].language.as_deref(), Some("en"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let snap = snapshot(vec![MetadataEntry::text(terms::LICENSE, "CC0-1.0")]);
        let rec = change(&[("title", "fr:Titre|en:Title"), ("keywords", "fr:un;deux|en:one;two")]);

        let first = merge(&snap, &rec, &FIELD_REGISTRY, "en");
        let second = merge(&snap, &rec, &FIELD_REGISTRY, "en");

        let a = serde_json::to_vec(&first.metas).unwrap();
        let b = serde_json::to_vec(&second.metas).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_end_to_end_counts_against_empty_snapshot() {
        let snap = ResourceSnapshot::empty("abc123", ResourceKind::Dataset);
        let rec = change(&[("title", "fr:Titre|en:Title"), ("keywords", "fr:un;deux|en:one;two")]);
        let outcome = merge(&snap, &rec, &FIELD_REGISTRY, "en");

        let titles = outcome.metas.iter().filter(|e| e.property_id == terms::TITLE).count();
        let keywords = outcome.metas.iter().filter(|e| e.property_id == terms::SUBJECT).count();
        assert_eq!(titles, 2);
        assert_eq!(keywords, 4);
        assert_eq!(outcome.metas.len(), 6);
    }

    #[test]
    fn test_creator_vs_contributor_shapes_survive_merge() {
        let snap = ResourceSnapshot::empty("abc123", ResourceKind::Dataset);
        let rec = change(&[
            ("creator", "Doe, John; Smith, Jane"),
            ("contributor", "Roe, Richard; Anonymous"),
        ]);
        let outcome = merge(&snap, &rec, &FIELD_REGISTRY, "en");

        let creators: Vec<_> = outcome
            .metas
            .iter()
            .filter(|e| e.property_id == terms::CREATOR)
            .collect();
        let contributors: Vec<_> = outcome
            .metas
            .iter()
            .filter(|e| e.property_id == terms::CONTRIBUTOR)
            .collect();
        assert_eq!(creators.len(), 2);
        assert_eq!(contributors.len(), 1);
        assert!(matches!(contributors[0].value, MetaValue::People(_)));
    }

    #[test]
    fn test_parser_warnings_surface() {
        let snap = ResourceSnapshot::empty("abc123", ResourceKind::Dataset);
        let rec = change(&[("rights", "embargo:2025-13-40")]);
        let outcome = merge(&snap, &rec, &FIELD_REGISTRY, "en");
        assert_eq!(outcome.metas.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
    }
}
