//! Dual-mode change-record validation.
//!
//! Creation mode requires `title`, `creator` and `description` to be
//! present and non-empty. Modification mode checks non-emptiness only for
//! fields the change record actually carries: an absent field is inherited
//! unchanged from the snapshot by the merge engine, so its absence is never
//! an error. This asymmetry is load-bearing.
//!
//! On top of the blocking checks, controlled-vocabulary lookups and quality
//! heuristics produce warnings and suggestions; neither ever blocks
//! application.

use serde::Serialize;

use crate::models::{ChangeMode, ChangeRecord};
use crate::registry::{FieldRegistry, FIELD_REGISTRY};

// =============================================================================
// Report
// =============================================================================

/// Validation mode tag carried on reports.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Creation,
    Modification,
}

impl From<ChangeMode> for ValidationMode {
    fn from(mode: ChangeMode) -> Self {
        match mode {
            ChangeMode::Create => ValidationMode::Creation,
            ChangeMode::Modify => ValidationMode::Modification,
        }
    }
}

/// Outcome of validating one change record.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub mode: ValidationMode,
    /// Blocking errors; a non-empty list fails the item.
    pub errors: Vec<String>,
    /// Non-blocking vocabulary warnings.
    pub warnings: Vec<String>,
    /// Quality suggestions.
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Only errors block application.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// =============================================================================
// Vocabulary advisor
// =============================================================================

/// Advisory controlled-vocabulary collaborator.
///
/// Lookups only ever produce warnings with nearest-match suggestions; an
/// unknown value never blocks an item.
pub struct VocabularyAdvisor {
    languages: &'static [&'static str],
    licenses: &'static [&'static str],
    resource_types: &'static [&'static str],
}

impl Default for VocabularyAdvisor {
    fn default() -> Self {
        Self {
            languages: &[
                "en", "fr", "de", "es", "it", "pt", "nl", "pl", "ru", "zh", "ja", "ar",
            ],
            licenses: &[
                "CC-BY-4.0",
                "CC-BY-SA-4.0",
                "CC-BY-NC-4.0",
                "CC-BY-ND-4.0",
                "CC0-1.0",
                "MIT",
                "Apache-2.0",
                "GPL-3.0",
                "ODbL-1.0",
            ],
            resource_types: &[
                "dataset", "text", "image", "software", "sound", "video", "collection", "other",
            ],
        }
    }
}

impl VocabularyAdvisor {
    /// Check a value against a named vocabulary; returns the nearest match
    /// when the value is unknown.
    pub fn check(&self, vocabulary: &str, value: &str) -> Option<String> {
        let candidates: &[&str] = match vocabulary {
            "language" => self.languages,
            "license" => self.licenses,
            "resource_type" => self.resource_types,
            _ => return None,
        };

        if candidates.iter().any(|c| c.eq_ignore_ascii_case(value)) {
            return None;
        }

        Some(self.nearest(candidates, value))
    }

    fn nearest(&self, candidates: &[&str], value: &str) -> String {
        candidates
            .iter()
            .min_by_key(|c| levenshtein(&c.to_lowercase(), &value.to_lowercase()))
            .map(|c| c.to_string())
            .unwrap_or_default()
    }
}

/// Plain dynamic-programming edit distance, small inputs only.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

// =============================================================================
// Validation
// =============================================================================

/// Fields that creation mode requires (deduplicated semantic fields).
const REQUIRED_FOR_CREATION: &[&str] = &["title", "creator", "description"];

/// Validate one change record in the mode implied by its origin.
pub fn validate_change(change: &ChangeRecord, advisor: &VocabularyAdvisor) -> ValidationReport {
    validate_change_with(change, advisor, &FIELD_REGISTRY)
}

/// Validation against an explicit registry (test seam).
pub fn validate_change_with(
    change: &ChangeRecord,
    advisor: &VocabularyAdvisor,
    registry: &FieldRegistry,
) -> ValidationReport {
    let mode = ValidationMode::from(change.mode);
    let mut report = ValidationReport::new(mode);

    match mode {
        ValidationMode::Creation => {
            for field in REQUIRED_FOR_CREATION {
                match change.changes.get(*field) {
                    Some(value) if !value.trim().is_empty() => {}
                    Some(_) => report.errors.push(format!("required field '{}' is empty", field)),
                    None => report.errors.push(format!("required field '{}' is missing", field)),
                }
            }
        }
        ValidationMode::Modification => {
            // Absent fields are inherited from the snapshot; only present
            // fields are checked.
            for (field, value) in &change.changes {
                if value.trim().is_empty() {
                    report.errors.push(format!("field '{}' is present but empty", field));
                }
            }
        }
    }

    advisory_checks(change, advisor, registry, &mut report);
    quality_checks(change, mode, &mut report);

    report
}

fn advisory_checks(
    change: &ChangeRecord,
    advisor: &VocabularyAdvisor,
    registry: &FieldRegistry,
    report: &mut ValidationReport,
) {
    for (field, value) in &change.changes {
        let Some(mapping) = registry.lookup_by_semantic_field(field) else {
            continue;
        };
        let Some(vocabulary) = mapping.controlled_vocabulary else {
            continue;
        };
        if let Some(suggestion) = advisor.check(vocabulary, value.trim()) {
            report.warnings.push(format!(
                "'{}' is not a known {} value",
                value.trim(),
                vocabulary
            ));
            report.suggestions.push(format!(
                "field '{}': did you mean '{}'?",
                field, suggestion
            ));
        }
    }
}

/// Minimum lengths below which a value looks like a placeholder.
const MIN_TITLE_LEN: usize = 3;
const MIN_DESCRIPTION_LEN: usize = 10;

fn quality_checks(change: &ChangeRecord, mode: ValidationMode, report: &mut ValidationReport) {
    if let Some(title) = change.changes.get("title") {
        if title.trim().chars().count() < MIN_TITLE_LEN {
            report.suggestions.push("title is very short".to_string());
        }
    }
    if let Some(description) = change.changes.get("description") {
        if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
            report.suggestions.push("description is very short".to_string());
        }
    }
    if mode == ValidationMode::Creation && !change.changes.contains_key("keywords") {
        report
            .suggestions
            .push("no keywords provided; resources without keywords are hard to discover".to_string());
    }
}
