//! Domain models for the metadata curation engine.
//!
//! This module contains the core data structures used throughout the engine:
//!
//! - [`MetadataEntry`] - One atomic metadata statement on a remote resource
//! - [`MetaValue`] - Entry payload: plain text or a list of persons
//! - [`Person`] - Structured creator/contributor name
//! - [`ResourceSnapshot`] - Complete current metadata of one resource
//! - [`ResourceKind`] / [`Resolved`] - Dataset vs collection resolution
//! - [`ChangeRecord`] - One CSV row turned into a set of field changes
//!
//! Property ids are Dublin Core term URIs; rights entries carry additional
//! type ids from the `info:eu-repo` access-level vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Property and type identifiers
// =============================================================================

/// Stable property identifiers (Dublin Core terms).
pub mod terms {
    pub const TITLE: &str = "http://purl.org/dc/terms/title";
    pub const CREATOR: &str = "http://purl.org/dc/terms/creator";
    pub const CONTRIBUTOR: &str = "http://purl.org/dc/terms/contributor";
    pub const DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    pub const SUBJECT: &str = "http://purl.org/dc/terms/subject";
    pub const LICENSE: &str = "http://purl.org/dc/terms/license";
    pub const RIGHTS: &str = "http://purl.org/dc/terms/accessRights";
    pub const LANGUAGE: &str = "http://purl.org/dc/terms/language";
    pub const DATE: &str = "http://purl.org/dc/terms/created";
    pub const TYPE: &str = "http://purl.org/dc/terms/type";
    pub const COVERAGE: &str = "http://purl.org/dc/terms/coverage";
    pub const STATUS: &str = "http://purl.org/dc/terms/accrualPolicy";
    pub const SOURCE: &str = "http://purl.org/dc/terms/source";
}

/// Type identifiers attached to entries alongside the property id.
pub mod types {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";

    // Access levels (info:eu-repo semantics vocabulary).
    pub const ACCESS_OPEN: &str = "info:eu-repo/semantics/openAccess";
    pub const ACCESS_RESTRICTED: &str = "info:eu-repo/semantics/restrictedAccess";
    pub const ACCESS_EMBARGOED: &str = "info:eu-repo/semantics/embargoedAccess";

    // Rights statement classes.
    pub const LICENSE: &str = "http://purl.org/dc/terms/LicenseDocument";
    pub const RIGHTS_STATEMENT: &str = "http://purl.org/dc/terms/RightsStatement";

    // Access-control permission grants.
    pub const PERMISSION_USER: &str = "urn:metacurate:permission:user";
    pub const PERMISSION_GROUP: &str = "urn:metacurate:permission:group";
    pub const PERMISSION_AGENT: &str = "urn:metacurate:permission:agent";
}

// =============================================================================
// Person
// =============================================================================

/// A structured creator or contributor name.
///
/// Tokens of the form `"Surname, Given"` are split into name parts;
/// anything else is kept as a full name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Person {
    /// Parse a person from a raw token.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        match token.split_once(',') {
            Some((surname, given)) if !surname.trim().is_empty() && !given.trim().is_empty() => {
                Self {
                    given_name: Some(given.trim().to_string()),
                    surname: Some(surname.trim().to_string()),
                    full_name: None,
                }
            }
            _ => Self {
                given_name: None,
                surname: None,
                full_name: Some(token.to_string()),
            },
        }
    }

    /// Display name for logs and reports.
    pub fn display_name(&self) -> String {
        match (&self.surname, &self.given_name, &self.full_name) {
            (Some(s), Some(g), _) => format!("{}, {}", s, g),
            (_, _, Some(f)) => f.clone(),
            _ => String::new(),
        }
    }
}

// =============================================================================
// Metadata entries
// =============================================================================

/// Payload of a metadata entry.
///
/// Array-format fields (contributor) hold their whole person list in a
/// single entry; everything else holds plain text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    People(Vec<Person>),
}

impl MetaValue {
    /// The text payload, if this is a text entry.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            MetaValue::People(_) => None,
        }
    }
}

/// One atomic metadata statement on a remote resource.
///
/// Every entry carries exactly one property id. Multilingual fields
/// decompose into one entry per language; rights and list entries never
/// carry a language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    /// Stable property identifier (see [`terms`]).
    pub property_id: String,
    /// Entry payload.
    pub value: MetaValue,
    /// Language tag (two letters), when the property is multilingual.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Optional type identifier (see [`types`]).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
}

impl MetadataEntry {
    /// Create a plain text entry.
    pub fn text(property_id: &str, value: impl Into<String>) -> Self {
        Self {
            property_id: property_id.to_string(),
            value: MetaValue::Text(value.into()),
            language: None,
            type_id: None,
        }
    }

    /// Create an entry holding a list of persons.
    pub fn people(property_id: &str, people: Vec<Person>) -> Self {
        Self {
            property_id: property_id.to_string(),
            value: MetaValue::People(people),
            language: None,
            type_id: None,
        }
    }

    /// Attach a language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Attach a type id.
    pub fn with_type(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Kind of remote resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Dataset,
    Collection,
    #[default]
    Unknown,
}

impl ResourceKind {
    /// API path segment for this kind.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ResourceKind::Dataset => "datasets",
            ResourceKind::Collection => "collections",
            ResourceKind::Unknown => "datasets",
        }
    }
}

/// Outcome of resource-kind resolution (dataset probed first, then
/// collection).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    Dataset,
    Collection,
    NotFound,
}

/// The complete current metadata of one resource, as last read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Opaque resource id.
    #[serde(rename = "identifier")]
    pub resource_id: String,
    /// Dataset or collection.
    #[serde(default)]
    pub kind: ResourceKind,
    /// Ordered metadata entries.
    #[serde(default)]
    pub metas: Vec<MetadataEntry>,
}

impl ResourceSnapshot {
    /// An empty snapshot for a resource with no metadata yet.
    pub fn empty(resource_id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            resource_id: resource_id.into(),
            kind,
            metas: Vec::new(),
        }
    }
}

// =============================================================================
// Change records
// =============================================================================

/// Whether a CSV describes new resources or edits to existing ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeMode {
    Create,
    Modify,
}

/// One CSV row turned into a set of field changes for one resource.
///
/// `changes` maps semantic field names to raw CSV values; a BTreeMap keeps
/// merge output order deterministic across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub resource_id: String,
    pub mode: ChangeMode,
    pub changes: BTreeMap<String, String>,
    /// 1-based data row number in the source CSV.
    pub source_row: usize,
}

/// A CSV row that produced no change record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row: usize,
    pub resource_id: String,
    pub reason: String,
}

// =============================================================================
// Tests
// =============================================================================
