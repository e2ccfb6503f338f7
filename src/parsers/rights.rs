//! Rights and access-control parser.
//!
//! Precedence-ordered grammar:
//!
//! 1. `|`-separated clauses, each parsed recursively
//!    (`license:CC-BY-4.0|access:open`)
//! 2. `;`-separated independent permission entries, parsed recursively
//! 3. `entity,ROLE` permission grants; the entity classifies as a user
//!    (`user:` prefix or `@`), a group (hyphenated UUID) or a generic
//!    agent
//! 4. `type:payload` statements: `embargo` (date-checked), `license`,
//!    `access`/`availability`, anything else generic
//! 5. plain literals: well-known access levels and `cc-*` licenses get a
//!    specialized type id, everything else a generic rights statement
//!
//! Malformed input never raises; it degrades to a generic rights statement
//! plus a warning.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use super::ParseOutcome;
use crate::models::{types, MetadataEntry};

/// Shape of an embargo payload before the calendar check.
static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Parse a rights/access-control value into entries.
pub fn parse(property_id: &str, raw: &str) -> ParseOutcome {
    let raw = raw.trim();
    let mut outcome = ParseOutcome::default();

    if raw.contains('|') {
        for clause in raw.split('|') {
            merge_into(&mut outcome, parse(property_id, clause));
        }
        return outcome;
    }

    if raw.contains(';') {
        for part in raw.split(';') {
            merge_into(&mut outcome, parse(property_id, part));
        }
        return outcome;
    }

    if raw.is_empty() {
        return outcome;
    }

    if raw.contains(',') {
        return parse_permission(property_id, raw);
    }

    if let Some((kind, payload)) = raw.split_once(':') {
        return parse_typed(property_id, raw, kind, payload);
    }

    ParseOutcome::single(classify_literal(property_id, raw))
}

fn merge_into(outcome: &mut ParseOutcome, other: ParseOutcome) {
    outcome.entries.extend(other.entries);
    outcome.warnings.extend(other.warnings);
}

/// Parse an `entity,role` permission grant.
fn parse_permission(property_id: &str, raw: &str) -> ParseOutcome {
    // split_once: role strings never contain a comma, entities never do
    // either once the clause level has been peeled off.
    let (entity, role) = match raw.split_once(',') {
        Some((e, r)) => (e.trim(), r.trim()),
        None => return ParseOutcome::single(generic_statement(property_id, raw)),
    };

    // Roles are stored verbatim, structured (`ROLE_`-prefixed) or not.
    let type_id = classify_entity(entity);
    ParseOutcome::single(
        MetadataEntry::text(property_id, format!("{},{}", entity, role)).with_type(type_id),
    )
}

/// Classify a permission entity: user, group or generic agent.
fn classify_entity(entity: &str) -> &'static str {
    if entity.starts_with("user:") || entity.contains('@') {
        types::PERMISSION_USER
    } else if entity.len() == 36 && Uuid::parse_str(entity).is_ok() {
        types::PERMISSION_GROUP
    } else {
        types::PERMISSION_AGENT
    }
}

/// Parse a `type:payload` statement.
fn parse_typed(property_id: &str, raw: &str, kind: &str, payload: &str) -> ParseOutcome {
    let payload = payload.trim();
    match kind.trim().to_lowercase().as_str() {
        "embargo" => {
            if DATE_SHAPE.is_match(payload)
                && NaiveDate::parse_from_str(payload, "%Y-%m-%d").is_ok()
            {
                ParseOutcome::single(
                    MetadataEntry::text(property_id, payload).with_type(types::ACCESS_EMBARGOED),
                )
            } else {
                ParseOutcome::single(generic_statement(property_id, raw)).warn(format!(
                    "embargo payload '{}' is not a valid YYYY-MM-DD date, kept as plain rights text",
                    payload
                ))
            }
        }
        "license" => ParseOutcome::single(
            MetadataEntry::text(property_id, payload).with_type(types::LICENSE),
        ),
        "access" | "availability" => ParseOutcome::single(classify_literal(property_id, payload)),
        _ => ParseOutcome::single(generic_statement(property_id, raw)),
    }
}

/// Classify a plain literal into an access level, a license or a generic
/// statement.
fn classify_literal(property_id: &str, literal: &str) -> MetadataEntry {
    let normalized = literal.trim().to_lowercase();
    match normalized.as_str() {
        "open" | "open access" | "public" => {
            MetadataEntry::text(property_id, literal.trim()).with_type(types::ACCESS_OPEN)
        }
        "restricted" | "private" | "confidential" => {
            MetadataEntry::text(property_id, literal.trim()).with_type(types::ACCESS_RESTRICTED)
        }
        _ if normalized.starts_with("cc-") => {
            MetadataEntry::text(property_id, literal.trim()).with_type(types::LICENSE)
        }
        _ => generic_statement(property_id, literal.trim()),
    }
}

fn generic_statement(property_id: &str, value: &str) -> MetadataEntry {
    MetadataEntry::text(property_id, value).with_type(types::RIGHTS_STATEMENT)
}
