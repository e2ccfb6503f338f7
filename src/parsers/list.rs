//! Array and semicolon-list parsers.
//!
//! The two formats produce different remote payload shapes:
//!
//! - array fields (contributor) emit exactly ONE entry whose value is the
//!   whole person list;
//! - semicolon-list fields (creator) emit ONE entry PER token, all sharing
//!   the same property id.
//!
//! This distinction must never be collapsed.

use super::ParseOutcome;
use crate::models::{MetadataEntry, Person};

/// Parse an array-format field into a single list-valued entry.
pub fn parse_array(property_id: &str, raw: &str) -> ParseOutcome {
    parse_array_tokens(property_id, raw.split(';'))
}

/// Array variant for input that is already split into tokens.
pub fn parse_array_tokens<'a>(
    property_id: &str,
    tokens: impl Iterator<Item = &'a str>,
) -> ParseOutcome {
    let people: Vec<Person> = tokens
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Person::from_token)
        .collect();

    if people.is_empty() {
        return ParseOutcome::default();
    }
    ParseOutcome::single(MetadataEntry::people(property_id, people))
}

/// Parse a semicolon-list field into one entry per token.
pub fn parse_semicolon_list(property_id: &str, raw: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    for token in raw.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        outcome.entries.push(MetadataEntry::text(property_id, token));
    }
    outcome
}
