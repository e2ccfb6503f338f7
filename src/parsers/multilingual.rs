//! Multilingual value parser.
//!
//! Grammar: `value := segment ('|' segment)*`, `segment := [lang ':'] content`
//! where `lang` is two letters with an optional regional suffix (`fr-FR`
//! collapses to `fr`). A segment without a language prefix falls back to the
//! configured default language, with a warning.
//!
//! For the `keywords` field only, segment content is further tokenized on
//! `;`, `,` or newlines. `|` stays reserved for the language separator.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ParseOutcome;
use crate::models::MetadataEntry;

/// Two-letter language tag with optional `-REGION` suffix.
static LANG_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{2})(?:-[A-Za-z0-9]{2,4})?$").unwrap());

/// Minimum keyword token length; shorter tokens are noise.
const MIN_KEYWORD_LEN: usize = 2;

/// Parse a multilingual value into one entry per (language, content) pair.
pub fn parse(property_id: &str, raw: &str, default_language: &str, keywords: bool) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for segment in raw.split('|') {
        if segment.trim().is_empty() {
            continue;
        }

        let (language, content) = match split_language(segment) {
            Some((lang, content)) => (lang, content),
            None => {
                outcome.warnings.push(format!(
                    "segment '{}' has no language tag, defaulting to '{}'",
                    segment.trim(),
                    default_language
                ));
                (default_language.to_string(), segment.trim())
            }
        };

        if keywords {
            for token in tokenize_keywords(content) {
                outcome.entries.push(
                    MetadataEntry::text(property_id, token).with_language(language.clone()),
                );
            }
        } else {
            outcome
                .entries
                .push(MetadataEntry::text(property_id, content).with_language(language));
        }
    }

    outcome
}

/// Split a `lang:content` segment, stripping any regional suffix.
///
/// Returns `None` when the prefix before the first `:` is not a language
/// tag (e.g. a URL or a plain sentence containing a colon).
fn split_language(segment: &str) -> Option<(String, &str)> {
    let (prefix, content) = segment.split_once(':')?;
    let prefix = prefix.trim();
    if LANG_TAG.is_match(prefix) {
        Some((prefix[..2].to_lowercase(), content.trim()))
    } else {
        None
    }
}

/// Tokenize keyword content on `;`, `,` and newlines.
fn tokenize_keywords(content: &str) -> Vec<String> {
    content
        .split(|c| c == ';' || c == ',' || c == '\n')
        .map(|t| t.trim().trim_matches('"').trim_matches('\'').trim())
        .filter(|t| t.chars().count() >= MIN_KEYWORD_LEN)
        .map(String::from)
        .collect()
}
