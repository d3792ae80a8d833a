//! Textual pattern extraction over the flattened description lines.
//!
//! Two passes share one set of filled buckets so that each canonical field
//! receives at most one textual candidate:
//!
//! 1. Generic "Key: Value" / "Key – Value" lines. The key is classified into a
//!    bucket by keyword; unclassified short keys may be kept verbatim.
//! 2. Targeted patterns for values that appear without a clean key (weight
//!    class, balance, flex, grip size token, dollar amount).
//!
//! The generic pass runs over every line before the targeted pass starts, so
//! `ParagraphPattern` candidates always precede `KeywordRegex` ones.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use super::normalize::rules::{canonical_balance, title_case};
use crate::config::ExtractionConfig;
use crate::constants::{BOILERPLATE_MARKERS, MAX_LITERAL_KEY_LEN, PROSE_KEY_MARKERS};
use crate::schema::CanonicalField;
use crate::types::{RawAttribute, SourceKind};

/// Keyword to bucket table for generic keys. First matching row wins.
/// Keep in step with `normalize::rules::HEURISTIC_RULES`: every bucket label
/// must classify back to its own field there.
const TEXT_BUCKETS: &[(&[&str], CanonicalField)] = &[
    (&["flex", "stiff"], CanonicalField::ShaftFlexibility),
    (&["balance", "head heavy", "head light"], CanonicalField::Balance),
    (&["weight"], CanonicalField::Weight),
    (&["grip"], CanonicalField::GripSize),
    (
        &["max tension", "max. tension", "maximum tension", "max racket tension", "maximum racket tension", "max string tension"],
        CanonicalField::MaximumRacketTension,
    ),
    (&["tension"], CanonicalField::StringTension),
    (&["color", "colour"], CanonicalField::Color),
    (&["price"], CanonicalField::Price),
];

const KEY_VALUE_DASHES: &[&str] = &[" – ", " — ", " - "];

struct TargetedPattern {
    field: CanonicalField,
    /// The line must contain this before the capture is attempted.
    anchor: Option<Regex>,
    capture: Regex,
    normalize: fn(&str) -> String,
}

static TARGETED_PATTERNS: Lazy<Vec<TargetedPattern>> = Lazy::new(|| {
    vec![
        TargetedPattern {
            field: CanonicalField::Weight,
            anchor: Some(Regex::new(r"(?i)\bweight").unwrap()),
            capture: Regex::new(r"(?i)\b([2-6]u|\d{2,3}(?:\.\d+)?\s?(?:g|grams?))\b").unwrap(),
            normalize: weight_token,
        },
        TargetedPattern {
            field: CanonicalField::Balance,
            anchor: Some(Regex::new(r"(?i)balance").unwrap()),
            capture: Regex::new(r"(?i)\b(head[\s-]+heavy|head[\s-]+light|even[\s-]+balance)\b").unwrap(),
            normalize: canonical_balance,
        },
        TargetedPattern {
            field: CanonicalField::ShaftFlexibility,
            anchor: Some(Regex::new(r"(?i)flex").unwrap()),
            capture: Regex::new(
                r"(?i)\b(extra[\s-]+stiff|very[\s-]+stiff|stiff|medium|very[\s-]+flexible|flexible)\b",
            )
            .unwrap(),
            normalize: title_case,
        },
        TargetedPattern {
            field: CanonicalField::GripSize,
            anchor: None,
            capture: Regex::new(r"\b(G[0-9])\b").unwrap(),
            normalize: str::to_string,
        },
        TargetedPattern {
            field: CanonicalField::Price,
            anchor: None,
            capture: Regex::new(r"\$\s?(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)").unwrap(),
            normalize: |amount| amount.replace(',', ""),
        },
    ]
});

/// Raw key emitted for a text bucket: the lowercased field name. It is never
/// an alias, so text candidates reach the resolver's heuristic pass behind
/// any structural candidate for the same field.
pub fn bucket_label(field: CanonicalField) -> String {
    field.name().to_lowercase()
}

fn weight_token(token: &str) -> String {
    if token.len() == 2 && token.to_lowercase().ends_with('u') {
        token.to_uppercase()
    } else {
        token.to_string()
    }
}

pub fn is_boilerplate(line: &str) -> bool {
    let line = line.to_lowercase();
    BOILERPLATE_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Splits on the first colon, or on a spaced dash when there is no colon.
pub fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = match line.split_once(':') {
        Some(pair) => pair,
        None => KEY_VALUE_DASHES.iter().find_map(|dash| line.split_once(dash))?,
    };
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() || value.starts_with("//") {
        return None;
    }
    Some((key, value))
}

/// Bucket for a generic key, by case-insensitive keyword containment.
pub fn bucket_for_key(key: &str) -> Option<CanonicalField> {
    let key = key.to_lowercase();
    TEXT_BUCKETS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| key.contains(kw)))
        .map(|(_, field)| *field)
}

/// Short keys that do not read like marketing prose.
pub fn is_literal_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    key.chars().count() < MAX_LITERAL_KEY_LEN && !PROSE_KEY_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub fn extract_text_attributes(lines: &[String], config: &ExtractionConfig) -> Vec<RawAttribute> {
    let candidates: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|line| line.chars().count() < config.max_line_len)
        .filter(|line| !is_boilerplate(line))
        .collect();

    let mut filled: HashSet<CanonicalField> = HashSet::new();
    let mut literal_keys: HashSet<String> = HashSet::new();
    let mut attributes = Vec::new();

    for line in &candidates {
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        match bucket_for_key(key) {
            Some(field) => {
                if filled.contains(&field) {
                    continue;
                }
                if let Some(attr) = RawAttribute::new(&bucket_label(field), value, SourceKind::ParagraphPattern) {
                    filled.insert(field);
                    attributes.push(attr);
                }
            }
            None if config.keep_unclassified_keys && is_literal_key(key) => {
                if literal_keys.insert(key.to_string()) {
                    if let Some(attr) = RawAttribute::new(key, value, SourceKind::ParagraphPattern) {
                        attributes.push(attr);
                    }
                }
            }
            None => {}
        }
    }
    let generic = attributes.len();

    for line in &candidates {
        for pattern in TARGETED_PATTERNS.iter() {
            if filled.contains(&pattern.field) {
                continue;
            }
            if let Some(anchor) = &pattern.anchor {
                if !anchor.is_match(line) {
                    continue;
                }
            }
            let Some(caps) = pattern.capture.captures(line) else {
                continue;
            };
            let value = (pattern.normalize)(&caps[1]);
            if let Some(attr) = RawAttribute::new(&bucket_label(pattern.field), &value, SourceKind::KeywordRegex) {
                filled.insert(pattern.field);
                attributes.push(attr);
            }
        }
    }

    debug!(
        "Text passes over {} lines yielded {} generic and {} targeted attributes",
        candidates.len(),
        generic,
        attributes.len() - generic
    );
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    fn pairs(attrs: &[RawAttribute]) -> Vec<(&str, &str, SourceKind)> {
        attrs.iter().map(|a| (a.key(), a.value(), a.source())).collect()
    }

    #[test]
    fn test_generic_key_value_buckets() {
        let attrs = extract_text_attributes(
            &lines(&["Shaft Stiffness: Stiff", "Balance Point: Head Heavy", "Weight: 4U (80-84g)"]),
            &ExtractionConfig::default(),
        );
        assert_eq!(
            pairs(&attrs),
            vec![
                ("shaft flexibility", "Stiff", SourceKind::ParagraphPattern),
                ("balance", "Head Heavy", SourceKind::ParagraphPattern),
                ("weight", "4U (80-84g)", SourceKind::ParagraphPattern),
            ]
        );
    }

    #[test]
    fn test_first_bucket_match_wins() {
        let attrs = extract_text_attributes(&lines(&["Weight: 4U", "Racket weight: 3U"]), &ExtractionConfig::default());
        assert_eq!(pairs(&attrs), vec![("weight", "4U", SourceKind::ParagraphPattern)]);
    }

    #[test]
    fn test_boilerplate_lines_are_dropped() {
        let attrs = extract_text_attributes(
            &lines(&["Pick up in-store available", "Free Shipping: orders over $75", "Grip Size: G5"]),
            &ExtractionConfig::default(),
        );
        assert_eq!(pairs(&attrs), vec![("grip size", "G5", SourceKind::ParagraphPattern)]);
    }

    #[test]
    fn test_literal_keys_follow_toggle() {
        let text = lines(&["Frame: HM Graphite", "Made in Japan: yes", "Technology: Rotational Generator System"]);

        let attrs = extract_text_attributes(&text, &ExtractionConfig::default());
        assert_eq!(pairs(&attrs), vec![("Frame", "HM Graphite", SourceKind::ParagraphPattern)]);

        let config = ExtractionConfig {
            keep_unclassified_keys: false,
            ..ExtractionConfig::default()
        };
        assert!(extract_text_attributes(&text, &config).is_empty());
    }

    #[test]
    fn test_long_keys_are_not_literal() {
        assert!(is_literal_key("Frame"));
        assert!(!is_literal_key("A rather long key that goes on and on"));
        assert!(!is_literal_key("Product Code"));
    }

    #[test]
    fn test_dash_separator() {
        assert_eq!(split_key_value("Flex – Medium"), Some(("Flex", "Medium")));
        assert_eq!(split_key_value("Head-heavy frame"), None);
        assert_eq!(split_key_value("https://example.com"), None);
        assert_eq!(split_key_value("Weight:"), None);
    }

    #[test]
    fn test_targeted_patterns() {
        let attrs = extract_text_attributes(
            &lines(&[
                "A 4U weight frame built for speed",
                "Extra stiff shaft with a head-heavy balance",
                "The flexibility is rated medium",
                "Available in G5 only",
                "Now only $1,199.99",
            ]),
            &ExtractionConfig::default(),
        );
        assert_eq!(
            pairs(&attrs),
            vec![
                ("weight", "4U", SourceKind::KeywordRegex),
                ("balance", "Head Heavy", SourceKind::KeywordRegex),
                ("shaft flexibility", "Medium", SourceKind::KeywordRegex),
                ("grip size", "G5", SourceKind::KeywordRegex),
                ("price", "1199.99", SourceKind::KeywordRegex),
            ]
        );
    }

    #[test]
    fn test_generic_fills_bucket_before_targeted() {
        let attrs = extract_text_attributes(
            &lines(&["Lightweight 3U frame weight", "Weight: 4U"]),
            &ExtractionConfig::default(),
        );
        assert_eq!(pairs(&attrs), vec![("weight", "4U", SourceKind::ParagraphPattern)]);
    }

    #[test]
    fn test_line_length_guard() {
        let long = format!("Weight: 4U {}", "x".repeat(200));
        assert!(extract_text_attributes(&[long], &ExtractionConfig::default()).is_empty());
    }

    #[test]
    fn test_bucket_labels_are_not_aliases_and_classify_back() {
        let schema = crate::schema::CanonicalSchema::builtin();
        let fields = TEXT_BUCKETS
            .iter()
            .map(|(_, field)| *field)
            .chain(TARGETED_PATTERNS.iter().map(|p| p.field));
        for field in fields {
            let label = bucket_label(field);
            assert_eq!(schema.field_for_alias(&label), None, "{label}");
            let rule = crate::pipeline::processing::normalize::rules::classify_key(&label).unwrap();
            assert_eq!(rule.field, field, "{label}");
        }
    }
}
