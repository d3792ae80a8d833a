//! Rule tables driving the heuristic and backfill passes. Order within each
//! table is significant: the first matching rule decides.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::CanonicalField;

/// Predicate over a raw key. Word matches compare against the lowercased key.
#[derive(Debug, Clone, Copy)]
pub enum KeyMatch {
    /// Any of the words occurs.
    Any(&'static [&'static str]),
    /// All of the words occur.
    All(&'static [&'static str]),
    /// The trimmed key starts with this literal.
    Prefix(&'static str),
}

impl KeyMatch {
    fn matches(&self, key: &str, lower: &str) -> bool {
        match self {
            KeyMatch::Any(words) => words.iter().any(|w| lower.contains(w)),
            KeyMatch::All(words) => words.iter().all(|w| lower.contains(w)),
            KeyMatch::Prefix(prefix) => key.trim_start().starts_with(prefix),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    Verbatim,
    StripCurrency,
}

impl ValueTransform {
    pub fn apply(self, value: &str) -> String {
        match self {
            ValueTransform::Verbatim => value.trim().to_string(),
            ValueTransform::StripCurrency => strip_currency(value),
        }
    }
}

/// Maps a key to a canonical field when any of its matchers hits.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicRule {
    pub field: CanonicalField,
    pub matchers: &'static [KeyMatch],
    pub transform: ValueTransform,
}

impl HeuristicRule {
    const fn new(field: CanonicalField, matchers: &'static [KeyMatch]) -> Self {
        Self {
            field,
            matchers,
            transform: ValueTransform::Verbatim,
        }
    }
}

/// Text bucket labels from `textual::bucket_label` rely on these rows to reach
/// their field; see `TEXT_BUCKETS` there.
pub static HEURISTIC_RULES: &[HeuristicRule] = &[
    HeuristicRule::new(CanonicalField::Balance, &[KeyMatch::Any(&["balance"])]),
    HeuristicRule::new(CanonicalField::Weight, &[KeyMatch::Any(&["weight", "gram"])]),
    HeuristicRule::new(CanonicalField::Color, &[KeyMatch::Any(&["color", "colour"])]),
    HeuristicRule::new(CanonicalField::ShaftFlexibility, &[KeyMatch::Any(&["flex", "stiff"])]),
    HeuristicRule::new(CanonicalField::FrameMaterial, &[KeyMatch::All(&["material", "frame"])]),
    HeuristicRule::new(CanonicalField::ShaftMaterial, &[KeyMatch::All(&["material", "shaft"])]),
    HeuristicRule::new(CanonicalField::Material, &[KeyMatch::Any(&["material"])]),
    HeuristicRule::new(CanonicalField::GripSize, &[KeyMatch::Any(&["grip"])]),
    HeuristicRule::new(CanonicalField::PlayerLevel, &[KeyMatch::All(&["player", "level"])]),
    HeuristicRule::new(CanonicalField::PlayerType, &[KeyMatch::All(&["player", "type"])]),
    HeuristicRule::new(CanonicalField::MaximumRacketTension, &[KeyMatch::All(&["max", "tension"])]),
    HeuristicRule::new(CanonicalField::StringTension, &[KeyMatch::Any(&["tension"])]),
    HeuristicRule {
        field: CanonicalField::Price,
        matchers: &[KeyMatch::Any(&["price"]), KeyMatch::Prefix("$")],
        transform: ValueTransform::StripCurrency,
    },
];

/// First heuristic rule whose matchers accept the key.
pub fn classify_key(key: &str) -> Option<&'static HeuristicRule> {
    let lower = key.to_lowercase();
    HEURISTIC_RULES
        .iter()
        .find(|rule| rule.matchers.iter().any(|m| m.matches(key, &lower)))
}

/// Re-derives one canonical field from free description text.
pub struct BackfillRule {
    pub field: CanonicalField,
    pattern: Regex,
    normalize: fn(&str) -> String,
}

impl BackfillRule {
    pub fn capture(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = (self.normalize)(caps.get(1)?.as_str());
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Label separator: a colon, or a dash followed by whitespace.
const SEP: &str = r"[ \t]*(?::|[\-–][ \t])[ \t]*";
/// Free-text capture ends at a line end or a capitalized stop word.
const STOP: &str = r"[ \t]*(?:\b(?-i:Product|Made)\b|$)";

fn free_text(label: &str, max_len: usize) -> Regex {
    Regex::new(&format!(r"(?im)\b{label}\b{SEP}([^\n]{{1,{max_len}}}?){STOP}")).unwrap()
}

pub static BACKFILL_RULES: Lazy<Vec<BackfillRule>> = Lazy::new(|| {
    vec![
        BackfillRule {
            field: CanonicalField::Balance,
            pattern: Regex::new(
                r"(?i)\bbalance\b[ \t]*[:\-–]?[ \t]*(head[\s-]+heavy|head[\s-]+light|even[\s-]+balance|even)\b",
            )
            .unwrap(),
            normalize: canonical_balance,
        },
        BackfillRule {
            field: CanonicalField::Weight,
            pattern: free_text("weight", 60),
            normalize: trimmed,
        },
        BackfillRule {
            field: CanonicalField::ShaftFlexibility,
            pattern: free_text(r"(?:shaft[ \t]+)?(?:flexibility|flex|stiffness)", 40),
            normalize: trimmed,
        },
        BackfillRule {
            field: CanonicalField::Color,
            pattern: free_text("colou?rs?", 60),
            normalize: trimmed,
        },
        BackfillRule {
            field: CanonicalField::MaximumRacketTension,
            pattern: free_text(r"max(?:imum|\.)?[ \t]+(?:racket[ \t]+|string[ \t]+)?tension", 40),
            normalize: trimmed,
        },
        BackfillRule {
            field: CanonicalField::StringTension,
            pattern: free_text(r"(?:string|recommended)[ \t]+tension", 40),
            normalize: trimmed,
        },
    ]
});

fn trimmed(value: &str) -> String {
    value.trim().trim_end_matches(['.', ',', ';']).trim().to_string()
}

/// Drops currency markers and surrounding whitespace: "CA$ 199.99" -> "199.99".
pub fn strip_currency(value: &str) -> String {
    value
        .trim()
        .trim_start_matches("CAD")
        .trim_start_matches("CA")
        .trim_start_matches("USD")
        .replace('$', "")
        .trim()
        .to_string()
}

/// "head-heavy" -> "Head Heavy", "EVEN" -> "Even Balance".
pub fn canonical_balance(token: &str) -> String {
    let lower = token.to_lowercase();
    if lower.starts_with("even") {
        "Even Balance".to_string()
    } else {
        title_case(&lower)
    }
}

/// Capitalizes each word, treating hyphens as word breaks.
pub fn title_case(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(key: &str) -> Option<CanonicalField> {
        classify_key(key).map(|rule| rule.field)
    }

    #[test]
    fn test_heuristic_order() {
        assert_eq!(field_of("Shaft Stiffness Rating"), Some(CanonicalField::ShaftFlexibility));
        assert_eq!(field_of("Balance Point (mm)"), Some(CanonicalField::Balance));
        assert_eq!(field_of("Weight in grams"), Some(CanonicalField::Weight));
        assert_eq!(field_of("Frame Material"), Some(CanonicalField::FrameMaterial));
        assert_eq!(field_of("Shaft material"), Some(CanonicalField::ShaftMaterial));
        assert_eq!(field_of("Materials Used"), Some(CanonicalField::Material));
        assert_eq!(field_of("Recommended Player Level"), Some(CanonicalField::PlayerLevel));
        assert_eq!(field_of("Player Type"), Some(CanonicalField::PlayerType));
        assert_eq!(field_of("Max. String Tension"), Some(CanonicalField::MaximumRacketTension));
        assert_eq!(field_of("Stringing tension"), Some(CanonicalField::StringTension));
        assert_eq!(field_of("Sale Price"), Some(CanonicalField::Price));
        assert_eq!(field_of("$ USD"), Some(CanonicalField::Price));
        assert_eq!(field_of("Warranty"), None);
    }

    #[test]
    fn test_balance_rule_precedes_weight() {
        // "weight" also occurs, but balance is checked first
        assert_eq!(field_of("Weight Balance"), Some(CanonicalField::Balance));
    }

    #[test]
    fn test_strip_currency() {
        assert_eq!(strip_currency(" $199.99 "), "199.99");
        assert_eq!(strip_currency("CA$ 250"), "250");
        assert_eq!(classify_key("Price").unwrap().transform.apply("$89"), "89");
    }

    #[test]
    fn test_balance_backfill() {
        let rule = &BACKFILL_RULES[0];
        assert_eq!(rule.capture("Great racket.\nBalance: Head Heavy\n").as_deref(), Some("Head Heavy"));
        assert_eq!(rule.capture("balance - even").as_deref(), Some("Even Balance"));
        assert_eq!(rule.capture("Balance: whatever feels right"), None);
    }

    #[test]
    fn test_free_text_backfill_stops() {
        let weight = &BACKFILL_RULES[1];
        assert_eq!(weight.capture("Weight: 4U (83g)\nGrip: G5").as_deref(), Some("4U (83g)"));
        assert_eq!(weight.capture("Weight - 3U Made in Japan").as_deref(), Some("3U"));
        assert_eq!(weight.capture("Weight: 5U Product code 123").as_deref(), Some("5U"));
        assert_eq!(weight.capture("Weight-balanced frame"), None);

        let color = &BACKFILL_RULES[3];
        assert_eq!(color.capture("Colours: Black / Gold.").as_deref(), Some("Black / Gold"));
    }

    #[test]
    fn test_tension_backfill() {
        let max = &BACKFILL_RULES[4];
        assert_eq!(max.capture("Max. Tension: 30 lbs").as_deref(), Some("30 lbs"));
        let string = &BACKFILL_RULES[5];
        assert_eq!(string.capture("Recommended tension: 24-28 lbs").as_deref(), Some("24-28 lbs"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("head-heavy"), "Head Heavy");
        assert_eq!(title_case("EXTRA  stiff"), "Extra Stiff");
        assert_eq!(canonical_balance("HEAD LIGHT"), "Head Light");
    }
}
