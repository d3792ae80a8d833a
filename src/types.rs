use serde::{Deserialize, Serialize};

use crate::schema::CanonicalSpecSet;

/// Where a raw attribute was found. Declaration order is resolution priority:
/// earlier variants win key collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Table,
    DefinitionList,
    ListItem,
    ParagraphPattern,
    KeywordRegex,
}

/// One key/value candidate as found on the page, before canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawAttribute {
    key: String,
    value: String,
    source: SourceKind,
}

impl RawAttribute {
    /// Collapses whitespace in both halves. Returns `None` when either half
    /// is empty, which is how rows without a counterpart get dropped.
    pub fn new(key: &str, value: &str, source: SourceKind) -> Option<Self> {
        let key = collapse_whitespace(key);
        let value = collapse_whitespace(value);
        if key.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self { key, value, source })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }
}

/// All raw attributes for one product, ordered by source priority and then
/// discovery order. Duplicate keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawAttributeSet {
    attributes: Vec<RawAttribute>,
}

impl RawAttributeSet {
    pub(crate) fn from_ordered(attributes: Vec<RawAttribute>) -> Self {
        Self { attributes }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawAttribute> {
        self.attributes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&RawAttribute> {
        self.attributes.get(index)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RawAttributeSet {
    type Item = &'a RawAttribute;
    type IntoIter = std::slice::Iter<'a, RawAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

/// A named technology call-out from the product description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub description: String,
}

/// Page-level facts gathered alongside the specifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageMetadata {
    pub name: String,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub description_text: String,
    pub technologies: Vec<Technology>,
}

/// The assembled output for one product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    url: String,
    name: String,
    #[serde(default)]
    brand: Option<String>,
    price: Option<f64>,
    image_url: Option<String>,
    #[serde(rename = "description")]
    description_text: String,
    technologies: Vec<Technology>,
    #[serde(rename = "specifications")]
    canonical_specs: CanonicalSpecSet,
}

impl ProductRecord {
    pub(crate) fn new(url: String, metadata: PageMetadata, price: Option<f64>, canonical_specs: CanonicalSpecSet) -> Self {
        Self {
            url,
            name: metadata.name,
            brand: metadata.brand,
            price,
            image_url: metadata.image_url,
            description_text: metadata.description_text,
            technologies: metadata.technologies,
            canonical_specs,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn description_text(&self) -> &str {
        &self.description_text
    }

    pub fn technologies(&self) -> &[Technology] {
        &self.technologies
    }

    pub fn canonical_specs(&self) -> &CanonicalSpecSet {
        &self.canonical_specs
    }
}

/// Replaces non-breaking spaces and folds whitespace runs into one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_attribute_requires_both_halves() {
        assert!(RawAttribute::new("Weight", "", SourceKind::Table).is_none());
        assert!(RawAttribute::new("  ", "4U", SourceKind::Table).is_none());
        let attr = RawAttribute::new(" Grip\u{a0} Size ", "G5 ", SourceKind::ListItem).unwrap();
        assert_eq!(attr.key(), "Grip Size");
        assert_eq!(attr.value(), "G5");
        assert_eq!(attr.source(), SourceKind::ListItem);
    }

    #[test]
    fn test_source_priority_order() {
        assert!(SourceKind::Table < SourceKind::DefinitionList);
        assert!(SourceKind::DefinitionList < SourceKind::ListItem);
        assert!(SourceKind::ListItem < SourceKind::ParagraphPattern);
        assert!(SourceKind::ParagraphPattern < SourceKind::KeywordRegex);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\u{a0}\u{a0}b \n\t c "), "a b c");
        assert_eq!(collapse_whitespace("\u{a0}"), "");
    }
}
