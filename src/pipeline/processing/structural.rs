//! Structural extraction: key/value pairs from explicit markup (spec tables,
//! definition lists, "Key: Value" list items).

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use tracing::debug;

use super::markup::element_text;
use crate::constants::KEY_DENYLIST;
use crate::types::{RawAttribute, SourceKind};

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static DEFINITION_LIST: Lazy<Selector> = Lazy::new(|| Selector::parse("dl").unwrap());
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());

/// Storefront boilerplate keys ("Pick up in-store", "Orders over $75") are not attributes.
/// Matches when the lowercased key contains a denylist entry, so "Pick up in-store today"
/// is dropped as well as an exact "pick up in-store".
pub fn is_denylisted(key: &str) -> bool {
    let key = key.to_lowercase();
    KEY_DENYLIST.iter().any(|entry| key.contains(entry))
}

fn clean_key(key: &str) -> &str {
    key.trim().trim_end_matches(':').trim_end()
}

fn make_attribute(key: &str, value: &str, source: SourceKind) -> Option<RawAttribute> {
    let key = clean_key(key);
    if is_denylisted(key) {
        debug!("Dropping denylisted key '{}'", key);
        return None;
    }
    RawAttribute::new(key, value, source)
}

/// First cell is the key, second the value. Rows with fewer than two cells are skipped.
pub fn extract_table_attributes(fragment: ElementRef<'_>) -> Vec<RawAttribute> {
    let mut attributes = Vec::new();
    for row in fragment.select(&ROW) {
        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .map(element_text)
            .collect();
        if cells.len() < 2 {
            continue;
        }
        if let Some(attr) = make_attribute(&cells[0], &cells[1], SourceKind::Table) {
            attributes.push(attr);
        }
    }
    attributes
}

/// Each `<dt>` pairs with the first `<dd>` that follows it. Unpaired terms
/// and definitions are skipped.
pub fn extract_definition_list_attributes(fragment: ElementRef<'_>) -> Vec<RawAttribute> {
    let mut attributes = Vec::new();
    for list in fragment.select(&DEFINITION_LIST) {
        let mut term: Option<String> = None;
        for child in list.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "dt" => term = Some(element_text(child)),
                "dd" => {
                    if let Some(key) = term.take() {
                        if let Some(attr) = make_attribute(&key, &element_text(child), SourceKind::DefinitionList) {
                            attributes.push(attr);
                        }
                    }
                }
                _ => {}
            }
        }
    }
    attributes
}

/// Leaf `<li>` elements of the form "Key: Value", split on the first colon.
pub fn extract_list_item_attributes(fragment: ElementRef<'_>) -> Vec<RawAttribute> {
    let mut attributes = Vec::new();
    for item in fragment.select(&LIST_ITEM) {
        if item.select(&LIST_ITEM).next().is_some() {
            continue;
        }
        let text = element_text(item);
        let Some((key, value)) = text.split_once(':') else {
            continue;
        };
        if value.trim_start().starts_with("//") {
            continue;
        }
        if let Some(attr) = make_attribute(key, value, SourceKind::ListItem) {
            attributes.push(attr);
        }
    }
    attributes
}

/// Runs the structural passes over every fragment in priority order.
/// A page uses one layout idiom, so later passes only run when earlier ones
/// found nothing, unless `exhaustive` is set.
pub fn extract_structural_attributes(fragments: &[ElementRef<'_>], exhaustive: bool) -> Vec<RawAttribute> {
    let mut attributes: Vec<RawAttribute> = fragments
        .iter()
        .flat_map(|fragment| extract_table_attributes(*fragment))
        .collect();
    debug!("Table pass yielded {} attributes", attributes.len());

    if attributes.is_empty() || exhaustive {
        let definitions: Vec<RawAttribute> = fragments
            .iter()
            .flat_map(|fragment| extract_definition_list_attributes(*fragment))
            .collect();
        debug!("Definition list pass yielded {} attributes", definitions.len());
        attributes.extend(definitions);
    }

    if attributes.is_empty() || exhaustive {
        let items: Vec<RawAttribute> = fragments
            .iter()
            .flat_map(|fragment| extract_list_item_attributes(*fragment))
            .collect();
        debug!("List item pass yielded {} attributes", items.len());
        attributes.extend(items);
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn keys(attrs: &[RawAttribute]) -> Vec<(&str, &str)> {
        attrs.iter().map(|a| (a.key(), a.value())).collect()
    }

    #[test]
    fn test_table_rows() {
        let html = Html::parse_fragment(
            r#"<table>
                <tr><th>Weight:</th><td>4U (80-84g)</td></tr>
                <tr><td>Balance</td><td>Head Heavy</td></tr>
                <tr><td>Lonely cell</td></tr>
                <tr><td>Empty value</td><td> </td></tr>
            </table>"#,
        );
        let attrs = extract_table_attributes(html.root_element());
        assert_eq!(keys(&attrs), vec![("Weight", "4U (80-84g)"), ("Balance", "Head Heavy")]);
        assert!(attrs.iter().all(|a| a.source() == SourceKind::Table));
    }

    #[test]
    fn test_table_denylist() {
        let html = Html::parse_fragment(
            r#"<table>
                <tr><td>PICK UP IN-STORE</td><td>Available</td></tr>
                <tr><td>Orders Over</td><td>$75 ship free</td></tr>
                <tr><td>Grip Size</td><td>G5</td></tr>
            </table>"#,
        );
        let attrs = extract_table_attributes(html.root_element());
        assert_eq!(keys(&attrs), vec![("Grip Size", "G5")]);
    }

    #[test]
    fn test_denylist_matches_by_containment() {
        assert!(is_denylisted("Pick up in-store"));
        assert!(is_denylisted("Pick Up In-Store Today"));
        assert!(is_denylisted("Free shipping on orders over $75"));
        assert!(!is_denylisted("Pick up"));
        assert!(!is_denylisted("Weight"));
    }

    #[test]
    fn test_definition_list_skips_unpaired() {
        let html = Html::parse_fragment(
            r#"<dl>
                <dd>Orphan definition</dd>
                <dt>Flex</dt><dd>Stiff</dd>
                <dt>Dangling term</dt>
                <dt>Color</dt><dd>Black/Red</dd><dd>Second definition</dd>
            </dl>"#,
        );
        let attrs = extract_definition_list_attributes(html.root_element());
        assert_eq!(keys(&attrs), vec![("Flex", "Stiff"), ("Color", "Black/Red")]);
        assert!(attrs.iter().all(|a| a.source() == SourceKind::DefinitionList));
    }

    #[test]
    fn test_list_items() {
        let html = Html::parse_fragment(
            r#"<ul>
                <li>Frame: HM Graphite</li>
                <li>Just marketing</li>
                <li>https://example.com/racket</li>
                <li>Specs<ul><li>Shaft: Graphite</li></ul></li>
            </ul>"#,
        );
        let attrs = extract_list_item_attributes(html.root_element());
        assert_eq!(keys(&attrs), vec![("Frame", "HM Graphite"), ("Shaft", "Graphite")]);
    }

    #[test]
    fn test_later_passes_only_when_table_empty() {
        let html = Html::parse_fragment(
            r#"<table><tr><td>Weight</td><td>4U</td></tr></table>
               <dl><dt>Balance</dt><dd>Even Balance</dd></dl>
               <ul><li>Flex: Medium</li></ul>"#,
        );
        let root = html.root_element();

        let attrs = extract_structural_attributes(&[root], false);
        assert_eq!(keys(&attrs), vec![("Weight", "4U")]);

        let attrs = extract_structural_attributes(&[root], true);
        assert_eq!(
            keys(&attrs),
            vec![("Weight", "4U"), ("Balance", "Even Balance"), ("Flex", "Medium")]
        );
    }

    #[test]
    fn test_no_structure_yields_nothing() {
        let html = Html::parse_fragment("<p>Weight: 4U</p>");
        assert!(extract_structural_attributes(&[html.root_element()], false).is_empty());
    }
}
