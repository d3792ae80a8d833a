//! Markup query helpers shared by the extractors: locating the description
//! region of a product page and flattening markup into trimmed text lines.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use crate::types::collapse_whitespace;

/// Product description containers, most specific first. The first selector
/// with any match wins and all of its matches form the region.
static DESCRIPTION_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        ".product__description",
        ".product-description",
        ".product-single__description",
        "[itemprop='description']",
        "#tab-description",
        ".product__accordion .accordion__content",
        ".accordion__content",
        ".rte",
    ]
    .iter()
    .map(|css| Selector::parse(css).unwrap())
    .collect()
});

static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name='description'], meta[property='og:description']").unwrap());

/// Elements that start a new line when flattened.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "tfoot", "thead", "tr", "ul",
];

const CELL_TAGS: &[&str] = &["td", "th"];

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// The description region, outermost matches only. Empty when the page has none.
pub fn description_fragments(document: &Html) -> Vec<ElementRef<'_>> {
    for selector in DESCRIPTION_SELECTORS.iter() {
        let matches: Vec<ElementRef> = document.select(selector).collect();
        if matches.is_empty() {
            continue;
        }
        let ids: Vec<_> = matches.iter().map(|el| el.id()).collect();
        return matches
            .into_iter()
            .filter(|el| !el.ancestors().any(|ancestor| ids.contains(&ancestor.id())))
            .collect();
    }
    Vec::new()
}

/// Description region, or the whole document when no region exists.
pub fn extraction_scope(document: &Html) -> Vec<ElementRef<'_>> {
    let fragments = description_fragments(document);
    if fragments.is_empty() {
        vec![document.root_element()]
    } else {
        fragments
    }
}

/// Content of the page's meta description, if non-empty.
pub fn meta_description(document: &Html) -> Option<String> {
    document
        .select(&META_DESCRIPTION)
        .filter_map(|meta| meta.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

/// Flattens fragments into non-empty, whitespace-collapsed lines. Block
/// elements and `<br>` break lines; table cells are joined with a space.
pub fn flatten_lines(fragments: &[ElementRef<'_>]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut buffer = String::new();
    for fragment in fragments {
        walk(*fragment, &mut buffer, &mut lines);
        flush(&mut buffer, &mut lines);
    }
    lines
}

/// Splits plain text on newlines into the same line view as `flatten_lines`.
pub fn text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Text content of an element with text nodes separated by spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn walk(element: ElementRef<'_>, buffer: &mut String, lines: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buffer.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if BLOCK_TAGS.contains(&name) {
                    flush(buffer, lines);
                    walk(child_el, buffer, lines);
                    flush(buffer, lines);
                } else if CELL_TAGS.contains(&name) {
                    buffer.push(' ');
                    walk(child_el, buffer, lines);
                    buffer.push(' ');
                } else {
                    walk(child_el, buffer, lines);
                }
            }
            _ => {}
        }
    }
}

fn flush(buffer: &mut String, lines: &mut Vec<String>) {
    let line = collapse_whitespace(buffer);
    if !line.is_empty() {
        lines.push(line);
    }
    buffer.clear();
}
