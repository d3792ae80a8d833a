//! Page-level facts that sit beside the specifications: product name, price,
//! image, brand, description text and technology call-outs.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use super::markup::{description_fragments, element_text, extraction_scope, flatten_lines, meta_description};
use super::normalize::rules::classify_key;
use crate::constants::KNOWN_BRANDS;
use crate::schema::CanonicalSchema;
use crate::types::{collapse_whitespace, PageMetadata, Technology};

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static OG_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("meta[property='og:title']").unwrap());
static OG_IMAGE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[property='og:image'], meta[property='og:image:secure_url']").unwrap()
});
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static BOLD: Lazy<Selector> = Lazy::new(|| Selector::parse("strong, b").unwrap());

/// Price-bearing elements, most specific first.
static PRICE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "[itemprop='price']",
        ".price-item--sale",
        ".price-item--regular",
        ".product__price",
        ".product-price",
        ".price",
        "[data-product-price]",
    ]
    .iter()
    .map(|css| Selector::parse(css).unwrap())
    .collect()
});

static PRICE_META: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[property='product:price:amount'], meta[property='og:price:amount']").unwrap()
});

static PRICE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").unwrap());

static BRAND_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    KNOWN_BRANDS
        .iter()
        .map(|&brand| {
            let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(brand))).unwrap();
            let display = if brand.eq_ignore_ascii_case("lining") { "Li-Ning" } else { brand };
            (pattern, display)
        })
        .collect()
});

/// Image file names that are never the product shot.
const EXCLUDED_IMAGE_PATTERNS: &[&str] = &[
    "logo", "icon", "favicon", "sprite", "loading", "placeholder", "payment", "banner", "badge", "social",
];

/// Technology names longer than this are prose, not call-outs.
const MAX_TECHNOLOGY_NAME_LEN: usize = 60;

/// First `<h1>`, then `og:title`, then `<title>`.
pub fn product_name(document: &Html) -> String {
    document
        .select(&HEADING)
        .map(element_text)
        .find(|text| !text.is_empty())
        .or_else(|| {
            document
                .select(&OG_TITLE)
                .filter_map(|meta| meta.value().attr("content"))
                .map(collapse_whitespace)
                .find(|text| !text.is_empty())
        })
        .or_else(|| document.select(&TITLE).map(element_text).find(|text| !text.is_empty()))
        .unwrap_or_default()
}

/// Parses the first number in a price string: "$1,199.99 CAD" -> 1199.99.
pub fn parse_price(text: &str) -> Option<f64> {
    let number = PRICE_NUMBER.find(text)?;
    number.as_str().replace(',', "").parse().ok()
}

/// First parseable price from the price elements, then the price meta tags.
pub fn product_price(document: &Html) -> Option<f64> {
    for selector in PRICE_SELECTORS.iter() {
        for element in document.select(selector) {
            let text = element
                .value()
                .attr("content")
                .map(str::to_string)
                .unwrap_or_else(|| element_text(element));
            if let Some(price) = parse_price(&text) {
                return Some(price);
            }
        }
    }
    document
        .select(&PRICE_META)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(parse_price)
}

fn absolutize(page_url: &str, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    match Url::parse(page_url).and_then(|base| base.join(src)) {
        Ok(full) => Some(full.to_string()),
        Err(_) => Url::parse(src).ok().map(|full| full.to_string()),
    }
}

/// `og:image`, otherwise the first `<img>` whose file looks like a product shot.
pub fn product_image(document: &Html, page_url: &str) -> Option<String> {
    if let Some(image) = document
        .select(&OG_IMAGE)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(|content| absolutize(page_url, content))
    {
        return Some(image);
    }

    let candidates: Vec<String> = document
        .select(&IMAGE)
        .filter_map(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
        .filter_map(|src| absolutize(page_url, src))
        .filter(|src| {
            let lower = src.to_lowercase();
            !EXCLUDED_IMAGE_PATTERNS.iter().any(|p| lower.contains(p))
        })
        .collect();

    candidates
        .iter()
        .find(|src| src.to_lowercase().contains("product"))
        .or_else(|| candidates.first())
        .cloned()
}

/// Brand from the product name, then the description, on word boundaries.
pub fn detect_brand(name: &str, description: &str) -> Option<String> {
    [name, description].iter().find_map(|text| {
        BRAND_PATTERNS
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(_, display)| display.to_string())
    })
}

/// Description region text, then the meta description, then the whole page.
pub fn description_text(document: &Html) -> String {
    let fragments = description_fragments(document);
    if !fragments.is_empty() {
        let text = flatten_lines(&fragments).join("\n");
        if !text.is_empty() {
            return text;
        }
    }
    meta_description(document).unwrap_or_else(|| flatten_lines(&[document.root_element()]).join("\n"))
}

fn strip_name<'t>(text: &'t str, name: &str) -> &'t str {
    text.strip_prefix(name)
        .unwrap_or(text)
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—'))
        .trim()
}

fn technology_for(bold: ElementRef<'_>, schema: &CanonicalSchema) -> Option<Technology> {
    let name = element_text(bold);
    let name = name.trim_end_matches(':').trim_end();
    if name.is_empty() || name.chars().count() > MAX_TECHNOLOGY_NAME_LEN {
        return None;
    }
    if schema.field_for_alias(name).is_some() || classify_key(name).is_some() {
        return None;
    }

    let parent = bold.parent().and_then(ElementRef::wrap)?;
    let parent_text = element_text(parent);
    let inline = strip_name(&parent_text, name);
    let description = if inline.is_empty() {
        parent
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .map(element_text)
            .unwrap_or_default()
    } else {
        inline.to_string()
    };

    if description.is_empty() {
        return None;
    }
    Some(Technology {
        name: name.to_string(),
        description,
    })
}

/// Bolded inline headers paired with the rich text that follows them.
/// Bold spec labels ("Weight:") are not technologies.
pub fn technologies(scope: &[ElementRef<'_>], schema: &CanonicalSchema) -> Vec<Technology> {
    let mut seen = HashSet::new();
    scope
        .iter()
        .flat_map(|fragment| fragment.select(&BOLD))
        .filter_map(|bold| technology_for(bold, schema))
        .filter(|tech| seen.insert(tech.name.clone()))
        .collect()
}

pub fn extract_metadata(document: &Html, page_url: &str, schema: &CanonicalSchema) -> PageMetadata {
    let name = product_name(document);
    let description_text = description_text(document);
    let metadata = PageMetadata {
        brand: detect_brand(&name, &description_text),
        price: product_price(document),
        image_url: product_image(document, page_url),
        technologies: technologies(&extraction_scope(document), schema),
        name,
        description_text,
    };
    debug!(
        "Metadata for {}: name='{}', price={:?}, {} technologies",
        page_url,
        metadata.name,
        metadata.price,
        metadata.technologies.len()
    );
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://shop.example.com/products/astrox-99";

    #[test]
    fn test_product_name_fallbacks() {
        let html = Html::parse_document("<html><head><title>Shop | Astrox</title></head><body><h1> Astrox 99 Pro </h1></body></html>");
        assert_eq!(product_name(&html), "Astrox 99 Pro");

        let html = Html::parse_document(
            r#"<html><head><meta property="og:title" content="Thruster K"><title>Other</title></head></html>"#,
        );
        assert_eq!(product_name(&html), "Thruster K");

        let html = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert_eq!(product_name(&html), "");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$1,199.99 CAD"), Some(1199.99));
        assert_eq!(parse_price("Sale price $219.00"), Some(219.0));
        assert_eq!(parse_price("Sold out"), None);
    }

    #[test]
    fn test_product_price_prefers_elements_then_meta() {
        let html = Html::parse_document(
            r#"<html><head><meta property="og:price:amount" content="300.00"></head>
               <body><span class="price-item--sale">$249.00</span><span class="price">$299.00</span></body></html>"#,
        );
        assert_eq!(product_price(&html), Some(249.0));

        let html = Html::parse_document(
            r#"<html><head><meta property="product:price:amount" content="189.50"></head><body></body></html>"#,
        );
        assert_eq!(product_price(&html), Some(189.5));
    }

    #[test]
    fn test_product_image() {
        let html = Html::parse_document(
            r#"<html><head><meta property="og:image" content="//cdn.example.com/astrox.jpg"></head></html>"#,
        );
        assert_eq!(product_image(&html, PAGE_URL).as_deref(), Some("https://cdn.example.com/astrox.jpg"));

        let html = Html::parse_document(
            r#"<html><body><img src="/assets/logo.png"><img src="/assets/banner.jpg">
               <img data-src="/files/products/astrox-99.jpg"></body></html>"#,
        );
        assert_eq!(
            product_image(&html, PAGE_URL).as_deref(),
            Some("https://shop.example.com/files/products/astrox-99.jpg")
        );
    }

    #[test]
    fn test_detect_brand() {
        assert_eq!(detect_brand("Yonex Astrox 99", "").as_deref(), Some("Yonex"));
        assert_eq!(detect_brand("Axforce 80", "Made by LINING").as_deref(), Some("Li-Ning"));
        assert_eq!(detect_brand("Hundredth Racket", "").as_deref(), None);
    }

    #[test]
    fn test_description_text_fallbacks() {
        let html = Html::parse_document(
            r#"<html><head><meta name="description" content="Meta text"></head>
               <body><div class="product__description"><p>Line one</p><p>Line two</p></div></body></html>"#,
        );
        assert_eq!(description_text(&html), "Line one\nLine two");

        let html = Html::parse_document(
            r#"<html><head><meta name="description" content="Balance: Head Heavy"></head><body><p>Body</p></body></html>"#,
        );
        assert_eq!(description_text(&html), "Balance: Head Heavy");

        let html = Html::parse_document("<html><body><p>Only body</p></body></html>");
        assert_eq!(description_text(&html), "Only body");
    }

    #[test]
    fn test_technologies_pair_bold_with_text() {
        let html = Html::parse_document(
            r#"<div class="product__description">
                <p><strong>Rotational Generator System:</strong> Counterbalanced head for control.</p>
                <p><strong>Namd</strong></p>
                <p>Graphite that snaps back faster.</p>
                <p><strong>Weight:</strong> 4U</p>
                <p><b>Rotational Generator System</b> duplicate entry</p>
            </div>"#,
        );
        let schema = CanonicalSchema::builtin();
        let techs = technologies(&description_fragments(&html), &schema);
        assert_eq!(
            techs,
            vec![
                Technology {
                    name: "Rotational Generator System".into(),
                    description: "Counterbalanced head for control.".into(),
                },
                Technology {
                    name: "Namd".into(),
                    description: "Graphite that snaps back faster.".into(),
                },
            ]
        );
    }
}
