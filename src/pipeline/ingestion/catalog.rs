use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::http_client::PageFetcher;
use crate::pipeline::processing::markup::element_text;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Storefront product pages live under this path segment.
const PRODUCT_PATH: &str = "/products/";

/// A product link found on a collection page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLink {
    pub name: String,
    pub url: String,
}

/// URL of the n-th collection page. Page 1 is the base URL itself.
pub fn collection_page_url(base: &str, page: u32) -> String {
    if page <= 1 {
        base.to_string()
    } else if base.contains('?') {
        format!("{base}&page={page}")
    } else {
        format!("{base}?page={page}")
    }
}

/// Product links on one collection page, absolute, deduplicated by URL
/// (query and fragment dropped) in document order.
pub fn discover_product_links(html: &str, page_url: &str) -> Vec<ProductLink> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let mut links: Vec<ProductLink> = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(PRODUCT_PATH) {
            continue;
        }
        let resolved = match &base {
            Some(base) => base.join(href),
            None => Url::parse(href),
        };
        let Ok(mut url) = resolved else {
            debug!("Skipping unresolvable product href '{}'", href);
            continue;
        };
        url.set_query(None);
        url.set_fragment(None);
        let url = url.to_string();
        let name = element_text(anchor);

        match links.iter_mut().find(|link| link.url == url) {
            Some(existing) if existing.name.is_empty() => existing.name = name,
            Some(_) => {}
            None => links.push(ProductLink { name, url }),
        }
    }

    links
}

/// Walks `?page=N` pages until a page fails to load, yields no product links,
/// yields only links already seen, or `max_pages` is reached.
pub async fn discover_collection(fetcher: &dyn PageFetcher, base: &str, max_pages: u32) -> Vec<ProductLink> {
    let mut all: Vec<ProductLink> = Vec::new();

    for page in 1..=max_pages {
        let page_url = collection_page_url(base, page);
        let Some(html) = fetcher.fetch(&page_url).await else {
            info!("Stopping discovery: page {} could not be fetched", page);
            break;
        };

        let found = discover_product_links(&html, &page_url);
        let before = all.len();
        for link in found.iter() {
            if !all.iter().any(|known| known.url == link.url) {
                all.push(link.clone());
            }
        }
        info!("Page {}: found {} products ({} new)", page, found.len(), all.len() - before);

        if all.len() == before {
            break;
        }
    }

    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Option<String> {
            self.0.get(url).cloned()
        }
    }

    const BASE: &str = "https://shop.example.com/collections/badminton-rackets";

    #[test]
    fn test_collection_page_url() {
        assert_eq!(collection_page_url(BASE, 1), BASE);
        assert_eq!(collection_page_url(BASE, 3), format!("{BASE}?page=3"));
        assert_eq!(collection_page_url("https://x.com/c?sort=asc", 2), "https://x.com/c?sort=asc&page=2");
    }

    #[test]
    fn test_discover_product_links() {
        let html = r#"
            <a href="/products/astrox-99?variant=1"><img src="a.jpg"></a>
            <a href="/products/astrox-99">Astrox 99 Pro</a>
            <a href="https://shop.example.com/products/thruster-k#reviews">Thruster K</a>
            <a href="/collections/shuttles">Shuttles</a>
        "#;
        let links = discover_product_links(html, BASE);
        assert_eq!(
            links,
            vec![
                ProductLink {
                    name: "Astrox 99 Pro".into(),
                    url: "https://shop.example.com/products/astrox-99".into(),
                },
                ProductLink {
                    name: "Thruster K".into(),
                    url: "https://shop.example.com/products/thruster-k".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_collection_stops_on_empty_page() {
        let mut pages = HashMap::new();
        pages.insert(BASE.to_string(), r#"<a href="/products/a">A</a>"#.to_string());
        pages.insert(format!("{BASE}?page=2"), r#"<a href="/products/b">B</a>"#.to_string());
        pages.insert(format!("{BASE}?page=3"), "<p>No products</p>".to_string());
        pages.insert(format!("{BASE}?page=4"), r#"<a href="/products/c">C</a>"#.to_string());
        let fetcher = MapFetcher(pages);

        let links = discover_collection(&fetcher, BASE, 20).await;
        let names: Vec<&str> = links.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_discover_collection_respects_page_cap() {
        let mut pages = HashMap::new();
        pages.insert(BASE.to_string(), r#"<a href="/products/a">A</a>"#.to_string());
        pages.insert(format!("{BASE}?page=2"), r#"<a href="/products/b">B</a>"#.to_string());
        let fetcher = MapFetcher(pages);

        assert_eq!(discover_collection(&fetcher, BASE, 1).await.len(), 1);
    }
}
