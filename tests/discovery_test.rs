use racket_scraper::pipeline::ingestion::catalog::{collection_page_url, discover_product_links};

const COLLECTION: &str = "https://shop.example.com/collections/badminton-rackets";

#[test]
fn test_collection_page_links() {
    let html = r#"<html><body>
        <div class="grid">
          <a class="card" href="/products/yonex-astrox-99-pro">Yonex Astrox 99 Pro</a>
          <a class="card" href="/products/victor-thruster-k-falcon?variant=123">Victor Thruster K Falcon</a>
          <a class="card__image" href="/products/yonex-astrox-99-pro"></a>
        </div>
        <a href="/collections/badminton-rackets?page=2">Next</a>
        <a href="/pages/contact">Contact</a>
    </body></html>"#;

    let links = discover_product_links(html, COLLECTION);
    let pairs: Vec<(&str, &str)> = links.iter().map(|l| (l.name.as_str(), l.url.as_str())).collect();
    assert_eq!(
        pairs,
        vec![
            ("Yonex Astrox 99 Pro", "https://shop.example.com/products/yonex-astrox-99-pro"),
            ("Victor Thruster K Falcon", "https://shop.example.com/products/victor-thruster-k-falcon"),
        ]
    );
}

#[test]
fn test_pagination_urls() {
    assert_eq!(collection_page_url(COLLECTION, 1), COLLECTION);
    assert_eq!(
        collection_page_url(COLLECTION, 2),
        "https://shop.example.com/collections/badminton-rackets?page=2"
    );
}
