use super::metadata::parse_price;
use crate::schema::{CanonicalField, CanonicalSpecSet};
use crate::types::{PageMetadata, ProductRecord};

/// Combines page metadata with the resolved specifications. Canonical values
/// are moved in untouched; the record price falls back to a number read from
/// the canonical Price value.
pub fn assemble(url: &str, metadata: PageMetadata, canonical_specs: CanonicalSpecSet) -> ProductRecord {
    let price = metadata
        .price
        .or_else(|| canonical_specs.value(CanonicalField::Price).and_then(parse_price));
    ProductRecord::new(url.to_string(), metadata, price, canonical_specs)
}
