use tracing::debug;

use crate::types::{RawAttribute, RawAttributeSet};

/// Orders candidates by source priority. The sort is stable, so discovery
/// order is kept within each source and duplicate keys survive.
pub fn aggregate(candidates: impl IntoIterator<Item = RawAttribute>) -> RawAttributeSet {
    let mut attributes: Vec<RawAttribute> = candidates.into_iter().collect();
    attributes.sort_by_key(RawAttribute::source);
    RawAttributeSet::from_ordered(attributes)
}

/// Merges the structural and textual extractor outputs for one page.
pub fn aggregate_sources(structural: Vec<RawAttribute>, textual: Vec<RawAttribute>) -> RawAttributeSet {
    debug!(
        "Aggregating {} structural and {} textual attributes",
        structural.len(),
        textual.len()
    );
    aggregate(structural.into_iter().chain(textual))
}
