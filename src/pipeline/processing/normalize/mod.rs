pub mod rules;

use tracing::debug;

use crate::schema::{CanonicalSchema, CanonicalSpecSet, Provenance};
use crate::types::RawAttributeSet;
use rules::{classify_key, BACKFILL_RULES};

/// Maps one product's raw attributes onto the canonical schema.
///
/// Three passes write into one empty `CanonicalSpecSet`, each only into
/// fields that are still unset:
///
/// 1. alias: exact, case-sensitive key match against the schema's alias tables
/// 2. heuristic: keyword classification of keys no alias claimed
/// 3. backfill: constrained patterns over the full description text
///
/// Within a pass, raw attributes are visited in `RawAttributeSet` order, so
/// higher-priority sources win collisions.
pub struct Resolver<'a> {
    schema: &'a CanonicalSchema,
}

impl<'a> Resolver<'a> {
    pub fn new(schema: &'a CanonicalSchema) -> Self {
        Self { schema }
    }

    pub fn resolve(&self, raw: &RawAttributeSet, description: &str) -> CanonicalSpecSet {
        let mut specs = CanonicalSpecSet::default();

        let consumed = self.alias_pass(raw, &mut specs);
        let after_alias = specs.len();

        self.heuristic_pass(raw, &consumed, &mut specs);
        let after_heuristic = specs.len();

        self.backfill_pass(description, &mut specs);

        debug!(
            "Resolved {} canonical fields from {} raw attributes (alias {}, heuristic {}, backfill {})",
            specs.len(),
            raw.len(),
            after_alias,
            after_heuristic - after_alias,
            specs.len() - after_heuristic
        );
        specs
    }

    /// Returns which raw attributes matched some alias; those are skipped by
    /// the heuristic pass whether or not they won their field.
    fn alias_pass(&self, raw: &RawAttributeSet, specs: &mut CanonicalSpecSet) -> Vec<bool> {
        let consumed: Vec<bool> = raw
            .iter()
            .map(|attr| self.schema.field_for_alias(attr.key()).is_some())
            .collect();

        for field in self.schema.fields() {
            let aliases = self.schema.aliases(field);
            if let Some(attr) = raw.iter().find(|attr| aliases.iter().any(|alias| alias == attr.key())) {
                specs.assign(field, attr.value().to_string(), Provenance::FromAlias);
            }
        }

        consumed
    }

    fn heuristic_pass(&self, raw: &RawAttributeSet, consumed: &[bool], specs: &mut CanonicalSpecSet) {
        for (attr, _) in raw.iter().zip(consumed).filter(|(_, consumed)| !**consumed) {
            let Some(rule) = classify_key(attr.key()) else {
                continue;
            };
            if specs.contains(rule.field) {
                continue;
            }
            let value = rule.transform.apply(attr.value());
            if !value.is_empty() {
                debug!("Heuristic mapped '{}' to {}", attr.key(), rule.field);
                specs.assign(rule.field, value, Provenance::FromHeuristic);
            }
        }
    }

    fn backfill_pass(&self, description: &str, specs: &mut CanonicalSpecSet) {
        if description.trim().is_empty() {
            return;
        }
        for rule in BACKFILL_RULES.iter() {
            if specs.contains(rule.field) {
                continue;
            }
            if let Some(value) = rule.capture(description) {
                specs.assign(rule.field, value, Provenance::FromDescriptionBackfill);
            }
        }
    }
}
