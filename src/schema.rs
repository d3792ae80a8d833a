//! Canonical specification schema.
//!
//! `CanonicalField` is the closed set of normalized attribute names every
//! product is mapped onto. `CanonicalSchema` pairs each field with the literal
//! key spellings (aliases) observed on storefronts; it is configuration and is
//! validated once at startup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::constants::SCHEMA_VERSION;
use crate::error::{Result, ScraperError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalField {
    Weight,
    Balance,
    #[serde(rename = "Shaft Flexibility")]
    ShaftFlexibility,
    #[serde(rename = "Grip Size")]
    GripSize,
    Material,
    #[serde(rename = "Frame Material")]
    FrameMaterial,
    #[serde(rename = "Shaft Material")]
    ShaftMaterial,
    #[serde(rename = "String Tension")]
    StringTension,
    #[serde(rename = "Maximum Racket Tension")]
    MaximumRacketTension,
    Price,
    Color,
    Model,
    #[serde(rename = "Product Range")]
    ProductRange,
    #[serde(rename = "Player Level")]
    PlayerLevel,
    #[serde(rename = "Player Type")]
    PlayerType,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 15] = [
        CanonicalField::Weight,
        CanonicalField::Balance,
        CanonicalField::ShaftFlexibility,
        CanonicalField::GripSize,
        CanonicalField::Material,
        CanonicalField::FrameMaterial,
        CanonicalField::ShaftMaterial,
        CanonicalField::StringTension,
        CanonicalField::MaximumRacketTension,
        CanonicalField::Price,
        CanonicalField::Color,
        CanonicalField::Model,
        CanonicalField::ProductRange,
        CanonicalField::PlayerLevel,
        CanonicalField::PlayerType,
    ];

    /// Display name, also the serialized key.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::Weight => "Weight",
            CanonicalField::Balance => "Balance",
            CanonicalField::ShaftFlexibility => "Shaft Flexibility",
            CanonicalField::GripSize => "Grip Size",
            CanonicalField::Material => "Material",
            CanonicalField::FrameMaterial => "Frame Material",
            CanonicalField::ShaftMaterial => "Shaft Material",
            CanonicalField::StringTension => "String Tension",
            CanonicalField::MaximumRacketTension => "Maximum Racket Tension",
            CanonicalField::Price => "Price",
            CanonicalField::Color => "Color",
            CanonicalField::Model => "Model",
            CanonicalField::ProductRange => "Product Range",
            CanonicalField::PlayerLevel => "Player Level",
            CanonicalField::PlayerType => "Player Type",
        }
    }

    /// Key spellings seen on storefront spec tables, in their observed casing.
    /// The display name is always implied and need not be listed.
    fn builtin_aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Weight => &["Racket Weight", "Weight Class", "Weight (U)", "Frame Weight"],
            CanonicalField::Balance => &["Balance Point", "Balance Type"],
            CanonicalField::ShaftFlexibility => &[
                "Flexibility",
                "Flex",
                "Shaft Flex",
                "Stiffness",
                "Shaft Stiffness",
                "Shaft Flexibility Rating",
            ],
            CanonicalField::GripSize => &["Grip", "Grip Sizes", "Handle Size"],
            CanonicalField::Material => &["Materials", "Composition"],
            CanonicalField::FrameMaterial => &["Frame", "Frame Materials"],
            CanonicalField::ShaftMaterial => &["Shaft", "Shaft Materials"],
            CanonicalField::StringTension => &[
                "Recommended Tension",
                "Tension",
                "Recommended String Tension",
                "String Tension Range",
            ],
            CanonicalField::MaximumRacketTension => &[
                "Max Tension",
                "Max. Tension",
                "Maximum Tension",
                "Max String Tension",
                "Max Racket Tension",
            ],
            CanonicalField::Price => &["Retail Price", "MSRP", "Regular Price"],
            CanonicalField::Color => &["Colour", "Colors", "Colours", "Color(s)", "Colorway"],
            CanonicalField::Model => &["Model Name", "Model Number", "Item"],
            CanonicalField::ProductRange => &["Series", "Range", "Collection"],
            CanonicalField::PlayerLevel => &["Level", "Skill Level", "Playing Level"],
            CanonicalField::PlayerType => &["Play Style", "Playing Style", "Player Style"],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CanonicalField {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        CanonicalField::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s.trim())
            .ok_or_else(|| ScraperError::Schema(format!("unknown canonical field '{s}'")))
    }
}

/// Alias tables for every canonical field, in canonical field order.
#[derive(Debug, Clone)]
pub struct CanonicalSchema {
    version: String,
    aliases: Vec<(CanonicalField, Vec<String>)>,
}

impl CanonicalSchema {
    /// The compiled-in schema.
    pub fn builtin() -> Self {
        let aliases = CanonicalField::ALL
            .iter()
            .map(|&field| {
                let mut list = vec![field.name().to_string()];
                list.extend(field.builtin_aliases().iter().map(|a| a.to_string()));
                (field, list)
            })
            .collect();

        Self {
            version: SCHEMA_VERSION.to_string(),
            aliases,
        }
    }

    /// Builtin schema plus configured aliases keyed by canonical display name.
    /// The result is validated before it is returned.
    pub fn with_extra_aliases(version: &str, extra: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut schema = Self::builtin();
        schema.version = version.to_string();

        for (field_name, additions) in extra {
            let field: CanonicalField = field_name.parse()?;
            if let Some((_, list)) = schema.aliases.iter_mut().find(|(f, _)| *f == field) {
                for alias in additions {
                    if !list.contains(alias) {
                        list.push(alias.clone());
                    }
                }
            }
        }

        schema.validate()?;
        Ok(schema)
    }

    /// Rejects empty versions, blank aliases and aliases claimed by two fields.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(ScraperError::Schema("schema version must not be empty".into()));
        }

        let mut owners: HashMap<&str, CanonicalField> = HashMap::new();
        for (field, list) in &self.aliases {
            if list.is_empty() {
                return Err(ScraperError::Schema(format!("field '{field}' has no aliases")));
            }
            for alias in list {
                if alias.trim().is_empty() || alias.trim() != alias {
                    return Err(ScraperError::Schema(format!(
                        "field '{field}' has a blank or untrimmed alias '{alias}'"
                    )));
                }
                if let Some(owner) = owners.insert(alias.as_str(), *field) {
                    if owner != *field {
                        return Err(ScraperError::Schema(format!(
                            "alias '{alias}' is claimed by both '{owner}' and '{field}'"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.aliases.iter().map(|(field, _)| *field)
    }

    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.aliases
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    /// Exact, case-sensitive alias lookup.
    pub fn field_for_alias(&self, key: &str) -> Option<CanonicalField> {
        self.aliases
            .iter()
            .find(|(_, list)| list.iter().any(|alias| alias == key))
            .map(|(field, _)| *field)
    }
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Which resolver pass produced a canonical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    FromAlias,
    FromHeuristic,
    FromDescriptionBackfill,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSpec {
    pub value: String,
    pub provenance: Provenance,
}

/// One resolved value per canonical field. Only the resolver writes to it,
/// and only into fields that are still unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSpecSet {
    specs: BTreeMap<CanonicalField, CanonicalSpec>,
}

impl CanonicalSpecSet {
    /// First writer wins; returns whether the value was taken.
    pub(crate) fn assign(&mut self, field: CanonicalField, value: String, provenance: Provenance) -> bool {
        if self.specs.contains_key(&field) {
            return false;
        }
        self.specs.insert(field, CanonicalSpec { value, provenance });
        true
    }

    pub fn get(&self, field: CanonicalField) -> Option<&CanonicalSpec> {
        self.specs.get(&field)
    }

    pub fn value(&self, field: CanonicalField) -> Option<&str> {
        self.specs.get(&field).map(|spec| spec.value.as_str())
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.specs.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Entries in canonical field order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &CanonicalSpec)> {
        self.specs.iter().map(|(field, spec)| (*field, spec))
    }

    /// Display name to value, dropping provenance.
    pub fn to_value_map(&self) -> BTreeMap<String, String> {
        self.specs
            .iter()
            .map(|(field, spec)| (field.name().to_string(), spec.value.clone()))
            .collect()
    }
}
