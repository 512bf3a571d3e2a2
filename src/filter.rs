//! Filter state and record predicates.
//!
//! A [`FilterState`] is an immutable value; every `with_*` call returns a new
//! state. Filters never touch record data, they only decide membership.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::constants::attributes::{CATEGORY, SEASON};
use crate::constants::filter::{ALL, ALL_ALIASES};
use crate::constants::normalize::{MAX_YEAR, MIN_YEAR};
use crate::data::{CanonicalRecord, SourceKind};
use crate::errors::PipelineError;
use crate::types::{CategoryName, Label, YearRange};
use crate::utils::normalize_inline_whitespace;

/// One filter dimension: either unconstrained or pinned to a value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    /// No constraint.
    #[default]
    All,
    /// Only records matching this value.
    Only(String),
}

impl Selection {
    /// Parse user input. Blank input and the wildcard spellings
    /// (`All`, `All Species`, `All Categories`, `All Seasons`) mean [`Selection::All`].
    pub fn parse(value: &str) -> Self {
        let value = normalize_inline_whitespace(value);
        if value.is_empty()
            || ALL_ALIASES
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(&value))
        {
            Selection::All
        } else {
            Selection::Only(value)
        }
    }

    /// Pinned value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(value) => Some(value),
        }
    }

    /// True when unconstrained.
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(ALL))
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::parse(value)
    }
}

/// Immutable snapshot of user-selected constraints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterState {
    species: Selection,
    category: Selection,
    season: Selection,
    year_range: YearRange,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::all()
    }
}

impl FilterState {
    /// Filter that admits every record.
    pub fn all() -> Self {
        Self {
            species: Selection::All,
            category: Selection::All,
            season: Selection::All,
            year_range: (MIN_YEAR, MAX_YEAR),
        }
    }

    /// Build a filter from raw UI values. An inverted year range is swapped.
    pub fn new(species: &str, category: &str, season: &str, year_range: YearRange) -> Self {
        Self::all()
            .with_species(species)
            .with_category(category)
            .with_season(season)
            .with_year_range(year_range)
    }

    /// Return a copy constrained to `species`.
    pub fn with_species(mut self, species: impl Into<Selection>) -> Self {
        self.species = species.into();
        self
    }

    /// Return a copy constrained to `category`.
    pub fn with_category(mut self, category: impl Into<Selection>) -> Self {
        self.category = category.into();
        self
    }

    /// Return a copy constrained to `season`.
    pub fn with_season(mut self, season: impl Into<Selection>) -> Self {
        self.season = season.into();
        self
    }

    /// Return a copy constrained to an inclusive year range.
    pub fn with_year_range(mut self, (min, max): YearRange) -> Self {
        self.year_range = if min <= max { (min, max) } else { (max, min) };
        self
    }

    /// Species selection.
    pub fn species(&self) -> &Selection {
        &self.species
    }

    /// Category selection.
    pub fn category(&self) -> &Selection {
        &self.category
    }

    /// Season selection.
    pub fn season(&self) -> &Selection {
        &self.season
    }

    /// Normalized inclusive `(min, max)` year range.
    pub fn year_range(&self) -> YearRange {
        self.year_range
    }

    /// Resolved parameters in export order: species, category, season,
    /// yearMin, yearMax.
    pub fn resolved_parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("species", self.species.to_string()),
            ("category", self.category.to_string()),
            ("season", self.season.to_string()),
            ("yearMin", self.year_range.0.to_string()),
            ("yearMax", self.year_range.1.to_string()),
        ]
    }

    /// Attach a registry for category lookups.
    pub fn with_registry<'a>(&'a self, registry: &'a SpeciesRegistry) -> RegistryFilter<'a> {
        RegistryFilter {
            filter: self,
            registry,
        }
    }

    fn admits(&self, record: &CanonicalRecord, registry: Option<&SpeciesRegistry>) -> bool {
        let (min, max) = self.year_range;
        if record.year < min || record.year > max {
            return false;
        }
        if record.source_kind == SourceKind::Fisheries {
            if self
                .species
                .value()
                .is_some_and(|species| !record.label.eq_ignore_ascii_case(species))
            {
                return false;
            }
            if let Some(category) = self.category.value() {
                let record_category = registry
                    .and_then(|registry| registry.category_of(&record.label))
                    .or_else(|| record.text_attribute(CATEGORY));
                if !record_category.is_some_and(|found| found.eq_ignore_ascii_case(category)) {
                    return false;
                }
            }
        }
        if record.source_kind != SourceKind::CycloneTrackPoint {
            return true;
        }
        match (self.season.value(), record.text_attribute(SEASON)) {
            (Some(season), Some(record_season)) => {
                record_season.trim().eq_ignore_ascii_case(season)
            }
            _ => true,
        }
    }
}

/// Membership test applied before aggregation.
pub trait RecordPredicate {
    /// True when `record` should be aggregated.
    fn matches(&self, record: &CanonicalRecord) -> bool;
}

impl RecordPredicate for FilterState {
    fn matches(&self, record: &CanonicalRecord) -> bool {
        self.admits(record, None)
    }
}

/// A [`FilterState`] paired with a [`SpeciesRegistry`] for category membership.
#[derive(Clone, Copy, Debug)]
pub struct RegistryFilter<'a> {
    filter: &'a FilterState,
    registry: &'a SpeciesRegistry,
}

impl RegistryFilter<'_> {
    /// Underlying filter state.
    pub fn state(&self) -> &FilterState {
        self.filter
    }
}

impl RecordPredicate for RegistryFilter<'_> {
    fn matches(&self, record: &CanonicalRecord) -> bool {
        self.filter.admits(record, Some(self.registry))
    }
}

/// One `{scientificName, category}` registry entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Species scientific name.
    #[serde(rename = "scientificName")]
    pub scientific_name: Label,
    /// Category the species belongs to.
    pub category: CategoryName,
}

/// Species to category lookup used by category filters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RegistryEntry>", into = "Vec<RegistryEntry>")]
pub struct SpeciesRegistry {
    entries: Vec<RegistryEntry>,
    by_name: HashMap<Label, usize>,
}

impl From<Vec<RegistryEntry>> for SpeciesRegistry {
    fn from(entries: Vec<RegistryEntry>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            by_name
                .entry(normalize_inline_whitespace(&entry.scientific_name))
                .or_insert(idx);
        }
        Self { entries, by_name }
    }
}

impl From<SpeciesRegistry> for Vec<RegistryEntry> {
    fn from(registry: SpeciesRegistry) -> Self {
        registry.entries
    }
}

impl SpeciesRegistry {
    /// Parse a registry from a JSON list of entries.
    pub fn from_json_str(text: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str::<Vec<RegistryEntry>>(text)?.into())
    }

    /// Category of `label`. The first entry for a name wins.
    pub fn category_of(&self, label: &str) -> Option<&str> {
        let idx = self.by_name.get(&normalize_inline_whitespace(label))?;
        Some(self.entries[*idx].category.as_str())
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !categories.contains(&entry.category.as_str()) {
                categories.push(&entry.category);
            }
        }
        categories
    }

    /// Registry entries in file order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttributeValue;
    use indexmap::IndexMap;

    fn record(kind: SourceKind, label: &str, year: i32) -> CanonicalRecord {
        CanonicalRecord {
            source_kind: kind,
            year,
            position: None,
            label: label.into(),
            value: None,
            attributes: IndexMap::new(),
        }
    }

    fn registry() -> SpeciesRegistry {
        SpeciesRegistry::from_json_str(
            r#"[
                {"scientificName": "Thunnus albacares", "category": "Pelagic"},
                {"scientificName": "Lutjanus argentimaculatus", "category": "Demersal"},
                {"scientificName": "Sardinella longiceps", "category": "Pelagic"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn wildcard_spellings_parse_as_all() {
        for raw in ["All", "all species", "All Categories", "All Seasons", "", "  "] {
            assert_eq!(Selection::parse(raw), Selection::All, "{raw:?}");
        }
        assert_eq!(
            Selection::parse(" Thunnus  albacares "),
            Selection::Only("Thunnus albacares".into())
        );
        assert_eq!(Selection::All.to_string(), "All");
    }

    #[test]
    fn inverted_year_range_is_swapped() {
        let filter = FilterState::new("All", "All", "All", (2021, 1900));
        assert_eq!(filter.year_range(), (1900, 2021));
        assert!(filter.matches(&record(SourceKind::Fisheries, "x", 1900)));
        assert!(filter.matches(&record(SourceKind::Fisheries, "x", 2021)));
        assert!(!filter.matches(&record(SourceKind::Fisheries, "x", 2022)));
    }

    #[test]
    fn species_filter_applies_to_fisheries_only() {
        let filter = FilterState::all().with_species("Thunnus albacares");
        assert!(filter.matches(&record(SourceKind::Fisheries, "Thunnus albacares", 2005)));
        assert!(!filter.matches(&record(SourceKind::Fisheries, "Sardinella longiceps", 2005)));
        assert!(filter.matches(&record(SourceKind::CycloneTrackPoint, "Fani", 2019)));

        let lowercase = FilterState::all().with_species("thunnus albacares");
        assert!(lowercase.matches(&record(SourceKind::Fisheries, "Thunnus albacares", 2005)));
    }

    #[test]
    fn season_filter_skips_records_without_season() {
        let filter = FilterState::all().with_season("monsoon");
        let mut monsoon = record(SourceKind::CycloneTrackPoint, "Monsoon", 2001);
        monsoon
            .attributes
            .insert(SEASON.into(), AttributeValue::Text("Monsoon".into()));
        let mut winter = monsoon.clone();
        winter
            .attributes
            .insert(SEASON.into(), AttributeValue::Text("Winter".into()));
        let unseasoned = record(SourceKind::CycloneTrackPoint, "Fani", 2019);
        let fish = record(SourceKind::Fisheries, "Thunnus albacares", 2005);

        assert!(filter.matches(&monsoon));
        assert!(!filter.matches(&winter));
        assert!(filter.matches(&unseasoned));
        assert!(filter.matches(&fish));
    }

    #[test]
    fn category_uses_registry_then_record_attribute() {
        let registry = registry();
        let filter = FilterState::all().with_category("pelagic");
        let predicate = filter.with_registry(&registry);

        assert!(predicate.matches(&record(SourceKind::Fisheries, "Thunnus albacares", 2005)));
        assert!(!predicate.matches(&record(
            SourceKind::Fisheries,
            "Lutjanus argentimaculatus",
            2005
        )));
        let mut unlisted = record(SourceKind::Fisheries, "Euthynnus affinis", 2005);
        assert!(!predicate.matches(&unlisted));
        unlisted
            .attributes
            .insert(CATEGORY.into(), AttributeValue::Text("Pelagic".into()));
        assert!(predicate.matches(&unlisted));
        assert!(filter.matches(&unlisted));
        assert_eq!(predicate.state(), &filter);
    }

    #[test]
    fn registry_categories_are_first_seen_and_deduplicated() {
        let registry = registry();
        assert_eq!(registry.categories(), vec!["Pelagic", "Demersal"]);
        assert_eq!(registry.category_of("Sardinella  longiceps"), Some("Pelagic"));
        assert_eq!(registry.category_of("Unknown"), None);
        assert_eq!(registry.len(), 3);
        let json = serde_json::to_string(&registry).unwrap();
        assert!(json.starts_with(r#"[{"scientificName":"Thunnus albacares""#));
    }

    #[test]
    fn resolved_parameters_follow_export_order() {
        let filter = FilterState::new("All Species", "Pelagic", "", (1900, 2021));
        assert_eq!(
            filter.resolved_parameters(),
            vec![
                ("species", "All".to_string()),
                ("category", "Pelagic".to_string()),
                ("season", "All".to_string()),
                ("yearMin", "1900".to_string()),
                ("yearMax", "2021".to_string()),
            ]
        );
    }
}
