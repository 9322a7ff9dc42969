//! # Spider Statistics
//!
//! One document per family holding every genus and species registered under it.
//! The tree only grows: registration adds what is missing, nothing ever removes
//! entries, so a family can outlive its last record.
//!
//! Empty genus or species names are not added to the tree.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SpiderRecord;

/// Author shown for a family whose records are all gone.
pub const UNKNOWN_AUTHOR: &str = "N/A";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct SpiderStatistics {
    pub family_name: String,
    #[serde(rename = "genus")]
    pub genera: Vec<GenusGroup>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GenusGroup {
    pub genus_name: String,
    pub species: Vec<SpeciesGroup>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SpeciesGroup {
    pub species_name: String,
}

/// One row of the family listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FamilySummary {
    pub family: String,
    pub author: String,
    pub quantity: usize,
}

/// Folds a new record into its family's tree.
///
/// Returns the document to store, or `None` when the tree already holds the
/// record's genus and species and nothing needs writing.
pub fn record_species(
    current: Option<SpiderStatistics>,
    record: &SpiderRecord,
) -> Option<SpiderStatistics> {
    let (mut statistics, mut changed) = match current {
        Some(statistics) => (statistics, false),
        None => (
            SpiderStatistics {
                family_name: record.family.clone(),
                genera: Vec::new(),
                created_at: record.created_at,
                updated_at: record.created_at,
            },
            true,
        ),
    };

    if !record.genus.is_empty() {
        let index = match statistics
            .genera
            .iter()
            .position(|genus| genus.genus_name == record.genus)
        {
            Some(index) => index,
            None => {
                statistics.genera.push(GenusGroup {
                    genus_name: record.genus.clone(),
                    species: Vec::new(),
                });
                changed = true;

                statistics.genera.len() - 1
            }
        };

        let species = &mut statistics.genera[index].species;
        if !record.species.is_empty()
            && !species
                .iter()
                .any(|species| species.species_name == record.species)
        {
            species.push(SpeciesGroup {
                species_name: record.species.clone(),
            });
            changed = true;
        }
    }

    if !changed {
        return None;
    }

    statistics.updated_at = record.created_at;

    Some(statistics)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(family: &str, genus: &str, species: &str) -> SpiderRecord {
        SpiderRecord {
            family: family.to_string(),
            genus: genus.to_string(),
            species: species.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    fn species_of(statistics: &SpiderStatistics, genus: &str) -> Vec<String> {
        statistics
            .genera
            .iter()
            .find(|group| group.genus_name == genus)
            .map(|group| {
                group
                    .species
                    .iter()
                    .map(|species| species.species_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_new_family() {
        let statistics =
            record_species(None, &record("Araneidae", "Argiope", "versicolor")).unwrap();

        assert_eq!(statistics.family_name, "Araneidae");
        assert_eq!(statistics.genera.len(), 1);
        assert_eq!(species_of(&statistics, "Argiope"), vec!["versicolor"]);
        assert_eq!(statistics.created_at, statistics.updated_at);
    }

    #[test]
    fn test_grows_genus_then_species() {
        let statistics =
            record_species(None, &record("Araneidae", "Argiope", "versicolor")).unwrap();
        let statistics =
            record_species(Some(statistics), &record("Araneidae", "Nephila", "pilipes")).unwrap();
        let statistics =
            record_species(Some(statistics), &record("Araneidae", "Argiope", "aemula")).unwrap();

        assert_eq!(statistics.genera.len(), 2);
        assert_eq!(
            species_of(&statistics, "Argiope"),
            vec!["versicolor", "aemula"]
        );
        assert_eq!(species_of(&statistics, "Nephila"), vec!["pilipes"]);
    }

    #[test]
    fn test_known_species_needs_no_write() {
        let statistics =
            record_species(None, &record("Araneidae", "Argiope", "versicolor")).unwrap();

        let again = record("Araneidae", "Argiope", "versicolor");

        assert!(record_species(Some(statistics), &again).is_none());
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let statistics = record_species(None, &record("Salticidae", "", "")).unwrap();
        assert!(statistics.genera.is_empty());

        let genus_only = record("Salticidae", "Phintella", "");
        let statistics = record_species(Some(statistics), &genus_only).unwrap();
        assert!(species_of(&statistics, "Phintella").is_empty());

        assert!(record_species(Some(statistics), &genus_only).is_none());
    }

    #[test]
    fn test_document_shape() {
        let statistics =
            record_species(None, &record("Araneidae", "Argiope", "versicolor")).unwrap();
        let json = serde_json::to_value(&statistics).unwrap();

        assert_eq!(json["family_name"], "Araneidae");
        assert_eq!(json["genus"][0]["genus_name"], "Argiope");
        assert_eq!(json["genus"][0]["species"][0]["species_name"], "versicolor");
    }
}
