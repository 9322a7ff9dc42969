//! # Geography Aggregation
//!
//! Answers "where has this spider type been found" for map display.
//!
//! ## Shape
//!
//! - One [`LocationResult`] per distinct province
//! - One [`LocalityResult`] per distinct `(province, locality)` pair
//! - Unique position names per locality, first-seen order
//!
//! ## Ordering
//!
//! Provinces come out in the order they are first encountered, localities and
//! position names likewise. Records are walked in input order, addresses in
//! record order.
//!
//! ## Keys
//!
//! Grouping is plain string equality, case-sensitive, no trimming. Localities are
//! keyed inside their province, so `"AB" + "C"` and `"A" + "BC"` stay separate
//! buckets. Coordinates never take part in identity, two positions with the same
//! name are the same sub-location.
use indexmap::{IndexMap, IndexSet};

use crate::models::{LocalityResult, LocationResult, SpiderRecord};

type Localities<'a> = IndexMap<&'a str, IndexSet<&'a str>>;

pub fn aggregate(records: &[SpiderRecord]) -> Vec<LocationResult> {
    let mut provinces: IndexMap<&str, Localities> = IndexMap::new();

    for address in records.iter().flat_map(|record| &record.addresses) {
        let sub_locations = provinces
            .entry(address.province.as_str())
            .or_default()
            .entry(address.locality.as_str())
            .or_default();

        sub_locations.extend(address.positions.iter().map(|position| position.name.as_str()));
    }

    provinces
        .into_iter()
        .map(|(province, localities)| LocationResult {
            province: province.to_string(),
            localities: localities
                .into_iter()
                .map(|(name, sub_locations)| LocalityResult {
                    name: name.to_string(),
                    sub_locations: sub_locations.into_iter().map(str::to_string).collect(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::aggregate;
    use crate::models::{Address, Position, SpiderRecord};

    fn address(province: &str, locality: &str, positions: &[&str]) -> Address {
        Address {
            province: province.to_string(),
            district: String::new(),
            locality: locality.to_string(),
            positions: positions
                .iter()
                .map(|name| Position {
                    name: name.to_string(),
                    latitude: 18.58,
                    longitude: 98.48,
                })
                .collect(),
        }
    }

    fn record(addresses: Vec<Address>) -> SpiderRecord {
        SpiderRecord {
            addresses,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
        assert!(aggregate(&[record(vec![])]).is_empty());
    }

    #[test]
    fn test_chiang_mai_parks() {
        let records = vec![
            record(vec![address(
                "Chiang Mai",
                "Doi Inthanon National Park",
                &["Doi Inthaonon"],
            )]),
            record(vec![
                address(
                    "Chiang Mai",
                    "Doi Inthanon National Park",
                    &["Doi Inthaonon 02"],
                ),
                address("Chiang Mai", "Doi Suthep-Pui National Park", &["Doi Pui"]),
            ]),
        ];

        let locations = aggregate(&records);

        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].province, "Chiang Mai");

        let localities = &locations[0].localities;
        assert_eq!(localities.len(), 2);
        assert_eq!(localities[0].name, "Doi Inthanon National Park");
        assert_eq!(
            localities[0].sub_locations,
            vec!["Doi Inthaonon", "Doi Inthaonon 02"]
        );
        assert_eq!(localities[1].name, "Doi Suthep-Pui National Park");
        assert_eq!(localities[1].sub_locations, vec!["Doi Pui"]);
    }

    #[test]
    fn test_duplicate_positions_merge_by_name() {
        let mut moved = address("Nan", "Doi Phu Kha", &["Camp"]);
        moved.positions[0].latitude = 19.2;

        let records = vec![
            record(vec![address("Nan", "Doi Phu Kha", &["Camp", "Camp", "Ridge"])]),
            record(vec![moved, address("Nan", "Doi Phu Kha", &["Ridge", "Stream"])]),
        ];

        let locations = aggregate(&records);

        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].localities.len(), 1);
        assert_eq!(
            locations[0].localities[0].sub_locations,
            vec!["Camp", "Ridge", "Stream"]
        );
    }

    #[test]
    fn test_boundary_ambiguous_keys_stay_apart() {
        let records = vec![record(vec![
            address("AB", "C", &["first"]),
            address("A", "BC", &["second"]),
        ])];

        let locations = aggregate(&records);

        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].province, "AB");
        assert_eq!(locations[0].localities[0].name, "C");
        assert_eq!(locations[0].localities[0].sub_locations, vec!["first"]);
        assert_eq!(locations[1].province, "A");
        assert_eq!(locations[1].localities[0].name, "BC");
        assert_eq!(locations[1].localities[0].sub_locations, vec!["second"]);
    }

    #[test]
    fn test_grouping_is_case_sensitive_and_untrimmed() {
        let records = vec![record(vec![
            address("Chiang Mai", "Mae Rim", &["a"]),
            address("chiang mai", "Mae Rim", &["b"]),
            address("Chiang Mai ", "Mae Rim", &["c"]),
            address("", "", &[]),
        ])];

        let locations = aggregate(&records);

        let provinces: Vec<&str> = locations.iter().map(|l| l.province.as_str()).collect();
        assert_eq!(provinces, vec!["Chiang Mai", "chiang mai", "Chiang Mai ", ""]);
        assert!(locations[3].localities[0].sub_locations.is_empty());
    }

    #[test]
    fn test_same_locality_name_under_two_provinces() {
        let records = vec![record(vec![
            address("Loei", "Phu Ruea", &["summit"]),
            address("Tak", "Phu Ruea", &["valley"]),
            address("Loei", "Phu Ruea", &["valley"]),
        ])];

        let locations = aggregate(&records);

        assert_eq!(locations.len(), 2);
        assert_eq!(
            locations[0].localities[0].sub_locations,
            vec!["summit", "valley"]
        );
        assert_eq!(locations[1].localities[0].sub_locations, vec!["valley"]);
    }

    #[test]
    fn test_repeatable_and_complete() {
        let records = vec![
            record(vec![
                address("Krabi", "Khao Phanom Bencha", &["p1", "p2"]),
                address("Trang", "Khao Chong", &["p3"]),
            ]),
            record(vec![
                address("Krabi", "Than Bok Khorani", &["p4"]),
                address("Krabi", "Khao Phanom Bencha", &["p2", "p5"]),
            ]),
            record(vec![address("Trang", "Khao Chong", &[])]),
        ];

        let first = aggregate(&records);
        assert_eq!(first, aggregate(&records));

        let input: HashSet<(String, String, String)> = records
            .iter()
            .flat_map(|r| &r.addresses)
            .flat_map(|a| {
                a.positions
                    .iter()
                    .map(|p| (a.province.clone(), a.locality.clone(), p.name.clone()))
            })
            .collect();

        let mut output = HashSet::new();
        let mut provinces = HashSet::new();
        for location in &first {
            assert!(provinces.insert(location.province.clone()));

            let mut names = HashSet::new();
            for locality in &location.localities {
                assert!(names.insert(locality.name.clone()));

                let mut seen = HashSet::new();
                for sub_location in &locality.sub_locations {
                    assert!(seen.insert(sub_location.clone()));
                    output.insert((
                        location.province.clone(),
                        locality.name.clone(),
                        sub_location.clone(),
                    ));
                }
            }
        }

        assert_eq!(input, output);
    }

    #[test]
    fn test_locality_seen_first_without_positions() {
        let records = vec![
            record(vec![address("Tak", "Umphang", &[])]),
            record(vec![address("Tak", "Umphang", &["Thi Lo Su"])]),
        ];

        let locations = aggregate(&records);

        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].localities.len(), 1);
        assert_eq!(locations[0].localities[0].sub_locations, vec!["Thi Lo Su"]);
    }
}
