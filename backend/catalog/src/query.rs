//! Record matching shared by the repository implementations.
use crate::models::{Address, GeographyFilter, Page, SpiderRecord, SpiderTypeFilter};

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn address_matches(address: &Address, filter: &GeographyFilter) -> bool {
    contains_ignore_case(&address.province, &filter.province)
        && contains_ignore_case(&address.district, &filter.district)
        && (filter.position.is_empty()
            || address
                .positions
                .iter()
                .any(|position| contains_ignore_case(&position.name, &filter.position)))
}

/// All criteria have to hold within the same address.
pub fn matches_geography(record: &SpiderRecord, filter: &GeographyFilter) -> bool {
    record
        .addresses
        .iter()
        .any(|address| address_matches(address, filter))
}

pub fn matches_spider_type(record: &SpiderRecord, filter: &SpiderTypeFilter) -> bool {
    (filter.family.is_empty() || record.family == filter.family)
        && (filter.genus.is_empty() || record.genus == filter.genus)
        && (filter.species.is_empty() || record.species == filter.species)
}

pub fn has_position(record: &SpiderRecord, name: &str) -> bool {
    record
        .addresses
        .iter()
        .flat_map(|address| &address.positions)
        .any(|position| position.name == name)
}

/// Oldest first, ties broken by uuid so pages are stable.
pub fn sort_by_creation(records: &mut [SpiderRecord]) {
    records.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.spider_uuid.cmp(&b.spider_uuid))
    });
}

pub fn paginate(mut records: Vec<SpiderRecord>, page: Option<Page>) -> Vec<SpiderRecord> {
    sort_by_creation(&mut records);

    match page {
        Some(page) => records
            .into_iter()
            .skip(page.skip())
            .take(page.size as usize)
            .collect(),
        None => records,
    }
}
