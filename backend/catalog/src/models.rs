use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SPIDER_UUID_PREFIX: &str = "SPIDER_";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpiderStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct SpiderRecord {
    pub spider_uuid: String,
    pub family: String,
    pub genus: String,
    pub species: String,
    pub author: String,
    pub publish_year: String,
    pub country: String,
    pub country_other: String,
    pub altitude: String,
    pub method: String,
    pub habitat: String,
    pub microhabitat: String,
    pub designate: String,
    #[serde(rename = "address")]
    pub addresses: Vec<Address>,
    pub paper: Vec<String>,
    pub status: SpiderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "image_file")]
    pub image_files: Vec<String>,
    pub created_by: String,
}

impl SpiderRecord {
    pub fn is_active(&self) -> bool {
        self.status == SpiderStatus::Active
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Address {
    pub province: String,
    pub district: String,
    pub locality: String,
    #[serde(rename = "position")]
    pub positions: Vec<Position>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Position {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One province in an aggregated geography view.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LocationResult {
    pub province: String,
    #[serde(rename = "locality")]
    pub localities: Vec<LocalityResult>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalityResult {
    pub name: String,
    #[serde(rename = "sub_location")]
    pub sub_locations: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Province {
    pub name_th: String,
    pub name_en: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "amphure")]
    pub districts: Vec<District>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct District {
    pub name_th: String,
    pub name_en: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Taxonomy filter. Empty fields are wildcards.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SpiderTypeFilter {
    pub family: String,
    pub genus: String,
    pub species: String,
}

impl SpiderTypeFilter {
    /// A filter must name a family, and may only narrow to species through a genus.
    pub fn is_valid(&self) -> bool {
        match (
            self.family.is_empty(),
            self.genus.is_empty(),
            self.species.is_empty(),
        ) {
            (true, _, _) => false,
            (false, true, false) => false,
            _ => true,
        }
    }
}

/// Geography filter. Each non-empty field must match within one single address.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GeographyFilter {
    pub province: String,
    pub district: String,
    pub position: String,
}

impl GeographyFilter {
    pub fn is_valid(&self) -> bool {
        if self.district.is_empty() && self.position.is_empty() {
            return !self.province.is_empty();
        }

        true
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn skip(&self) -> usize {
        self.page as usize * self.size as usize
    }

    pub fn is_valid(&self) -> bool {
        self.size > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spider_type_filter_rules() {
        let filter = |family: &str, genus: &str, species: &str| SpiderTypeFilter {
            family: family.to_string(),
            genus: genus.to_string(),
            species: species.to_string(),
        };

        assert!(filter("Araneidae", "", "").is_valid());
        assert!(filter("Araneidae", "Argiope", "").is_valid());
        assert!(filter("Araneidae", "Argiope", "aemula").is_valid());
        assert!(!filter("", "", "").is_valid());
        assert!(!filter("", "Argiope", "").is_valid());
        assert!(!filter("Araneidae", "", "aemula").is_valid());
    }

    #[test]
    fn test_geography_filter_rules() {
        let mut filter = GeographyFilter::default();
        assert!(!filter.is_valid());

        filter.province = "Chiang Mai".to_string();
        assert!(filter.is_valid());

        filter.province.clear();
        filter.position = "Doi Pui".to_string();
        assert!(filter.is_valid());
    }

    #[test]
    fn test_record_wire_names() {
        let record = SpiderRecord {
            spider_uuid: "SPIDER_1".to_string(),
            image_files: vec!["a.png".to_string()],
            addresses: vec![Address {
                province: "Chiang Mai".to_string(),
                positions: vec![Position {
                    name: "Doi Pui".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["image_file"][0], "a.png");
        assert_eq!(json["address"][0]["position"][0]["name"], "Doi Pui");
        assert_eq!(json["status"], "active");

        let decoded: SpiderRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_missing_fields_default() {
        let record: SpiderRecord = serde_json::from_str(r#"{"spider_uuid":"SPIDER_2"}"#).unwrap();

        assert_eq!(record.spider_uuid, "SPIDER_2");
        assert!(record.addresses.is_empty());
        assert!(record.image_files.is_empty());
        assert!(record.is_active());
    }
}
