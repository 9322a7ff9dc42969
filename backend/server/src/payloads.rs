//! # Payloads
//!
//! Every request is `{ "header": { "username", "token" }, "data": { ... } }`, the header
//! being optional. Every response is `{ "header": { "error_code", "message" }, "data": { ... } }`.
//!
//! A success carries `error_code: "00"` and `message: "success"`. Failures carry an empty
//! `data` object and the code from [`crate::error::AppError::code`].
use catalog::models::{
    Address, District, LocationResult, Page, Province, SpiderRecord, SpiderStatus,
    SpiderTypeFilter,
};
use catalog::statistics::{FamilySummary, SpiderStatistics};
use serde::{Deserialize, Serialize};

pub const SUCCESS_CODE: &str = "00";
pub const SUCCESS_MESSAGE: &str = "success";

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RequestHeader {
    pub username: String,
    pub token: String,
}

#[derive(Deserialize, Debug)]
pub struct Request<T> {
    #[serde(default)]
    pub header: RequestHeader,
    pub data: T,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ResponseHeader {
    pub error_code: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Envelope<T> {
    pub header: ResponseHeader,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            header: ResponseHeader {
                error_code: SUCCESS_CODE.to_string(),
                message: SUCCESS_MESSAGE.to_string(),
            },
            data,
        }
    }
}

impl Envelope<Empty> {
    pub fn failure(code: &str, message: String) -> Self {
        Self {
            header: ResponseHeader {
                error_code: code.to_string(),
                message,
            },
            data: Empty {},
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Empty {}

// geographies

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct NamedArea {
    pub number: usize,
    pub name_th: String,
    pub name_en: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProvinceList {
    pub province_list: Vec<NamedArea>,
}

impl From<Vec<Province>> for ProvinceList {
    fn from(provinces: Vec<Province>) -> Self {
        let province_list = provinces
            .into_iter()
            .enumerate()
            .map(|(index, province)| NamedArea {
                number: index + 1,
                name_th: province.name_th,
                name_en: province.name_en,
            })
            .collect();

        Self { province_list }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DistrictRequest {
    pub province_name_en: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DistrictList {
    pub district_list: Vec<NamedArea>,
}

impl From<Vec<District>> for DistrictList {
    fn from(districts: Vec<District>) -> Self {
        let district_list = districts
            .into_iter()
            .enumerate()
            .map(|(index, district)| NamedArea {
                number: index + 1,
                name_th: district.name_th,
                name_en: district.name_en,
            })
            .collect();

        Self { district_list }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LocationList {
    pub location_result: Vec<LocationResult>,
}

// spider info

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct SpiderInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub spider_uuid: String,
    pub family: String,
    pub genus: String,
    pub species: String,
    pub author: String,
    pub publish_year: String,
    pub country: String,
    pub other_countries: String,
    pub altitude: String,
    pub method: String,
    pub habitat: String,
    pub microhabitat: String,
    pub designate: String,
    pub address: Vec<Address>,
    pub paper: Vec<String>,
    pub image: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SpiderStatus>,
}

impl SpiderInfo {
    /// Descriptive fields only. Identity, images and bookkeeping belong to the usecases.
    pub fn into_record(self) -> SpiderRecord {
        SpiderRecord {
            spider_uuid: self.spider_uuid,
            family: self.family,
            genus: self.genus,
            species: self.species,
            author: self.author,
            publish_year: self.publish_year,
            country: self.country,
            country_other: self.other_countries,
            altitude: self.altitude,
            method: self.method,
            habitat: self.habitat,
            microhabitat: self.microhabitat,
            designate: self.designate,
            addresses: self.address,
            paper: self.paper,
            ..Default::default()
        }
    }
}

impl From<SpiderRecord> for SpiderInfo {
    fn from(record: SpiderRecord) -> Self {
        Self {
            spider_uuid: record.spider_uuid,
            family: record.family,
            genus: record.genus,
            species: record.species,
            author: record.author,
            publish_year: record.publish_year,
            country: record.country,
            other_countries: record.country_other,
            altitude: record.altitude,
            method: record.method,
            habitat: record.habitat,
            microhabitat: record.microhabitat,
            designate: record.designate,
            address: record.addresses,
            paper: record.paper,
            image: record.image_files,
            status: Some(record.status),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SpiderInfoList {
    pub spider_info_list: Vec<SpiderInfo>,
}

impl From<Vec<SpiderRecord>> for SpiderInfoList {
    fn from(records: Vec<SpiderRecord>) -> Self {
        Self {
            spider_info_list: records.into_iter().map(SpiderInfo::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct SpiderUuid {
    pub spider_uuid: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct LocalityRequest {
    pub locality: String,
    pub page: u32,
    pub size: u32,
}

impl LocalityRequest {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.size)
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SpiderTypeRequest {
    pub family: String,
    pub genus: String,
    pub species: String,
    pub page: u32,
    pub size: u32,
}

impl SpiderTypeRequest {
    pub fn filter(&self) -> SpiderTypeFilter {
        SpiderTypeFilter {
            family: self.family.clone(),
            genus: self.genus.clone(),
            species: self.species.clone(),
        }
    }

    pub fn page(&self) -> Page {
        Page::new(self.page, self.size)
    }
}

// images

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ImageNames {
    pub spider_image_list: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ImageSource {
    pub title: String,
    pub src: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ImageSourceList {
    pub spider_image_list: Vec<ImageSource>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UploadImagesRequest {
    pub spider_uuid: String,
    pub list_image_encode: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UploadedImages {
    pub image: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RemoveImagesRequest {
    pub spider_uuid: String,
    pub spider_image_list: Vec<String>,
}

// statistics

#[derive(Serialize, Deserialize, Debug)]
pub struct StatisticsList {
    pub spider_statistics: Vec<SpiderStatistics>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FamilyList {
    pub family_list: Vec<FamilySummary>,
}
