//! Storage seams consumed by the usecases.
//!
//! Every lookup that can come back empty reports [`StorageError::NotFound`] rather than
//! an empty list, so callers can tell "nothing matched" apart from a broken backend.
use async_trait::async_trait;

use crate::{
    error::StorageError,
    models::{GeographyFilter, Page, Province, SpiderRecord, SpiderTypeFilter},
    statistics::SpiderStatistics,
};

#[async_trait]
pub trait SpiderRepository: Send + Sync {
    async fn insert(&self, record: SpiderRecord) -> Result<(), StorageError>;

    async fn find_by_uuid(&self, spider_uuid: &str) -> Result<SpiderRecord, StorageError>;

    /// Every record, oldest first. Used by the manager listing, never reports `NotFound`.
    async fn list(&self, page: Page) -> Result<Vec<SpiderRecord>, StorageError>;

    async fn find_by_geography(
        &self,
        filter: &GeographyFilter,
    ) -> Result<Vec<SpiderRecord>, StorageError>;

    /// `page: None` returns every match.
    async fn find_by_spider_type(
        &self,
        filter: &SpiderTypeFilter,
        page: Option<Page>,
    ) -> Result<Vec<SpiderRecord>, StorageError>;

    async fn find_by_locality(
        &self,
        locality: &str,
        page: Page,
    ) -> Result<Vec<SpiderRecord>, StorageError>;

    /// Replaces the descriptive fields of a record. `Ok(false)` when nothing matched.
    async fn update_info(&self, record: SpiderRecord) -> Result<bool, StorageError>;

    /// Returns the matched count, zero means the record does not exist.
    async fn update_image_list(
        &self,
        spider_uuid: &str,
        image_files: &[String],
    ) -> Result<u64, StorageError>;

    async fn delete(&self, spider_uuid: &str) -> Result<(), StorageError>;
}

#[async_trait]
pub trait GeographyRepository: Send + Sync {
    async fn provinces(&self) -> Result<Vec<Province>, StorageError>;

    async fn province_by_name_en(&self, name_en: &str) -> Result<Province, StorageError>;
}

#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Every family document, ordered by family name.
    async fn all(&self) -> Result<Vec<SpiderStatistics>, StorageError>;

    async fn by_family(&self, family: &str) -> Result<SpiderStatistics, StorageError>;

    /// Inserts or replaces the document of `statistics.family_name`.
    async fn upsert(&self, statistics: SpiderStatistics) -> Result<(), StorageError>;

    /// One page of family documents, same order as [`StatisticsRepository::all`].
    async fn families(&self, page: Page) -> Result<Vec<SpiderStatistics>, StorageError>;
}

/// Physical image files, addressed by file name relative to the store root.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}
