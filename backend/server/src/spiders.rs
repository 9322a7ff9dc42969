use std::sync::Arc;

use catalog::{
    StorageError,
    models::{GeographyFilter, Page, SpiderRecord, SpiderStatus, SpiderTypeFilter},
    repository::{SpiderRepository, StatisticsRepository},
    statistics::record_species,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{cleanup::CleanupQueue, error::AppError, utils::new_spider_uuid};

pub struct SpiderService {
    spiders: Arc<dyn SpiderRepository>,
    statistics: Arc<dyn StatisticsRepository>,
    cleanup: CleanupQueue,
}

impl SpiderService {
    pub fn new(
        spiders: Arc<dyn SpiderRepository>,
        statistics: Arc<dyn StatisticsRepository>,
        cleanup: CleanupQueue,
    ) -> Self {
        Self {
            spiders,
            statistics,
            cleanup,
        }
    }

    /// Inactive records are reported as missing unless `include_inactive` is set.
    pub async fn spider(
        &self,
        spider_uuid: &str,
        include_inactive: bool,
    ) -> Result<SpiderRecord, AppError> {
        let record = self
            .spiders
            .find_by_uuid(spider_uuid)
            .await
            .map_err(AppError::from_lookup)?;

        if !include_inactive && !record.is_active() {
            warn!("Spider {spider_uuid} is inactive");
            return Err(AppError::SpiderNotFound);
        }

        Ok(record)
    }

    pub async fn list(&self, page: Page) -> Result<Vec<SpiderRecord>, AppError> {
        if !page.is_valid() {
            return Err(AppError::RequestDataFail);
        }

        let records = self.spiders.list(page).await?;
        info!("Listing {} spider(s) for page {page:?}", records.len());

        Ok(records)
    }

    pub async fn by_geographies(
        &self,
        filter: &GeographyFilter,
    ) -> Result<Vec<SpiderRecord>, AppError> {
        if !filter.is_valid() {
            warn!("Rejected geography filter {filter:?}");
            return Err(AppError::RequestDataFail);
        }

        self.spiders
            .find_by_geography(filter)
            .await
            .map_err(AppError::from_lookup)
    }

    pub async fn by_locality(
        &self,
        locality: &str,
        page: Page,
    ) -> Result<Vec<SpiderRecord>, AppError> {
        if locality.is_empty() || !page.is_valid() {
            return Err(AppError::RequestDataFail);
        }

        self.spiders
            .find_by_locality(locality, page)
            .await
            .map_err(AppError::from_lookup)
    }

    pub async fn by_type(
        &self,
        filter: &SpiderTypeFilter,
        page: Page,
    ) -> Result<Vec<SpiderRecord>, AppError> {
        if !filter.is_valid() || !page.is_valid() {
            warn!("Rejected spider type request {filter:?}, {page:?}");
            return Err(AppError::RequestDataFail);
        }

        self.spiders
            .find_by_spider_type(filter, Some(page))
            .await
            .map_err(AppError::from_lookup)
    }

    /// Stores a new record and returns its generated uuid.
    pub async fn register(
        &self,
        draft: SpiderRecord,
        created_by: &str,
    ) -> Result<String, AppError> {
        if draft.family.is_empty() {
            return Err(AppError::RequestDataFail);
        }

        let now = Utc::now();
        let record = SpiderRecord {
            spider_uuid: new_spider_uuid(),
            status: SpiderStatus::Active,
            created_at: now,
            updated_at: now,
            image_files: Vec::new(),
            created_by: created_by.to_string(),
            ..draft
        };
        let spider_uuid = record.spider_uuid.clone();

        self.record_statistics(&record).await?;

        self.spiders.insert(record).await.map_err(|e| {
            error!("Failed to insert spider: {e}");
            AppError::SpiderDb(e)
        })?;

        info!("Registered spider {spider_uuid}");

        Ok(spider_uuid)
    }

    /// Replaces the descriptive fields. Images, status and creation metadata are kept.
    pub async fn update(&self, draft: SpiderRecord) -> Result<(), AppError> {
        if draft.spider_uuid.is_empty() || draft.family.is_empty() {
            return Err(AppError::RequestDataFail);
        }

        let current = self
            .spiders
            .find_by_uuid(&draft.spider_uuid)
            .await
            .map_err(AppError::from_lookup)?;

        let record = SpiderRecord {
            status: current.status,
            created_at: current.created_at,
            created_by: current.created_by,
            image_files: current.image_files,
            updated_at: Utc::now(),
            ..draft
        };

        info!("Updating spider {}", record.spider_uuid);

        if !self.spiders.update_info(record).await? {
            return Err(AppError::SpiderNotFound);
        }

        Ok(())
    }

    /// Deletes the record now, its image files later on the cleanup worker.
    pub async fn delete(&self, spider_uuid: &str) -> Result<(), AppError> {
        info!("Deleting spider {spider_uuid}");

        let record = self
            .spiders
            .find_by_uuid(spider_uuid)
            .await
            .map_err(AppError::from_lookup)?;

        match self.spiders.delete(spider_uuid).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(AppError::SpiderNotFound),
            Err(e) => {
                error!("Failed to delete spider {spider_uuid}: {e}");
                return Err(AppError::DeleteSpiderFailed);
            }
        }

        self.cleanup.submit(record.image_files);

        Ok(())
    }

    async fn record_statistics(&self, record: &SpiderRecord) -> Result<(), AppError> {
        let current = match self.statistics.by_family(&record.family).await {
            Ok(statistics) => Some(statistics),
            Err(StorageError::NotFound) => None,
            Err(e) => {
                error!("Failed to load statistics of {}: {e}", record.family);
                return Err(AppError::SpiderDb(e));
            }
        };

        let Some(statistics) = record_species(current, record) else {
            return Ok(());
        };

        self.statistics.upsert(statistics).await.map_err(|e| {
            error!("Failed to store statistics of {}: {e}", record.family);
            AppError::SpiderDb(e)
        })
    }
}
