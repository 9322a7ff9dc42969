use std::sync::Arc;

use catalog::{
    StorageError,
    geography::aggregate,
    models::{District, LocationResult, Province, SpiderTypeFilter},
    repository::{GeographyRepository, SpiderRepository},
};
use tracing::{error, info, warn};

use crate::error::AppError;

pub struct GeographyService {
    geographies: Arc<dyn GeographyRepository>,
    spiders: Arc<dyn SpiderRepository>,
}

impl GeographyService {
    pub fn new(
        geographies: Arc<dyn GeographyRepository>,
        spiders: Arc<dyn SpiderRepository>,
    ) -> Self {
        Self {
            geographies,
            spiders,
        }
    }

    pub async fn provinces(&self) -> Result<Vec<Province>, AppError> {
        let provinces = self.geographies.provinces().await.map_err(|e| {
            error!("Failed to load provinces: {e}");
            AppError::SpiderDb(e)
        })?;

        if provinces.is_empty() {
            warn!("No provinces stored");
            return Err(AppError::GeographiesNotFound);
        }

        Ok(provinces)
    }

    pub async fn districts(&self, province_name_en: &str) -> Result<Vec<District>, AppError> {
        match self.geographies.province_by_name_en(province_name_en).await {
            Ok(province) => Ok(province.districts),
            Err(StorageError::NotFound) => {
                warn!("Province {province_name_en:?} not found");
                Err(AppError::GeographiesNotFound)
            }
            Err(e) => {
                error!("Failed to load province {province_name_en:?}: {e}");
                Err(AppError::SpiderDb(e))
            }
        }
    }

    /// Where a spider type has been found, grouped province -> locality -> positions.
    pub async fn by_spider_type(
        &self,
        filter: &SpiderTypeFilter,
    ) -> Result<Vec<LocationResult>, AppError> {
        if !filter.is_valid() {
            warn!("Rejected spider type filter {filter:?}");
            return Err(AppError::RequestDataFail);
        }

        let records = self
            .spiders
            .find_by_spider_type(filter, None)
            .await
            .map_err(AppError::from_lookup)?;

        let locations = aggregate(&records);
        info!(
            "Aggregated {} record(s) into {} province(s)",
            records.len(),
            locations.len()
        );

        Ok(locations)
    }
}
