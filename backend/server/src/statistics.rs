//! Read side of the per-family statistics. The tree itself is grown by
//! [`crate::spiders::SpiderService::register`].
use std::sync::Arc;

use catalog::{
    StorageError,
    models::{Page, SpiderTypeFilter},
    repository::{SpiderRepository, StatisticsRepository},
    statistics::{FamilySummary, SpiderStatistics, UNKNOWN_AUTHOR},
};
use tracing::{error, info};

use crate::error::AppError;

pub struct StatisticsService {
    statistics: Arc<dyn StatisticsRepository>,
    spiders: Arc<dyn SpiderRepository>,
}

impl StatisticsService {
    pub fn new(
        statistics: Arc<dyn StatisticsRepository>,
        spiders: Arc<dyn SpiderRepository>,
    ) -> Self {
        Self {
            statistics,
            spiders,
        }
    }

    pub async fn statistics(&self) -> Result<Vec<SpiderStatistics>, AppError> {
        self.statistics.all().await.map_err(|e| {
            error!("Failed to load spider statistics: {e}");
            AppError::SpiderDb(e)
        })
    }

    /// One page of families with the author of their oldest record and their record count.
    pub async fn families(&self, page: Page) -> Result<Vec<FamilySummary>, AppError> {
        if !page.is_valid() {
            return Err(AppError::RequestDataFail);
        }

        let documents = self.statistics.families(page).await.map_err(|e| {
            error!("Failed to load family page {page:?}: {e}");
            AppError::SpiderDb(e)
        })?;

        let mut families = Vec::with_capacity(documents.len());
        for document in documents {
            let filter = SpiderTypeFilter {
                family: document.family_name.clone(),
                ..Default::default()
            };

            let summary = match self.spiders.find_by_spider_type(&filter, None).await {
                Ok(records) => FamilySummary {
                    author: records[0].author.clone(),
                    quantity: records.len(),
                    family: document.family_name,
                },
                Err(StorageError::NotFound) => FamilySummary {
                    family: document.family_name,
                    author: UNKNOWN_AUTHOR.to_string(),
                    quantity: 0,
                },
                Err(e) => {
                    error!("Failed to count family {}: {e}", document.family_name);
                    return Err(AppError::SpiderDb(e));
                }
            };

            families.push(summary);
        }

        info!("Listing {} famil(ies) for page {page:?}", families.len());

        Ok(families)
    }
}

#[cfg(test)]
mod tests {
    use catalog::{
        memory::{MemorySpiderRepository, MemoryStatisticsRepository},
        models::SpiderRecord,
        statistics::record_species,
    };
    use chrono::{TimeZone, Utc};

    use super::*;

    fn spider(spider_uuid: &str, family: &str, author: &str, minute: u32) -> SpiderRecord {
        SpiderRecord {
            spider_uuid: spider_uuid.to_string(),
            family: family.to_string(),
            genus: "Genus".to_string(),
            author: author.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
            ..Default::default()
        }
    }

    async fn service(tracked: &[&str], records: Vec<SpiderRecord>) -> StatisticsService {
        let statistics = Arc::new(MemoryStatisticsRepository::new());
        for family in tracked {
            let document = record_species(None, &spider("", family, "", 0)).unwrap();
            statistics.upsert(document).await.unwrap();
        }

        StatisticsService::new(
            statistics,
            Arc::new(MemorySpiderRepository::with_records(records)),
        )
    }

    #[tokio::test]
    async fn test_families_count_records() {
        let service = service(
            &["Araneidae", "Salticidae", "Theridiidae"],
            vec![
                spider("SPIDER_2", "Araneidae", "Clerck", 2),
                spider("SPIDER_1", "Araneidae", "Simon", 1),
                spider("SPIDER_3", "Salticidae", "Koch", 3),
            ],
        )
        .await;

        let families = service.families(Page::new(0, 10)).await.unwrap();

        assert_eq!(
            families,
            vec![
                FamilySummary {
                    family: "Araneidae".to_string(),
                    author: "Simon".to_string(),
                    quantity: 2,
                },
                FamilySummary {
                    family: "Salticidae".to_string(),
                    author: "Koch".to_string(),
                    quantity: 1,
                },
                FamilySummary {
                    family: "Theridiidae".to_string(),
                    author: UNKNOWN_AUTHOR.to_string(),
                    quantity: 0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_families_are_paged() {
        let service = service(&["Araneidae", "Salticidae", "Theridiidae"], vec![]).await;

        let second = service.families(Page::new(1, 2)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].family, "Theridiidae");

        assert!(service.families(Page::new(5, 2)).await.unwrap().is_empty());
        assert!(matches!(
            service.families(Page::new(0, 0)).await,
            Err(AppError::RequestDataFail)
        ));
    }

    #[tokio::test]
    async fn test_statistics_listing() {
        let service = service(&["Salticidae", "Araneidae"], vec![]).await;

        let statistics = service.statistics().await.unwrap();
        let names: Vec<&str> = statistics
            .iter()
            .map(|document| document.family_name.as_str())
            .collect();

        assert_eq!(names, vec!["Araneidae", "Salticidae"]);
    }
}
