//! # Redis
//!
//! Document store for spider records and the province/district reference data.
//!
//! ## Layout
//!
//! - `spiders` hash: `spider_uuid` -> JSON spider record
//! - `provinces` hash: English province name -> JSON province, districts nested
//! - `statistics` hash: family name -> JSON genus/species tree
//!
//! ## Queries
//!
//! The catalog is small (thousands of records, not millions), so filtered queries read
//! every document with `HGETALL` and match in process. Lookups by id are a single `HGET`.
//!
//! ## Consistency
//!
//! Read-modify-write updates are not guarded. Two concurrent edits of the same record
//! resolve as last write wins.
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use catalog::{
    StorageError,
    models::{GeographyFilter, Page, Province, SpiderRecord, SpiderTypeFilter},
    query::{has_position, matches_geography, matches_spider_type, paginate},
    repository::{GeographyRepository, SpiderRepository, StatisticsRepository},
    statistics::SpiderStatistics,
};
use chrono::Utc;
use redis::{
    AsyncCommands, Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{error, info, warn};

pub const SPIDERS_KEY: &str = "spiders";
pub const PROVINCES_KEY: &str = "provinces";
pub const STATISTICS_KEY: &str = "statistics";

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    client.get_connection_manager_with_config(config).await
}

fn backend(error: RedisError) -> StorageError {
    error!("Redis command failed: {error}");
    StorageError::Backend(error.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(document: &str) -> Result<T, StorageError> {
    serde_json::from_str(document).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// A document that does not decode fails the whole read, naming its hash field.
fn decode_fields<T: DeserializeOwned>(
    key: &str,
    documents: &HashMap<String, String>,
) -> Result<Vec<T>, StorageError> {
    documents
        .iter()
        .map(|(field, document)| {
            decode(document).map_err(|e| {
                error!("Unreadable document {key}/{field}: {e}");
                StorageError::Serialization(format!("{key}/{field}: {e}"))
            })
        })
        .collect()
}

async fn read_hash<T: DeserializeOwned>(
    connection: &ConnectionManager,
    key: &str,
) -> Result<Vec<T>, StorageError> {
    let mut connection = connection.clone();

    let documents: HashMap<String, String> = connection.hgetall(key).await.map_err(backend)?;

    decode_fields(key, &documents)
}

fn non_empty(records: Vec<SpiderRecord>) -> Result<Vec<SpiderRecord>, StorageError> {
    if records.is_empty() {
        return Err(StorageError::NotFound);
    }

    Ok(records)
}

#[derive(Clone)]
pub struct RedisSpiderRepository {
    connection: ConnectionManager,
}

impl RedisSpiderRepository {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    async fn get(&self, spider_uuid: &str) -> Result<Option<SpiderRecord>, StorageError> {
        let mut connection = self.connection.clone();

        let document: Option<String> = connection
            .hget(SPIDERS_KEY, spider_uuid)
            .await
            .map_err(backend)?;

        document.as_deref().map(decode).transpose()
    }

    async fn put(&self, record: &SpiderRecord) -> Result<(), StorageError> {
        let mut connection = self.connection.clone();
        let document = encode(record)?;

        let _: () = connection
            .hset(SPIDERS_KEY, &record.spider_uuid, document)
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn all(&self) -> Result<Vec<SpiderRecord>, StorageError> {
        read_hash(&self.connection, SPIDERS_KEY).await
    }

    async fn filtered(
        &self,
        predicate: impl Fn(&SpiderRecord) -> bool,
    ) -> Result<Vec<SpiderRecord>, StorageError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|record| predicate(record))
            .collect())
    }
}

#[async_trait]
impl SpiderRepository for RedisSpiderRepository {
    async fn insert(&self, record: SpiderRecord) -> Result<(), StorageError> {
        info!("Inserting spider {}", record.spider_uuid);

        self.put(&record).await
    }

    async fn find_by_uuid(&self, spider_uuid: &str) -> Result<SpiderRecord, StorageError> {
        self.get(spider_uuid).await?.ok_or(StorageError::NotFound)
    }

    async fn list(&self, page: Page) -> Result<Vec<SpiderRecord>, StorageError> {
        Ok(paginate(self.all().await?, Some(page)))
    }

    async fn find_by_geography(
        &self,
        filter: &GeographyFilter,
    ) -> Result<Vec<SpiderRecord>, StorageError> {
        info!("Finding spiders by geography {filter:?}");

        let records = self
            .filtered(|record| matches_geography(record, filter))
            .await?;

        non_empty(paginate(records, None))
    }

    async fn find_by_spider_type(
        &self,
        filter: &SpiderTypeFilter,
        page: Option<Page>,
    ) -> Result<Vec<SpiderRecord>, StorageError> {
        info!("Finding spiders by type {filter:?}, page {page:?}");

        let records = self
            .filtered(|record| matches_spider_type(record, filter))
            .await?;

        non_empty(paginate(records, page))
    }

    async fn find_by_locality(
        &self,
        locality: &str,
        page: Page,
    ) -> Result<Vec<SpiderRecord>, StorageError> {
        let records = self
            .filtered(|record| has_position(record, locality))
            .await?;

        non_empty(paginate(records, Some(page)))
    }

    async fn update_info(&self, record: SpiderRecord) -> Result<bool, StorageError> {
        if self.get(&record.spider_uuid).await?.is_none() {
            warn!("Update matched no spider {}", record.spider_uuid);
            return Ok(false);
        }

        self.put(&record).await?;

        Ok(true)
    }

    async fn update_image_list(
        &self,
        spider_uuid: &str,
        image_files: &[String],
    ) -> Result<u64, StorageError> {
        let Some(mut record) = self.get(spider_uuid).await? else {
            return Ok(0);
        };

        record.image_files = image_files.to_vec();
        record.updated_at = Utc::now();
        self.put(&record).await?;

        info!(
            "Spider {spider_uuid} now has {} image(s)",
            record.image_files.len()
        );

        Ok(1)
    }

    async fn delete(&self, spider_uuid: &str) -> Result<(), StorageError> {
        let mut connection = self.connection.clone();

        let deleted: usize = connection
            .hdel(SPIDERS_KEY, spider_uuid)
            .await
            .map_err(backend)?;

        if deleted == 0 {
            warn!("Delete matched no spider {spider_uuid}");
            return Err(StorageError::NotFound);
        }

        info!("Deleted spider {spider_uuid}");

        Ok(())
    }
}

#[derive(Clone)]
pub struct RedisGeographyRepository {
    connection: ConnectionManager,
}

impl RedisGeographyRepository {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl GeographyRepository for RedisGeographyRepository {
    async fn provinces(&self) -> Result<Vec<Province>, StorageError> {
        let mut provinces: Vec<Province> = read_hash(&self.connection, PROVINCES_KEY).await?;
        provinces.sort_by(|a, b| a.name_en.cmp(&b.name_en));

        Ok(provinces)
    }

    async fn province_by_name_en(&self, name_en: &str) -> Result<Province, StorageError> {
        let mut connection = self.connection.clone();

        let document: Option<String> = connection
            .hget(PROVINCES_KEY, name_en)
            .await
            .map_err(backend)?;

        match document {
            Some(document) => decode(&document),
            None => Err(StorageError::NotFound),
        }
    }
}

#[derive(Clone)]
pub struct RedisStatisticsRepository {
    connection: ConnectionManager,
}

impl RedisStatisticsRepository {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl StatisticsRepository for RedisStatisticsRepository {
    async fn all(&self) -> Result<Vec<SpiderStatistics>, StorageError> {
        let mut documents: Vec<SpiderStatistics> =
            read_hash(&self.connection, STATISTICS_KEY).await?;
        documents.sort_by(|a, b| a.family_name.cmp(&b.family_name));

        Ok(documents)
    }

    async fn by_family(&self, family: &str) -> Result<SpiderStatistics, StorageError> {
        let mut connection = self.connection.clone();

        let document: Option<String> = connection
            .hget(STATISTICS_KEY, family)
            .await
            .map_err(backend)?;

        match document {
            Some(document) => decode(&document),
            None => Err(StorageError::NotFound),
        }
    }

    async fn upsert(&self, statistics: SpiderStatistics) -> Result<(), StorageError> {
        let mut connection = self.connection.clone();
        let document = encode(&statistics)?;

        let _: () = connection
            .hset(STATISTICS_KEY, &statistics.family_name, document)
            .await
            .map_err(backend)?;

        info!("Stored statistics for family {}", statistics.family_name);

        Ok(())
    }

    async fn families(&self, page: Page) -> Result<Vec<SpiderStatistics>, StorageError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .skip(page.skip())
            .take(page.size as usize)
            .collect())
    }
}
