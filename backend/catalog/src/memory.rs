//! In-process storage. Backs unit tests and local runs without Redis.
use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    error::StorageError,
    models::{GeographyFilter, Page, Province, SpiderRecord, SpiderTypeFilter},
    query::{has_position, matches_geography, matches_spider_type, paginate},
    repository::{GeographyRepository, ImageStore, SpiderRepository, StatisticsRepository},
    statistics::SpiderStatistics,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn non_empty(records: Vec<SpiderRecord>) -> Result<Vec<SpiderRecord>, StorageError> {
    if records.is_empty() {
        return Err(StorageError::NotFound);
    }

    Ok(records)
}

#[derive(Default)]
pub struct MemorySpiderRepository {
    records: Mutex<Vec<SpiderRecord>>,
    fail_image_updates: AtomicBool,
}

impl MemorySpiderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SpiderRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Makes `update_image_list` report a backend failure.
    pub fn fail_image_updates(&self, fail: bool) {
        self.fail_image_updates.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, spider_uuid: &str) -> Option<SpiderRecord> {
        lock(&self.records)
            .iter()
            .find(|record| record.spider_uuid == spider_uuid)
            .cloned()
    }

    fn filtered(&self, predicate: impl Fn(&SpiderRecord) -> bool) -> Vec<SpiderRecord> {
        lock(&self.records)
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SpiderRepository for MemorySpiderRepository {
    async fn insert(&self, record: SpiderRecord) -> Result<(), StorageError> {
        lock(&self.records).push(record);

        Ok(())
    }

    async fn find_by_uuid(&self, spider_uuid: &str) -> Result<SpiderRecord, StorageError> {
        self.get(spider_uuid).ok_or(StorageError::NotFound)
    }

    async fn list(&self, page: Page) -> Result<Vec<SpiderRecord>, StorageError> {
        Ok(paginate(self.filtered(|_| true), Some(page)))
    }

    async fn find_by_geography(
        &self,
        filter: &GeographyFilter,
    ) -> Result<Vec<SpiderRecord>, StorageError> {
        non_empty(paginate(
            self.filtered(|record| matches_geography(record, filter)),
            None,
        ))
    }

    async fn find_by_spider_type(
        &self,
        filter: &SpiderTypeFilter,
        page: Option<Page>,
    ) -> Result<Vec<SpiderRecord>, StorageError> {
        non_empty(paginate(
            self.filtered(|record| matches_spider_type(record, filter)),
            page,
        ))
    }

    async fn find_by_locality(
        &self,
        locality: &str,
        page: Page,
    ) -> Result<Vec<SpiderRecord>, StorageError> {
        non_empty(paginate(
            self.filtered(|record| has_position(record, locality)),
            Some(page),
        ))
    }

    async fn update_info(&self, record: SpiderRecord) -> Result<bool, StorageError> {
        let mut records = lock(&self.records);

        match records
            .iter_mut()
            .find(|stored| stored.spider_uuid == record.spider_uuid)
        {
            Some(stored) => {
                *stored = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_image_list(
        &self,
        spider_uuid: &str,
        image_files: &[String],
    ) -> Result<u64, StorageError> {
        if self.fail_image_updates.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("image list update refused".to_string()));
        }

        let mut records = lock(&self.records);

        match records
            .iter_mut()
            .find(|stored| stored.spider_uuid == spider_uuid)
        {
            Some(stored) => {
                stored.image_files = image_files.to_vec();
                stored.updated_at = chrono::Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, spider_uuid: &str) -> Result<(), StorageError> {
        let mut records = lock(&self.records);
        let before = records.len();

        records.retain(|record| record.spider_uuid != spider_uuid);

        if records.len() == before {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryGeographyRepository {
    provinces: Vec<Province>,
}

impl MemoryGeographyRepository {
    pub fn new(provinces: Vec<Province>) -> Self {
        Self { provinces }
    }
}

#[async_trait]
impl GeographyRepository for MemoryGeographyRepository {
    async fn provinces(&self) -> Result<Vec<Province>, StorageError> {
        Ok(self.provinces.clone())
    }

    async fn province_by_name_en(&self, name_en: &str) -> Result<Province, StorageError> {
        self.provinces
            .iter()
            .find(|province| province.name_en == name_en)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryStatisticsRepository {
    documents: Mutex<HashMap<String, SpiderStatistics>>,
    fail_upserts: AtomicBool,
}

impl MemoryStatisticsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, family: &str) -> Option<SpiderStatistics> {
        lock(&self.documents).get(family).cloned()
    }

    fn sorted(&self) -> Vec<SpiderStatistics> {
        let mut documents: Vec<SpiderStatistics> = lock(&self.documents).values().cloned().collect();
        documents.sort_by(|a, b| a.family_name.cmp(&b.family_name));
        documents
    }
}

#[async_trait]
impl StatisticsRepository for MemoryStatisticsRepository {
    async fn all(&self) -> Result<Vec<SpiderStatistics>, StorageError> {
        Ok(self.sorted())
    }

    async fn by_family(&self, family: &str) -> Result<SpiderStatistics, StorageError> {
        self.get(family).ok_or(StorageError::NotFound)
    }

    async fn upsert(&self, statistics: SpiderStatistics) -> Result<(), StorageError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("statistics upsert refused".to_string()));
        }

        lock(&self.documents).insert(statistics.family_name.clone(), statistics);

        Ok(())
    }

    async fn families(&self, page: Page) -> Result<Vec<SpiderStatistics>, StorageError> {
        Ok(self
            .sorted()
            .into_iter()
            .skip(page.skip())
            .take(page.size as usize)
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    delete_attempts: Mutex<HashMap<String, usize>>,
    fail_deletes: AtomicBool,
    write_limit: Mutex<Option<usize>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Lets `limit` more writes through, every write after that fails.
    pub fn fail_writes_after(&self, limit: usize) {
        *lock(&self.write_limit) = Some(limit);
    }

    pub fn contains(&self, name: &str) -> bool {
        lock(&self.files).contains_key(name)
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.files).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn delete_attempts(&self, name: &str) -> usize {
        lock(&self.delete_attempts).get(name).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(remaining) = lock(&self.write_limit).as_mut() {
            if *remaining == 0 {
                return Err(StorageError::Backend(format!("cannot write {name}")));
            }
            *remaining -= 1;
        }

        lock(&self.files).insert(name.to_string(), bytes.to_vec());

        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        lock(&self.files)
            .get(name)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        *lock(&self.delete_attempts)
            .entry(name.to_string())
            .or_insert(0) += 1;

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("cannot delete {name}")));
        }

        lock(&self.files)
            .remove(name)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}
