//! # Spider Images
//!
//! ## Upload
//!
//! 1. The record must exist
//! 2. Every data URL is decoded and checked before anything is written
//! 3. Files are written one by one and tracked
//! 4. New names are sorted and appended to the record's list
//! 5. If writing or the list update fails, the tracked files are removed again
//!
//! ## Removal
//!
//! The record's list is updated first and is authoritative. Files that were
//! actually attached go to the cleanup worker afterwards, names the record never
//! had are ignored.
use std::sync::Arc;

use catalog::{
    images::{detached_images, merge_images, remove_files_with_retry, retained_images},
    repository::{ImageStore, SpiderRepository},
};
use tracing::{error, info, warn};

use crate::{
    cleanup::CleanupQueue,
    error::AppError,
    payloads::ImageSource,
    utils::{decode_data_url, encode_data_url, image_file_name},
};

pub struct ImageService {
    spiders: Arc<dyn SpiderRepository>,
    store: Arc<dyn ImageStore>,
    cleanup: CleanupQueue,
    attempts: u32,
}

impl ImageService {
    pub fn new(
        spiders: Arc<dyn SpiderRepository>,
        store: Arc<dyn ImageStore>,
        cleanup: CleanupQueue,
        attempts: u32,
    ) -> Self {
        Self {
            spiders,
            store,
            cleanup,
            attempts,
        }
    }

    pub async fn images(&self, names: &[String]) -> Result<Vec<ImageSource>, AppError> {
        let mut sources = Vec::with_capacity(names.len());

        for name in names {
            let bytes = self.store.read(name).await.map_err(|e| {
                error!("Failed to read image {name}: {e}");
                AppError::ReadImageFailed
            })?;

            sources.push(ImageSource {
                title: name.clone(),
                src: encode_data_url(&bytes),
            });
        }

        Ok(sources)
    }

    /// Returns the names of the stored files, in the order they were appended.
    pub async fn upload(
        &self,
        spider_uuid: &str,
        data_urls: &[String],
    ) -> Result<Vec<String>, AppError> {
        if spider_uuid.is_empty() || data_urls.is_empty() {
            return Err(AppError::RequestDataFail);
        }

        let record = self
            .spiders
            .find_by_uuid(spider_uuid)
            .await
            .map_err(AppError::from_lookup)?;

        let decoded = data_urls
            .iter()
            .map(|data_url| decode_data_url(data_url))
            .collect::<Result<Vec<_>, _>>()?;

        let mut written = Vec::with_capacity(decoded.len());
        for image in decoded {
            let name = image_file_name(spider_uuid, image.kind);

            if let Err(e) = self.store.write(&name, &image.bytes).await {
                error!("Failed to write image {name}: {e}");
                self.compensate(&written).await;
                return Err(AppError::Internal(format!("cannot store image: {e}")));
            }

            info!("Stored image {name}");
            written.push(name);
        }

        written.sort();
        let image_files = merge_images(&record.image_files, &written);

        match self.spiders.update_image_list(spider_uuid, &image_files).await {
            Ok(0) => {
                warn!("Spider {spider_uuid} vanished during upload");
                self.compensate(&written).await;
                Err(AppError::SpiderNotFound)
            }
            Ok(_) => Ok(written),
            Err(e) => {
                error!("Failed to attach images to {spider_uuid}: {e}");
                self.compensate(&written).await;
                Err(AppError::SpiderDb(e))
            }
        }
    }

    pub async fn remove(&self, spider_uuid: &str, names: &[String]) -> Result<(), AppError> {
        if spider_uuid.is_empty() {
            return Err(AppError::RequestDataFail);
        }

        let record = self
            .spiders
            .find_by_uuid(spider_uuid)
            .await
            .map_err(AppError::from_lookup)?;

        let retained = retained_images(&record.image_files, names);
        let detached = detached_images(&record.image_files, names);

        match self.spiders.update_image_list(spider_uuid, &retained).await {
            Ok(0) => return Err(AppError::SpiderNotFound),
            Ok(_) => {}
            Err(e) => {
                error!("Failed to update images of {spider_uuid}: {e}");
                return Err(AppError::SpiderDb(e));
            }
        }

        info!(
            "Spider {spider_uuid} keeps {} image(s), releasing {}",
            retained.len(),
            detached.len()
        );

        self.cleanup.submit(detached);

        Ok(())
    }

    async fn compensate(&self, written: &[String]) {
        if written.is_empty() {
            return;
        }

        warn!("Rolling back {} stored image(s)", written.len());
        remove_files_with_retry(self.store.as_ref(), written, self.attempts).await;
    }
}

#[cfg(test)]
mod tests {
    use catalog::{
        memory::{MemoryImageStore, MemorySpiderRepository},
        models::SpiderRecord,
    };

    use super::*;
    use crate::utils::{JPEG_MIME, PNG_MIME, test_images};

    struct Fixture {
        repository: Arc<MemorySpiderRepository>,
        store: Arc<MemoryImageStore>,
        queue: CleanupQueue,
        service: ImageService,
    }

    fn fixture(images: &[&str]) -> Fixture {
        let record = SpiderRecord {
            spider_uuid: "SPIDER_1".to_string(),
            family: "Araneidae".to_string(),
            image_files: images.iter().map(|name| name.to_string()).collect(),
            ..Default::default()
        };

        let repository = Arc::new(MemorySpiderRepository::with_records(vec![record]));
        let store = Arc::new(MemoryImageStore::new());
        let (queue, _worker) = CleanupQueue::start(store.clone(), 3, 8);
        let service = ImageService::new(repository.clone(), store.clone(), queue.clone(), 3);

        Fixture {
            repository,
            store,
            queue,
            service,
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn uploads() -> Vec<String> {
        vec![
            test_images::data_url(PNG_MIME, &test_images::png()),
            test_images::data_url(JPEG_MIME, &test_images::jpeg()),
        ]
    }

    #[tokio::test]
    async fn test_upload_appends_sorted_names() {
        let fixture = fixture(&["existing.png"]);

        let written = fixture.service.upload("SPIDER_1", &uploads()).await.unwrap();

        assert_eq!(written.len(), 2);
        let mut sorted = written.clone();
        sorted.sort();
        assert_eq!(written, sorted);
        assert!(written.iter().any(|name| name.ends_with(".png")));
        assert!(written.iter().any(|name| name.ends_with(".jpeg")));

        let stored = fixture.repository.get("SPIDER_1").unwrap();
        assert_eq!(stored.image_files[0], "existing.png");
        assert_eq!(&stored.image_files[1..], written.as_slice());
        for name in &written {
            assert!(fixture.store.contains(name));
        }
    }

    #[tokio::test]
    async fn test_upload_unknown_spider() {
        let fixture = fixture(&[]);

        assert!(matches!(
            fixture.service.upload("SPIDER_9", &uploads()).await,
            Err(AppError::SpiderNotFound)
        ));
        assert!(fixture.store.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_type_before_writing() {
        let fixture = fixture(&[]);
        let mut data_urls = uploads();
        data_urls.push(test_images::data_url("image/gif", &test_images::png()));

        assert!(matches!(
            fixture.service.upload("SPIDER_1", &data_urls).await,
            Err(AppError::InvalidImageType)
        ));
        assert!(fixture.store.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_failed_list_update_removes_written_files() {
        let fixture = fixture(&["existing.png"]);
        fixture.repository.fail_image_updates(true);

        let result = fixture.service.upload("SPIDER_1", &uploads()).await;

        assert!(matches!(result, Err(AppError::SpiderDb(_))));
        assert!(fixture.store.file_names().is_empty());
        assert_eq!(
            fixture.repository.get("SPIDER_1").unwrap().image_files,
            names(&["existing.png"])
        );
    }

    #[tokio::test]
    async fn test_failed_write_removes_earlier_files() {
        let fixture = fixture(&[]);
        fixture.store.fail_writes_after(1);

        let result = fixture.service.upload("SPIDER_1", &uploads()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(fixture.store.file_names().is_empty());
        assert!(fixture.repository.get("SPIDER_1").unwrap().image_files.is_empty());
    }

    #[tokio::test]
    async fn test_remove_persists_then_cleans_up() {
        let fixture = fixture(&["a.png", "b.png", "c.png"]);
        for name in ["a.png", "b.png", "c.png", "x.png"] {
            fixture.store.write(name, b"img").await.unwrap();
        }

        fixture
            .service
            .remove("SPIDER_1", &names(&["c.png", "a.png", "x.png"]))
            .await
            .unwrap();

        assert_eq!(
            fixture.repository.get("SPIDER_1").unwrap().image_files,
            names(&["b.png"])
        );

        fixture.queue.flush().await;
        assert_eq!(fixture.store.file_names(), names(&["b.png", "x.png"]));
        assert_eq!(fixture.store.delete_attempts("x.png"), 0);
    }

    #[tokio::test]
    async fn test_remove_succeeds_when_cleanup_fails() {
        let fixture = fixture(&["a.png"]);
        fixture.store.fail_deletes(true);

        fixture
            .service
            .remove("SPIDER_1", &names(&["a.png"]))
            .await
            .unwrap();
        fixture.queue.flush().await;

        assert!(fixture.repository.get("SPIDER_1").unwrap().image_files.is_empty());
        assert_eq!(fixture.store.delete_attempts("a.png"), 3);
    }

    #[tokio::test]
    async fn test_remove_keeps_files_when_list_update_fails() {
        let fixture = fixture(&["a.png", "b.png"]);
        fixture.store.write("a.png", b"img").await.unwrap();
        fixture.repository.fail_image_updates(true);

        let result = fixture.service.remove("SPIDER_1", &names(&["a.png"])).await;
        fixture.queue.flush().await;

        assert!(matches!(result, Err(AppError::SpiderDb(_))));
        assert_eq!(fixture.store.delete_attempts("a.png"), 0);
        assert!(fixture.store.contains("a.png"));
        assert_eq!(
            fixture.repository.get("SPIDER_1").unwrap().image_files,
            names(&["a.png", "b.png"])
        );
    }

    #[tokio::test]
    async fn test_remove_unknown_spider() {
        let fixture = fixture(&[]);

        assert!(matches!(
            fixture.service.remove("SPIDER_9", &names(&["a.png"])).await,
            Err(AppError::SpiderNotFound)
        ));
    }

    #[tokio::test]
    async fn test_read_images() {
        let fixture = fixture(&[]);
        fixture.store.write("a.png", &test_images::png()).await.unwrap();

        let sources = fixture.service.images(&names(&["a.png"])).await.unwrap();
        assert_eq!(sources[0].title, "a.png");
        assert!(sources[0].src.starts_with("data:image/png;base64,"));

        assert!(matches!(
            fixture.service.images(&names(&["a.png", "missing.png"])).await,
            Err(AppError::ReadImageFailed)
        ));
    }
}
