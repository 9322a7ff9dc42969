use std::sync::Arc;

use anyhow::Context;
use catalog::repository::{
    GeographyRepository, ImageStore, SpiderRepository, StatisticsRepository,
};
use tracing::info;

use super::{
    cleanup::CleanupQueue,
    config::Config,
    database::{
        RedisGeographyRepository, RedisSpiderRepository, RedisStatisticsRepository, init_redis,
    },
    geographies::GeographyService,
    images::ImageService,
    spiders::SpiderService,
    statistics::StatisticsService,
    storage::FsImageStore,
};

pub struct AppState {
    pub config: Config,
    pub geographies: GeographyService,
    pub spiders: SpiderService,
    pub images: ImageService,
    pub statistics: StatisticsService,
    pub cleanup: CleanupQueue,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let redis_connection = init_redis(&config.redis_url)
            .await
            .with_context(|| format!("cannot connect to redis at {}", config.redis_url))?;
        info!("Connected to redis");

        let store = FsImageStore::open(&config.image_path)
            .await
            .with_context(|| format!("cannot open image directory {:?}", config.image_path))?;
        info!("Serving images from {:?}", config.image_path);

        Ok(Self::from_parts(
            config,
            Arc::new(RedisSpiderRepository::new(redis_connection.clone())),
            Arc::new(RedisGeographyRepository::new(redis_connection.clone())),
            Arc::new(RedisStatisticsRepository::new(redis_connection)),
            Arc::new(store),
        ))
    }

    /// Must be called inside a tokio runtime, the cleanup worker is spawned here.
    pub fn from_parts(
        config: Config,
        spiders: Arc<dyn SpiderRepository>,
        geographies: Arc<dyn GeographyRepository>,
        statistics: Arc<dyn StatisticsRepository>,
        store: Arc<dyn ImageStore>,
    ) -> Arc<Self> {
        let (cleanup, _worker) = CleanupQueue::start(
            store.clone(),
            config.cleanup_attempts,
            config.cleanup_queue_size,
        );

        Arc::new(Self {
            geographies: GeographyService::new(geographies, spiders.clone()),
            spiders: SpiderService::new(spiders.clone(), statistics.clone(), cleanup.clone()),
            statistics: StatisticsService::new(statistics, spiders.clone()),
            images: ImageService::new(spiders, store, cleanup.clone(), config.cleanup_attempts),
            cleanup,
            config,
        })
    }
}
