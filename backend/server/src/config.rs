use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use catalog::images::DEFAULT_REMOVE_ATTEMPTS;
use tracing::{info, warn};

const DEFAULT_PORT: &str = "8080";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_IMAGE_PATH: &str = "./images";
const DEFAULT_MAX_REQUEST_SIZE: &str = "10485760";
const DEFAULT_CLEANUP_QUEUE_SIZE: &str = "256";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub image_path: PathBuf,
    pub max_request_size: usize,
    pub cleanup_attempts: u32,
    pub cleanup_queue_size: usize,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", DEFAULT_PORT),
            redis_url: read_secret("REDIS_URL")
                .unwrap_or_else(|| try_load("REDIS_URL", DEFAULT_REDIS_URL)),
            image_path: try_load("SPIDER_IMAGE_PATH", DEFAULT_IMAGE_PATH),
            max_request_size: try_load("MAX_REQUEST_SIZE", DEFAULT_MAX_REQUEST_SIZE),
            cleanup_attempts: try_load("CLEANUP_ATTEMPTS", &DEFAULT_REMOVE_ATTEMPTS.to_string()),
            cleanup_queue_size: try_load("CLEANUP_QUEUE_SIZE", DEFAULT_CLEANUP_QUEUE_SIZE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            image_path: PathBuf::from(DEFAULT_IMAGE_PATH),
            max_request_size: 10 * 1024 * 1024,
            cleanup_attempts: DEFAULT_REMOVE_ATTEMPTS,
            cleanup_queue_size: 256,
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("Secret {secret_name} not readable, falling back to environment: {e}");
        })
        .ok()
}
