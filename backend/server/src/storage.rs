//! # Image Files
//!
//! Flat directory of image files, one file per stored image, named
//! `<spider_uuid>_<uuid>.<png|jpeg>`.
//!
//! Names arrive from clients on read and remove requests, so anything that is not a
//! plain file name is refused before it reaches the filesystem.
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use catalog::{StorageError, repository::ImageStore};
use tokio::fs;
use tracing::debug;

pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        Ok(Self { root })
    }

    fn path(&self, name: &str) -> Result<PathBuf, StorageError> {
        let is_plain = !name.is_empty()
            && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
            && name != ".."
            && name != ".";

        if !is_plain {
            return Err(StorageError::Backend(format!("invalid image name {name:?}")));
        }

        Ok(self.root.join(name))
    }
}

fn storage_error(error: io::Error) -> StorageError {
    match error.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        _ => StorageError::Backend(error.to_string()),
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path(name)?;
        debug!("Writing image to {}", path.display());

        fs::write(&path, bytes).await.map_err(storage_error)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(name)?;

        fs::read(&path).await.map_err(storage_error)
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path(name)?;

        fs::remove_file(&path).await.map_err(storage_error)
    }
}
