//! # Image Set Reconciliation
//!
//! The image list on a record is the source of truth, files on disk follow it.
//!
//! ## Removal
//!
//! 1. [`retained_images`] computes the list to persist
//! 2. The caller persists it
//! 3. Only after a successful persist, the removed files are handed to
//!    [`remove_files_with_retry`] on a detached task
//!
//! ## Upload Compensation
//!
//! Newly written files are tracked. If the metadata update fails, the same
//! bounded removal runs over the just-written files. The record was never
//! touched, so there is nothing to roll back on that side.
//!
//! ## Retry Policy
//!
//! - Every file gets its own loop of at most `attempts` tries, no delay in between
//! - A file that still fails is logged and skipped
//! - Nothing is reported upward as an error, orphaned files are acceptable
use std::collections::HashSet;

use tracing::{debug, error, info};

use crate::{error::StorageError, repository::ImageStore};

pub const DEFAULT_REMOVE_ATTEMPTS: u32 = 3;

/// `current` minus every name in `to_remove`, order preserved.
pub fn retained_images(current: &[String], to_remove: &[String]) -> Vec<String> {
    let to_remove: HashSet<&str> = to_remove.iter().map(String::as_str).collect();

    current
        .iter()
        .filter(|name| !to_remove.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Names of `to_remove` that are actually attached, each once, in request order.
pub fn detached_images(current: &[String], to_remove: &[String]) -> Vec<String> {
    let current: HashSet<&str> = current.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    to_remove
        .iter()
        .filter(|name| current.contains(name.as_str()) && seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Appends `added` to `current`, skipping names already present.
pub fn merge_images(current: &[String], added: &[String]) -> Vec<String> {
    let mut merged = current.to_vec();
    let mut seen: HashSet<String> = current.iter().cloned().collect();

    for name in added {
        if seen.insert(name.clone()) {
            merged.push(name.clone());
        }
    }

    merged
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

pub async fn remove_files_with_retry<S>(store: &S, names: &[String], attempts: u32) -> CleanupReport
where
    S: ImageStore + ?Sized,
{
    let mut report = CleanupReport::default();

    for name in names {
        match remove_file_with_retry(store, name, attempts).await {
            Ok(()) => {
                info!("Removed image {name}");
                report.removed.push(name.clone());
            }
            Err(e) => {
                error!("Giving up on image {name} after {attempts} attempts: {e}");
                report.failed.push(name.clone());
            }
        }
    }

    info!(
        "Image cleanup finished, removed: {}, failed: {}",
        report.removed.len(),
        report.failed.len()
    );

    report
}

async fn remove_file_with_retry<S>(store: &S, name: &str, attempts: u32) -> Result<(), StorageError>
where
    S: ImageStore + ?Sized,
{
    let mut last_error = StorageError::Backend("no attempt made".to_string());

    for attempt in 1..=attempts.max(1) {
        match store.delete(name).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!("Attempt {attempt} to remove image {name} failed: {e}");
                last_error = e;
            }
        }
    }

    Err(last_error)
}
