//! # Background Image Cleanup
//!
//! Physical removal of image files that are no longer referenced by any record.
//!
//! - One long-lived worker task, started with the server, owns the queue
//! - Requests only enqueue and return, the worker is never tied to a request
//! - Jobs run one after another, each through the bounded per-file retry
//! - Outcomes are only visible in the logs
//!
//! If the queue is full or the worker is gone, the job runs on its own detached task.
use std::sync::Arc;

use catalog::{images::remove_files_with_retry, repository::ImageStore};
use tokio::{
    sync::{
        mpsc::{self, Receiver, Sender, error::TrySendError},
        oneshot,
    },
    task::JoinHandle,
};
use tracing::{info, warn};

enum CleanupJob {
    Remove(Vec<String>),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct CleanupQueue {
    sender: Sender<CleanupJob>,
    store: Arc<dyn ImageStore>,
    attempts: u32,
}

impl CleanupQueue {
    pub fn start(
        store: Arc<dyn ImageStore>,
        attempts: u32,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run(receiver, store.clone(), attempts));

        (
            Self {
                sender,
                store,
                attempts,
            },
            worker,
        )
    }

    pub fn submit(&self, files: Vec<String>) {
        if files.is_empty() {
            return;
        }

        info!("Queueing {} image(s) for removal", files.len());

        match self.sender.try_send(CleanupJob::Remove(files)) {
            Ok(()) => {}
            Err(TrySendError::Full(job) | TrySendError::Closed(job)) => {
                warn!("Cleanup queue unavailable, removing images on a detached task");

                if let CleanupJob::Remove(files) = job {
                    let store = self.store.clone();
                    let attempts = self.attempts;

                    tokio::spawn(async move {
                        remove_files_with_retry(store.as_ref(), &files, attempts).await;
                    });
                }
            }
        }
    }

    /// Waits until every job queued before this call has been processed.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();

        if self.sender.send(CleanupJob::Flush(ack)).await.is_err() {
            warn!("Cleanup worker already stopped");
            return;
        }

        let _ = done.await;
    }
}

async fn run(mut receiver: Receiver<CleanupJob>, store: Arc<dyn ImageStore>, attempts: u32) {
    info!("Image cleanup worker started");

    while let Some(job) = receiver.recv().await {
        match job {
            CleanupJob::Remove(files) => {
                remove_files_with_retry(store.as_ref(), &files, attempts).await;
            }
            CleanupJob::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    info!("Image cleanup worker stopped");
}
