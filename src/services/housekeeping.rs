use crate::services::{rate_limit::RateLimiter, storage::NoticeStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Handle to the background reclamation task.
///
/// The loop stops when [`Janitor::shutdown`] is called or the handle is
/// dropped. The period is a fixed delay between passes.
#[derive(Debug)]
pub struct Janitor {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Janitor {
    pub fn start(store: NoticeStore, limiter: Arc<Mutex<RateLimiter>>, every: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            info!(?every, "janitor started");
            loop {
                tokio::select! {
                    _ = sleep(every) => {
                        run_once(&store, &limiter).await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            info!("janitor stopped");
        });
        Self { shutdown_tx, task }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "janitor task ended abnormally");
        }
    }
}

/// One housekeeping pass: reclaim expired notices and prune rate windows.
pub async fn run_once(store: &NoticeStore, limiter: &Mutex<RateLimiter>) -> usize {
    let removed = store.reclaim().await;
    limiter.lock().await.sweep();
    debug!(removed, "janitor pass complete");
    removed
}
