use crate::clock::Clock;
use crate::domain::notice::{ListQuery, NewNotice, Notice, NoticeError, NoticePatch};
use crate::services::stats::{Stats, StatsSnapshot};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// The live notice collection.
///
/// Every read or write of the collection happens under one lock; stats
/// describing a mutation are bumped before that lock is released.
#[derive(Clone, Debug)]
pub struct NoticeStore {
    notices: Arc<Mutex<HashMap<Uuid, Notice>>>,
    clock: Arc<dyn Clock>,
    stats: Stats,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticePage {
    pub total: usize,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchItemError {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub created: Vec<Notice>,
    pub errors: Vec<BatchItemError>,
}

impl NoticeStore {
    pub fn new(clock: Arc<dyn Clock>, stats: Stats) -> Self {
        Self { notices: Arc::default(), clock, stats }
    }

    pub async fn insert(&self, input: NewNotice) -> Result<Notice, NoticeError> {
        let mut notices = self.notices.lock().await;
        let notice = input.into_notice(self.clock.now())?;
        notices.insert(notice.id, notice.clone());
        self.stats.record_created(1);
        info!(notice_id = %notice.id, expires_at = %notice.expires_at, "notice created");
        Ok(notice)
    }

    /// Validates each item on its own; one bad item never blocks the rest.
    pub async fn insert_batch(&self, inputs: Vec<NewNotice>) -> BatchOutcome {
        let mut notices = self.notices.lock().await;
        let now = self.clock.now();
        let mut outcome = BatchOutcome::default();
        for (index, input) in inputs.into_iter().enumerate() {
            match input.into_notice(now) {
                Ok(notice) => {
                    notices.insert(notice.id, notice.clone());
                    outcome.created.push(notice);
                }
                Err(e) => outcome.errors.push(BatchItemError { index, error: e.to_string() }),
            }
        }
        self.stats.record_created(outcome.created.len() as u64);
        info!(created = outcome.created.len(), failed = outcome.errors.len(), "batch processed");
        outcome
    }

    /// Reclaims expired notices, then filters, sorts and truncates.
    pub async fn list(&self, query: &ListQuery) -> NoticePage {
        let snapshot: Vec<Notice> = {
            let mut notices = self.notices.lock().await;
            self.reclaim_locked(&mut notices, self.clock.now());
            notices.values().cloned().collect()
        };
        let (total, notices) = query.apply(snapshot);
        NoticePage { total, notices }
    }

    /// Expired notices are reclaimed first, so they can be neither updated
    /// nor revived.
    pub async fn update(&self, id: Uuid, patch: NoticePatch) -> Result<Notice, NoticeError> {
        let mut notices = self.notices.lock().await;
        let now = self.clock.now();
        self.reclaim_locked(&mut notices, now);
        let notice = notices.get_mut(&id).ok_or(NoticeError::NotFound(id))?;
        patch.apply(notice, now)?;
        info!(notice_id = %id, "notice updated");
        Ok(notice.clone())
    }

    pub async fn delete(&self, id: Uuid) -> Result<Notice, NoticeError> {
        let mut notices = self.notices.lock().await;
        self.reclaim_locked(&mut notices, self.clock.now());
        let removed = notices.remove(&id).ok_or(NoticeError::NotFound(id))?;
        info!(notice_id = %id, "notice deleted");
        Ok(removed)
    }

    /// Drops every notice whose expiry is not after now; returns how many.
    pub async fn reclaim(&self) -> usize {
        let mut notices = self.notices.lock().await;
        self.reclaim_locked(&mut notices, self.clock.now())
    }

    pub async fn len(&self) -> usize {
        self.notices.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats_snapshot(&self) -> StatsSnapshot {
        let notices = self.notices.lock().await;
        self.stats.snapshot(notices.len())
    }

    fn reclaim_locked(&self, notices: &mut HashMap<Uuid, Notice>, now: OffsetDateTime) -> usize {
        let before = notices.len();
        notices.retain(|_, n| n.is_active(now));
        let removed = before - notices.len();
        if removed > 0 {
            self.stats.record_cleanup(now);
            info!(removed, remaining = notices.len(), "reclaimed expired notices");
        } else {
            debug!(remaining = before, "nothing to reclaim");
        }
        removed
    }
}
