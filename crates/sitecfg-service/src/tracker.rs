//! Change tracking and notification fan-out.
//!
//! Every committed write produces one [`ChangeEvent`]. The tracker keeps
//! a bounded in-memory history of recent events and fans each event out
//! to registered handlers. Inline handlers run before the write returns
//! (cache invalidation lives here so no caller observes a stale read
//! after its own write); async handlers are dispatched through a bounded
//! queue serviced by a background worker.
//!
//! A failing handler never fails the write: each failure is logged
//! individually and the remaining handlers still run.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sitecfg_core::{ChangeAction, RecordId, Result, SectionKind};

use crate::cache::{CacheNamespace, ConfigCache};
use crate::settings::TrackerSettings;

/// One observed configuration change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Section kind that changed.
    pub kind: SectionKind,
    /// Record that changed.
    pub record_id: RecordId,
    /// What happened.
    pub action: ChangeAction,
    /// When the change was committed.
    pub timestamp: DateTime<Utc>,
    /// Top-level fields whose value changed.
    pub changed_fields: Vec<String>,
}

/// A change notification target.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    /// Handler name used in logs.
    fn name(&self) -> &str;

    /// Reacts to one change event.
    async fn on_change(&self, event: &ChangeEvent) -> Result<()>;
}

type HandlerList = Arc<RwLock<Vec<Arc<dyn ChangeHandler>>>>;

/// Tracks recent changes and notifies registered handlers.
pub struct ChangeTracker {
    history: Mutex<VecDeque<ChangeEvent>>,
    history_size: usize,
    inline_handlers: RwLock<Vec<Arc<dyn ChangeHandler>>>,
    async_handlers: HandlerList,
    queue: Mutex<Option<mpsc::Sender<ChangeEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeTracker {
    /// Creates a tracker and spawns its notification worker. Must be
    /// called from within a Tokio runtime.
    pub fn new(settings: TrackerSettings) -> Self {
        let (tx, mut rx) = mpsc::channel::<ChangeEvent>(settings.queue_depth.max(1));
        let async_handlers: HandlerList = Arc::new(RwLock::new(Vec::new()));

        let worker_handlers = Arc::clone(&async_handlers);
        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                // Snapshot under the lock, await outside it.
                let handlers: Vec<Arc<dyn ChangeHandler>> =
                    worker_handlers.read().iter().cloned().collect();
                for handler in handlers {
                    if let Err(e) = handler.on_change(&event).await {
                        warn!(
                            handler = handler.name(),
                            kind = %event.kind,
                            error = %e,
                            "async change handler failed"
                        );
                    }
                }
            }
            debug!("change notification worker drained");
        });

        Self {
            history: Mutex::new(VecDeque::with_capacity(settings.history_size)),
            history_size: settings.history_size.max(1),
            inline_handlers: RwLock::new(Vec::new()),
            async_handlers,
            queue: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Registers a handler that runs inline, before the write returns.
    pub fn register_handler(&self, handler: Arc<dyn ChangeHandler>) {
        info!(handler = handler.name(), "inline change handler registered");
        self.inline_handlers.write().push(handler);
    }

    /// Registers a handler serviced by the background worker.
    pub fn register_async_handler(&self, handler: Arc<dyn ChangeHandler>) {
        info!(handler = handler.name(), "async change handler registered");
        self.async_handlers.write().push(handler);
    }

    /// Records one event: appends to history, runs inline handlers, and
    /// queues async dispatch. Handler failures are logged, never raised.
    pub async fn record_change(&self, event: ChangeEvent) {
        {
            let mut history = self.history.lock();
            if history.len() == self.history_size {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        let inline: Vec<Arc<dyn ChangeHandler>> =
            self.inline_handlers.read().iter().cloned().collect();
        for handler in inline {
            if let Err(e) = handler.on_change(&event).await {
                warn!(
                    handler = handler.name(),
                    kind = %event.kind,
                    error = %e,
                    "inline change handler failed"
                );
            }
        }

        let sender = self.queue.lock().clone();
        if let Some(sender) = sender {
            match sender.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(event)) => {
                    warn!(kind = %event.kind, "notification queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("notification queue closed");
                }
            }
        }
    }

    /// The most recent events, newest first.
    pub fn recent_changes(&self, limit: usize) -> Vec<ChangeEvent> {
        self.history
            .lock()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Events committed at or after the given instant, newest first.
    pub fn changes_since(&self, since: DateTime<Utc>) -> Vec<ChangeEvent> {
        self.history
            .lock()
            .iter()
            .rev()
            .filter(|e| e.timestamp >= since)
            .cloned()
            .collect()
    }

    /// Closes the queue and waits for the worker to drain queued events.
    pub async fn shutdown(&self) {
        self.queue.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "notification worker terminated abnormally");
            }
        }
    }
}

/// Inline handler keeping the cache coherent with committed writes.
///
/// Any write flushes the resolved composites; a Site write additionally
/// flushes feature flag lookups, which are derived from the Site section.
pub struct CacheInvalidationHandler {
    cache: ConfigCache,
}

impl CacheInvalidationHandler {
    pub fn new(cache: ConfigCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ChangeHandler for CacheInvalidationHandler {
    fn name(&self) -> &str {
        "cache_invalidation"
    }

    async fn on_change(&self, event: &ChangeEvent) -> Result<()> {
        self.cache.invalidate_namespace(CacheNamespace::Core).await;
        self.cache.invalidate_namespace(CacheNamespace::Config).await;
        if event.kind == SectionKind::Site {
            self.cache
                .invalidate_namespace(CacheNamespace::FeatureFlags)
                .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecfg_core::{SINGLETON_RECORD_ID, SitecfgError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn event(kind: SectionKind) -> ChangeEvent {
        ChangeEvent {
            kind,
            record_id: SINGLETON_RECORD_ID,
            action: ChangeAction::Update,
            timestamp: Utc::now(),
            changed_fields: vec!["site_name".to_string()],
        }
    }

    struct CountingHandler {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ChangeHandler for CountingHandler {
        fn name(&self) -> &str {
            "counting"
        }

        async fn on_change(&self, _event: &ChangeEvent) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ChangeHandler for FailingHandler {
        fn name(&self) -> &str {
            "failing"
        }

        async fn on_change(&self, _event: &ChangeEvent) -> Result<()> {
            Err(SitecfgError::internal("handler exploded"))
        }
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_newest_first() {
        let tracker = ChangeTracker::new(TrackerSettings {
            history_size: 3,
            queue_depth: 8,
        });

        for kind in [
            SectionKind::Site,
            SectionKind::Seo,
            SectionKind::Theme,
            SectionKind::Content,
        ] {
            tracker.record_change(event(kind)).await;
        }

        let recent = tracker.recent_changes(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].kind, SectionKind::Content);
        // The oldest event fell off the ring.
        assert!(recent.iter().all(|e| e.kind != SectionKind::Site));

        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn test_inline_handler_runs_before_return() {
        let tracker = ChangeTracker::new(TrackerSettings::default());
        let calls = Arc::new(AtomicU32::new(0));
        tracker.register_handler(Arc::new(CountingHandler {
            calls: Arc::clone(&calls),
        }));

        tracker.record_change(event(SectionKind::Site)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_others() {
        let tracker = ChangeTracker::new(TrackerSettings::default());
        let calls = Arc::new(AtomicU32::new(0));
        tracker.register_handler(Arc::new(FailingHandler));
        tracker.register_handler(Arc::new(CountingHandler {
            calls: Arc::clone(&calls),
        }));

        tracker.record_change(event(SectionKind::Seo)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        tracker.shutdown().await;
    }

    #[tokio::test]
    async fn test_async_handlers_drain_on_shutdown() {
        let tracker = ChangeTracker::new(TrackerSettings::default());
        let calls = Arc::new(AtomicU32::new(0));
        tracker.register_async_handler(Arc::new(CountingHandler {
            calls: Arc::clone(&calls),
        }));

        tracker.record_change(event(SectionKind::Theme)).await;
        tracker.record_change(event(SectionKind::Theme)).await;
        tracker.shutdown().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    struct GatedHandler {
        gate: Arc<tokio::sync::Semaphore>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ChangeHandler for GatedHandler {
        fn name(&self) -> &str {
            "gated"
        }

        async fn on_change(&self, _event: &ChangeEvent) -> Result<()> {
            let _permit = self.gate.acquire().await.map_err(|e| {
                SitecfgError::internal(e.to_string())
            })?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let tracker = ChangeTracker::new(TrackerSettings {
            history_size: 10,
            queue_depth: 1,
        });
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let calls = Arc::new(AtomicU32::new(0));
        tracker.register_async_handler(Arc::new(GatedHandler {
            gate: Arc::clone(&gate),
            calls: Arc::clone(&calls),
        }));

        // First event parks the worker in the handler, second fills the
        // queue, third is dropped.
        tracker.record_change(event(SectionKind::Site)).await;
        tokio::task::yield_now().await;
        tracker.record_change(event(SectionKind::Seo)).await;
        tracker.record_change(event(SectionKind::Theme)).await;

        gate.add_permits(10);
        tracker.shutdown().await;

        assert!(calls.load(Ordering::SeqCst) <= 2);
        // All three still reached the history ring.
        assert_eq!(tracker.recent_changes(10).len(), 3);
    }

    #[tokio::test]
    async fn test_changes_since_filters_by_timestamp() {
        let tracker = ChangeTracker::new(TrackerSettings::default());

        tracker.record_change(event(SectionKind::Site)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let cutoff = Utc::now();
        tracker.record_change(event(SectionKind::Seo)).await;

        let since = tracker.changes_since(cutoff);
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].kind, SectionKind::Seo);

        tracker.shutdown().await;
    }
}
