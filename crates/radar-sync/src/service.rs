//! # Config Service
//!
//! The caller-facing save-then-notify operations.
//!
//! ## Update Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    update_split / update_notices                        │
//! │                                                                         │
//! │  1. facility_id blank?         ──► InvalidArgument (no write, no pub)   │
//! │  2. lines over LineLimits?     ──► InvalidArgument (no write, no pub)   │
//! │  ─────────────── spawned task, holds (id, field) lock ───────────────   │
//! │  3. store.update_field         ──► NotFound / StoreUnavailable          │
//! │                                    (propagated, no publish)             │
//! │  4. publish committed value    ──► ok:   Published(facility)            │
//! │                                    fail: SavedNotPublished{..}          │
//! │  ──────────────────────────── lock released ─────────────────────────   │
//! │                                                                         │
//! │  The caller awaits the task. Dropping the caller after step 3 still    │
//! │  lets step 4 run, so a committed value is never silently unannounced.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No-op edits (same list as stored) still write and publish.

use std::sync::Arc;

use radar_core::lines::split_lines;
use radar_core::validation::{validate_facility_id, validate_lines};
use radar_core::{parse_topic, ChangeEvent, ConfigField, Facility, LineLimits};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult, TransportError};
use crate::locks::{KeyGuard, KeyLocks};
use crate::notifier::ChangeNotifier;
use crate::store::{ConfigStore, FacilityDirectory};
use crate::transport::Transport;

// =============================================================================
// Update Outcome
// =============================================================================

/// Result of an update that reached the store.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Committed and announced.
    Published(Facility),

    /// Committed, but the change notification failed.
    ///
    /// The write stands. Subscribers learn of it on their next fetch or
    /// after [`ConfigService::republish`].
    SavedNotPublished {
        facility: Facility,
        error: TransportError,
    },
}

impl UpdateOutcome {
    /// The record as committed.
    pub fn facility(&self) -> &Facility {
        match self {
            UpdateOutcome::Published(facility) => facility,
            UpdateOutcome::SavedNotPublished { facility, .. } => facility,
        }
    }

    /// Consumes the outcome, returning the committed record.
    pub fn into_facility(self) -> Facility {
        match self {
            UpdateOutcome::Published(facility) => facility,
            UpdateOutcome::SavedNotPublished { facility, .. } => facility,
        }
    }

    /// Returns true if the change notification went out.
    pub fn is_published(&self) -> bool {
        matches!(self, UpdateOutcome::Published(_))
    }

    /// The publish failure, if any.
    pub fn publish_error(&self) -> Option<&TransportError> {
        match self {
            UpdateOutcome::Published(_) => None,
            UpdateOutcome::SavedNotPublished { error, .. } => Some(error),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// The current value of one topic, read under the topic's write lock.
///
/// While a `Snapshot` is alive, updates to the same (facility, field) wait.
/// Deliver it, then drop it: anything published afterwards is newer.
#[derive(Debug)]
pub struct Snapshot {
    pub event: ChangeEvent,
    _guard: KeyGuard,
}

// =============================================================================
// Config Service
// =============================================================================

struct ServiceInner {
    store: Arc<dyn ConfigStore>,
    directory: Arc<dyn FacilityDirectory>,
    notifier: ChangeNotifier,
    locks: KeyLocks,
    limits: LineLimits,
}

/// Save-then-notify service.
///
/// Cloning is cheap and shares all state.
///
/// ## Usage
/// ```rust,ignore
/// let store = Arc::new(SqliteConfigStore::new(db));
/// let service = ConfigService::new(store.clone(), store, Arc::new(bus), LineLimits::default());
///
/// match service.update_split(&ztl_id, lines).await? {
///     UpdateOutcome::Published(f) => { /* done */ }
///     UpdateOutcome::SavedNotPublished { facility, error } => { /* warn the operator */ }
/// }
/// ```
#[derive(Clone)]
pub struct ConfigService {
    inner: Arc<ServiceInner>,
}

impl ConfigService {
    /// Creates a service from its collaborators.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        directory: Arc<dyn FacilityDirectory>,
        transport: Arc<dyn Transport>,
        limits: LineLimits,
    ) -> Self {
        ConfigService {
            inner: Arc::new(ServiceInner {
                store,
                directory,
                notifier: ChangeNotifier::new(transport),
                locks: KeyLocks::new(),
                limits,
            }),
        }
    }

    /// The limits applied to every update.
    pub fn limits(&self) -> LineLimits {
        self.inner.limits
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Point-in-time list of all facilities.
    pub async fn list_facilities(&self) -> SyncResult<Vec<Facility>> {
        self.inner.directory.list().await
    }

    /// Current committed state of one facility.
    pub async fn fetch(&self, facility_id: &str) -> SyncResult<Facility> {
        validate_facility_id(facility_id)?;
        self.inner.store.get(facility_id).await
    }

    /// Reads the committed value behind a topic such as `"ZTL-notam"`.
    ///
    /// Used by subscribers to reconcile on (re)subscribe. See [`Snapshot`].
    pub async fn snapshot(&self, topic: &str) -> SyncResult<Snapshot> {
        let (facility_identifier, field) = parse_topic(topic)?;

        let found = self
            .inner
            .directory
            .find_by_identifier(facility_identifier)
            .await?
            .ok_or_else(|| SyncError::not_found(facility_identifier))?;

        let guard = self.inner.locks.lock(&found.id, field).await;
        // Re-read under the lock; the directory copy may predate a write
        let current = self.inner.store.get(&found.id).await?;

        Ok(Snapshot {
            event: ChangeEvent::for_facility(&current, field),
            _guard: guard,
        })
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Replaces a facility's split assignments and announces the new value.
    pub async fn update_split(
        &self,
        facility_id: &str,
        lines: Vec<String>,
    ) -> SyncResult<UpdateOutcome> {
        self.update_field(facility_id, ConfigField::SplitAssignments, lines)
            .await
    }

    /// Replaces a facility's NOTAMs and announces the new value.
    pub async fn update_notices(
        &self,
        facility_id: &str,
        lines: Vec<String>,
    ) -> SyncResult<UpdateOutcome> {
        self.update_field(facility_id, ConfigField::Notices, lines)
            .await
    }

    /// [`update_split`](Self::update_split) from free text, one entry per line.
    pub async fn update_split_text(
        &self,
        facility_id: &str,
        text: &str,
    ) -> SyncResult<UpdateOutcome> {
        self.update_split(facility_id, split_lines(text)).await
    }

    /// [`update_notices`](Self::update_notices) from free text, one entry per line.
    pub async fn update_notices_text(
        &self,
        facility_id: &str,
        text: &str,
    ) -> SyncResult<UpdateOutcome> {
        self.update_notices(facility_id, split_lines(text)).await
    }

    /// Replaces one field and announces the committed value.
    ///
    /// ## Returns
    /// * `Ok(Published)` - Written and announced
    /// * `Ok(SavedNotPublished)` - Written, announcement failed
    /// * `Err(InvalidArgument)` - Rejected before any write
    /// * `Err(NotFound)` / `Err(StoreUnavailable)` - Write failed, nothing announced
    pub async fn update_field(
        &self,
        facility_id: &str,
        field: ConfigField,
        lines: Vec<String>,
    ) -> SyncResult<UpdateOutcome> {
        validate_facility_id(facility_id)?;
        validate_lines(field, &lines, &self.inner.limits)?;

        let inner = self.inner.clone();
        let facility_id = facility_id.to_string();

        // Runs to completion even if the caller is dropped
        let task = tokio::spawn(async move {
            inner
                .commit_and_publish(&facility_id, field, lines)
                .await
        });

        task.await?
    }

    /// Re-announces the committed value of one field.
    ///
    /// This is the caller-driven recovery for
    /// [`UpdateOutcome::SavedNotPublished`]; nothing retries automatically.
    pub async fn republish(&self, facility_id: &str, field: ConfigField) -> SyncResult<Facility> {
        validate_facility_id(facility_id)?;

        let _guard = self.inner.locks.lock(facility_id, field).await;
        let facility = self.inner.store.get(facility_id).await?;
        let topic = self.inner.notifier.publish_field(&facility, field).await?;

        info!(
            facility_id = %facility.id,
            topic = %topic,
            lines = facility.field(field).len(),
            "Republished committed value"
        );
        Ok(facility)
    }
}

impl ServiceInner {
    async fn commit_and_publish(
        &self,
        facility_id: &str,
        field: ConfigField,
        lines: Vec<String>,
    ) -> SyncResult<UpdateOutcome> {
        let _guard = self.locks.lock(facility_id, field).await;

        let facility = self
            .store
            .update_field(facility_id, field, &lines)
            .await
            .map_err(|e| {
                debug!(facility_id = %facility_id, field = %field, error = %e, "Store write failed");
                e
            })?;

        match self.notifier.publish_field(&facility, field).await {
            Ok(topic) => {
                info!(
                    facility_id = %facility.id,
                    topic = %topic,
                    lines = facility.field(field).len(),
                    "Update committed and published"
                );
                Ok(UpdateOutcome::Published(facility))
            }
            Err(error) => {
                warn!(
                    facility_id = %facility.id,
                    topic = %facility.topic(field),
                    error = %error,
                    published = false,
                    "Update committed but not published"
                );
                Ok(UpdateOutcome::SavedNotPublished { facility, error })
            }
        }
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("notifier", &self.inner.notifier)
            .field("limits", &self.inner.limits)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryConfigStore;
    use crate::transport::LocalBus;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Records every publish in order.
    #[derive(Default)]
    struct RecordingTransport {
        published: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl RecordingTransport {
        fn published(&self) -> Vec<(String, Vec<String>)> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn publish(&self, topic: &str, lines: &[String]) -> Result<(), TransportError> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), lines.to_vec()));
            Ok(())
        }
    }

    /// Always fails to publish.
    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn publish(&self, topic: &str, _lines: &[String]) -> Result<(), TransportError> {
            Err(TransportError::Publish {
                topic: topic.to_string(),
                reason: "broker unreachable".into(),
            })
        }
    }

    /// Store whose writes always fail transiently.
    struct UnavailableStore;

    #[async_trait]
    impl ConfigStore for UnavailableStore {
        async fn get(&self, _facility_id: &str) -> SyncResult<Facility> {
            Err(SyncError::StoreUnavailable("database is locked".into()))
        }

        async fn update_field(
            &self,
            _facility_id: &str,
            _field: ConfigField,
            _lines: &[String],
        ) -> SyncResult<Facility> {
            Err(SyncError::StoreUnavailable("database is locked".into()))
        }
    }

    struct Fixture {
        service: ConfigService,
        store: Arc<MemoryConfigStore>,
        transport: Arc<RecordingTransport>,
        ztl: Facility,
    }

    fn fixture() -> Fixture {
        let ztl = Facility::new("ZTL")
            .with_split_assignments(["North", "South"])
            .with_notices(["RWY 8L closed"]);
        let store = Arc::new(MemoryConfigStore::from_iter([ztl.clone(), Facility::new("ZJX")]));
        let transport = Arc::new(RecordingTransport::default());
        let service = ConfigService::new(
            store.clone(),
            store.clone(),
            transport.clone(),
            LineLimits::default(),
        );
        Fixture {
            service,
            store,
            transport,
            ztl,
        }
    }

    #[tokio::test]
    async fn test_ztl_split_update_scenario() {
        let f = fixture();
        let new_split = lines(&["North", "South", "East"]);

        let outcome = f.service.update_split(&f.ztl.id, new_split.clone()).await.unwrap();
        assert!(outcome.is_published());
        assert_eq!(outcome.facility().split_assignments, new_split);

        assert_eq!(
            f.transport.published(),
            vec![("ZTL-radar-split".to_string(), new_split.clone())]
        );
        assert_eq!(f.store.get(&f.ztl.id).await.unwrap().split_assignments, new_split);
    }

    #[tokio::test]
    async fn test_unknown_facility_is_not_found_and_not_published() {
        let f = fixture();

        let err = f
            .service
            .update_notices("XXX", lines(&["TFR in effect"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
        assert!(f.transport.published().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_leave_no_lock_entries() {
        let f = fixture();

        for i in 0..1000 {
            let id = format!("unknown-{}", i);
            let err = f
                .service
                .update_notices(&id, lines(&["x"]))
                .await
                .unwrap_err();
            assert!(matches!(err, SyncError::NotFound { .. }));
            assert!(f.service.republish(&id, ConfigField::Notices).await.is_err());
        }

        assert!(f.service.inner.locks.is_empty());
    }

    #[tokio::test]
    async fn test_blank_facility_id_rejected_before_store() {
        let f = fixture();

        for id in ["", "   "] {
            let err = f.service.update_split(id, lines(&["North"])).await.unwrap_err();
            assert!(matches!(err, SyncError::InvalidArgument(_)));
        }
        assert!(f.transport.published().is_empty());
        assert_eq!(
            f.store.get(&f.ztl.id).await.unwrap().split_assignments,
            lines(&["North", "South"])
        );
    }

    #[tokio::test]
    async fn test_limits_rejected_before_store() {
        let ztl = Facility::new("ZTL").with_notices(["keep"]);
        let store = Arc::new(MemoryConfigStore::from_iter([ztl.clone()]));
        let transport = Arc::new(RecordingTransport::default());
        let service = ConfigService::new(
            store.clone(),
            store.clone(),
            transport.clone(),
            LineLimits {
                max_lines: 2,
                max_line_len: 5,
            },
        );

        let too_many = service.update_notices(&ztl.id, lines(&["a", "b", "c"])).await;
        assert!(matches!(too_many, Err(SyncError::InvalidArgument(_))));

        let too_long = service.update_notices(&ztl.id, lines(&["abcdef"])).await;
        assert!(matches!(too_long, Err(SyncError::InvalidArgument(_))));

        assert!(transport.published().is_empty());
        assert_eq!(store.get(&ztl.id).await.unwrap().notices, lines(&["keep"]));
    }

    #[tokio::test]
    async fn test_fields_are_independent() {
        let f = fixture();

        f.service
            .update_notices(&f.ztl.id, lines(&["TFR in effect"]))
            .await
            .unwrap();
        let current = f.service.fetch(&f.ztl.id).await.unwrap();
        assert_eq!(current.split_assignments, lines(&["North", "South"]));

        f.service
            .update_split(&f.ztl.id, lines(&["Combined"]))
            .await
            .unwrap();
        let current = f.service.fetch(&f.ztl.id).await.unwrap();
        assert_eq!(current.notices, lines(&["TFR in effect"]));
    }

    #[tokio::test]
    async fn test_order_and_empty_entries_preserved() {
        let f = fixture();
        let value = lines(&["", "North", "", "  South  ", ""]);

        f.service.update_split(&f.ztl.id, value.clone()).await.unwrap();

        assert_eq!(f.service.fetch(&f.ztl.id).await.unwrap().split_assignments, value);
        assert_eq!(f.transport.published()[0].1, value);
    }

    #[tokio::test]
    async fn test_sequential_updates_last_wins() {
        let f = fixture();

        f.service.update_notices(&f.ztl.id, lines(&["first"])).await.unwrap();
        f.service.update_notices(&f.ztl.id, lines(&["second"])).await.unwrap();

        assert_eq!(f.service.fetch(&f.ztl.id).await.unwrap().notices, lines(&["second"]));
        let payloads: Vec<Vec<String>> =
            f.transport.published().into_iter().map(|(_, l)| l).collect();
        assert_eq!(payloads, vec![lines(&["first"]), lines(&["second"])]);
    }

    #[tokio::test]
    async fn test_noop_update_still_publishes() {
        let f = fixture();

        let outcome = f
            .service
            .update_split(&f.ztl.id, f.ztl.split_assignments.clone())
            .await
            .unwrap();
        assert!(outcome.is_published());
        assert_eq!(f.transport.published().len(), 1);
    }

    #[tokio::test]
    async fn test_text_variants_split_on_newline() {
        let f = fixture();

        let outcome = f
            .service
            .update_notices_text(&f.ztl.id, "TFR in effect\n\nRWY 8L closed")
            .await
            .unwrap();
        assert_eq!(
            outcome.into_facility().notices,
            lines(&["TFR in effect", "", "RWY 8L closed"])
        );

        let outcome = f.service.update_split_text(&f.ztl.id, "").await.unwrap();
        assert_eq!(outcome.facility().split_assignments, lines(&[""]));
    }

    #[tokio::test]
    async fn test_transport_failure_is_saved_not_published() {
        let ztl = Facility::new("ZTL").with_split_assignments(["North"]);
        let store = Arc::new(MemoryConfigStore::from_iter([ztl.clone()]));
        let service = ConfigService::new(
            store.clone(),
            store.clone(),
            Arc::new(FailingTransport),
            LineLimits::default(),
        );

        let outcome = service
            .update_split(&ztl.id, lines(&["North", "East"]))
            .await
            .unwrap();

        assert!(!outcome.is_published());
        assert!(matches!(
            outcome.publish_error(),
            Some(TransportError::Publish { topic, .. }) if topic == "ZTL-radar-split"
        ));
        assert_eq!(
            store.get(&ztl.id).await.unwrap().split_assignments,
            lines(&["North", "East"])
        );

        // Caller-driven retry surfaces the transport failure directly
        let err = service
            .republish(&ztl.id, ConfigField::SplitAssignments)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }

    #[tokio::test]
    async fn test_store_failure_skips_publish() {
        let transport = Arc::new(RecordingTransport::default());
        let directory = Arc::new(MemoryConfigStore::new());
        let service = ConfigService::new(
            Arc::new(UnavailableStore),
            directory,
            transport.clone(),
            LineLimits::default(),
        );

        let err = service.update_split("some-id", lines(&["North"])).await.unwrap_err();
        assert!(matches!(err, SyncError::StoreUnavailable(_)));
        assert!(err.is_retryable());
        assert!(transport.published().is_empty());
    }

    #[tokio::test]
    async fn test_republish_sends_committed_value() {
        let f = fixture();

        let facility = f
            .service
            .republish(&f.ztl.id, ConfigField::Notices)
            .await
            .unwrap();
        assert_eq!(facility.notices, lines(&["RWY 8L closed"]));
        assert_eq!(
            f.transport.published(),
            vec![("ZTL-notam".to_string(), lines(&["RWY 8L closed"]))]
        );
    }

    #[tokio::test]
    async fn test_list_and_snapshot() {
        let f = fixture();

        let codes: Vec<String> = f
            .service
            .list_facilities()
            .await
            .unwrap()
            .into_iter()
            .map(|fac| fac.facility_identifier)
            .collect();
        assert_eq!(codes, vec!["ZJX", "ZTL"]);

        let snap = f.service.snapshot("ZTL-radar-split").await.unwrap();
        assert_eq!(snap.event.lines, lines(&["North", "South"]));
        drop(snap);

        assert!(matches!(
            f.service.snapshot("ZZZ-notam").await,
            Err(SyncError::NotFound { .. })
        ));
        assert!(matches!(
            f.service.snapshot("ZTL-weather").await,
            Err(SyncError::InvalidArgument(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_final_value_matches_last_publish() {
        let f = fixture();

        let mut tasks = Vec::new();
        for i in 0..32 {
            let service = f.service.clone();
            let id = f.ztl.id.clone();
            tasks.push(tokio::spawn(async move {
                service
                    .update_split(&id, vec![format!("config-{i}"), String::new()])
                    .await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_published());
        }

        let published = f.transport.published();
        assert_eq!(published.len(), 32);

        let stored = f.service.fetch(&f.ztl.id).await.unwrap().split_assignments;
        assert_eq!(published.last().unwrap().1, stored);
    }

    /// Blocks each publish until released.
    struct GatedTransport {
        entered: Notify,
        release: Notify,
        inner: RecordingTransport,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn publish(&self, topic: &str, lines: &[String]) -> Result<(), TransportError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.publish(topic, lines).await
        }
    }

    #[tokio::test]
    async fn test_dropped_caller_still_publishes_committed_value() {
        let ztl = Facility::new("ZTL");
        let store = Arc::new(MemoryConfigStore::from_iter([ztl.clone()]));
        let transport = Arc::new(GatedTransport {
            entered: Notify::new(),
            release: Notify::new(),
            inner: RecordingTransport::default(),
        });
        let service = ConfigService::new(
            store.clone(),
            store.clone(),
            transport.clone(),
            LineLimits::default(),
        );

        // Drop the caller once the write is committed and publish is pending
        {
            let update = service.update_notices(&ztl.id, lines(&["TFR in effect"]));
            tokio::select! {
                _ = update => panic!("publish should still be gated"),
                _ = transport.entered.notified() => {}
            }
        }

        assert_eq!(
            store.get(&ztl.id).await.unwrap().notices,
            lines(&["TFR in effect"])
        );

        transport.release.notify_one();
        tokio::time::timeout(Duration::from_secs(5), async {
            while transport.inner.published().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(
            transport.inner.published(),
            vec![("ZTL-notam".to_string(), lines(&["TFR in effect"]))]
        );
    }

    #[tokio::test]
    async fn test_local_bus_end_to_end() {
        let ztl = Facility::new("ZTL");
        let store = Arc::new(MemoryConfigStore::from_iter([ztl.clone()]));
        let bus = LocalBus::new(16);
        let mut sub = bus.subscribe();
        let service = ConfigService::new(
            store.clone(),
            store,
            Arc::new(bus),
            LineLimits::default(),
        );

        service
            .update_split(&ztl.id, lines(&["North", "South", "East"]))
            .await
            .unwrap();

        let event = sub.recv().await.unwrap();
        assert_eq!(event.topic, "ZTL-radar-split");
        assert_eq!(event.lines, lines(&["North", "South", "East"]));
    }
}
