//! # Config Store
//!
//! Durable, per-facility storage of the list fields.
//!
//! ## Seams
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Store Seams                                    │
//! │                                                                         │
//! │  ConfigService                                                         │
//! │     │                                                                   │
//! │     ├── ConfigStore        get / update_field (write path)             │
//! │     └── FacilityDirectory  list / find_by_identifier (read path)       │
//! │              │                                                          │
//! │      ┌───────┴──────────────────┐                                       │
//! │      ▼                          ▼                                       │
//! │  SqliteConfigStore          MemoryConfigStore                          │
//! │  (radar-db, durable)        (DashMap, tests / embedded)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A store never notifies. Publishing is the service's job and only happens
//! after `update_field` has returned the committed record.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use radar_core::{ConfigField, Facility};
use radar_db::Database;
use tracing::debug;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Traits
// =============================================================================

/// Keyed storage of facility list fields.
///
/// ## Guarantees
/// - `update_field` is a full replace of one field
/// - Concurrent writes to the same (facility, field) leave one of the written
///   values in place, never a mix
/// - Writes to one field never touch the other
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Returns the current record.
    async fn get(&self, facility_id: &str) -> SyncResult<Facility>;

    /// Replaces one field and returns the record as committed.
    async fn update_field(
        &self,
        facility_id: &str,
        field: ConfigField,
        lines: &[String],
    ) -> SyncResult<Facility>;
}

/// Enumeration of provisioned facilities.
#[async_trait]
pub trait FacilityDirectory: Send + Sync {
    /// Point-in-time snapshot of all facilities.
    async fn list(&self) -> SyncResult<Vec<Facility>>;

    /// Looks a facility up by its identifier code (e.g. "ZTL").
    async fn find_by_identifier(&self, facility_identifier: &str) -> SyncResult<Option<Facility>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|f| f.facility_identifier == facility_identifier))
    }
}

// =============================================================================
// SQLite Store
// =============================================================================

/// Store backed by the radar-db SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteConfigStore {
    db: Database,
}

impl SqliteConfigStore {
    /// Wraps an open database.
    pub fn new(db: Database) -> Self {
        SqliteConfigStore { db }
    }
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn get(&self, facility_id: &str) -> SyncResult<Facility> {
        self.db
            .facilities()
            .get_by_id(facility_id)
            .await?
            .ok_or_else(|| SyncError::not_found(facility_id))
    }

    async fn update_field(
        &self,
        facility_id: &str,
        field: ConfigField,
        lines: &[String],
    ) -> SyncResult<Facility> {
        Ok(self
            .db
            .facilities()
            .update_field(facility_id, field, lines)
            .await?)
    }
}

#[async_trait]
impl FacilityDirectory for SqliteConfigStore {
    async fn list(&self) -> SyncResult<Vec<Facility>> {
        Ok(self.db.facilities().list().await?)
    }

    async fn find_by_identifier(&self, facility_identifier: &str) -> SyncResult<Option<Facility>> {
        Ok(self
            .db
            .facilities()
            .get_by_identifier(facility_identifier)
            .await?)
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Concurrent in-memory store keyed by facility ID.
///
/// Each update holds the facility's map entry for the duration of the
/// replace, which gives the same last-writer-wins behaviour as the SQLite
/// single-statement write.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    facilities: DashMap<String, Facility>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provisions (or replaces) a facility.
    pub fn insert(&self, facility: Facility) {
        self.facilities.insert(facility.id.clone(), facility);
    }
}

impl FromIterator<Facility> for MemoryConfigStore {
    fn from_iter<I: IntoIterator<Item = Facility>>(iter: I) -> Self {
        let store = MemoryConfigStore::new();
        for facility in iter {
            store.insert(facility);
        }
        store
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, facility_id: &str) -> SyncResult<Facility> {
        self.facilities
            .get(facility_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SyncError::not_found(facility_id))
    }

    async fn update_field(
        &self,
        facility_id: &str,
        field: ConfigField,
        lines: &[String],
    ) -> SyncResult<Facility> {
        let mut entry = self
            .facilities
            .get_mut(facility_id)
            .ok_or_else(|| SyncError::not_found(facility_id))?;

        entry.set_field(field, lines.to_vec());
        entry.updated_at = Utc::now();

        debug!(facility_id = %facility_id, field = %field, "Updated in-memory facility");
        Ok(entry.value().clone())
    }
}

#[async_trait]
impl FacilityDirectory for MemoryConfigStore {
    async fn list(&self) -> SyncResult<Vec<Facility>> {
        let mut all: Vec<Facility> = self
            .facilities
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.facility_identifier.cmp(&b.facility_identifier));
        Ok(all)
    }
}
