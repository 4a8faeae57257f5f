//! # radar-sync: Save-then-Notify Engine for Radar Config Sync
//!
//! This crate commits facility configuration edits to the store and then
//! announces each committed list to the subscribers of its topic.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Config Sync Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 ConfigService (Main Orchestrator)                │  │
//! │  │                                                                  │  │
//! │  │  validate ──▶ lock (facility, field) ──▶ commit ──▶ publish     │  │
//! │  └───────┬──────────────────────┬──────────────────────┬────────────┘  │
//! │          │                      │                      │               │
//! │          ▼                      ▼                      ▼               │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  ConfigStore   │  │    KeyLocks    │  │    ChangeNotifier      │    │
//! │  │                │  │                │  │                        │    │
//! │  │ SQLite (prod)  │  │ One mutex per  │  │ "{ident}-radar-split"  │    │
//! │  │ Memory (tests) │  │ facility+field │  │ "{ident}-notam"        │    │
//! │  └────────────────┘  └────────────────┘  └───────────┬────────────┘    │
//! │                                                      │                 │
//! │                                     ┌────────────────┴──────┐          │
//! │                                     ▼                       ▼          │
//! │                             ┌──────────────┐       ┌──────────────┐    │
//! │                             │   LocalBus   │       │    Redis     │    │
//! │                             │  (broadcast) │       │  PUBLISH     │    │
//! │                             └──────┬───────┘       └──────────────┘    │
//! │                                    ▼                                   │
//! │                             ┌──────────────┐                           │
//! │                             │  HubServer   │ ◀── HTTP API + /ws        │
//! │                             └──────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`service`] - `ConfigService`, the commit-then-publish orchestrator
//! - [`store`] - Durable store and directory seams (SQLite, memory)
//! - [`notifier`] - Topic derivation and transport hand-off
//! - [`transport`] - In-process bus and Redis transports
//! - [`locks`] - Per-(facility, field) write serialization
//! - [`api`] - JSON HTTP routes for editors
//! - [`hub`] - HTTP/WebSocket server and subscriber sessions
//! - [`protocol`] - WebSocket message types
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use radar_sync::{ConfigService, LocalBus, SqliteConfigStore};
//!
//! let store = Arc::new(SqliteConfigStore::new(db));
//! let bus = LocalBus::new(1024);
//! let service = ConfigService::new(store.clone(), store, Arc::new(bus.clone()), limits);
//!
//! let outcome = service.update_split(&facility_id, lines).await?;
//! if let Some(err) = outcome.publish_error() {
//!     eprintln!("Saved, but not announced: {}", err);
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod hub;
pub mod locks;
pub mod notifier;
pub mod protocol;
pub mod service;
pub mod store;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{DatabaseSettings, HubSettings, SyncConfig, TransportSettings};
pub use error::{SyncError, SyncResult, TransportError};
pub use hub::{HubHandle, HubServer};
pub use notifier::ChangeNotifier;
pub use protocol::{ClientMessage, HubMessage};
pub use service::{ConfigService, Snapshot, UpdateOutcome};
pub use store::{ConfigStore, FacilityDirectory, MemoryConfigStore, SqliteConfigStore};
pub use transport::{LocalBus, RedisTransport, Subscription, Transport};
