//! # Repository Module
//!
//! Database repository implementations for Radar Config Sync.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  ConfigService (radar-sync)                                            │
//! │       │                                                                 │
//! │       │  db.facilities().update_field(id, Notices, lines)              │
//! │       ▼                                                                 │
//! │  FacilityRepository                                                    │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── get_by_identifier(&self, code)                                    │
//! │  ├── list(&self)                                                       │
//! │  ├── insert(&self, facility)                                           │
//! │  └── update_field(&self, id, field, lines)                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`FacilityRepository`](facility::FacilityRepository) - Facility reads and field writes

pub mod facility;
