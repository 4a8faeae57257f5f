//! # Facility Repository
//!
//! Database operations for radar facilities.
//!
//! ## Key Operations
//! - Read one facility (by id or identifier code) or list all of them
//! - Replace one list field as a single statement
//! - Insert (provisioning tools and tests only)
//!
//! ## List Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How List Fields Are Stored                           │
//! │                                                                         │
//! │  Vec<String>                        facilities.split_assignments        │
//! │  ["North", "", "East"]  ──serde──►  '["North","","East"]'  (TEXT)       │
//! │                                                                         │
//! │  • Order is the array order - nothing to sort, nothing to lose          │
//! │  • Empty entries are ordinary array elements                            │
//! │  • One column per field, so writing one never touches the other         │
//! │                                                                         │
//! │  Field write = one statement:                                           │
//! │     UPDATE facilities SET notices = ?, updated_at = ?                   │
//! │     WHERE id = ? RETURNING ...                                          │
//! │  The returned row is exactly what was committed.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use radar_core::{ConfigField, Facility};

const SELECT_COLUMNS: &str =
    "id, facility_identifier, split_assignments, notices, created_at, updated_at";

const UPDATE_SPLIT_SQL: &str = r#"
    UPDATE facilities
    SET split_assignments = ?1, updated_at = ?2
    WHERE id = ?3
    RETURNING id, facility_identifier, split_assignments, notices, created_at, updated_at
"#;

const UPDATE_NOTICES_SQL: &str = r#"
    UPDATE facilities
    SET notices = ?1, updated_at = ?2
    WHERE id = ?3
    RETURNING id, facility_identifier, split_assignments, notices, created_at, updated_at
"#;

/// Raw row shape of the `facilities` table.
#[derive(Debug, sqlx::FromRow)]
struct FacilityRow {
    id: String,
    facility_identifier: String,
    split_assignments: String,
    notices: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FacilityRow> for Facility {
    type Error = DbError;

    fn try_from(row: FacilityRow) -> DbResult<Self> {
        let split_assignments = decode_list(&row.id, &row.split_assignments)?;
        let notices = decode_list(&row.id, &row.notices)?;

        Ok(Facility {
            id: row.id,
            facility_identifier: row.facility_identifier,
            split_assignments,
            notices,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_list(id: &str, raw: &str) -> DbResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| DbError::CorruptRecord {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

fn encode_list(lines: &[String]) -> DbResult<String> {
    serde_json::to_string(lines).map_err(|e| DbError::Internal(e.to_string()))
}

/// Repository for facility database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = FacilityRepository::new(pool);
///
/// let all = repo.list().await?;
/// let updated = repo
///     .update_field(&id, ConfigField::Notices, &["TFR in effect".into()])
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct FacilityRepository {
    pool: SqlitePool,
}

impl FacilityRepository {
    /// Creates a new FacilityRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FacilityRepository { pool }
    }

    /// Gets a facility by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Facility))` - Facility found
    /// * `Ok(None)` - Facility not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Facility>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM facilities WHERE id = ?1");

        let row = sqlx::query_as::<_, FacilityRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Facility::try_from).transpose()
    }

    /// Gets a facility by its identifier code (e.g. "ZTL").
    pub async fn get_by_identifier(&self, facility_identifier: &str) -> DbResult<Option<Facility>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM facilities WHERE facility_identifier = ?1");

        let row = sqlx::query_as::<_, FacilityRow>(&sql)
            .bind(facility_identifier)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Facility::try_from).transpose()
    }

    /// Lists all facilities ordered by identifier code.
    pub async fn list(&self) -> DbResult<Vec<Facility>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM facilities ORDER BY facility_identifier");

        let rows = sqlx::query_as::<_, FacilityRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed facilities");
        rows.into_iter().map(Facility::try_from).collect()
    }

    /// Inserts a new facility.
    ///
    /// ## Returns
    /// * `Ok(Facility)` - Inserted facility
    /// * `Err(DbError::UniqueViolation)` - Identifier or ID already exists
    pub async fn insert(&self, facility: &Facility) -> DbResult<Facility> {
        debug!(facility_identifier = %facility.facility_identifier, "Inserting facility");

        let split = encode_list(&facility.split_assignments)?;
        let notices = encode_list(&facility.notices)?;

        sqlx::query(
            r#"
            INSERT INTO facilities (
                id, facility_identifier, split_assignments, notices, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&facility.id)
        .bind(&facility.facility_identifier)
        .bind(split)
        .bind(notices)
        .bind(facility.created_at)
        .bind(facility.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, facility.facility_identifier.clone())
            }
            other => other,
        })?;

        Ok(facility.clone())
    }

    /// Replaces one list field of a facility.
    ///
    /// ## Guarantees
    /// - Full replace: the stored list becomes exactly `lines`
    /// - Single statement: concurrent writers to the same row are serialized
    ///   by SQLite, the later commit wins
    /// - The other list field is not part of the statement
    ///
    /// ## Returns
    /// * `Ok(Facility)` - The record as committed
    /// * `Err(DbError::NotFound)` - No facility with this ID
    pub async fn update_field(
        &self,
        id: &str,
        field: ConfigField,
        lines: &[String],
    ) -> DbResult<Facility> {
        debug!(id = %id, field = %field, entries = lines.len(), "Updating facility field");

        let sql = match field {
            ConfigField::SplitAssignments => UPDATE_SPLIT_SQL,
            ConfigField::Notices => UPDATE_NOTICES_SQL,
        };

        let row = sqlx::query_as::<_, FacilityRow>(sql)
            .bind(encode_list(lines)?)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Facility::try_from(row),
            None => Err(DbError::not_found("Facility", id)),
        }
    }

    /// Counts facilities (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM facilities")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
