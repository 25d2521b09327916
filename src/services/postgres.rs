use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::core::utilization::DateRange;
use crate::models::{AssignedBy, AssignmentStatus, SessionType, TrainerAssignment};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Assignment lifecycle states as stored in the ledger
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
pub enum LedgerStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl From<AssignmentStatus> for LedgerStatus {
    fn from(value: AssignmentStatus) -> Self {
        match value {
            AssignmentStatus::Scheduled => LedgerStatus::Scheduled,
            AssignmentStatus::Completed => LedgerStatus::Completed,
            AssignmentStatus::Cancelled => LedgerStatus::Cancelled,
            AssignmentStatus::NoShow => LedgerStatus::NoShow,
        }
    }
}

impl From<LedgerStatus> for AssignmentStatus {
    fn from(value: LedgerStatus) -> Self {
        match value {
            LedgerStatus::Scheduled => AssignmentStatus::Scheduled,
            LedgerStatus::Completed => AssignmentStatus::Completed,
            LedgerStatus::Cancelled => AssignmentStatus::Cancelled,
            LedgerStatus::NoShow => AssignmentStatus::NoShow,
        }
    }
}

/// PostgreSQL ledger for trainer assignments
///
/// This client maintains a database separate from Appwrite holding the
/// authoritative assignment history. Utilization is computed from these
/// rows, so an assignment missing here would make a trainer look idle.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        _acquire_timeout_secs: Option<u64>,
        _idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL with URL: {}", url);

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Record one assignment in the ledger
    ///
    /// Uses INSERT ... ON CONFLICT so replaying the same assignment id
    /// refreshes the mutable columns instead of failing.
    pub async fn record_assignment(
        &self,
        assignment: &TrainerAssignment,
    ) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO trainer_assignments (
                assignment_id, trainer_id, member_id, session_type,
                scheduled_date, duration_minutes, status, is_paid, amount,
                assigned_by, assignment_reason, alternative_trainers, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (assignment_id)
            DO UPDATE SET
                status = EXCLUDED.status,
                is_paid = EXCLUDED.is_paid,
                scheduled_date = EXCLUDED.scheduled_date,
                duration_minutes = EXCLUDED.duration_minutes,
                amount = EXCLUDED.amount
        "#;

        sqlx::query(query)
            .bind(&assignment.assignment_id)
            .bind(&assignment.trainer_id)
            .bind(&assignment.member_id)
            .bind(assignment.session_type.as_str())
            .bind(assignment.scheduled_date)
            .bind(assignment.duration_minutes as i32)
            .bind(LedgerStatus::from(assignment.status))
            .bind(assignment.is_paid)
            .bind(assignment.amount)
            .bind(assignment.assigned_by.as_str())
            .bind(&assignment.assignment_reason)
            .bind(&assignment.alternative_trainers)
            .bind(assignment.created_at.unwrap_or_else(chrono::Utc::now))
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded assignment {}: trainer {} for member {}",
            assignment.assignment_id,
            assignment.trainer_id,
            assignment.member_id
        );

        Ok(())
    }

    /// Fetch assignments for a set of trainers inside a booking window
    ///
    /// This is the utilization feed; the window is half-open and matches
    /// the tracker's range semantics.
    pub async fn get_assignments_for_trainers(
        &self,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> Result<Vec<TrainerAssignment>, PostgresError> {
        if trainer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = r#"
            SELECT assignment_id, trainer_id, member_id, session_type,
                   scheduled_date, duration_minutes, status, is_paid, amount,
                   assigned_by, assignment_reason, alternative_trainers, created_at
            FROM trainer_assignments
            WHERE trainer_id = ANY($1)
              AND scheduled_date >= $2
              AND scheduled_date < $3
        "#;

        let rows = sqlx::query(query)
            .bind(trainer_ids)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;

        let assignments: Result<Vec<TrainerAssignment>, PostgresError> =
            rows.iter().map(row_to_assignment).collect();
        let assignments = assignments?;

        tracing::debug!(
            "Fetched {} ledger assignments for {} trainers",
            assignments.len(),
            trainer_ids.len()
        );

        Ok(assignments)
    }

    /// Move an assignment to a new status
    ///
    /// Returns false when no row carries the id.
    pub async fn update_assignment_status(
        &self,
        assignment_id: &str,
        status: AssignmentStatus,
    ) -> Result<bool, PostgresError> {
        let query = r#"
            UPDATE trainer_assignments
            SET status = $2
            WHERE assignment_id = $1
        "#;

        let result = sqlx::query(query)
            .bind(assignment_id)
            .bind(LedgerStatus::from(status))
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Updated assignment {} to {:?} ({} rows)",
            assignment_id,
            status,
            result.rows_affected()
        );

        Ok(result.rows_affected() > 0)
    }

    /// Aggregate booking statistics for one trainer
    pub async fn get_trainer_booking_stats(
        &self,
        trainer_id: &str,
    ) -> Result<TrainerBookingStats, PostgresError> {
        let query = r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE status = 'scheduled') as scheduled,
                COUNT(*) FILTER (WHERE status = 'completed') as completed,
                COUNT(*) FILTER (WHERE status = 'cancelled') as cancelled,
                COUNT(*) FILTER (WHERE status = 'no_show') as no_show,
                COALESCE(SUM(duration_minutes) FILTER (
                    WHERE status IN ('scheduled', 'completed')
                ), 0) as booked_minutes,
                MAX(scheduled_date) as last_scheduled_at
            FROM trainer_assignments
            WHERE trainer_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(trainer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(TrainerBookingStats {
            trainer_id: trainer_id.to_string(),
            total: row.get("total"),
            scheduled: row.get("scheduled"),
            completed: row.get("completed"),
            cancelled: row.get("cancelled"),
            no_show: row.get("no_show"),
            booked_minutes: row.get("booked_minutes"),
            last_scheduled_at: row.get("last_scheduled_at"),
        })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn row_to_assignment(row: &sqlx::postgres::PgRow) -> Result<TrainerAssignment, PostgresError> {
    let session_type: String = row.get("session_type");
    let session_type = SessionType::parse(&session_type)
        .ok_or_else(|| PostgresError::InvalidInput(format!("unknown session type: {}", session_type)))?;

    let assigned_by: String = row.get("assigned_by");
    let assigned_by = AssignedBy::parse(&assigned_by)
        .ok_or_else(|| PostgresError::InvalidInput(format!("unknown assigner: {}", assigned_by)))?;

    let status: LedgerStatus = row.get("status");
    let duration_minutes: i32 = row.get("duration_minutes");

    Ok(TrainerAssignment {
        assignment_id: row.get("assignment_id"),
        trainer_id: row.get("trainer_id"),
        member_id: row.get("member_id"),
        session_type,
        scheduled_date: row.get("scheduled_date"),
        duration_minutes: duration_minutes.max(0) as u32,
        status: status.into(),
        is_paid: row.get("is_paid"),
        amount: row.get("amount"),
        assigned_by,
        assignment_reason: row.get("assignment_reason"),
        alternative_trainers: row.get("alternative_trainers"),
        created_at: row.get("created_at"),
    })
}

/// Aggregates over one trainer's ledger rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerBookingStats {
    pub trainer_id: String,
    pub total: i64,
    pub scheduled: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub no_show: i64,
    pub booked_minutes: i64,
    pub last_scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
}
