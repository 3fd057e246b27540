use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// Ledger entry for a student's physical presence interval in a course.
/// `exit_time = NULL` marks the interval as open; a partial unique index on
/// `(student_id, course_id) WHERE exit_time IS NULL` guarantees at most one
/// open interval per pair, even under concurrent taps.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub room_id: i64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    /// Opens a new presence interval. Fails with a unique violation if an
    /// open interval already exists for `(student_id, course_id)`.
    pub async fn insert_open(
        ex: impl PgExecutor<'_>,
        student_id: i64,
        course_id: i64,
        room_id: i64,
        entry_time: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO attendance_records (student_id, course_id, room_id, entry_time)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(room_id)
        .bind(entry_time)
        .fetch_one(ex)
        .await
    }

    pub async fn find_open(
        ex: impl PgExecutor<'_>,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT * FROM attendance_records
            WHERE student_id = $1 AND course_id = $2 AND exit_time IS NULL
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(ex)
        .await
    }
}
