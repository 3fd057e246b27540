use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// Sentinel student id recorded when identity resolution itself fails.
/// The audit table carries no foreign key on `student_id` for this reason.
pub const UNKNOWN_STUDENT: i64 = 0;

pub const ACTION_ENTRY: &str = "Entry";

/// Append-only record of an admission attempt, written for every attempt
/// regardless of outcome. The only trace that exists when the NFC token
/// cannot be resolved to a student.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    pub id: i64,
    pub student_id: i64,
    pub course_id: Option<i64>,
    pub room_id: i64,
    pub attempt_time: DateTime<Utc>,
    pub action: String,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub nfc_id_used: String,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub student_id: i64,
    pub course_id: Option<i64>,
    pub room_id: i64,
    pub attempt_time: DateTime<Utc>,
    pub action: String,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub nfc_id_used: String,
}

impl NewAuditEntry {
    pub fn entry_failure(
        student_id: i64,
        course_id: Option<i64>,
        room_id: i64,
        attempt_time: DateTime<Utc>,
        reason: &str,
        nfc_id_used: &str,
    ) -> Self {
        Self {
            student_id,
            course_id,
            room_id,
            attempt_time,
            action: ACTION_ENTRY.to_string(),
            success: false,
            failure_reason: Some(reason.to_string()),
            nfc_id_used: nfc_id_used.to_string(),
        }
    }

    pub fn entry_success(
        student_id: i64,
        course_id: i64,
        room_id: i64,
        attempt_time: DateTime<Utc>,
        nfc_id_used: &str,
    ) -> Self {
        Self {
            student_id,
            course_id: Some(course_id),
            room_id,
            attempt_time,
            action: ACTION_ENTRY.to_string(),
            success: true,
            failure_reason: None,
            nfc_id_used: nfc_id_used.to_string(),
        }
    }
}

impl AuditLogEntry {
    pub async fn insert(
        ex: impl PgExecutor<'_>,
        entry: &NewAuditEntry,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_log
                (student_id, course_id, room_id, attempt_time, action, success, failure_reason, nfc_id_used)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.student_id)
        .bind(entry.course_id)
        .bind(entry.room_id)
        .bind(entry.attempt_time)
        .bind(&entry.action)
        .bind(entry.success)
        .bind(&entry.failure_reason)
        .bind(&entry.nfc_id_used)
        .execute(ex)
        .await?;

        Ok(())
    }
}
