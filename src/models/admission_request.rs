use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// Lifecycle of an admission request. `Pending` is the only non-terminal
/// state; the guarded transition queries below enforce that at the storage
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
    Expired,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Denied => "Denied",
            RequestStatus::Expired => "Expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Approved" => Ok(RequestStatus::Approved),
            "Denied" => Ok(RequestStatus::Denied),
            "Expired" => Ok(RequestStatus::Expired),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// Workflow object tracking a single entry attempt's approval lifecycle.
/// Mutated only by a status transition; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdmissionRequest {
    pub id: i64,
    pub student_id: i64,
    pub instructor_id: i64,
    pub room_id: i64,
    pub course_id: Option<i64>,
    pub request_time: DateTime<Utc>,
    pub status: String,
    pub reason: Option<String>,
    pub response_time: Option<DateTime<Utc>>,
}

/// Denormalized read view joining student/instructor/room/building/course
/// display fields, the shape every dashboard query returns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequestView {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub instructor_id: i64,
    pub instructor_name: String,
    pub room_id: i64,
    pub room_number: String,
    pub building_name: String,
    pub course_id: Option<i64>,
    pub course_name: Option<String>,
    pub request_time: DateTime<Utc>,
    pub status: String,
    pub reason: Option<String>,
    pub response_time: Option<DateTime<Utc>>,
}

const VIEW_SELECT: &str = r#"
    SELECT r.id,
           r.student_id, s.name AS student_name, s.email AS student_email,
           r.instructor_id, i.name AS instructor_name,
           r.room_id, rm.room_number, b.name AS building_name,
           r.course_id, c.name AS course_name,
           r.request_time, r.status, r.reason, r.response_time
    FROM admission_requests r
    JOIN students s ON s.id = r.student_id
    JOIN instructors i ON i.id = r.instructor_id
    JOIN rooms rm ON rm.id = r.room_id
    JOIN buildings b ON b.id = rm.building_id
    LEFT JOIN courses c ON c.id = r.course_id
"#;

impl AdmissionRequest {
    /// Inserts a new Pending request, returning its id.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_pending(
        ex: impl PgExecutor<'_>,
        student_id: i64,
        instructor_id: i64,
        room_id: i64,
        course_id: i64,
        request_time: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO admission_requests
                (student_id, instructor_id, room_id, course_id, request_time, status, reason)
            VALUES ($1, $2, $3, $4, $5, 'Pending', $6)
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(instructor_id)
        .bind(room_id)
        .bind(course_id)
        .bind(request_time)
        .bind(reason)
        .fetch_one(ex)
        .await
    }

    pub async fn find_by_id(
        ex: impl PgExecutor<'_>,
        request_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdmissionRequest>("SELECT * FROM admission_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(ex)
            .await
    }

    /// Guarded transition out of Pending. Returns the number of rows changed:
    /// 0 means the request does not exist or is no longer Pending, so a
    /// concurrent approval and an expiry sweep can never both win.
    pub async fn transition_from_pending(
        ex: impl PgExecutor<'_>,
        request_id: i64,
        new_status: RequestStatus,
        response_time: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE admission_requests
            SET status = $2, response_time = $3
            WHERE id = $1 AND status = 'Pending'
            "#,
        )
        .bind(request_id)
        .bind(new_status.as_str())
        .bind(response_time)
        .execute(ex)
        .await?;

        Ok(result.rows_affected())
    }

    /// Most recent Pending request an instructor can act on for a given
    /// student in a given course.
    pub async fn find_pending_for(
        ex: impl PgExecutor<'_>,
        instructor_id: i64,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdmissionRequest>(
            r#"
            SELECT * FROM admission_requests
            WHERE instructor_id = $1 AND student_id = $2 AND course_id = $3
              AND status = 'Pending'
            ORDER BY request_time DESC
            LIMIT 1
            "#,
        )
        .bind(instructor_id)
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(ex)
        .await
    }

    /// Sweeps stale Pending requests to Expired. `response_time` is left
    /// untouched: expiry is not a response. Returns the count changed.
    pub async fn expire_pending_before(
        ex: impl PgExecutor<'_>,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE admission_requests
            SET status = 'Expired'
            WHERE status = 'Pending' AND request_time < $1
            "#,
        )
        .bind(cutoff)
        .execute(ex)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn view_by_id(
        ex: impl PgExecutor<'_>,
        request_id: i64,
    ) -> Result<Option<AdmissionRequestView>, sqlx::Error> {
        let sql = format!("{VIEW_SELECT} WHERE r.id = $1");
        sqlx::query_as::<_, AdmissionRequestView>(&sql)
            .bind(request_id)
            .fetch_optional(ex)
            .await
    }

    pub async fn views_by_instructor(
        ex: impl PgExecutor<'_>,
        instructor_id: i64,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AdmissionRequestView>, sqlx::Error> {
        match status {
            Some(status) => {
                let sql = format!(
                    "{VIEW_SELECT} WHERE r.instructor_id = $1 AND r.status = $2 \
                     ORDER BY r.request_time DESC"
                );
                sqlx::query_as::<_, AdmissionRequestView>(&sql)
                    .bind(instructor_id)
                    .bind(status.as_str())
                    .fetch_all(ex)
                    .await
            }
            None => {
                let sql = format!(
                    "{VIEW_SELECT} WHERE r.instructor_id = $1 ORDER BY r.request_time DESC"
                );
                sqlx::query_as::<_, AdmissionRequestView>(&sql)
                    .bind(instructor_id)
                    .fetch_all(ex)
                    .await
            }
        }
    }

    pub async fn views_by_student(
        ex: impl PgExecutor<'_>,
        student_id: i64,
    ) -> Result<Vec<AdmissionRequestView>, sqlx::Error> {
        let sql = format!("{VIEW_SELECT} WHERE r.student_id = $1 ORDER BY r.request_time DESC");
        sqlx::query_as::<_, AdmissionRequestView>(&sql)
            .bind(student_id)
            .fetch_all(ex)
            .await
    }

    pub async fn pending_views_by_room(
        ex: impl PgExecutor<'_>,
        room_id: i64,
    ) -> Result<Vec<AdmissionRequestView>, sqlx::Error> {
        let sql = format!(
            "{VIEW_SELECT} WHERE r.room_id = $1 AND r.status = 'Pending' \
             ORDER BY r.request_time DESC"
        );
        sqlx::query_as::<_, AdmissionRequestView>(&sql)
            .bind(room_id)
            .fetch_all(ex)
            .await
    }

    pub async fn pending_views_by_course(
        ex: impl PgExecutor<'_>,
        course_id: i64,
    ) -> Result<Vec<AdmissionRequestView>, sqlx::Error> {
        let sql = format!(
            "{VIEW_SELECT} WHERE r.course_id = $1 AND r.status = 'Pending' \
             ORDER BY r.request_time DESC"
        );
        sqlx::query_as::<_, AdmissionRequestView>(&sql)
            .bind(course_id)
            .fetch_all(ex)
            .await
    }
}
