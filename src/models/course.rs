use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// A single non-recurring session window. Immutable for admission purposes;
/// owned by the external scheduling CRUD.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub instructor_id: i64,
    pub room_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Course {
    /// A course is active iff `start_time <= at <= end_time` (both inclusive).
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at <= self.end_time
    }

    /// Finds the course occupying a room at the given instant. The scheduling
    /// layer is expected to prevent overlapping bookings; if that assumption
    /// is violated the earliest `start_time` wins.
    pub async fn find_active_in_room(
        ex: impl PgExecutor<'_>,
        room_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE room_id = $1 AND start_time <= $2 AND end_time >= $2
            ORDER BY start_time
            LIMIT 1
            "#,
        )
        .bind(room_id)
        .bind(at)
        .fetch_optional(ex)
        .await
    }

    /// Finds the instructor's ongoing lecture, if any.
    pub async fn find_active_for_instructor(
        ex: impl PgExecutor<'_>,
        instructor_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE instructor_id = $1 AND start_time <= $2 AND end_time >= $2
            ORDER BY start_time
            LIMIT 1
            "#,
        )
        .bind(instructor_id)
        .bind(at)
        .fetch_optional(ex)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn course(start: DateTime<Utc>, end: DateTime<Utc>) -> Course {
        Course {
            id: 1,
            name: "Systems Programming".to_string(),
            instructor_id: 1,
            room_id: 1,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn active_window_is_inclusive_on_both_ends() {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 4, 10, 30, 0).unwrap();
        let c = course(start, end);

        assert!(c.is_active_at(start));
        assert!(c.is_active_at(end));
        assert!(c.is_active_at(Utc.with_ymd_and_hms(2024, 3, 4, 9, 15, 0).unwrap()));
        assert!(!c.is_active_at(start - chrono::Duration::seconds(1)));
        assert!(!c.is_active_at(end + chrono::Duration::seconds(1)));
    }
}
