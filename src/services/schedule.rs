use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Course;
use crate::store::AdmissionStore;

/// Finds the course scheduled to occupy a room at the given instant.
///
/// The scheduling layer is assumed to prevent overlapping bookings per room;
/// should that assumption be violated, the store picks the course with the
/// earliest `start_time`.
pub async fn find_active_course(
    store: &dyn AdmissionStore,
    room_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Course>> {
    store.active_course_in_room(room_id, now).await
}

/// Finds the lecture an instructor is currently holding, if any.
pub async fn find_ongoing_lecture(
    store: &dyn AdmissionStore,
    instructor_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Course>> {
    store.active_course_for_instructor(instructor_id, now).await
}
