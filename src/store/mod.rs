// Storage port for the admission subsystem. The service layer talks to this
// trait only; `PgStore` is the production adapter, `MemoryStore` backs the
// integration tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    AdmissionRequest, AdmissionRequestView, AttendanceRecord, Course, NewAuditEntry,
    RequestStatus, Student,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of a guarded status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Updated,
    NotFound,
    /// The request exists but is no longer Pending; the caller lost the race
    /// (or acted on an already-settled request).
    NotPending,
}

/// Everything the admission workflow needs from the relational store.
///
/// `admit` is the one multi-write operation: the open attendance record, the
/// Pending request and the success audit entry must persist atomically, and a
/// concurrent open interval for the same `(student, course)` must surface as
/// [`crate::error::AppError::AlreadyCheckedIn`] rather than a second open row.
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    async fn student_by_card_id(&self, card_id: &str) -> Result<Option<Student>>;

    async fn student_by_phone_id(&self, phone_id: &str) -> Result<Option<Student>>;

    async fn active_course_in_room(&self, room_id: i64, at: DateTime<Utc>)
        -> Result<Option<Course>>;

    async fn active_course_for_instructor(
        &self,
        instructor_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Course>>;

    async fn open_attendance(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<AttendanceRecord>>;

    /// Standalone audit write for failure paths (its own transaction).
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<()>;

    /// Atomic triple write for a successful admission. Returns the id of the
    /// created request.
    async fn admit(&self, admission: NewAdmission) -> Result<i64>;

    async fn transition_request(
        &self,
        request_id: i64,
        new_status: RequestStatus,
        response_time: DateTime<Utc>,
    ) -> Result<TransitionOutcome>;

    async fn pending_request_for(
        &self,
        instructor_id: i64,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<AdmissionRequest>>;

    /// Moves stale Pending requests to Expired, returning the count changed.
    async fn expire_pending_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn view_by_id(&self, request_id: i64) -> Result<Option<AdmissionRequestView>>;

    async fn views_by_instructor(
        &self,
        instructor_id: i64,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AdmissionRequestView>>;

    async fn views_by_student(&self, student_id: i64) -> Result<Vec<AdmissionRequestView>>;

    async fn pending_views_by_room(&self, room_id: i64) -> Result<Vec<AdmissionRequestView>>;

    async fn pending_views_by_course(&self, course_id: i64) -> Result<Vec<AdmissionRequestView>>;
}

/// Inputs for the atomic admission write.
#[derive(Debug, Clone)]
pub struct NewAdmission {
    pub student_id: i64,
    pub instructor_id: i64,
    pub room_id: i64,
    pub course_id: i64,
    pub request_time: DateTime<Utc>,
    pub reason: Option<String>,
    pub nfc_id_used: String,
}
