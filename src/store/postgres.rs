use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::{
    audit_log::AuditLogEntry, AdmissionRequest, AdmissionRequestView, AttendanceRecord, Course,
    NewAuditEntry, RequestStatus, Student,
};
use crate::store::{AdmissionStore, NewAdmission, TransitionOutcome};

/// Production adapter over Postgres. Single-statement operations run on the
/// pool; `admit` composes the model queries inside one transaction so a crash
/// or timeout leaves either all three rows or none.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdmissionStore for PgStore {
    async fn student_by_card_id(&self, card_id: &str) -> Result<Option<Student>> {
        Ok(Student::find_by_card_id(&self.pool, card_id).await?)
    }

    async fn student_by_phone_id(&self, phone_id: &str) -> Result<Option<Student>> {
        Ok(Student::find_by_phone_id(&self.pool, phone_id).await?)
    }

    async fn active_course_in_room(
        &self,
        room_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Course>> {
        Ok(Course::find_active_in_room(&self.pool, room_id, at).await?)
    }

    async fn active_course_for_instructor(
        &self,
        instructor_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Course>> {
        Ok(Course::find_active_for_instructor(&self.pool, instructor_id, at).await?)
    }

    async fn open_attendance(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<AttendanceRecord>> {
        Ok(AttendanceRecord::find_open(&self.pool, student_id, course_id).await?)
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<()> {
        Ok(AuditLogEntry::insert(&self.pool, &entry).await?)
    }

    async fn admit(&self, admission: NewAdmission) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let attendance = AttendanceRecord::insert_open(
            &mut *tx,
            admission.student_id,
            admission.course_id,
            admission.room_id,
            admission.request_time,
        )
        .await;

        if let Err(err) = attendance {
            // The partial unique index on open intervals turns a lost
            // check-then-create race into a clean business failure.
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_unique_violation() {
                    return Err(AppError::AlreadyCheckedIn);
                }
            }
            return Err(err.into());
        }

        let request_id = AdmissionRequest::insert_pending(
            &mut *tx,
            admission.student_id,
            admission.instructor_id,
            admission.room_id,
            admission.course_id,
            admission.request_time,
            admission.reason.as_deref(),
        )
        .await?;

        let audit = NewAuditEntry::entry_success(
            admission.student_id,
            admission.course_id,
            admission.room_id,
            admission.request_time,
            &admission.nfc_id_used,
        );
        AuditLogEntry::insert(&mut *tx, &audit).await?;

        tx.commit().await?;

        Ok(request_id)
    }

    async fn transition_request(
        &self,
        request_id: i64,
        new_status: RequestStatus,
        response_time: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let changed = AdmissionRequest::transition_from_pending(
            &self.pool,
            request_id,
            new_status,
            response_time,
        )
        .await?;

        if changed > 0 {
            return Ok(TransitionOutcome::Updated);
        }

        // Zero rows: distinguish a missing request from a settled one.
        match AdmissionRequest::find_by_id(&self.pool, request_id).await? {
            Some(_) => Ok(TransitionOutcome::NotPending),
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    async fn pending_request_for(
        &self,
        instructor_id: i64,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<AdmissionRequest>> {
        Ok(
            AdmissionRequest::find_pending_for(&self.pool, instructor_id, student_id, course_id)
                .await?,
        )
    }

    async fn expire_pending_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        Ok(AdmissionRequest::expire_pending_before(&self.pool, cutoff).await?)
    }

    async fn view_by_id(&self, request_id: i64) -> Result<Option<AdmissionRequestView>> {
        Ok(AdmissionRequest::view_by_id(&self.pool, request_id).await?)
    }

    async fn views_by_instructor(
        &self,
        instructor_id: i64,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AdmissionRequestView>> {
        Ok(AdmissionRequest::views_by_instructor(&self.pool, instructor_id, status).await?)
    }

    async fn views_by_student(&self, student_id: i64) -> Result<Vec<AdmissionRequestView>> {
        Ok(AdmissionRequest::views_by_student(&self.pool, student_id).await?)
    }

    async fn pending_views_by_room(&self, room_id: i64) -> Result<Vec<AdmissionRequestView>> {
        Ok(AdmissionRequest::pending_views_by_room(&self.pool, room_id).await?)
    }

    async fn pending_views_by_course(&self, course_id: i64) -> Result<Vec<AdmissionRequestView>> {
        Ok(AdmissionRequest::pending_views_by_course(&self.pool, course_id).await?)
    }
}
