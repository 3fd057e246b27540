use std::sync::Arc;

use anyhow::anyhow;
use chrono::Duration;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::{
    audit_log::{NewAuditEntry, UNKNOWN_STUDENT},
    AdmissionRequestView, RequestStatus,
};
use crate::services::{identity, schedule};
use crate::store::{AdmissionStore, NewAdmission, TransitionOutcome};

/// The admission workflow: request creation, the Pending → terminal state
/// machine, attendance ledger writes, audit logging, expiry, and the
/// dashboard read views.
///
/// Stateless apart from its store and clock handles; every call is an
/// independent request over the shared transactional store.
pub struct AdmissionService {
    store: Arc<dyn AdmissionStore>,
    clock: Arc<dyn Clock>,
}

impl AdmissionService {
    pub fn new(store: Arc<dyn AdmissionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Handles an NFC tap at a room.
    ///
    /// Resolves the token, locates the active course, checks the ledger for
    /// an already-open interval, then atomically writes the open attendance
    /// record, the Pending request and the success audit entry. Every failure
    /// path writes its own audit entry before surfacing the error.
    pub async fn create_request(
        &self,
        nfc_id: &str,
        room_id: i64,
        reason: Option<String>,
    ) -> Result<AdmissionRequestView> {
        let now = self.clock.now();

        let Some(student) = identity::resolve(self.store.as_ref(), nfc_id).await? else {
            let failure = AppError::StudentNotFound;
            self.store
                .record_audit(NewAuditEntry::entry_failure(
                    UNKNOWN_STUDENT,
                    None,
                    room_id,
                    now,
                    &failure.to_string(),
                    nfc_id,
                ))
                .await?;
            return Err(failure);
        };

        let Some(course) = schedule::find_active_course(self.store.as_ref(), room_id, now).await?
        else {
            let failure = AppError::NoActiveCourse;
            self.store
                .record_audit(NewAuditEntry::entry_failure(
                    student.id,
                    None,
                    room_id,
                    now,
                    &failure.to_string(),
                    nfc_id,
                ))
                .await?;
            return Err(failure);
        };

        // Friendly-path check; the storage constraint is the real guarantee.
        if self
            .store
            .open_attendance(student.id, course.id)
            .await?
            .is_some()
        {
            return self
                .fail_already_checked_in(student.id, course.id, room_id, now, nfc_id)
                .await;
        }

        let admitted = self
            .store
            .admit(NewAdmission {
                student_id: student.id,
                instructor_id: course.instructor_id,
                room_id,
                course_id: course.id,
                request_time: now,
                reason,
                nfc_id_used: nfc_id.to_string(),
            })
            .await;

        let request_id = match admitted {
            Ok(request_id) => request_id,
            // Lost a concurrent check-then-create race: the other tap holds
            // the open interval. Audit and report like the pre-check path.
            Err(AppError::AlreadyCheckedIn) => {
                return self
                    .fail_already_checked_in(student.id, course.id, room_id, now, nfc_id)
                    .await;
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            request_id,
            student_id = student.id,
            course_id = course.id,
            room_id,
            "admission request created"
        );

        self.view_of(request_id).await
    }

    async fn fail_already_checked_in(
        &self,
        student_id: i64,
        course_id: i64,
        room_id: i64,
        now: chrono::DateTime<chrono::Utc>,
        nfc_id: &str,
    ) -> Result<AdmissionRequestView> {
        let failure = AppError::AlreadyCheckedIn;
        self.store
            .record_audit(NewAuditEntry::entry_failure(
                student_id,
                Some(course_id),
                room_id,
                now,
                &failure.to_string(),
                nfc_id,
            ))
            .await?;
        Err(failure)
    }

    /// Settles a Pending request. `Approved` and `Denied` are the only legal
    /// targets; terminal requests are never touched, so `response_time` is
    /// written exactly once. Approval does not close the attendance record:
    /// admission and physical presence are tracked independently.
    pub async fn update_request_status(
        &self,
        request_id: i64,
        new_status: RequestStatus,
    ) -> Result<AdmissionRequestView> {
        if !matches!(new_status, RequestStatus::Approved | RequestStatus::Denied) {
            return Err(AppError::Validation(
                "Status must be either 'Approved' or 'Denied'".to_string(),
            ));
        }

        let now = self.clock.now();
        match self
            .store
            .transition_request(request_id, new_status, now)
            .await?
        {
            TransitionOutcome::Updated => {
                tracing::info!(request_id, status = %new_status, "admission request settled");
                self.view_of(request_id).await
            }
            TransitionOutcome::NotFound => Err(AppError::RequestNotFound),
            TransitionOutcome::NotPending => Err(AppError::InvalidTransition),
        }
    }

    /// Instructor-side convenience: settles the most recent Pending request
    /// from a student in the instructor's ongoing lecture.
    pub async fn approve_student_entry(
        &self,
        instructor_id: i64,
        student_id: i64,
        is_approved: bool,
    ) -> Result<AdmissionRequestView> {
        let now = self.clock.now();

        let Some(course) =
            schedule::find_ongoing_lecture(self.store.as_ref(), instructor_id, now).await?
        else {
            return Err(AppError::RequestNotFound);
        };

        let Some(request) = self
            .store
            .pending_request_for(instructor_id, student_id, course.id)
            .await?
        else {
            return Err(AppError::RequestNotFound);
        };

        let new_status = if is_approved {
            RequestStatus::Approved
        } else {
            RequestStatus::Denied
        };

        self.update_request_status(request.id, new_status).await
    }

    /// Moves Pending requests older than `expiration_hours` to Expired.
    /// Idempotent; never touches settled requests.
    pub async fn expire_old_requests(&self, expiration_hours: i64) -> Result<u64> {
        // The horizon is caller-supplied; the checked arithmetic keeps an
        // absurd value a validation error instead of a panic.
        let window = Duration::try_hours(expiration_hours).ok_or_else(|| {
            AppError::Validation("hours is out of range".to_string())
        })?;
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(window)
            .ok_or_else(|| AppError::Validation("hours is out of range".to_string()))?;
        let expired = self.store.expire_pending_before(cutoff).await?;
        if expired > 0 {
            tracing::info!(expired, expiration_hours, "stale admission requests expired");
        }
        Ok(expired)
    }

    pub async fn request_by_id(&self, request_id: i64) -> Result<AdmissionRequestView> {
        self.store
            .view_by_id(request_id)
            .await?
            .ok_or(AppError::RequestNotFound)
    }

    pub async fn requests_by_instructor(
        &self,
        instructor_id: i64,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AdmissionRequestView>> {
        self.store.views_by_instructor(instructor_id, status).await
    }

    pub async fn requests_by_student(&self, student_id: i64) -> Result<Vec<AdmissionRequestView>> {
        self.store.views_by_student(student_id).await
    }

    pub async fn pending_requests_by_room(
        &self,
        room_id: i64,
    ) -> Result<Vec<AdmissionRequestView>> {
        self.store.pending_views_by_room(room_id).await
    }

    /// Pending requests for the instructor's ongoing lecture; empty when the
    /// instructor has no active course right now.
    pub async fn pending_for_ongoing_lecture(
        &self,
        instructor_id: i64,
    ) -> Result<Vec<AdmissionRequestView>> {
        let now = self.clock.now();
        match schedule::find_ongoing_lecture(self.store.as_ref(), instructor_id, now).await? {
            Some(course) => self.store.pending_views_by_course(course.id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn view_of(&self, request_id: i64) -> Result<AdmissionRequestView> {
        self.store
            .view_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow!("failed to retrieve request {request_id}")))
    }
}
