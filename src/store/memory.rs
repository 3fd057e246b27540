use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    AdmissionRequest, AdmissionRequestView, AttendanceRecord, AuditLogEntry, Building, Course,
    Instructor, NewAuditEntry, RequestStatus, Room, Student,
};
use crate::store::{AdmissionStore, NewAdmission, TransitionOutcome};

#[derive(Debug, Default)]
struct Tables {
    students: Vec<Student>,
    instructors: Vec<Instructor>,
    buildings: Vec<Building>,
    rooms: Vec<Room>,
    courses: Vec<Course>,
    attendance: Vec<AttendanceRecord>,
    requests: Vec<AdmissionRequest>,
    audit: Vec<AuditLogEntry>,
    next_id: i64,
}

impl Tables {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn open_attendance(&self, student_id: i64, course_id: i64) -> Option<&AttendanceRecord> {
        self.attendance.iter().find(|a| {
            a.student_id == student_id && a.course_id == course_id && a.exit_time.is_none()
        })
    }

    fn push_audit(&mut self, entry: NewAuditEntry) {
        let id = self.alloc_id();
        self.audit.push(AuditLogEntry {
            id,
            student_id: entry.student_id,
            course_id: entry.course_id,
            room_id: entry.room_id,
            attempt_time: entry.attempt_time,
            action: entry.action,
            success: entry.success,
            failure_reason: entry.failure_reason,
            nfc_id_used: entry.nfc_id_used,
        });
    }

    fn view_of(&self, r: &AdmissionRequest) -> Result<AdmissionRequestView> {
        let student = self
            .students
            .iter()
            .find(|s| s.id == r.student_id)
            .ok_or_else(|| AppError::Internal(anyhow!("student {} not seeded", r.student_id)))?;
        let instructor = self
            .instructors
            .iter()
            .find(|i| i.id == r.instructor_id)
            .ok_or_else(|| {
                AppError::Internal(anyhow!("instructor {} not seeded", r.instructor_id))
            })?;
        let room = self
            .rooms
            .iter()
            .find(|rm| rm.id == r.room_id)
            .ok_or_else(|| AppError::Internal(anyhow!("room {} not seeded", r.room_id)))?;
        let building = self
            .buildings
            .iter()
            .find(|b| b.id == room.building_id)
            .ok_or_else(|| AppError::Internal(anyhow!("building {} not seeded", room.building_id)))?;
        let course = r
            .course_id
            .and_then(|course_id| self.courses.iter().find(|c| c.id == course_id));

        Ok(AdmissionRequestView {
            id: r.id,
            student_id: r.student_id,
            student_name: student.name.clone(),
            student_email: student.email.clone(),
            instructor_id: r.instructor_id,
            instructor_name: instructor.name.clone(),
            room_id: r.room_id,
            room_number: room.room_number.clone(),
            building_name: building.name.clone(),
            course_id: r.course_id,
            course_name: course.map(|c| c.name.clone()),
            request_time: r.request_time,
            status: r.status.clone(),
            reason: r.reason.clone(),
            response_time: r.response_time,
        })
    }

    fn views_where<F>(&self, predicate: F) -> Result<Vec<AdmissionRequestView>>
    where
        F: Fn(&AdmissionRequest) -> bool,
    {
        let mut matched: Vec<&AdmissionRequest> =
            self.requests.iter().filter(|r| predicate(r)).collect();
        matched.sort_by(|a, b| b.request_time.cmp(&a.request_time));
        matched.into_iter().map(|r| self.view_of(r)).collect()
    }
}

/// In-process store with the same guarded semantics as `PgStore`. All mutation
/// happens under a single mutex, which stands in for the storage-level
/// constraints (open-interval uniqueness, status-guarded updates).
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Seed helpers for tests and local fixtures.

    pub fn add_student(&self, student: Student) {
        self.lock().students.push(student);
    }

    pub fn add_instructor(&self, instructor: Instructor) {
        self.lock().instructors.push(instructor);
    }

    pub fn add_building(&self, building: Building) {
        self.lock().buildings.push(building);
    }

    pub fn add_room(&self, room: Room) {
        self.lock().rooms.push(room);
    }

    pub fn add_course(&self, course: Course) {
        self.lock().courses.push(course);
    }

    // Snapshots for assertions.

    pub fn attendance_records(&self) -> Vec<AttendanceRecord> {
        self.lock().attendance.clone()
    }

    pub fn requests(&self) -> Vec<AdmissionRequest> {
        self.lock().requests.clone()
    }

    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.lock().audit.clone()
    }
}

#[async_trait]
impl AdmissionStore for MemoryStore {
    async fn student_by_card_id(&self, card_id: &str) -> Result<Option<Student>> {
        let tables = self.lock();
        Ok(tables
            .students
            .iter()
            .find(|s| s.card_id.as_deref() == Some(card_id))
            .cloned())
    }

    async fn student_by_phone_id(&self, phone_id: &str) -> Result<Option<Student>> {
        let tables = self.lock();
        Ok(tables
            .students
            .iter()
            .find(|s| s.phone_id.as_deref() == Some(phone_id))
            .cloned())
    }

    async fn active_course_in_room(
        &self,
        room_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Course>> {
        let tables = self.lock();
        Ok(tables
            .courses
            .iter()
            .filter(|c| c.room_id == room_id && c.is_active_at(at))
            .min_by_key(|c| c.start_time)
            .cloned())
    }

    async fn active_course_for_instructor(
        &self,
        instructor_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Course>> {
        let tables = self.lock();
        Ok(tables
            .courses
            .iter()
            .filter(|c| c.instructor_id == instructor_id && c.is_active_at(at))
            .min_by_key(|c| c.start_time)
            .cloned())
    }

    async fn open_attendance(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<AttendanceRecord>> {
        let tables = self.lock();
        Ok(tables.open_attendance(student_id, course_id).cloned())
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<()> {
        self.lock().push_audit(entry);
        Ok(())
    }

    async fn admit(&self, admission: NewAdmission) -> Result<i64> {
        let mut tables = self.lock();

        // Re-check under the lock: this is the memory equivalent of the
        // partial unique index catching a lost check-then-create race.
        if tables
            .open_attendance(admission.student_id, admission.course_id)
            .is_some()
        {
            return Err(AppError::AlreadyCheckedIn);
        }

        let attendance_id = tables.alloc_id();
        tables.attendance.push(AttendanceRecord {
            id: attendance_id,
            student_id: admission.student_id,
            course_id: admission.course_id,
            room_id: admission.room_id,
            entry_time: admission.request_time,
            exit_time: None,
        });

        let request_id = tables.alloc_id();
        tables.requests.push(AdmissionRequest {
            id: request_id,
            student_id: admission.student_id,
            instructor_id: admission.instructor_id,
            room_id: admission.room_id,
            course_id: Some(admission.course_id),
            request_time: admission.request_time,
            status: RequestStatus::Pending.as_str().to_string(),
            reason: admission.reason.clone(),
            response_time: None,
        });

        tables.push_audit(NewAuditEntry::entry_success(
            admission.student_id,
            admission.course_id,
            admission.room_id,
            admission.request_time,
            &admission.nfc_id_used,
        ));

        Ok(request_id)
    }

    async fn transition_request(
        &self,
        request_id: i64,
        new_status: RequestStatus,
        response_time: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let mut tables = self.lock();
        let Some(request) = tables.requests.iter_mut().find(|r| r.id == request_id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        if request.status != RequestStatus::Pending.as_str() {
            return Ok(TransitionOutcome::NotPending);
        }

        request.status = new_status.as_str().to_string();
        request.response_time = Some(response_time);
        Ok(TransitionOutcome::Updated)
    }

    async fn pending_request_for(
        &self,
        instructor_id: i64,
        student_id: i64,
        course_id: i64,
    ) -> Result<Option<AdmissionRequest>> {
        let tables = self.lock();
        Ok(tables
            .requests
            .iter()
            .filter(|r| {
                r.instructor_id == instructor_id
                    && r.student_id == student_id
                    && r.course_id == Some(course_id)
                    && r.status == RequestStatus::Pending.as_str()
            })
            .max_by_key(|r| r.request_time)
            .cloned())
    }

    async fn expire_pending_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.lock();
        let mut expired = 0;
        for request in tables.requests.iter_mut() {
            if request.status == RequestStatus::Pending.as_str() && request.request_time < cutoff {
                request.status = RequestStatus::Expired.as_str().to_string();
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn view_by_id(&self, request_id: i64) -> Result<Option<AdmissionRequestView>> {
        let tables = self.lock();
        match tables.requests.iter().find(|r| r.id == request_id) {
            Some(request) => Ok(Some(tables.view_of(request)?)),
            None => Ok(None),
        }
    }

    async fn views_by_instructor(
        &self,
        instructor_id: i64,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AdmissionRequestView>> {
        let tables = self.lock();
        tables.views_where(|r| {
            r.instructor_id == instructor_id
                && status.map_or(true, |wanted| r.status == wanted.as_str())
        })
    }

    async fn views_by_student(&self, student_id: i64) -> Result<Vec<AdmissionRequestView>> {
        let tables = self.lock();
        tables.views_where(|r| r.student_id == student_id)
    }

    async fn pending_views_by_room(&self, room_id: i64) -> Result<Vec<AdmissionRequestView>> {
        let tables = self.lock();
        tables.views_where(|r| r.room_id == room_id && r.status == RequestStatus::Pending.as_str())
    }

    async fn pending_views_by_course(&self, course_id: i64) -> Result<Vec<AdmissionRequestView>> {
        let tables = self.lock();
        tables.views_where(|r| {
            r.course_id == Some(course_id) && r.status == RequestStatus::Pending.as_str()
        })
    }
}
