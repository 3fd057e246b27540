// Models module - Database entity representations

pub mod admission_request;
pub mod attendance;
pub mod audit_log;
pub mod course;
pub mod instructor;
pub mod room;
pub mod student;

pub use admission_request::{AdmissionRequest, AdmissionRequestView, RequestStatus};
pub use attendance::AttendanceRecord;
pub use audit_log::{AuditLogEntry, NewAuditEntry};
pub use course::Course;
pub use instructor::Instructor;
pub use room::{Building, Room};
pub use student::Student;
