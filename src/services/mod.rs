// Services module - Business logic

pub mod admission;
pub mod identity;
pub mod schedule;

pub use admission::AdmissionService;
