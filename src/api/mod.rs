// API module - HTTP endpoints

pub mod admissions;

use std::sync::Arc;

use crate::services::AdmissionService;

#[derive(Clone)]
pub struct AppState {
    pub admissions: Arc<AdmissionService>,
}
