use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::advisor::CropAdvisor;

/// Shared, read-only state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub advisor: Arc<CropAdvisor>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(advisor: CropAdvisor) -> Self {
        Self {
            advisor: Arc::new(advisor),
            started_at: Utc::now(),
        }
    }
}
