pub mod analytics;
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod import;
pub mod metrics;
pub mod models;
pub mod reasoning;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::reasoning::ReasoningService;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub reasoning: Option<Arc<dyn ReasoningService>>,
}
