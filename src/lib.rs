pub mod api;
pub mod chain;
pub mod config;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod models;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::engine::YieldEngine;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub engine: Arc<YieldEngine>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
