use std::time::Duration;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};

use crate::AppState;

const SERVICE_NAME: &str = "Yield Accrual Engine";
/// A node slower than this is reported as disconnected.
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(3);

/// GET /: Service status and chain connectivity.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let rates = state.engine.rates();
    let web3_connected = match state.engine.settler() {
        Some(settler) => tokio::time::timeout(CONNECTIVITY_TIMEOUT, settler.is_connected())
            .await
            .unwrap_or_else(|_| {
                tracing::warn!("Chain connectivity check timed out");
                false
            }),
        None => false,
    };

    Json(json!({
        "status": "online",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "strategies": rates.strategy_count(),
        "ai_boost": rates.boost_multiplier().to_f64(),
        "web3_connected": web3_connected,
    }))
}

/// GET /health: Liveness probe.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
