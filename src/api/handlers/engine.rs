use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::{MetricsResponse, StartEngineRequest, StartEngineResponse, StopEngineRequest};
use crate::AppState;

const WALLET_HEADER: &str = "x-wallet-address";

/// POST /api/engine/start: Create or reset the session for a wallet.
///
/// With a chain client configured the network is checked first, so a
/// misconfigured deployment fails here rather than silently on every read.
pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<StartEngineRequest>,
) -> Result<Json<StartEngineResponse>, AppError> {
    let wallet = req.wallet_address.trim();
    if wallet.is_empty() {
        return Err(AppError::BadRequest("walletAddress required".into()));
    }

    if let Some(settler) = state.engine.settler() {
        settler.verify_network().await?;
    }

    tracing::debug!(
        wallet,
        mining_contract = %req.mining_contract,
        yield_aggregator = %req.yield_aggregator,
        requested_strategies = req.strategies.len(),
        "Start requested"
    );
    state.engine.start(wallet, Utc::now()).await;

    Ok(Json(StartEngineResponse {
        success: true,
        message: "Engine started".into(),
        ai_boost: state.engine.rates().boost_multiplier(),
    }))
}

/// GET /api/engine/metrics: Accrue and report; may trigger a settlement.
pub async fn metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MetricsResponse>, AppError> {
    let wallet = headers
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("X-Wallet-Address required".into()))?;

    let snapshot = state.engine.read_metrics(wallet, Utc::now()).await;

    Ok(Json(MetricsResponse {
        total_profit: snapshot.total_profit,
        hourly_rate: snapshot.hourly_rate,
        daily_profit: snapshot.daily_profit,
        active_positions: snapshot.active_positions,
        pending_rewards: snapshot.pending_rewards,
        total_apy: snapshot.total_apy(),
    }))
}

/// POST /api/engine/stop: Drop the wallet's session. Always succeeds.
pub async fn stop(
    State(state): State<AppState>,
    req: Option<Json<StopEngineRequest>>,
) -> Json<Value> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    if !req.wallet_address.trim().is_empty() {
        state.engine.stop(&req.wallet_address).await;
    }
    Json(json!({ "success": true }))
}
