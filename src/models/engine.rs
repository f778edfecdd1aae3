use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEngineRequest {
    pub wallet_address: String,
    #[serde(default)]
    pub mining_contract: String,
    #[serde(default)]
    pub yield_aggregator: String,
    #[serde(default)]
    pub strategies: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopEngineRequest {
    #[serde(default)]
    pub wallet_address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub wallet_address: String,
    pub amount: Decimal,
    pub token_address: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Body of `GET /api/engine/metrics`. Field names are part of the public
/// contract consumed by existing dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    #[serde(rename = "totalProfit", with = "rust_decimal::serde::float")]
    pub total_profit: Decimal,
    #[serde(rename = "hourlyRate", with = "rust_decimal::serde::float")]
    pub hourly_rate: Decimal,
    #[serde(rename = "dailyProfit", with = "rust_decimal::serde::float")]
    pub daily_profit: Decimal,
    #[serde(rename = "activePositions")]
    pub active_positions: usize,
    #[serde(rename = "pendingRewards", with = "rust_decimal::serde::float")]
    pub pending_rewards: Decimal,
    pub total_apy: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartEngineResponse {
    pub success: bool,
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub ai_boost: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResponse {
    pub success: bool,
    pub tx_hash: String,
    pub block_number: Option<u64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}
