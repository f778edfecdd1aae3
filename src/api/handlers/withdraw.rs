use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::models::{WithdrawRequest, WithdrawResponse};
use crate::AppState;

/// POST /api/engine/withdraw: Direct token transfer from the signing identity.
///
/// Independent of session accounting.
pub async fn withdraw(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, AppError> {
    let settler = state
        .engine
        .settler()
        .filter(|s| s.is_ready())
        .ok_or_else(|| AppError::ServiceUnavailable("chain client not configured".into()))?;

    let receipt = settler
        .transfer(&req.token_address, &req.wallet_address, req.amount)
        .await?;

    tracing::info!(
        wallet = %req.wallet_address,
        token = %req.token_address,
        amount = %req.amount,
        tx_hash = %receipt.tx_hash,
        "Withdrawal confirmed"
    );

    Ok(Json(WithdrawResponse {
        success: true,
        tx_hash: receipt.tx_hash.to_string(),
        block_number: receipt.block_number,
        amount: req.amount,
    }))
}
