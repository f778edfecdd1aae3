use std::time::Duration;

use alloy::primitives::TxHash;
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a settlement or transfer did not happen.
///
/// Every variant means no tokens moved as far as the caller can tell; the
/// accounting side must treat the attempt as not having occurred.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("chain client unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("wrong network: expected chain id {expected}, connected to {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("no receipt for {tx_hash} within {waited:?}")]
    Timeout { tx_hash: TxHash, waited: Duration },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),
}

impl SettlementError {
    /// Whether the same request can succeed on a later attempt.
    ///
    /// A wallet that is not an address stays invalid however often it is retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidAddress(_))
    }
}
