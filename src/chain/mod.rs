pub mod alloy_backend;
pub mod backend;
pub mod calldata;
pub mod error;
pub mod settler;

pub use alloy_backend::AlloyBackend;
pub use backend::{ChainBackend, ReceiptOutcome, SettlementTx};
pub use error::SettlementError;
pub use settler::{ChainSettler, SettlementClient, SettlementReceipt, SettlerConfig};
