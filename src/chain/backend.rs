use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

/// Unsigned legacy transaction against a token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementTx {
    pub to: Address,
    pub input: Bytes,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub chain_id: u64,
}

/// What a mined receipt tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptOutcome {
    pub success: bool,
    pub block_number: Option<u64>,
}

/// Raw blockchain primitives. Sequencing and nonce discipline live in
/// [`ChainSettler`](super::ChainSettler), not here.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Address of the signing identity, if a key is loaded.
    fn signer_address(&self) -> Option<Address>;

    async fn chain_id(&self) -> anyhow::Result<u64>;

    async fn gas_price(&self) -> anyhow::Result<u128>;

    /// Next usable nonce for `address`, including pending transactions.
    async fn transaction_count(&self, address: Address) -> anyhow::Result<u64>;

    /// Sign `tx` and return the EIP-2718 encoded envelope.
    async fn sign(&self, tx: &SettlementTx) -> anyhow::Result<Bytes>;

    async fn broadcast(&self, raw: Bytes) -> anyhow::Result<TxHash>;

    /// `None` while the transaction is not yet mined.
    async fn receipt(&self, tx_hash: TxHash) -> anyhow::Result<Option<ReceiptOutcome>>;
}
