use std::str::FromStr;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{ReceiptResponse, TxSignerSync};
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use super::backend::{ChainBackend, ReceiptOutcome, SettlementTx};

/// JSON-RPC backed chain access with an optional local signing key.
///
/// The private key is parsed once during construction and never stored as a string.
pub struct AlloyBackend {
    provider: DynProvider,
    signer: Option<PrivateKeySigner>,
}

impl AlloyBackend {
    /// Connect to `rpc_url`. Without `private_key` the backend can read chain
    /// state but every signing attempt fails.
    pub fn connect(rpc_url: &str, private_key: Option<&str>) -> anyhow::Result<Self> {
        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.parse()?)
            .erased();

        let signer = private_key
            .map(|key| PrivateKeySigner::from_str(key.trim()))
            .transpose()?;

        if let Some(s) = &signer {
            tracing::info!(signer = %s.address(), "Signing identity loaded");
        } else {
            tracing::warn!("No signing key configured; settlements disabled");
        }

        Ok(Self { provider, signer })
    }
}

#[async_trait]
impl ChainBackend for AlloyBackend {
    fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn chain_id(&self) -> anyhow::Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn gas_price(&self) -> anyhow::Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn transaction_count(&self, address: Address) -> anyhow::Result<u64> {
        Ok(self.provider.get_transaction_count(address).pending().await?)
    }

    async fn sign(&self, tx: &SettlementTx) -> anyhow::Result<Bytes> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no signing key configured"))?;

        let mut legacy = TxLegacy {
            chain_id: Some(tx.chain_id),
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: TxKind::Call(tx.to),
            value: U256::ZERO,
            input: tx.input.clone(),
        };

        let signature = signer.sign_transaction_sync(&mut legacy)?;
        let envelope = TxEnvelope::from(legacy.into_signed(signature));
        Ok(envelope.encoded_2718().into())
    }

    async fn broadcast(&self, raw: Bytes) -> anyhow::Result<TxHash> {
        let pending = self.provider.send_raw_transaction(&raw).await?;
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: TxHash) -> anyhow::Result<Option<ReceiptOutcome>> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt.map(|r| ReceiptOutcome {
            success: ReceiptResponse::status(&r),
            block_number: ReceiptResponse::block_number(&r),
        }))
    }
}
