use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::backend::{ChainBackend, ReceiptOutcome, SettlementTx};
use super::calldata::{mint_calldata, parse_address, to_token_units, transfer_calldata};
use super::error::SettlementError;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A confirmed settlement transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// The on-chain payout surface consumed by the engine and the withdraw endpoint.
#[async_trait]
pub trait SettlementClient: Send + Sync {
    /// Whether a signing identity and network connection are configured.
    fn is_ready(&self) -> bool;

    /// Whether the RPC endpoint currently answers.
    async fn is_connected(&self) -> bool;

    /// Confirm the connected chain is the required one. Returns its id.
    async fn verify_network(&self) -> Result<u64, SettlementError>;

    /// Mint `amount` reward tokens to `wallet` and wait for confirmation.
    async fn settle(&self, wallet: &str, amount: Decimal) -> Result<SettlementReceipt, SettlementError>;

    /// Transfer `amount` of `token` from the signing identity to `wallet`.
    async fn transfer(
        &self,
        token: &str,
        wallet: &str,
        amount: Decimal,
    ) -> Result<SettlementReceipt, SettlementError>;
}

#[derive(Debug, Clone)]
pub struct SettlerConfig {
    pub reward_token: Address,
    pub required_chain_id: u64,
    pub gas_limit: u64,
    /// Added on top of the node's gas price, in percent.
    pub gas_price_bump_percent: u64,
    pub receipt_timeout: Duration,
}

/// Builds, signs and broadcasts token transactions for a single signing identity.
///
/// Every transaction goes through `signing_lock`, held from the chain-id check
/// until the receipt arrives, so nonces are never fetched concurrently.
pub struct ChainSettler<B> {
    backend: Arc<B>,
    config: SettlerConfig,
    signing_lock: Mutex<()>,
}

impl<B: ChainBackend> ChainSettler<B> {
    pub fn new(backend: Arc<B>, config: SettlerConfig) -> Self {
        Self {
            backend,
            config,
            signing_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SettlerConfig {
        &self.config
    }

    async fn check_chain(&self) -> Result<u64, SettlementError> {
        let actual = self
            .backend
            .chain_id()
            .await
            .map_err(|e| SettlementError::NetworkUnavailable(e.to_string()))?;
        if actual != self.config.required_chain_id {
            return Err(SettlementError::WrongNetwork {
                expected: self.config.required_chain_id,
                actual,
            });
        }
        Ok(actual)
    }

    fn bumped_gas_price(&self, node_price: u128) -> u128 {
        node_price.saturating_mul(100 + u128::from(self.config.gas_price_bump_percent)) / 100
    }

    /// verify chain → gas price → nonce → sign → broadcast → receipt, under the signing lock.
    async fn submit(&self, to: Address, input: Bytes) -> Result<SettlementReceipt, SettlementError> {
        let from = self.backend.signer_address().ok_or_else(|| {
            SettlementError::NetworkUnavailable("no signing key configured".into())
        })?;

        let _guard = self.signing_lock.lock().await;

        let chain_id = self.check_chain().await?;
        let gas_price = self
            .backend
            .gas_price()
            .await
            .map_err(|e| SettlementError::NetworkUnavailable(e.to_string()))?;
        let nonce = self
            .backend
            .transaction_count(from)
            .await
            .map_err(|e| SettlementError::NetworkUnavailable(e.to_string()))?;

        let tx = SettlementTx {
            to,
            input,
            nonce,
            gas_limit: self.config.gas_limit,
            gas_price: self.bumped_gas_price(gas_price),
            chain_id,
        };

        let raw = self
            .backend
            .sign(&tx)
            .await
            .map_err(|e| SettlementError::TransactionFailed(format!("signing: {e}")))?;
        let tx_hash = self
            .backend
            .broadcast(raw)
            .await
            .map_err(|e| SettlementError::TransactionFailed(format!("broadcast: {e}")))?;

        tracing::info!(%tx_hash, nonce, gas_price = %tx.gas_price, "Transaction broadcast");

        let outcome = self.wait_for_receipt(tx_hash).await?;
        if !outcome.success {
            return Err(SettlementError::TransactionFailed(format!(
                "{tx_hash} reverted in block {:?}",
                outcome.block_number
            )));
        }

        tracing::info!(%tx_hash, block = ?outcome.block_number, "Transaction confirmed");

        Ok(SettlementReceipt {
            tx_hash,
            block_number: outcome.block_number,
        })
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ReceiptOutcome, SettlementError> {
        let poll = async {
            loop {
                match self.backend.receipt(tx_hash).await {
                    Ok(Some(outcome)) => return outcome,
                    Ok(None) => {}
                    Err(e) => tracing::debug!(%tx_hash, error = %e, "Receipt poll failed"),
                }
                tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(self.config.receipt_timeout, poll)
            .await
            .map_err(|_| SettlementError::Timeout {
                tx_hash,
                waited: self.config.receipt_timeout,
            })
    }
}

#[async_trait]
impl<B: ChainBackend + 'static> SettlementClient for ChainSettler<B> {
    fn is_ready(&self) -> bool {
        self.backend.signer_address().is_some()
    }

    async fn is_connected(&self) -> bool {
        self.backend.chain_id().await.is_ok()
    }

    async fn verify_network(&self) -> Result<u64, SettlementError> {
        self.check_chain().await
    }

    async fn settle(&self, wallet: &str, amount: Decimal) -> Result<SettlementReceipt, SettlementError> {
        let to = parse_address(wallet)?;
        let units = to_token_units(amount)?;
        tracing::info!(wallet = %to, amount = %amount, "Minting reward tokens");
        self.submit(self.config.reward_token, mint_calldata(to, units))
            .await
    }

    async fn transfer(
        &self,
        token: &str,
        wallet: &str,
        amount: Decimal,
    ) -> Result<SettlementReceipt, SettlementError> {
        let token = parse_address(token)?;
        let to = parse_address(wallet)?;
        let units = to_token_units(amount)?;
        tracing::info!(%token, wallet = %to, amount = %amount, "Transferring tokens");
        self.submit(token, transfer_calldata(to, units)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex as StdMutex;

    const WALLET: &str = "0x1111111111111111111111111111111111111111";
    const TOKEN: &str = "0x2222222222222222222222222222222222222222";

    /// In-memory chain: nonce advances on broadcast, receipts mined on demand.
    struct MockBackend {
        chain_id: u64,
        signer: Option<Address>,
        broadcasts: AtomicU64,
        signed: StdMutex<Vec<SettlementTx>>,
        receipt: Option<ReceiptOutcome>,
        offline: bool,
    }

    impl MockBackend {
        fn healthy() -> Self {
            Self {
                chain_id: 1,
                signer: Some(Address::repeat_byte(0xaa)),
                broadcasts: AtomicU64::new(0),
                signed: StdMutex::new(Vec::new()),
                receipt: Some(ReceiptOutcome {
                    success: true,
                    block_number: Some(100),
                }),
                offline: false,
            }
        }
    }

    #[async_trait]
    impl ChainBackend for MockBackend {
        fn signer_address(&self) -> Option<Address> {
            self.signer
        }

        async fn chain_id(&self) -> anyhow::Result<u64> {
            if self.offline {
                anyhow::bail!("connection refused");
            }
            Ok(self.chain_id)
        }

        async fn gas_price(&self) -> anyhow::Result<u128> {
            // Give concurrent callers a chance to interleave
            tokio::task::yield_now().await;
            Ok(10_000_000_000)
        }

        async fn transaction_count(&self, _address: Address) -> anyhow::Result<u64> {
            tokio::task::yield_now().await;
            Ok(self.broadcasts.load(Ordering::SeqCst))
        }

        async fn sign(&self, tx: &SettlementTx) -> anyhow::Result<Bytes> {
            self.signed.lock().unwrap().push(tx.clone());
            Ok(Bytes::from(tx.nonce.to_be_bytes().to_vec()))
        }

        async fn broadcast(&self, raw: Bytes) -> anyhow::Result<TxHash> {
            tokio::task::yield_now().await;
            self.broadcasts.fetch_add(1, Ordering::SeqCst);
            let mut word = [0u8; 32];
            word[24..].copy_from_slice(&raw);
            Ok(TxHash::from(word))
        }

        async fn receipt(&self, _tx_hash: TxHash) -> anyhow::Result<Option<ReceiptOutcome>> {
            Ok(self.receipt)
        }
    }

    fn settler(backend: MockBackend) -> (Arc<MockBackend>, ChainSettler<MockBackend>) {
        let backend = Arc::new(backend);
        let settler = ChainSettler::new(
            Arc::clone(&backend),
            SettlerConfig {
                reward_token: parse_address(TOKEN).unwrap(),
                required_chain_id: 1,
                gas_limit: 200_000,
                gas_price_bump_percent: 20,
                receipt_timeout: Duration::from_secs(120),
            },
        );
        (backend, settler)
    }

    #[tokio::test]
    async fn test_settle_builds_mint_tx() {
        let (backend, settler) = settler(MockBackend::healthy());

        let receipt = settler.settle(WALLET, Decimal::new(25, 1)).await.unwrap();
        assert_eq!(receipt.block_number, Some(100));

        let signed = backend.signed.lock().unwrap();
        assert_eq!(signed.len(), 1);
        let tx = &signed[0];
        assert_eq!(tx.to, parse_address(TOKEN).unwrap());
        assert_eq!(tx.chain_id, 1);
        assert_eq!(tx.gas_limit, 200_000);
        // 10 gwei × 1.2
        assert_eq!(tx.gas_price, 12_000_000_000);
        assert_eq!(&tx.input[..4], &[0x40, 0xc1, 0x0f, 0x19]);
    }

    #[tokio::test]
    async fn test_wrong_network_rejected_before_signing() {
        let (backend, settler) = settler(MockBackend {
            chain_id: 11155111,
            ..MockBackend::healthy()
        });

        let err = settler.settle(WALLET, Decimal::ONE).await.unwrap_err();
        assert!(matches!(
            err,
            SettlementError::WrongNetwork { expected: 1, actual: 11155111 }
        ));
        assert!(backend.signed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_backend_is_unavailable() {
        let (_backend, settler) = settler(MockBackend {
            offline: true,
            ..MockBackend::healthy()
        });

        assert!(!settler.is_connected().await);
        let err = settler.verify_network().await.unwrap_err();
        assert!(matches!(err, SettlementError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_signer_not_ready() {
        let (_backend, settler) = settler(MockBackend {
            signer: None,
            ..MockBackend::healthy()
        });

        assert!(!settler.is_ready());
        let err = settler.settle(WALLET, Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, SettlementError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_failure() {
        let (_backend, settler) = settler(MockBackend {
            receipt: Some(ReceiptOutcome {
                success: false,
                block_number: Some(7),
            }),
            ..MockBackend::healthy()
        });

        let err = settler.transfer(TOKEN, WALLET, Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, SettlementError::TransactionFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_receipt_times_out() {
        let (_backend, settler) = settler(MockBackend {
            receipt: None,
            ..MockBackend::healthy()
        });

        let err = settler.settle(WALLET, Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, SettlementError::Timeout { waited, .. } if waited == Duration::from_secs(120)));
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected() {
        let (backend, settler) = settler(MockBackend::healthy());

        assert!(matches!(
            settler.settle("bob", Decimal::ONE).await,
            Err(SettlementError::InvalidAddress(_))
        ));
        assert!(matches!(
            settler.transfer(TOKEN, WALLET, Decimal::ZERO).await,
            Err(SettlementError::InvalidAmount(_))
        ));
        assert_eq!(backend.broadcasts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_settlements_never_reuse_nonce() {
        let (backend, settler) = settler(MockBackend::healthy());
        let settler = Arc::new(settler);

        let mut handles = Vec::new();
        for _ in 0..5 {
            let s = Arc::clone(&settler);
            handles.push(tokio::spawn(async move { s.settle(WALLET, Decimal::ONE).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let mut nonces: Vec<u64> = backend.signed.lock().unwrap().iter().map(|t| t.nonce).collect();
        nonces.sort_unstable();
        assert_eq!(nonces, vec![0, 1, 2, 3, 4]);
    }
}
