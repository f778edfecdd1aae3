use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::TxHash;
use async_trait::async_trait;
use rust_decimal::Decimal;

use yield_engine::chain::{SettlementClient, SettlementError, SettlementReceipt};
use yield_engine::config::AppConfig;
use yield_engine::engine::{EngineConfig, RateModel, YieldEngine};
use yield_engine::AppState;

pub const WALLET: &str = "0xAbCdEf0123456789abcdef0123456789ABCDEF01";
#[allow(dead_code)]
pub const TOKEN: &str = "0x8502496d6739dd6e18ced318c4b5fc12a5fb2c2c";

/// How the mock chain answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum ChainBehavior {
    Confirm,
    Revert,
    Offline,
    WrongNetwork,
    /// Wallet is not a valid address.
    BadAddress,
    /// RPC endpoint accepts the connection but never answers.
    Stalled,
}

/// Records every call; outcome controlled by `behavior`.
pub struct MockSettler {
    behavior: Mutex<ChainBehavior>,
    pub ready: bool,
    pub calls: AtomicUsize,
    pub settled: Mutex<Vec<(String, Decimal)>>,
}

#[allow(dead_code)]
impl MockSettler {
    pub fn new(behavior: ChainBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            ready: true,
            calls: AtomicUsize::new(0),
            settled: Mutex::new(Vec::new()),
        })
    }

    /// A client with no signing identity.
    pub fn unready() -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(ChainBehavior::Confirm),
            ready: false,
            calls: AtomicUsize::new(0),
            settled: Mutex::new(Vec::new()),
        })
    }

    pub fn set_behavior(&self, behavior: ChainBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn settled_amounts(&self) -> Vec<Decimal> {
        self.settled.lock().unwrap().iter().map(|(_, a)| *a).collect()
    }

    fn outcome(&self, wallet: &str, amount: Decimal) -> Result<SettlementReceipt, SettlementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *self.behavior.lock().unwrap() {
            ChainBehavior::Confirm => {
                self.settled.lock().unwrap().push((wallet.to_string(), amount));
                Ok(SettlementReceipt {
                    tx_hash: TxHash::repeat_byte(0x11),
                    block_number: Some(19_000_000),
                })
            }
            ChainBehavior::Revert => Err(SettlementError::TransactionFailed("reverted".into())),
            ChainBehavior::Offline => Err(SettlementError::NetworkUnavailable("connection refused".into())),
            ChainBehavior::WrongNetwork => Err(SettlementError::WrongNetwork { expected: 1, actual: 5 }),
            ChainBehavior::BadAddress => Err(SettlementError::InvalidAddress(wallet.to_string())),
            ChainBehavior::Stalled => Err(SettlementError::NetworkUnavailable("request timed out".into())),
        }
    }
}

#[async_trait]
impl SettlementClient for MockSettler {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn is_connected(&self) -> bool {
        let behavior = *self.behavior.lock().unwrap();
        if behavior == ChainBehavior::Stalled {
            std::future::pending::<()>().await;
        }
        behavior != ChainBehavior::Offline
    }

    async fn verify_network(&self) -> Result<u64, SettlementError> {
        match *self.behavior.lock().unwrap() {
            ChainBehavior::Offline => Err(SettlementError::NetworkUnavailable("connection refused".into())),
            ChainBehavior::WrongNetwork => Err(SettlementError::WrongNetwork { expected: 1, actual: 5 }),
            _ => Ok(1),
        }
    }

    async fn settle(&self, wallet: &str, amount: Decimal) -> Result<SettlementReceipt, SettlementError> {
        self.outcome(wallet, amount)
    }

    async fn transfer(
        &self,
        _token: &str,
        wallet: &str,
        amount: Decimal,
    ) -> Result<SettlementReceipt, SettlementError> {
        self.outcome(wallet, amount)
    }
}

#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        rpc_url: None,
        admin_private_key: None,
        reward_token_address: TOKEN.into(),
        chain_id: 1,
        settlement_interval_secs: 5,
        receipt_timeout_secs: 120,
        settlement_gas_limit: 200_000,
        gas_price_bump_percent: 20,
        principal: Decimal::from(100_000),
        boost_multiplier: Decimal::new(25, 1),
        strategy_catalog_path: None,
        normalize_strategy_weights: false,
        api_token: None,
    }
}

#[allow(dead_code)]
pub fn engine_with(settler: Option<Arc<MockSettler>>) -> YieldEngine {
    YieldEngine::new(
        RateModel::default(),
        settler.map(|s| s as Arc<dyn SettlementClient>),
        EngineConfig::default(),
    )
}

#[allow(dead_code)]
pub fn build_state(config: AppConfig, settler: Option<Arc<MockSettler>>) -> AppState {
    AppState {
        config,
        engine: Arc::new(engine_with(settler)),
        metrics_handle: yield_engine::metrics::detached_handle(),
    }
}
