use rust_decimal::Decimal;
use std::env;
use std::path::{Path, PathBuf};

use crate::engine::{
    CatalogError, EngineConfig, EngineConfigError, RateModel, DEFAULT_BOOST_MULTIPLIER,
    DEFAULT_PRINCIPAL,
};
use crate::models::Strategy;

const DEFAULT_REWARD_TOKEN: &str = "0x8502496d6739dd6e18ced318c4b5fc12a5fb2c2c";
const ALCHEMY_MAINNET_URL: &str = "https://eth-mainnet.g.alchemy.com/v2";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Chain: all optional. Without them the engine accrues but never settles
    pub rpc_url: Option<String>,
    pub admin_private_key: Option<String>,
    pub reward_token_address: String,
    pub chain_id: u64,

    // Settlement
    pub settlement_interval_secs: i64,
    pub receipt_timeout_secs: u64,
    pub settlement_gas_limit: u64,
    pub gas_price_bump_percent: u64,

    // Yield model
    pub principal: Decimal,
    pub boost_multiplier: Decimal,
    pub strategy_catalog_path: Option<PathBuf>,
    pub normalize_strategy_weights: bool,

    /// Bearer token for the withdraw endpoint. Unset disables the check.
    pub api_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let rpc_url = non_empty("RPC_URL").or_else(|| {
            non_empty("ALCHEMY_API_KEY").map(|key| format!("{ALCHEMY_MAINNET_URL}/{key}"))
        });

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".into())
                .parse()?,

            rpc_url,
            admin_private_key: non_empty("ADMIN_PRIVATE_KEY"),
            reward_token_address: env::var("REWARD_TOKEN_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_REWARD_TOKEN.into()),
            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| "1".into())
                .parse()?,

            settlement_interval_secs: env::var("SETTLEMENT_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()?,
            receipt_timeout_secs: env::var("RECEIPT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".into())
                .parse()
                .unwrap_or(120),
            settlement_gas_limit: env::var("SETTLEMENT_GAS_LIMIT")
                .unwrap_or_else(|_| "200000".into())
                .parse()
                .unwrap_or(200_000),
            gas_price_bump_percent: env::var("GAS_PRICE_BUMP_PERCENT")
                .unwrap_or_else(|_| "20".into())
                .parse()
                .unwrap_or(20),

            principal: env::var("BASE_PRINCIPAL")
                .unwrap_or_else(|_| "100000".into())
                .parse()
                .unwrap_or(DEFAULT_PRINCIPAL),
            boost_multiplier: env::var("BOOST_MULTIPLIER")
                .unwrap_or_else(|_| "2.5".into())
                .parse()
                .unwrap_or(DEFAULT_BOOST_MULTIPLIER),
            strategy_catalog_path: non_empty("STRATEGY_CATALOG_PATH").map(PathBuf::from),
            normalize_strategy_weights: env::var("NORMALIZE_STRATEGY_WEIGHTS")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),

            api_token: non_empty("API_TOKEN"),
        };

        config.engine_config()?;
        Ok(config)
    }

    /// Principal and settlement interval, validated.
    pub fn engine_config(&self) -> Result<EngineConfig, EngineConfigError> {
        EngineConfig::new(self.principal, self.settlement_interval_secs)
    }

    /// Returns true if both an RPC endpoint and a signing key are configured.
    pub fn has_chain_credentials(&self) -> bool {
        self.rpc_url.is_some() && self.admin_private_key.is_some()
    }

    /// Build the rate model from the configured catalog, or the built-in one.
    pub fn rate_model(&self) -> Result<RateModel, CatalogError> {
        let strategies = match &self.strategy_catalog_path {
            Some(path) => load_catalog(path)?,
            None => RateModel::default_catalog(),
        };
        let model = RateModel::new(strategies, self.boost_multiplier)?;
        Ok(if self.normalize_strategy_weights {
            model.normalized()
        } else {
            model
        })
    }
}

/// Read a JSON array of `{name, apy, weight}` objects.
pub fn load_catalog(path: &Path) -> Result<Vec<Strategy>, CatalogError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CatalogError::Unreadable(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| CatalogError::Unreadable(format!("{}: {e}", path.display())))
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
