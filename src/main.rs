use std::sync::Arc;
use std::time::Duration;

use yield_engine::api::router::create_router;
use yield_engine::chain::{calldata, AlloyBackend, ChainSettler, SettlementClient, SettlerConfig};
use yield_engine::config::AppConfig;
use yield_engine::engine::YieldEngine;
use yield_engine::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = yield_engine::metrics::init_metrics();

    let rates = config.rate_model()?;
    tracing::info!(
        strategies = rates.strategy_count(),
        boost = %rates.boost_multiplier(),
        blended_rate = %rates.blended_rate(),
        "Rate model loaded"
    );

    // --- Chain settlement client ---
    let settler: Option<Arc<dyn SettlementClient>> = match &config.rpc_url {
        Some(rpc_url) => {
            let backend = AlloyBackend::connect(rpc_url, config.admin_private_key.as_deref())?;
            let settler = ChainSettler::new(
                Arc::new(backend),
                SettlerConfig {
                    reward_token: calldata::parse_address(&config.reward_token_address)?,
                    required_chain_id: config.chain_id,
                    gas_limit: config.settlement_gas_limit,
                    gas_price_bump_percent: config.gas_price_bump_percent,
                    receipt_timeout: Duration::from_secs(config.receipt_timeout_secs),
                },
            );
            tracing::info!(
                chain_id = config.chain_id,
                reward_token = %config.reward_token_address,
                signing = config.has_chain_credentials(),
                "Chain client configured"
            );
            Some(Arc::new(settler))
        }
        None => {
            tracing::warn!("No RPC endpoint configured; earnings accrue but are never settled");
            None
        }
    };

    let engine = YieldEngine::new(rates, settler, config.engine_config()?);

    let state = AppState {
        config,
        engine: Arc::new(engine),
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
