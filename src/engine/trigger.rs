use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::chain::SettlementClient;

use super::accrual::{accrue, elapsed_secs, hourly_rate, DEFAULT_PRINCIPAL};
use super::rate_model::RateModel;
use super::session_store::{normalize_wallet, Session, SessionHandle, SessionStore};

/// Share of unsettled earnings reported as `pendingRewards`.
const PENDING_REWARDS_SHARE: Decimal = Decimal::from_parts(1, 0, 0, false, 1); // 0.1

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineConfigError {
    #[error("principal must not be negative, got {0}")]
    NegativePrincipal(Decimal),

    #[error("settlement interval must be a non-negative number of seconds in range, got {0}")]
    InvalidInterval(i64),
}

/// Validated accrual and settlement parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    principal: Decimal,
    settlement_interval: Duration,
}

impl EngineConfig {
    pub fn new(principal: Decimal, settlement_interval_secs: i64) -> Result<Self, EngineConfigError> {
        if principal < Decimal::ZERO {
            return Err(EngineConfigError::NegativePrincipal(principal));
        }
        let settlement_interval = Duration::try_seconds(settlement_interval_secs)
            .filter(|_| settlement_interval_secs >= 0)
            .ok_or(EngineConfigError::InvalidInterval(settlement_interval_secs))?;

        Ok(Self {
            principal,
            settlement_interval,
        })
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn settlement_interval(&self) -> Duration {
        self.settlement_interval
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            principal: DEFAULT_PRINCIPAL,
            settlement_interval: Duration::seconds(5),
        }
    }
}

/// Figures returned by one metrics read.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub total_profit: Decimal,
    pub hourly_rate: Decimal,
    pub daily_profit: Decimal,
    pub active_positions: usize,
    pub pending_rewards: Decimal,
    /// Blended annualized rate as a ratio (4.8195 = 481.95%).
    pub blended_rate: Decimal,
    pub last_settlement_at: DateTime<Utc>,
    /// Set when this read performed a successful settlement.
    pub settled: Option<Decimal>,
}

impl MetricsSnapshot {
    /// Blended rate as a percentage string, e.g. `"481.95%"`.
    pub fn total_apy(&self) -> String {
        format!("{:.2}%", self.blended_rate * Decimal::ONE_HUNDRED)
    }
}

/// Accrual and settlement for all wallets.
///
/// Each read accrues the time elapsed since the previous read, then pays out
/// the unsettled balance once the settlement interval has passed. Chain calls
/// run with the wallet's session lock released; a per-session flag keeps a
/// second read from starting a parallel settlement.
pub struct YieldEngine {
    rates: RateModel,
    sessions: SessionStore,
    settler: Option<Arc<dyn SettlementClient>>,
    config: EngineConfig,
}

impl YieldEngine {
    pub fn new(
        rates: RateModel,
        settler: Option<Arc<dyn SettlementClient>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            rates,
            sessions: SessionStore::new(),
            settler,
            config,
        }
    }

    pub fn rates(&self) -> &RateModel {
        &self.rates
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settler(&self) -> Option<&Arc<dyn SettlementClient>> {
        self.settler.as_ref()
    }

    /// Start (or restart) accrual for `wallet` at `now`.
    pub async fn start(&self, wallet: &str, now: DateTime<Utc>) {
        self.sessions.reset(wallet, now).await;
        gauge!("active_sessions").set(self.sessions.len().await as f64);
        tracing::info!(wallet = %normalize_wallet(wallet), "Engine started");
    }

    /// Forget `wallet`. Unsettled earnings are discarded.
    pub async fn stop(&self, wallet: &str) {
        if self.sessions.remove(wallet).await {
            tracing::info!(wallet = %normalize_wallet(wallet), "Engine stopped");
        }
        gauge!("active_sessions").set(self.sessions.len().await as f64);
    }

    /// Accrue, maybe settle, and report for `wallet` as of `now`.
    ///
    /// Never fails: settlement errors are logged and retried on a later read.
    pub async fn read_metrics(&self, wallet: &str, now: DateTime<Utc>) -> MetricsSnapshot {
        counter!("engine_metrics_reads_total").increment(1);

        let wallet = normalize_wallet(wallet);
        let (handle, created) = self.sessions.get_or_create(&wallet, now).await;
        if created {
            gauge!("active_sessions").set(self.sessions.len().await as f64);
        }
        let rate = self.rates.blended_rate();
        let principal = self.config.principal;

        let (mut snapshot, due) = {
            let mut session = handle.lock().await;
            // Reads can arrive out of order; accrual time never moves backwards.
            let now = now.max(session.last_accrual_at);

            let increment = accrue(principal, elapsed_secs(session.last_accrual_at, now), rate);
            session.unsettled_earnings += increment;
            session.last_accrual_at = now;

            let hourly = hourly_rate(principal, elapsed_secs(session.started_at, now), rate);
            let since_settlement = now - session.last_settlement_at;

            let due = self.settler.as_ref().filter(|s| s.is_ready()).is_some()
                && !session.settlement_in_flight
                && !session.settlement_blocked
                && since_settlement >= self.config.settlement_interval
                && session.unsettled_earnings > Decimal::ZERO;

            let amount = session.unsettled_earnings;
            if due {
                session.settlement_in_flight = true;
            }

            let snapshot = MetricsSnapshot {
                total_profit: session.unsettled_earnings,
                hourly_rate: hourly,
                daily_profit: hourly * Decimal::from(24),
                active_positions: self.rates.strategy_count(),
                pending_rewards: session.unsettled_earnings * PENDING_REWARDS_SHARE,
                blended_rate: rate,
                last_settlement_at: session.last_settlement_at,
                settled: None,
            };
            (snapshot, due.then_some((amount, now)))
        };

        let (Some((amount, settle_at)), Some(settler)) = (due, self.settler.as_ref()) else {
            return snapshot;
        };

        // Spawned so a dropped request cannot strand the in-flight flag.
        let task = tokio::spawn(settle_session(
            Arc::clone(settler),
            Arc::clone(&handle),
            wallet.clone(),
            amount,
            settle_at,
        ));

        match task.await {
            Ok(Some(session)) => {
                snapshot.total_profit = session.unsettled_earnings;
                snapshot.pending_rewards = session.unsettled_earnings * PENDING_REWARDS_SHARE;
                snapshot.last_settlement_at = session.last_settlement_at;
                snapshot.settled = Some(amount);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(wallet = %wallet, error = %e, "Settlement task aborted");
                handle.lock().await.settlement_in_flight = false;
            }
        }

        snapshot
    }
}

/// Pay out `amount` for one session and fold the outcome back into it.
///
/// Returns the updated session on success; on failure the balance is left as is.
async fn settle_session(
    settler: Arc<dyn SettlementClient>,
    handle: SessionHandle,
    wallet: String,
    amount: Decimal,
    settle_at: DateTime<Utc>,
) -> Option<Session> {
    let attempt_id = Uuid::new_v4();
    tracing::info!(%attempt_id, wallet = %wallet, amount = %amount, "Settlement due");

    let started = Instant::now();
    let result = settler.settle(&wallet, amount).await;
    histogram!("settlement_latency_seconds").record(started.elapsed().as_secs_f64());

    let mut session = handle.lock().await;
    session.settlement_in_flight = false;

    match result {
        Ok(receipt) => {
            counter!("settlements_total", "outcome" => "success").increment(1);
            // Keep anything accrued by concurrent reads while the chain call ran.
            session.unsettled_earnings = (session.unsettled_earnings - amount).max(Decimal::ZERO);
            session.last_settlement_at = settle_at;
            tracing::info!(
                %attempt_id,
                wallet = %wallet,
                amount = %amount,
                tx_hash = %receipt.tx_hash,
                block = ?receipt.block_number,
                "Settlement confirmed"
            );
            Some(session.clone())
        }
        Err(e) if !e.is_retryable() => {
            session.settlement_blocked = true;
            tracing::debug!(
                %attempt_id,
                wallet = %wallet,
                error = %e,
                "Wallet cannot receive settlements; earnings accrue unsettled"
            );
            None
        }
        Err(e) => {
            counter!("settlements_total", "outcome" => "failure").increment(1);
            tracing::warn!(
                %attempt_id,
                wallet = %wallet,
                amount = %amount,
                error = %e,
                "Settlement failed; earnings kept for retry"
            );
            None
        }
    }
}
