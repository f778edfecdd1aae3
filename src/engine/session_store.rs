use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

/// Accrual state for one wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub started_at: DateTime<Utc>,
    /// Instant up to which earnings have been added to `unsettled_earnings`.
    pub last_accrual_at: DateTime<Utc>,
    pub last_settlement_at: DateTime<Utc>,
    pub unsettled_earnings: Decimal,
    /// Set while a chain settlement for this wallet is running.
    pub settlement_in_flight: bool,
    /// Set after a settlement failure that retrying cannot fix.
    pub settlement_blocked: bool,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            last_accrual_at: now,
            last_settlement_at: now,
            unsettled_earnings: Decimal::ZERO,
            settlement_in_flight: false,
            settlement_blocked: false,
        }
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Process-wide wallet → session map.
///
/// The outer lock only guards membership; each session carries its own lock
/// so a slow read-modify-write on one wallet never blocks another.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

/// Canonical session key: trimmed and lowercased.
pub fn normalize_wallet(wallet: &str) -> String {
    wallet.trim().to_lowercase()
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing session for `wallet`, or a fresh one started at `now`.
    ///
    /// The flag is true when this call inserted the session.
    pub async fn get_or_create(&self, wallet: &str, now: DateTime<Utc>) -> (SessionHandle, bool) {
        let key = normalize_wallet(wallet);
        let mut map = self.inner.lock().await;
        if let Some(handle) = map.get(&key) {
            return (Arc::clone(handle), false);
        }

        tracing::debug!(wallet = %wallet, "Session created");
        let handle = Arc::new(Mutex::new(Session::new(now)));
        map.insert(key, Arc::clone(&handle));
        (handle, true)
    }

    /// Replace any existing session for `wallet` with a fresh one.
    pub async fn reset(&self, wallet: &str, now: DateTime<Utc>) -> SessionHandle {
        let handle = Arc::new(Mutex::new(Session::new(now)));
        let mut map = self.inner.lock().await;
        if map.insert(normalize_wallet(wallet), Arc::clone(&handle)).is_some() {
            tracing::debug!(wallet = %wallet, "Session reset");
        }
        handle
    }

    /// Drop the session for `wallet`. Returns whether one existed.
    pub async fn remove(&self, wallet: &str) -> bool {
        self.inner
            .lock()
            .await
            .remove(&normalize_wallet(wallet))
            .is_some()
    }

    /// Copy of the current session state, if any.
    pub async fn snapshot(&self, wallet: &str) -> Option<Session> {
        let handle = self.inner.lock().await.get(&normalize_wallet(wallet)).cloned()?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
