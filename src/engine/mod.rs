pub mod accrual;
pub mod rate_model;
pub mod session_store;
pub mod trigger;

pub use accrual::{accrue, DEFAULT_PRINCIPAL, SECONDS_PER_YEAR};
pub use rate_model::{CatalogError, RateModel, DEFAULT_BOOST_MULTIPLIER};
pub use session_store::{normalize_wallet, Session, SessionHandle, SessionStore};
pub use trigger::{EngineConfig, EngineConfigError, MetricsSnapshot, YieldEngine};
