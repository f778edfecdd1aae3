pub mod engine;
pub mod strategy;

pub use engine::{
    MetricsResponse, StartEngineRequest, StartEngineResponse, StopEngineRequest,
    WithdrawRequest, WithdrawResponse,
};
pub use strategy::Strategy;
