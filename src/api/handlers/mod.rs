pub mod engine;
pub mod health;
pub mod metrics;
pub mod withdraw;
