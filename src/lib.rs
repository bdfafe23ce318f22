// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod models;
pub mod orders;
pub mod pricing;

// Re-export commonly used types
pub use api::{ExchangeApi, KrakenClient};
pub use error::{OrderError, OrderFailure, PriceError};
pub use execution::{run_orders, FailurePolicy, OrderBuilder, OrderExecutor, RunReport};
pub use models::*;
