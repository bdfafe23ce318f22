// Order construction and placement
pub mod batch;
pub mod builder;
pub mod executor;

pub use batch::{run_orders, FailurePolicy, RunReport};
pub use builder::{OrderBuilder, DEBUG_PRICE_MULTIPLIER, TRADING_AGREEMENT};
pub use executor::{OrderExecutor, PlacedOrder, PlacementState};
