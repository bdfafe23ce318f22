pub mod kraken;

pub use kraken::{Credentials, KrakenClient};

use crate::models::{ExchangeResponse, OrderPayload, PriceSource, TradingPair};
use std::future::Future;

/// The two exchange operations order placement relies on
pub trait ExchangeApi {
    /// Query public market data for `pair` from the endpoint selected by `source`
    fn query_market_data(
        &self,
        pair: &TradingPair,
        source: PriceSource,
    ) -> impl Future<Output = anyhow::Result<ExchangeResponse>> + Send;

    /// Submit an order through the authenticated trading API
    fn submit_order(
        &self,
        payload: &OrderPayload,
    ) -> impl Future<Output = anyhow::Result<ExchangeResponse>> + Send;
}
