use crate::error::OrderError;
use crate::models::{OrderPayload, OrderRequest};
use crate::pricing::{compute_volume, round_to_exchange_precision};
use rust_decimal::Decimal;

/// Debug orders are placed at 1% of the market price so they sit unfilled until cancelled
pub const DEBUG_PRICE_MULTIPLIER: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Kraken rejects orders that do not acknowledge its trading agreement
pub const TRADING_AGREEMENT: &str = "agree";

/// Turns an order request and a resolved market price into AddOrder parameters
#[derive(Debug, Clone, Default)]
pub struct OrderBuilder {
    validate_only: bool,
}

impl OrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every built payload as validate-only
    pub fn validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }

    /// Build the payload for `request` at `market_price`.
    ///
    /// The volume always comes from the unscaled market price; debug mode only
    /// changes the submitted price and forces a limit order.
    pub fn build_payload(
        &self,
        request: &OrderRequest,
        market_price: Decimal,
    ) -> Result<OrderPayload, OrderError> {
        let multiplier = if request.debug {
            DEBUG_PRICE_MULTIPLIER
        } else {
            Decimal::ONE
        };

        let price = market_price
            .checked_mul(multiplier)
            .map(round_to_exchange_precision)
            .ok_or(OrderError::AmountOutOfRange)?;
        let volume = compute_volume(request.amount_in_fiat, market_price)
            .ok_or(OrderError::AmountOutOfRange)?;

        Ok(OrderPayload {
            pair: request.pair.clone(),
            side: request.side,
            order_type: request.effective_order_type(),
            price,
            volume,
            trading_agreement: TRADING_AGREEMENT,
            validate: self.validate_only,
        })
    }
}
