use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kraken market identifier, e.g. `ALGOEUR`
///
/// Opaque to the bot: whether a pair exists is only known from the exchange's answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradingPair(String);

impl TradingPair {
    pub fn new(pair: impl Into<String>) -> Self {
        Self(pair.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Buy or sell ("type" in Kraken's AddOrder)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    #[default]
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market or limit ("ordertype" in Kraken's AddOrder)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    #[default]
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recurring order as read from the orders file
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub pair: TradingPair,
    pub amount_in_fiat: Decimal,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub debug: bool,
}

impl OrderRequest {
    /// Buy limit order, the default for DCA
    pub fn new(pair: TradingPair, amount_in_fiat: Decimal, debug: bool) -> Self {
        Self {
            pair,
            amount_in_fiat,
            side: OrderSide::default(),
            order_type: OrderType::default(),
            debug,
        }
    }

    /// Order type actually sent to the exchange. Debug orders are always limit orders.
    pub fn effective_order_type(&self) -> OrderType {
        if self.debug {
            OrderType::Limit
        } else {
            self.order_type
        }
    }

    /// Human-readable line used to prefix every failure report
    pub fn description(&self) -> String {
        format!(
            "ORDER: pair: {}, amount in fiat: {}, style: {}, type: {}",
            self.pair, self.amount_in_fiat, self.side, self.order_type
        )
    }
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[pair: {}, amount_in_fiat: {}, debug: {}]",
            self.pair, self.amount_in_fiat, self.debug
        )
    }
}

/// Exchange-facing AddOrder parameters. Built once, submitted once.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPayload {
    pub pair: TradingPair,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Decimal,
    pub volume: Decimal,
    pub trading_agreement: &'static str,
    /// Ask Kraken to validate the order without placing it
    pub validate: bool,
}

impl OrderPayload {
    /// AddOrder form fields, in submission order
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("pair", self.pair.to_string()),
            ("type", self.side.to_string()),
            ("ordertype", self.order_type.to_string()),
            ("price", self.price.to_string()),
            ("volume", self.volume.to_string()),
            ("trading_agreement", self.trading_agreement.to_string()),
        ];
        if self.validate {
            fields.push(("validate", "true".to_string()));
        }
        fields
    }
}

/// Kraken's response envelope: `{"error": [...], "result": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExchangeResponse {
    #[serde(default)]
    pub error: Vec<String>,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl ExchangeResponse {
    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

/// Which public endpoint to read the current price from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    #[default]
    Ticker,
    Ohlc,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSource::Ticker => f.write_str("ticker"),
            PriceSource::Ohlc => f.write_str("ohlc"),
        }
    }
}

/// Parsed AddOrder result
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddOrderResult {
    #[serde(default)]
    pub descr: Option<OrderDescription>,
    #[serde(default)]
    pub txid: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderDescription {
    pub order: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(debug: bool) -> OrderRequest {
        OrderRequest::new(TradingPair::new("ALGOEUR"), Decimal::from(25), debug)
    }

    #[test]
    fn test_order_request_defaults() {
        let order = request(false);
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(
            order.to_string(),
            "[pair: ALGOEUR, amount_in_fiat: 25, debug: false]"
        );
    }

    #[test]
    fn test_debug_forces_limit() {
        let mut order = request(true);
        order.order_type = OrderType::Market;
        assert_eq!(order.effective_order_type(), OrderType::Limit);

        let mut order = request(false);
        order.order_type = OrderType::Market;
        assert_eq!(order.effective_order_type(), OrderType::Market);
    }

    #[test]
    fn test_description() {
        assert_eq!(
            request(false).description(),
            "ORDER: pair: ALGOEUR, amount in fiat: 25, style: buy, type: limit"
        );
    }

    #[test]
    fn test_form_fields_validate_flag() {
        let mut payload = OrderPayload {
            pair: TradingPair::new("XBTEUR"),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            price: Decimal::new(2500012345, 5),
            volume: Decimal::new(40, 5),
            trading_agreement: "agree",
            validate: false,
        };
        let fields = payload.form_fields();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[3], ("price", "25000.12345".to_string()));
        assert_eq!(fields[5], ("trading_agreement", "agree".to_string()));

        payload.validate = true;
        assert_eq!(
            payload.form_fields().last(),
            Some(&("validate", "true".to_string()))
        );
    }

    #[test]
    fn test_exchange_response_parsing() {
        let response: ExchangeResponse =
            serde_json::from_str(r#"{"error":["EOrder:Insufficient funds"]}"#).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.result, serde_json::Value::Null);
    }
}
