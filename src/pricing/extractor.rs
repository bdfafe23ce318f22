use super::round_to_exchange_precision;
use crate::error::PriceError;
use crate::models::{ExchangeResponse, PriceSource, TradingPair};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Best ask from the Ticker endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct TickerEntry {
    pub ask: Option<Decimal>,
}

/// One OHLC row reduced to the two positions the price lookup needs
#[derive(Debug, Clone, PartialEq)]
pub struct CandleEntry {
    pub close: Decimal,
    pub trade_volume: Decimal,
}

/// Market data for a single pair, tagged by the endpoint it came from
#[derive(Debug, Clone, PartialEq)]
pub enum MarketData {
    Ticker(TickerEntry),
    Candles(Vec<CandleEntry>),
}

impl MarketData {
    /// Pull the data for `pair` out of a public endpoint response
    pub fn from_response(
        response: &ExchangeResponse,
        pair: &TradingPair,
        source: PriceSource,
    ) -> Result<Self, PriceError> {
        if let Some(first) = response.error.first() {
            return Err(PriceError::Exchange(first.clone()));
        }

        let data = response
            .result
            .get(pair.as_str())
            .ok_or(PriceError::DataExtraction)?;

        match source {
            PriceSource::Ticker => Ok(MarketData::Ticker(parse_ticker(data)?)),
            PriceSource::Ohlc => Ok(MarketData::Candles(parse_candles(data)?)),
        }
    }

    /// Current price, rounded to exchange precision. Always strictly positive.
    pub fn current_price(&self) -> Result<Decimal, PriceError> {
        let price = match self {
            MarketData::Ticker(ticker) => ticker.ask.ok_or(PriceError::DataExtraction)?,
            // A candle without trades has no meaningful close
            MarketData::Candles(candles) => candles
                .iter()
                .find(|candle| !candle.trade_volume.is_zero())
                .map(|candle| candle.close)
                .ok_or(PriceError::DataExtraction)?,
        };

        // Checked after rounding: a tiny quote would otherwise become a zero price
        let price = round_to_exchange_precision(price);
        if price <= Decimal::ZERO {
            return Err(PriceError::DataExtraction);
        }
        Ok(price)
    }
}

/// Get the current price of `pair` from a market data response
pub fn extract_price(
    response: &ExchangeResponse,
    pair: &TradingPair,
    source: PriceSource,
) -> Result<Decimal, PriceError> {
    MarketData::from_response(response, pair, source)?.current_price()
}

// Ticker: {"a": ["<price>", "<whole lot volume>", "<lot volume>"], "b": [...], ...}
fn parse_ticker(data: &Value) -> Result<TickerEntry, PriceError> {
    let ask = match data.get("a").and_then(|a| a.get(0)) {
        Some(value) => Some(parse_decimal(value)?),
        None => None,
    };
    Ok(TickerEntry { ask })
}

// Candle rows are fixed-position tuples. Only positions relative to the end are relied
// on: the close is third from last, the trade volume is last.
fn parse_candles(data: &Value) -> Result<Vec<CandleEntry>, PriceError> {
    let rows = data.as_array().ok_or(PriceError::DataExtraction)?;

    rows.iter()
        .map(|row| {
            let fields = row.as_array().ok_or(PriceError::DataExtraction)?;
            if fields.len() < 3 {
                return Err(PriceError::DataExtraction);
            }
            Ok(CandleEntry {
                close: parse_decimal(&fields[fields.len() - 3])?,
                trade_volume: parse_decimal(&fields[fields.len() - 1])?,
            })
        })
        .collect()
}

/// Kraken encodes most numbers as strings, but counts and timestamps as JSON numbers
fn parse_decimal(value: &Value) -> Result<Decimal, PriceError> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(PriceError::DataExtraction),
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| PriceError::DataExtraction)
}
