// Price resolution and order sizing
pub mod extractor;
pub mod volume;

pub use extractor::{extract_price, CandleEntry, MarketData, TickerEntry};
pub use volume::compute_volume;

use rust_decimal::Decimal;

/// Kraken only accepts up to five decimals for prices and volumes
pub const EXCHANGE_DECIMALS: u32 = 5;

/// Round to the number of decimals the Kraken API accepts
pub fn round_to_exchange_precision(value: Decimal) -> Decimal {
    value.round_dp(EXCHANGE_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rounds_to_five_decimals() {
        let value = Decimal::from_str("123.4567891").unwrap();
        assert_eq!(
            round_to_exchange_precision(value),
            Decimal::from_str("123.45679").unwrap()
        );
    }

    #[test]
    fn test_short_values_unchanged() {
        let value = Decimal::from_str("0.5").unwrap();
        assert_eq!(round_to_exchange_precision(value), value);
    }

    #[test]
    fn test_rounding_is_idempotent() {
        for raw in ["0.000004999", "1.234565", "98765.4321098", "-3.1415926", "0"] {
            let value = Decimal::from_str(raw).unwrap();
            let once = round_to_exchange_precision(value);
            assert_eq!(round_to_exchange_precision(once), once, "value {}", raw);
            assert!(once.scale() <= EXCHANGE_DECIMALS);
        }
    }
}
