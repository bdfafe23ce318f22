use thiserror::Error;

const UNKNOWN_PAIR_MARKER: &str = "Unknown asset pair";
const INVALID_VOLUME_MARKER: &str = "Invalid arguments:volume";
const INSUFFICIENT_FUNDS_MARKER: &str = "Insufficient funds";

const TICKER_PAIRS_URL: &str = "https://support.kraken.com/hc/en-us/articles/360000920306-Ticker-pairs";
const MINIMUM_ORDER_SIZE_URL: &str =
    "https://support.kraken.com/hc/en-us/articles/205893708-Minimum-order-size-volume-for-trading";

/// Why no price could be read from a market data response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The exchange answered with a non-empty error list; carries the first entry
    #[error("{0}")]
    Exchange(String),

    #[error("Data extraction error")]
    DataExtraction,
}

/// Terminal outcome of a failed order placement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("unknown trading pair {0}")]
    UnknownPair(String),

    #[error("could not extract a price from the market data")]
    DataExtraction,

    #[error("invalid order volume")]
    InvalidVolume,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("fiat amount out of range")]
    AmountOutOfRange,

    #[error("exchange error: {}", .0.join(", "))]
    Exchange(Vec<String>),
}

impl OrderError {
    /// Map a price lookup failure for `pair` onto the order taxonomy
    pub fn from_price_error(error: PriceError, pair: &str) -> Self {
        match error {
            PriceError::Exchange(message) if message.contains(UNKNOWN_PAIR_MARKER) => {
                OrderError::UnknownPair(pair.to_string())
            }
            PriceError::Exchange(message) => OrderError::Exchange(vec![message]),
            PriceError::DataExtraction => OrderError::DataExtraction,
        }
    }

    /// Classify the (non-empty) error list of a rejected AddOrder request
    pub fn classify_submission(errors: &[String]) -> Self {
        if errors.iter().any(|e| e.contains(INVALID_VOLUME_MARKER)) {
            return OrderError::InvalidVolume;
        }
        if errors.iter().any(|e| e.contains(INSUFFICIENT_FUNDS_MARKER)) {
            return OrderError::InsufficientFunds;
        }
        OrderError::Exchange(errors.to_vec())
    }

    /// Explanation shown to the user, with pointers on how to fix the order
    pub fn hint(&self) -> String {
        match self {
            OrderError::UnknownPair(pair) => format!(
                "You specified an unknown trading pair: {}\nSee here for a full list of all trading pairs {}",
                pair, TICKER_PAIRS_URL
            ),
            OrderError::DataExtraction => {
                "There was an error while extracting data from the Kraken API.".to_string()
            }
            OrderError::InvalidVolume => format!(
                "The volume you specified for your order was invalid.\n\
                 This probably means the specified fiat amount was too low.\n\
                 See {} for the minimum required order sizes.",
                MINIMUM_ORDER_SIZE_URL
            ),
            OrderError::InsufficientFunds => {
                "Insufficient funds. Your Kraken account does not contain enough funds for this order."
                    .to_string()
            }
            OrderError::AmountOutOfRange => {
                "The fiat amount of this order is too large to compute an order volume from."
                    .to_string()
            }
            OrderError::Exchange(errors) => format!("{:?}", errors),
        }
    }
}

/// A failed order together with the description of the order it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{order}\nERROR: {}", .error.hint())]
pub struct OrderFailure {
    pub order: String,
    #[source]
    pub error: OrderError,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unknown_pair_from_price_fetch() {
        let error = OrderError::from_price_error(
            PriceError::Exchange("EQuery:Unknown asset pair".to_string()),
            "FOOBAR",
        );
        assert_eq!(error, OrderError::UnknownPair("FOOBAR".to_string()));
        assert!(error.hint().contains("FOOBAR"));
    }

    #[test]
    fn test_price_error_mapping() {
        assert_eq!(
            OrderError::from_price_error(PriceError::DataExtraction, "XBTEUR"),
            OrderError::DataExtraction
        );
        assert_eq!(
            OrderError::from_price_error(
                PriceError::Exchange("EService:Unavailable".to_string()),
                "XBTEUR"
            ),
            OrderError::Exchange(errors(&["EService:Unavailable"]))
        );
    }

    #[test]
    fn test_classify_insufficient_funds() {
        assert_eq!(
            OrderError::classify_submission(&errors(&["EOrder:Insufficient funds"])),
            OrderError::InsufficientFunds
        );
    }

    #[test]
    fn test_classify_invalid_volume() {
        assert_eq!(
            OrderError::classify_submission(&errors(&["EGeneral:Invalid arguments:volume"])),
            OrderError::InvalidVolume
        );
    }

    #[test]
    fn test_invalid_volume_takes_precedence() {
        let list = errors(&["EOrder:Insufficient funds", "EGeneral:Invalid arguments:volume"]);
        assert_eq!(
            OrderError::classify_submission(&list),
            OrderError::InvalidVolume
        );
    }

    #[test]
    fn test_classify_generic() {
        let list = errors(&["EAPI:Invalid nonce"]);
        assert_eq!(
            OrderError::classify_submission(&list),
            OrderError::Exchange(list.clone())
        );
    }

    #[test]
    fn test_amount_out_of_range_hint() {
        assert!(OrderError::AmountOutOfRange.hint().contains("too large"));
    }

    #[test]
    fn test_failure_message_includes_order() {
        let failure = OrderFailure {
            order: "ORDER: pair: XBTEUR, amount in fiat: 10, style: buy, type: limit".to_string(),
            error: OrderError::InsufficientFunds,
        };
        let message = failure.to_string();
        assert!(message.starts_with("ORDER: pair: XBTEUR"));
        assert!(message.contains("ERROR: Insufficient funds"));
    }
}
