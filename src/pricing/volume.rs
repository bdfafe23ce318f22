use super::round_to_exchange_precision;
use rust_decimal::Decimal;

/// Calculate the order volume in crypto from a given fiat amount.
///
/// Example: with a price of 1000€ and a budget of 100€ the order volume is 0.1.
///
/// Returns `None` when `price` is zero or the quotient does not fit in a `Decimal`.
pub fn compute_volume(amount_in_fiat: Decimal, price: Decimal) -> Option<Decimal> {
    amount_in_fiat
        .checked_div(price)
        .map(round_to_exchange_precision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_half_unit() {
        assert_eq!(compute_volume(dec("500"), dec("1000.0")), Some(dec("0.5")));
    }

    #[test]
    fn test_volume_is_rounded() {
        // 25 / 0.12345 = 202.5111381...
        assert_eq!(compute_volume(dec("25"), dec("0.12345")), Some(dec("202.51114")));
        // 10 / 27123.4 = 0.000368685...
        assert_eq!(compute_volume(dec("10"), dec("27123.4")), Some(dec("0.00037")));
    }

    #[test]
    fn test_matches_rounded_quotient() {
        let budgets = ["1", "12.5", "100", "999.99"];
        let prices = ["0.00321", "1.5", "64000.12345", "3"];
        for budget in budgets {
            for price in prices {
                let (budget, price) = (dec(budget), dec(price));
                assert_eq!(
                    compute_volume(budget, price),
                    Some((budget / price).round_dp(5))
                );
            }
        }
    }

    #[test]
    fn test_zero_price_has_no_volume() {
        assert_eq!(compute_volume(dec("10"), Decimal::ZERO), None);
    }

    #[test]
    fn test_overflowing_volume() {
        let huge = dec("70000000000000000000000000000");
        assert_eq!(compute_volume(huge, dec("0.5")), None);
        assert_eq!(compute_volume(Decimal::MAX, dec("0.00001")), None);
    }
}
