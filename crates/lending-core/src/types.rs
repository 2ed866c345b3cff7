use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Interest rates expressed as percent per month (2.5 = 2.5%/month),
/// matching how rate tables are quoted and persisted.
pub type RatePercent = Decimal;

pub type ClientId = u64;
pub type UserId = u64;
pub type RateTableId = u64;
pub type RequestId = u64;
pub type LoanId = u64;
pub type InstallmentId = u64;

/// Round to 2 decimal places, half away from zero. Applied once at the end
/// of a computation, never on intermediate values.
pub fn round_money(value: Decimal) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to the nearest 100 currency units.
pub fn round_to_nearest_hundred(value: Decimal) -> Money {
    (value / dec!(100)).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        * dec!(100)
}

/// Standard calculation output envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub warnings: Vec<String>,
}

pub fn with_methodology<T: Serialize>(
    methodology: &str,
    warnings: Vec<String>,
    result: T,
) -> CalcOutput<T> {
    CalcOutput {
        result,
        methodology: methodology.to_string(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(945.595)), dec!(945.60));
        assert_eq!(round_money(dec!(10.004)), dec!(10.00));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn test_round_to_nearest_hundred() {
        assert_eq!(round_to_nearest_hundred(dec!(3649.99)), dec!(3600));
        assert_eq!(round_to_nearest_hundred(dec!(3650)), dec!(3700));
        assert_eq!(round_to_nearest_hundred(dec!(12000)), dec!(12000));
    }
}
