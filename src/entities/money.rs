//! Money column type - A `Decimal` stored as exact text.
//!
//! SQLite has no fixed-point type and would keep a decimal column as a float, so amounts
//! are written with `Decimal::to_string` and parsed back with `Decimal::from_str`. The
//! text round-trips without loss. [`Money::checked`] enforces the ledger's limits of two
//! decimal places and sixteen integer digits.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use sea_orm::{
    ColIdx, DbErr, QueryResult, TryGetError, TryGetable,
    sea_query::{ArrayType, ColumnType, Value, ValueType, ValueTypeErr},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Most decimal places an amount may carry.
pub const MAX_SCALE: u32 = 2;

/// Most digits before the decimal point.
pub const MAX_INTEGER_DIGITS: u32 = 16;

/// An exact monetary amount.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps `value` without checking limits.
    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Wraps `value` if it fits the ledger's limits.
    ///
    /// # Errors
    /// Returns `Validation` naming `field` when `value` has more than two decimal places or
    /// sixteen integer digits.
    pub fn checked(value: Decimal, field: &str) -> Result<Self> {
        if value.normalize().scale() > MAX_SCALE {
            return Err(Error::validation(format!(
                "{field} cannot have more than {MAX_SCALE} decimal places"
            )));
        }
        if value.abs() >= Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS)) {
            return Err(Error::validation(format!(
                "{field} cannot have more than {MAX_INTEGER_DIGITS} integer digits"
            )));
        }
        Ok(Self(value))
    }

    /// The wrapped decimal.
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl PartialEq<Decimal> for Money {
    fn eq(&self, other: &Decimal) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Money> for Value {
    fn from(money: Money) -> Self {
        Self::from(money.0.to_string())
    }
}

impl TryGetable for Money {
    fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> std::result::Result<Self, TryGetError> {
        let raw = String::try_get_by(res, index)?;
        Decimal::from_str(&raw).map(Self).map_err(|e| {
            TryGetError::DbErr(DbErr::Type(format!("Invalid money value {raw:?}: {e}")))
        })
    }
}

impl ValueType for Money {
    fn try_from(v: Value) -> std::result::Result<Self, ValueTypeErr> {
        let raw = <String as ValueType>::try_from(v)?;
        Decimal::from_str(&raw).map(Self).map_err(|_| ValueTypeErr)
    }

    fn type_name() -> String {
        "Money".to_owned()
    }

    fn array_type() -> ArrayType {
        ArrayType::String
    }

    fn column_type() -> ColumnType {
        ColumnType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checked_accepts_cents() {
        assert_eq!(Money::checked(dec!(12.34), "Amount").unwrap_or_default(), dec!(12.34));
        assert!(Money::checked(dec!(-0.01), "Amount").is_ok());
        // Trailing zeros do not count as places
        assert!(Money::checked(dec!(5.5000), "Amount").is_ok());
        assert!(Money::checked(dec!(9999999999999999.99), "Amount").is_ok());
    }

    #[test]
    fn test_checked_rejects_extra_places() {
        let result = Money::checked(dec!(1.005), "Amount");
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_checked_rejects_magnitude() {
        let result = Money::checked(dec!(10000000000000000), "Amount");
        assert!(matches!(result, Err(Error::Validation { .. })));
        let result = Money::checked(Decimal::MAX, "Amount");
        assert!(matches!(result, Err(Error::Validation { .. })));
        let result = Money::checked(Decimal::MIN, "Initial balance");
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_value_round_trip_is_exact() {
        let money = Money::new(dec!(1234567890123456.78));
        let value: Value = money.into();
        let back = <Money as ValueType>::try_from(value).ok();
        assert_eq!(back, Some(money));
    }
}
