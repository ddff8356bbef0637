//! Exact monetary amounts, persisted as decimal text.

use std::{fmt, ops::Deref, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A money value with no floating-point drift.
///
/// SQLite has no decimal type, so amounts are stored as TEXT and parsed back
/// through `TryFrom<String>` when rows are decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn is_integral(&self) -> bool {
        self.0.fract().is_zero()
    }

    /// Number of significant decimal places once trailing zeros are dropped.
    pub fn decimal_places(&self) -> u32 {
        self.0.normalize().scale()
    }

    /// Canonical text form written to the database.
    pub fn to_db_string(&self) -> String {
        self.0.normalize().to_string()
    }

    /// `None` when the product does not fit in a `Decimal`.
    pub fn checked_times(&self, quantity: i64) -> Option<Amount> {
        self.0.checked_mul(Decimal::from(quantity)).map(Amount)
    }

    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

impl Deref for Amount {
    type Target = Decimal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl TryFrom<String> for Amount {
    type Error = rust_decimal::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Decimal::from_str(value.trim()).map(Self)
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
