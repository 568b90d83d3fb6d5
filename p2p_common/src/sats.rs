use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const SATS_PER_BTC: i64 = 100_000_000;

//--------------------------------------        Sats         ---------------------------------------------------------
/// An amount in satoshis, the smallest unit an invoice can be denominated in.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Sats(i64);

op!(binary Sats, Add, add);
op!(binary Sats, Sub, sub);
op!(inplace Sats, AddAssign, add_assign);

impl Sum for Sats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in sats: {0}")]
pub struct SatsConversionError(String);

impl From<i64> for Sats {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<Decimal> for Sats {
    type Error = SatsConversionError;

    fn try_from(btc: Decimal) -> Result<Self, Self::Error> {
        Self::from_btc(btc)
    }
}

impl Display for Sats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.abs() < 100_000 {
            write!(f, "{} sats", self.0)
        } else {
            write!(f, "{} BTC", self.to_btc())
        }
    }
}

impl Sats {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Converts a BTC amount into sats using exact decimal arithmetic. Fractions of a sat are truncated toward zero.
    pub fn from_btc(btc: Decimal) -> Result<Self, SatsConversionError> {
        if btc.is_sign_negative() && !btc.is_zero() {
            return Err(SatsConversionError(format!("{btc} is negative")));
        }
        btc.checked_mul(Decimal::from(SATS_PER_BTC))
            .map(|d| d.trunc())
            .and_then(|d| d.to_i64())
            .map(Self)
            .ok_or_else(|| SatsConversionError(format!("{btc} BTC is too large")))
    }

    /// The exact BTC value of this amount, with trailing zeros removed.
    pub fn to_btc(&self) -> Decimal {
        Decimal::new(self.0, 8).normalize()
    }
}
