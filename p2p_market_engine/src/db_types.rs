use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use p2p_common::{Sats, SatsConversionError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

//--------------------------------------   Decimal amounts    ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
#[error("Invalid amount: {0}")]
pub struct AmountParseError(String);

/// Declares a decimal-valued newtype. Values are kept as exact decimals end to end and stored as text, so whatever
/// the seller typed is exactly what comes back out of the database.
macro_rules! decimal_amount {
    ($name:ident, $unit:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Decimal);

        impl $name {
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            pub fn value(&self) -> Decimal {
                self.0
            }

            pub fn is_positive(&self) -> bool {
                self.0 > Decimal::ZERO
            }
        }

        impl From<Decimal> for $name {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = AmountParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Decimal::from_str(s.trim()).map(Self).map_err(|e| AmountParseError(format!("'{s}' ({e})")))
            }
        }

        impl TryFrom<String> for $name {
            type Error = AmountParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", self.0.normalize(), $unit)
            }
        }
    };
}

decimal_amount!(BtcAmount, "BTC");
decimal_amount!(UsdPrice, "USD");

impl BtcAmount {
    /// The invoice amount for this offer. Multiplies by 10^8 in decimal arithmetic and truncates toward zero.
    pub fn to_sats(&self) -> Result<Sats, SatsConversionError> {
        Sats::from_btc(self.0)
    }
}

//--------------------------------------   OfferStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatusType {
    /// The offer is listed and its invoice has not been settled yet.
    Pending,
    /// The payment backend reported the invoice as settled. Waiting on the seller to confirm.
    Paid,
    /// The seller confirmed receipt of payment.
    Completed,
    /// The seller withdrew the offer before it was paid.
    Cancelled,
}

impl OfferStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The offer state machine.
    ///
    /// | From      | Action   | To        |
    /// |-----------|----------|-----------|
    /// | Pending   | MarkPaid | Paid      |
    /// | Paid      | Confirm  | Completed |
    /// | Pending   | Cancel   | Cancelled |
    ///
    /// Every other combination is illegal and returns `None`.
    pub fn next(self, action: OfferAction) -> Option<OfferStatusType> {
        use OfferAction::*;
        use OfferStatusType::*;
        match (self, action) {
            (Pending, MarkPaid) => Some(Paid),
            (Paid, Confirm) => Some(Completed),
            (Pending, Cancel) => Some(Cancelled),
            _ => None,
        }
    }
}

impl Display for OfferStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferStatusType::Pending => write!(f, "pending"),
            OfferStatusType::Paid => write!(f, "paid"),
            OfferStatusType::Completed => write!(f, "completed"),
            OfferStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid offer status: {0}")]
pub struct ConversionError(String);

impl FromStr for OfferStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl TryFrom<String> for OfferStatusType {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------     OfferAction       ---------------------------------------------------------
/// The events that can move an offer through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferAction {
    /// Settlement of the invoice was observed on the payment backend.
    MarkPaid,
    /// The owner confirms the payment was received.
    Confirm,
    /// The owner withdraws the offer.
    Cancel,
}

impl Display for OfferAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferAction::MarkPaid => write!(f, "settle"),
            OfferAction::Confirm => write!(f, "confirm payment for"),
            OfferAction::Cancel => write!(f, "cancel"),
        }
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    /// The stable numeric identity the chat platform assigns to the user
    pub user_id: i64,
    /// The display handle, if the user has one
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Invoice        ---------------------------------------------------------
/// The payment request issued by the payment backend for an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    /// Where the buyer is redirected to pay the invoice
    pub link: String,
}

impl Invoice {
    pub fn new<S: Into<String>, L: Into<String>>(id: S, link: L) -> Self {
        Self { id: id.into(), link: link.into() }
    }
}

//--------------------------------------       NewOffer       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOffer {
    pub owner_id: i64,
    pub amount_btc: BtcAmount,
    pub price_usd: UsdPrice,
    pub invoice: Invoice,
}

impl NewOffer {
    pub fn new(owner_id: i64, amount_btc: BtcAmount, price_usd: UsdPrice, invoice: Invoice) -> Self {
        Self { owner_id, amount_btc, price_usd, invoice }
    }
}

//--------------------------------------        Offer         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub owner_id: i64,
    /// The owner's handle, resolved from the users table at query time
    pub owner_handle: Option<String>,
    #[sqlx(try_from = "String")]
    pub amount_btc: BtcAmount,
    #[sqlx(try_from = "String")]
    pub price_usd: UsdPrice,
    pub invoice_id: String,
    pub invoice_link: String,
    #[sqlx(try_from = "String")]
    pub status: OfferStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }

    /// The name to show for the seller. Falls back to the numeric id for users without a handle.
    pub fn seller_name(&self) -> String {
        match self.owner_handle.as_deref() {
            Some(h) if !h.is_empty() => format!("@{h}"),
            _ => format!("User #{}", self.owner_id),
        }
    }
}
