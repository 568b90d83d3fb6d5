use std::fmt::Display;

use chrono::{DateTime, Utc};
use p2p_common::Sats;
use serde::{Deserialize, Serialize};

pub const LIGHTNING_PAYMENT_METHOD: &str = "BTC-LightningNetwork";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoiceRequest {
    /// Decimal string in BTC. BTCPay parses this exactly, so no floating point is involved.
    pub amount: String,
    pub currency: String,
    pub metadata: InvoiceMetadata,
    pub checkout: CheckoutOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMetadata {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOptions {
    pub payment_methods: Vec<String>,
    pub expiration_minutes: u32,
}

impl NewInvoiceRequest {
    /// A Lightning invoice for `amount`, tagged with `memo` as the order id.
    pub fn lightning(amount: Sats, memo: &str, expiration_minutes: u32) -> Self {
        Self {
            amount: amount.to_btc().to_string(),
            currency: "BTC".to_string(),
            metadata: InvoiceMetadata { order_id: memo.to_string() },
            checkout: CheckoutOptions {
                payment_methods: vec![LIGHTNING_PAYMENT_METHOD.to_string()],
                expiration_minutes,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum InvoiceStatus {
    New,
    Processing,
    Expired,
    Invalid,
    Settled,
    Complete,
    #[serde(other)]
    Unknown,
}

impl InvoiceStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled | Self::Complete)
    }
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtcPayInvoice {
    pub id: String,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub checkout_link: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expiration_time: Option<DateTime<Utc>>,
}
