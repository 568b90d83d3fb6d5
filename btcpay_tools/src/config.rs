use std::time::Duration;

use log::*;
use p2p_common::Secret;

pub const DEFAULT_EXPIRY_MINUTES: u32 = 60;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct BtcPayConfig {
    /// The base URL of the BTCPay Server instance, without a trailing slash
    pub url: String,
    pub api_key: Secret<String>,
    pub store_id: String,
    /// Upper bound on every request to the server
    pub timeout: Duration,
    /// How long a buyer has to pay an invoice before BTCPay expires it
    pub invoice_expiry_minutes: u32,
}

impl Default for BtcPayConfig {
    fn default() -> Self {
        Self {
            url: "https://your.btcpayserver.com".to_string(),
            api_key: Secret::default(),
            store_id: String::default(),
            timeout: DEFAULT_TIMEOUT,
            invoice_expiry_minutes: DEFAULT_EXPIRY_MINUTES,
        }
    }
}

impl BtcPayConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let url = std::env::var("P2P_BTCPAY_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                warn!("🪛️ P2P_BTCPAY_URL not set, using (probably useless) default {}", defaults.url);
                defaults.url
            });
        let api_key = Secret::new(std::env::var("P2P_BTCPAY_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ P2P_BTCPAY_API_KEY not set. BTCPay Server will reject every request.");
            String::default()
        }));
        let store_id = std::env::var("P2P_BTCPAY_STORE_ID").unwrap_or_else(|_| {
            warn!("🪛️ P2P_BTCPAY_STORE_ID not set. BTCPay Server will reject every request.");
            String::default()
        });
        let timeout = std::env::var("P2P_BTCPAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok().map(Duration::from_secs))
            .unwrap_or_else(|| {
                info!("🪛️ P2P_BTCPAY_TIMEOUT_SECS not set or invalid, using {:?}", defaults.timeout);
                defaults.timeout
            });
        let invoice_expiry_minutes = std::env::var("P2P_INVOICE_EXPIRY_MINUTES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or_else(|| {
                info!("🪛️ P2P_INVOICE_EXPIRY_MINUTES not set or invalid, using {DEFAULT_EXPIRY_MINUTES}");
                DEFAULT_EXPIRY_MINUTES
            });
        Self { url, api_key, store_id, timeout, invoice_expiry_minutes }
    }
}
