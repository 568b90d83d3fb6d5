use btcpay_tools::{BtcPayApi, BtcPayApiError, BtcPayConfig};
use log::*;
use p2p_common::Sats;
use p2p_market_engine::{db_types::Invoice, PaymentBackend, PaymentBackendError};

/// BTCPay Server as the marketplace's payment backend.
#[derive(Debug, Clone)]
pub struct BtcPayBackend {
    api: BtcPayApi,
}

impl BtcPayBackend {
    pub fn new(config: BtcPayConfig) -> Result<Self, BtcPayApiError> {
        let api = BtcPayApi::new(config)?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &BtcPayApi {
        &self.api
    }
}

impl PaymentBackend for BtcPayBackend {
    async fn issue_invoice(&self, amount: Sats, memo: &str) -> Result<Invoice, PaymentBackendError> {
        let invoice = self.api.create_invoice(amount, memo).await.map_err(to_backend_error)?;
        let link = invoice
            .checkout_link
            .ok_or_else(|| PaymentBackendError::Rejected(format!("Invoice {} has no checkout link", invoice.id)))?;
        debug!("💳️ Invoice {} issued for {amount}", invoice.id);
        Ok(Invoice::new(invoice.id, link))
    }

    async fn check_settled(&self, invoice_id: &str) -> Result<bool, PaymentBackendError> {
        self.api.is_settled(invoice_id).await.map_err(to_backend_error)
    }
}

/// Transport failures and server-side errors may clear up by themselves. Anything else means BTCPay said no.
fn to_backend_error(e: BtcPayApiError) -> PaymentBackendError {
    if e.is_transient() {
        warn!("💳️ BTCPay Server is unavailable. {e}");
        PaymentBackendError::Unavailable(e.to_string())
    } else {
        error!("💳️ BTCPay Server rejected the request. {e}");
        PaymentBackendError::Rejected(e.to_string())
    }
}
