use p2p_common::Sats;
use thiserror::Error;

use crate::db_types::Invoice;

#[derive(Debug, Clone, Error)]
pub enum PaymentBackendError {
    /// The backend could not be reached, or did not answer in time.
    #[error("Payment backend unavailable: {0}")]
    Unavailable(String),
    /// The backend answered, but refused the request or sent something we could not understand.
    #[error("Payment backend rejected the request: {0}")]
    Rejected(String),
}

/// The external service that backs every offer with a payment request.
///
/// Implementations are treated as untrusted and possibly slow. Callers wrap every call in a timeout.
#[allow(async_fn_in_trait)]
pub trait PaymentBackend {
    /// Issues a new invoice for `amount`. The `memo` is attached to the invoice for bookkeeping on the backend.
    async fn issue_invoice(&self, amount: Sats, memo: &str) -> Result<Invoice, PaymentBackendError>;

    /// Reports whether the invoice has been settled. Must not have side effects.
    async fn check_settled(&self, invoice_id: &str) -> Result<bool, PaymentBackendError>;
}
