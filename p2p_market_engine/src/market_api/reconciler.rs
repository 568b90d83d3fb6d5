use std::{fmt::Debug, sync::Arc, time::Duration};

use log::*;
use tokio::time::timeout;

use crate::{
    db_types::{Offer, OfferAction, OfferStatusType},
    market_api::errors::ReconcileError,
    traits::PaymentBackend,
};

/// Compares an offer's stored status with what the payment backend knows about its invoice.
///
/// The reconciler is read-only. It reports the action that would bring the stored status up to date, and leaves it to
/// the lifecycle controller to apply it.
pub struct SettlementReconciler<P> {
    backend: Arc<P>,
    timeout: Duration,
}

impl<P> Debug for SettlementReconciler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementReconciler (timeout: {:?})", self.timeout)
    }
}

impl<P> Clone for SettlementReconciler<P> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend), timeout: self.timeout }
    }
}

impl<P> SettlementReconciler<P> {
    pub fn new(backend: Arc<P>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<P: PaymentBackend> SettlementReconciler<P> {
    /// Asks the payment backend whether the invoice is settled. A backend error or a slow answer both count as
    /// "unavailable", and callers must treat that as "unknown", never as "unpaid".
    pub async fn is_settled(&self, invoice_id: &str) -> Result<bool, ReconcileError> {
        let unavailable = |reason: String| ReconcileError::BackendUnavailable { invoice_id: invoice_id.into(), reason };
        match timeout(self.timeout, self.backend.check_settled(invoice_id)).await {
            Ok(Ok(settled)) => {
                trace!("🧾️ Invoice {invoice_id} settled: {settled}");
                Ok(settled)
            },
            Ok(Err(e)) => Err(unavailable(e.to_string())),
            Err(_) => Err(unavailable(format!("no answer within {:?}", self.timeout))),
        }
    }

    /// Returns the action to apply to `offer`, if any.
    ///
    /// Only pending offers are ever checked. Anything past `pending` cannot be moved by settlement, so the backend is
    /// not consulted.
    pub async fn observe(&self, offer: &Offer) -> Result<Option<OfferAction>, ReconcileError> {
        if offer.status != OfferStatusType::Pending {
            return Ok(None);
        }
        let settled = self.is_settled(&offer.invoice_id).await?;
        if settled {
            debug!("🧾️ Invoice {} for offer #{} has been settled", offer.invoice_id, offer.id);
            Ok(Some(OfferAction::MarkPaid))
        } else {
            Ok(None)
        }
    }
}
