use std::{fmt::Debug, sync::Arc, time::Duration};

use futures_util::future::join_all;
use log::*;
use tokio::time::timeout;

use crate::{
    db_types::{BtcAmount, NewOffer, Offer, OfferAction, OfferStatusType, UsdPrice, User},
    events::{EventProducers, OfferStatusChangedEvent},
    market_api::{
        errors::OfferFlowError,
        offer_objects::{ReconcileSummary, Reconciled},
        reconciler::SettlementReconciler,
    },
    traits::{MarketplaceDatabase, OfferStoreError, PaymentBackend},
};

pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// `OfferFlowApi` is the lifecycle controller for sell offers.
///
/// It is the only component that decides whether a status change is legal. Every change goes through the store as a
/// compare-and-set, so two callers racing on the same offer cannot both win. Successful transitions are published to
/// the `status_changed` event subscribers.
pub struct OfferFlowApi<B, P> {
    db: B,
    payments: Arc<P>,
    reconciler: SettlementReconciler<P>,
    producers: EventProducers,
    backend_timeout: Duration,
}

impl<B, P> Debug for OfferFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OfferFlowApi")
    }
}

impl<B: Clone, P> Clone for OfferFlowApi<B, P> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            payments: Arc::clone(&self.payments),
            reconciler: self.reconciler.clone(),
            producers: self.producers.clone(),
            backend_timeout: self.backend_timeout,
        }
    }
}

impl<B, P> OfferFlowApi<B, P> {
    pub fn new(db: B, payments: Arc<P>, producers: EventProducers) -> Self {
        Self::with_timeout(db, payments, producers, DEFAULT_BACKEND_TIMEOUT)
    }

    /// Like [`new`](Self::new), but every call to the payment backend is abandoned after `backend_timeout`.
    pub fn with_timeout(db: B, payments: Arc<P>, producers: EventProducers, backend_timeout: Duration) -> Self {
        let reconciler = SettlementReconciler::new(Arc::clone(&payments), backend_timeout);
        Self { db, payments, reconciler, producers, backend_timeout }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn reconciler(&self) -> &SettlementReconciler<P> {
        &self.reconciler
    }
}

impl<B, P> OfferFlowApi<B, P>
where
    B: MarketplaceDatabase,
    P: PaymentBackend,
{
    /// Registers a user, or refreshes their handle if they are already known. Safe to call repeatedly.
    pub async fn register_user(&self, user_id: i64, handle: Option<&str>) -> Result<User, OfferFlowError> {
        let user = self.db.register_user(user_id, handle).await?;
        Ok(user)
    }

    /// Creates a new sell offer for `owner_id`.
    ///
    /// The terms are validated first, then an invoice for the offered amount is issued, and only then is the offer
    /// stored. If the invoice cannot be issued, nothing is stored. If the offer cannot be stored after the invoice
    /// was issued, the invoice is left to expire on the backend.
    pub async fn create_offer(
        &self,
        owner_id: i64,
        amount_btc: BtcAmount,
        price_usd: UsdPrice,
    ) -> Result<Offer, OfferFlowError> {
        if !amount_btc.is_positive() {
            return Err(OfferFlowError::InvalidTerms(format!("The amount must be positive, not {amount_btc}")));
        }
        if !price_usd.is_positive() {
            return Err(OfferFlowError::InvalidTerms(format!("The price must be positive, not {price_usd}")));
        }
        let sats = amount_btc.to_sats().map_err(|e| OfferFlowError::InvalidTerms(e.to_string()))?;
        if sats.value() == 0 {
            return Err(OfferFlowError::InvalidTerms(format!("{amount_btc} is less than one satoshi")));
        }
        if self.db.fetch_user(owner_id).await?.is_none() {
            return Err(OfferFlowError::NotRegistered(owner_id));
        }

        let memo = format!("BTC sell offer by {owner_id}");
        let invoice = match timeout(self.backend_timeout, self.payments.issue_invoice(sats, &memo)).await {
            Ok(Ok(invoice)) => invoice,
            Ok(Err(e)) => {
                warn!("🔄️📝️ Could not issue an invoice for {sats} for user #{owner_id}. {e}");
                return Err(OfferFlowError::PaymentBackendError(e.to_string()));
            },
            Err(_) => {
                warn!("🔄️📝️ Invoice issuance for user #{owner_id} timed out after {:?}", self.backend_timeout);
                return Err(OfferFlowError::PaymentBackendError(format!(
                    "No invoice was issued within {:?}",
                    self.backend_timeout
                )));
            },
        };
        let invoice_id = invoice.id.clone();
        let new_offer = NewOffer::new(owner_id, amount_btc, price_usd, invoice);
        let offer = self.db.insert_offer(new_offer).await.map_err(|e| {
            error!("🔄️📝️ Invoice {invoice_id} was issued but the offer could not be saved. It will expire unpaid. {e}");
            OfferFlowError::PersistenceError(e.to_string())
        })?;
        info!("🔄️📝️ Offer #{} created for user #{owner_id}: {amount_btc} for {price_usd}", offer.id);
        Ok(offer)
    }

    /// Fetches the offer as stored, without consulting the payment backend.
    pub async fn fetch_offer(&self, offer_id: i64) -> Result<Offer, OfferFlowError> {
        let offer = self.db.fetch_offer(offer_id).await?;
        Ok(offer)
    }

    /// Brings a single offer up to date with the payment backend and returns it.
    ///
    /// If the backend does not answer, the offer is returned as stored. That is not an error.
    pub async fn refresh_status(&self, offer_id: i64) -> Result<Offer, OfferFlowError> {
        let offer = self.db.fetch_offer(offer_id).await?;
        let result = self.reconcile(offer).await?;
        Ok(result.into_offer())
    }

    /// The owner confirms that the payment for a `paid` offer was received. The offer becomes `completed`.
    pub async fn confirm_payment(&self, offer_id: i64, requester: i64) -> Result<Offer, OfferFlowError> {
        self.owner_transition(offer_id, requester, OfferAction::Confirm).await
    }

    /// The owner withdraws a `pending` offer. The offer becomes `cancelled`.
    pub async fn cancel_offer(&self, offer_id: i64, requester: i64) -> Result<Offer, OfferFlowError> {
        self.owner_transition(offer_id, requester, OfferAction::Cancel).await
    }

    /// All of the owner's offers, most recent first, exactly as stored.
    pub async fn list_owner_offers(&self, owner_id: i64) -> Result<Vec<Offer>, OfferFlowError> {
        let offers = self.db.fetch_offers_for_owner(owner_id).await?;
        Ok(offers)
    }

    /// All of the owner's offers, most recent first, after bringing the pending ones up to date.
    pub async fn refresh_owner_offers(&self, owner_id: i64) -> Result<Vec<Offer>, OfferFlowError> {
        let offers = self.db.fetch_offers_for_owner(owner_id).await?;
        let results = join_all(offers.into_iter().map(|o| self.reconcile(o))).await;
        results.into_iter().map(|r| r.map(Reconciled::into_offer)).collect()
    }

    /// The offers among the `limit` most recent ones that are still open for purchase.
    ///
    /// `limit` counts offers of every status, so closed offers use up slots in the scan. The pending ones are checked
    /// against the payment backend first, and offers found to be settled are dropped from the listing, so a buyer is
    /// never shown an offer that has already been paid. If the backend cannot answer for an offer, it stays listed.
    pub async fn list_marketplace(&self, limit: i64) -> Result<Vec<Offer>, OfferFlowError> {
        let recent = self.db.fetch_recent_offers(limit).await?;
        let candidates = recent.into_iter().filter(|o| o.status == OfferStatusType::Pending).collect::<Vec<_>>();
        trace!("🔄️🛒️ Checking {} marketplace candidates among the {limit} most recent offers", candidates.len());
        let results = join_all(candidates.into_iter().map(|o| self.reconcile(o))).await;
        let mut listing = Vec::with_capacity(results.len());
        for result in results {
            let offer = result?.into_offer();
            if offer.status == OfferStatusType::Pending {
                listing.push(offer);
            }
        }
        Ok(listing)
    }

    /// Checks every pending offer against the payment backend, one at a time, and marks the settled ones as paid.
    pub async fn reconcile_pending(&self) -> Result<ReconcileSummary, OfferFlowError> {
        let pending = self.db.fetch_offers_with_status(OfferStatusType::Pending, 0).await?;
        let mut summary = ReconcileSummary::default();
        for offer in pending {
            let result = self.reconcile(offer).await?;
            summary.record(result);
        }
        Ok(summary)
    }

    /// Reconciles a single offer. Backend failures and lost races are not errors here: the offer is returned as it is
    /// best known. Store failures are.
    async fn reconcile(&self, offer: Offer) -> Result<Reconciled, OfferFlowError> {
        let action = match self.reconciler.observe(&offer).await {
            Ok(Some(action)) => action,
            Ok(None) => return Ok(Reconciled::Unchanged(offer)),
            Err(e) => {
                warn!("🔄️🧾️ Status of offer #{} is unknown. {e}", offer.id);
                return Ok(Reconciled::Unknown(offer));
            },
        };
        match self.apply_transition(&offer, action).await {
            Ok(updated) => Ok(Reconciled::Advanced(updated)),
            Err(OfferFlowError::InvalidState { offer_id, status, .. }) => {
                debug!("🔄️🧾️ Offer #{offer_id} became {status} while it was being reconciled");
                let current = self.db.fetch_offer(offer_id).await?;
                Ok(Reconciled::Unchanged(current))
            },
            Err(e) => Err(e),
        }
    }

    async fn owner_transition(
        &self,
        offer_id: i64,
        requester: i64,
        action: OfferAction,
    ) -> Result<Offer, OfferFlowError> {
        let offer = self.db.fetch_offer(offer_id).await?;
        if !offer.is_owned_by(requester) {
            warn!("🔄️🔐️ User #{requester} tried to {action} offer #{offer_id}, which belongs to #{}", offer.owner_id);
            return Err(OfferFlowError::Unauthorized { offer_id, requester, action, status: offer.status });
        }
        self.apply_transition(&offer, action).await
    }

    /// Applies `action` to `offer`, provided the offer is still in the status it was read with.
    async fn apply_transition(&self, offer: &Offer, action: OfferAction) -> Result<Offer, OfferFlowError> {
        let from = offer.status;
        let to = from.next(action).ok_or(OfferFlowError::InvalidState { offer_id: offer.id, status: from, action })?;
        match self.db.transition_offer_status(offer.id, from, to).await {
            Ok(updated) => {
                info!("🔄️ Offer #{} is now {to} (was {from})", updated.id);
                self.call_status_changed_hook(&updated, from).await;
                Ok(updated)
            },
            Err(OfferStoreError::StatusConflict { id, found, .. }) => {
                debug!("🔄️ Lost the race to {action} offer #{id}. It is now {found}");
                Err(OfferFlowError::InvalidState { offer_id: id, status: found, action })
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn call_status_changed_hook(&self, offer: &Offer, old_status: OfferStatusType) {
        if self.producers.status_changed_producer.is_empty() {
            return;
        }
        debug!("🔄️📬️ Notifying status changed hook subscribers");
        let event = OfferStatusChangedEvent::new(offer.clone(), old_status);
        self.producers.publish_status_changed(event).await;
    }
}
