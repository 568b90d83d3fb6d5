use serde::{Deserialize, Serialize};

use crate::db_types::{Offer, OfferStatusType};

/// Published after an offer status change has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferStatusChangedEvent {
    /// The offer as it was stored after the change
    pub offer: Offer,
    pub old_status: OfferStatusType,
}

impl OfferStatusChangedEvent {
    pub fn new(offer: Offer, old_status: OfferStatusType) -> Self {
        Self { offer, old_status }
    }

    pub fn new_status(&self) -> OfferStatusType {
        self.offer.status
    }
}
