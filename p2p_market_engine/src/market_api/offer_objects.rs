use serde::{Deserialize, Serialize};

use crate::db_types::Offer;

/// What happened when an offer was checked against the payment backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The stored status was already up to date, or the offer is past `pending`.
    Unchanged(Offer),
    /// Settlement was observed and the offer moved to `paid`.
    Advanced(Offer),
    /// The payment backend could not answer. The offer is returned as stored.
    Unknown(Offer),
}

impl Reconciled {
    pub fn offer(&self) -> &Offer {
        match self {
            Self::Unchanged(o) | Self::Advanced(o) | Self::Unknown(o) => o,
        }
    }

    pub fn into_offer(self) -> Offer {
        match self {
            Self::Unchanged(o) | Self::Advanced(o) | Self::Unknown(o) => o,
        }
    }
}

/// The outcome of a sweep over all pending offers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// How many pending offers were checked
    pub checked: usize,
    /// The offers that moved to `paid` during this sweep
    pub newly_paid: Vec<Offer>,
    /// How many offers could not be checked because the payment backend did not answer
    pub unknown: usize,
}

impl ReconcileSummary {
    pub fn record(&mut self, result: Reconciled) {
        self.checked += 1;
        match result {
            Reconciled::Advanced(offer) => self.newly_paid.push(offer),
            Reconciled::Unknown(_) => self.unknown += 1,
            Reconciled::Unchanged(_) => {},
        }
    }
}
