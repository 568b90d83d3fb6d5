use thiserror::Error;

use crate::{
    db_types::{OfferAction, OfferStatusType},
    traits::OfferStoreError,
};

/// Everything that can go wrong with an offer operation.
///
/// `InvalidTerms`, `NotRegistered`, `Unauthorized` and `InvalidState` are caller mistakes; they are never retried.
/// The remaining variants are system faults.
#[derive(Debug, Clone, Error)]
pub enum OfferFlowError {
    #[error("Invalid offer terms. {0}")]
    InvalidTerms(String),
    #[error("User #{0} is not registered")]
    NotRegistered(i64),
    #[error("Offer #{0} does not exist")]
    NotFound(i64),
    #[error("User #{requester} may not {action} offer #{offer_id}, which is {status} and belongs to someone else")]
    Unauthorized { offer_id: i64, requester: i64, action: OfferAction, status: OfferStatusType },
    #[error("Cannot {action} offer #{offer_id} because it is {status}")]
    InvalidState { offer_id: i64, status: OfferStatusType, action: OfferAction },
    #[error("The payment backend could not issue an invoice. {0}")]
    PaymentBackendError(String),
    #[error("The payment backend is temporarily unavailable. {0}")]
    BackendUnavailable(String),
    #[error("Could not read or write the offer store. {0}")]
    PersistenceError(String),
}

impl OfferFlowError {
    /// True for errors caused by the caller rather than by the system.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTerms(_) | Self::NotRegistered(_) | Self::Unauthorized { .. } | Self::InvalidState { .. }
        )
    }
}

impl From<OfferStoreError> for OfferFlowError {
    fn from(e: OfferStoreError) -> Self {
        match e {
            OfferStoreError::OfferNotFound(id) => Self::NotFound(id),
            e => Self::PersistenceError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Could not check settlement of invoice {invoice_id}. {reason}")]
    BackendUnavailable { invoice_id: String, reason: String },
}

impl From<ReconcileError> for OfferFlowError {
    fn from(e: ReconcileError) -> Self {
        Self::BackendUnavailable(e.to_string())
    }
}
