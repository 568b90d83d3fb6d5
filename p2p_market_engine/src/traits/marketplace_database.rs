use thiserror::Error;

use crate::db_types::{NewOffer, Offer, OfferStatusType, User};

#[derive(Debug, Clone, Error)]
pub enum OfferStoreError {
    #[error("Offer #{0} does not exist")]
    OfferNotFound(i64),
    #[error("User #{0} is not registered")]
    UserNotFound(i64),
    #[error("Offer #{id} is {found}, not {expected}. The status update was rejected")]
    StatusConflict { id: i64, expected: OfferStatusType, found: OfferStatusType },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// The durable record of users and offers.
///
/// Every method is a single atomic operation against the backing store. Offer status is never cached by callers;
/// each read goes back to the store.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Registers a user. This call is idempotent: an existing user is left in place, although a new non-empty handle
    /// replaces the stored one.
    async fn register_user(&self, user_id: i64, handle: Option<&str>) -> Result<User, OfferStoreError>;

    /// Fetches the user with the given id, or `None` if they have never registered.
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, OfferStoreError>;

    /// Stores a new offer with status `pending`, in a single transaction.
    ///
    /// Fails with [`OfferStoreError::UserNotFound`] if the owner is not registered.
    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, OfferStoreError>;

    /// Fetches an offer along with its owner's handle. Fails with [`OfferStoreError::OfferNotFound`] if it does not
    /// exist.
    async fn fetch_offer(&self, offer_id: i64) -> Result<Offer, OfferStoreError>;

    /// All offers belonging to `owner_id`, most recent first.
    async fn fetch_offers_for_owner(&self, owner_id: i64) -> Result<Vec<Offer>, OfferStoreError>;

    /// The most recent offers across all owners, most recent first. A `limit` of zero or less means no limit.
    async fn fetch_recent_offers(&self, limit: i64) -> Result<Vec<Offer>, OfferStoreError>;

    /// The most recent offers with the given status, most recent first. A `limit` of zero or less means no limit.
    async fn fetch_offers_with_status(&self, status: OfferStatusType, limit: i64)
        -> Result<Vec<Offer>, OfferStoreError>;

    /// Writes `status` and refreshes `updated_at`, whatever the current status is.
    ///
    /// This is a bare write. Callers that care about transition legality should use
    /// [`transition_offer_status`](Self::transition_offer_status) instead.
    async fn update_offer_status(&self, offer_id: i64, status: OfferStatusType) -> Result<Offer, OfferStoreError>;

    /// Moves the offer from `from` to `to`, provided that the stored status is still `from`.
    ///
    /// If another writer got there first, nothing is written and [`OfferStoreError::StatusConflict`] reports the
    /// status that was actually found.
    async fn transition_offer_status(
        &self,
        offer_id: i64,
        from: OfferStatusType,
        to: OfferStatusType,
    ) -> Result<Offer, OfferStoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OfferStoreError> {
        Ok(())
    }
}
