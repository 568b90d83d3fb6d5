use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::SqlitePool;

use super::{db_url, new_pool, offers, offers::OfferQueryFilter, users, SqliteDatabaseError, DEFAULT_DB_TIMEOUT};
use crate::{
    db_types::{NewOffer, Offer, OfferStatusType, User},
    traits::{MarketplaceDatabase, OfferStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn register_user(&self, user_id: i64, handle: Option<&str>) -> Result<User, OfferStoreError> {
        let mut tx = self.pool.begin().await?;
        users::upsert_user(user_id, handle, &mut tx).await?;
        let user = users::fetch_user(user_id, &mut tx).await?.ok_or(SqliteDatabaseError::UserNotFound(user_id))?;
        tx.commit().await?;
        debug!("🗃️ User #{user_id} is registered as {:?}", user.username);
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, OfferStoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, OfferStoreError> {
        let mut tx = self.pool.begin().await?;
        let owner_id = offer.owner_id;
        let invoice_id = offer.invoice.id.clone();
        let id = offers::insert_offer(offer, &mut tx).await?.ok_or(OfferStoreError::UserNotFound(owner_id))?;
        let offer = offers::fetch_offer(id, &mut tx).await?.ok_or(SqliteDatabaseError::OfferNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Offer #{id} for user #{owner_id} has been saved with invoice {invoice_id}");
        Ok(offer)
    }

    async fn fetch_offer(&self, offer_id: i64) -> Result<Offer, OfferStoreError> {
        let mut conn = self.pool.acquire().await?;
        let offer = offers::fetch_offer(offer_id, &mut conn).await?;
        offer.ok_or(OfferStoreError::OfferNotFound(offer_id))
    }

    async fn fetch_offers_for_owner(&self, owner_id: i64) -> Result<Vec<Offer>, OfferStoreError> {
        let mut conn = self.pool.acquire().await?;
        let query = OfferQueryFilter::default().with_owner_id(owner_id);
        let offers = offers::fetch_offers(query, &mut conn).await?;
        Ok(offers)
    }

    async fn fetch_recent_offers(&self, limit: i64) -> Result<Vec<Offer>, OfferStoreError> {
        let mut conn = self.pool.acquire().await?;
        let query = OfferQueryFilter::default().with_limit(limit);
        let offers = offers::fetch_offers(query, &mut conn).await?;
        Ok(offers)
    }

    async fn fetch_offers_with_status(
        &self,
        status: OfferStatusType,
        limit: i64,
    ) -> Result<Vec<Offer>, OfferStoreError> {
        let mut conn = self.pool.acquire().await?;
        let query = OfferQueryFilter::default().with_status(status).with_limit(limit);
        let offers = offers::fetch_offers(query, &mut conn).await?;
        Ok(offers)
    }

    async fn update_offer_status(&self, offer_id: i64, status: OfferStatusType) -> Result<Offer, OfferStoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = offers::update_status(offer_id, status, &mut tx).await?;
        if updated == 0 {
            return Err(OfferStoreError::OfferNotFound(offer_id));
        }
        let offer = offers::fetch_offer(offer_id, &mut tx).await?.ok_or(OfferStoreError::OfferNotFound(offer_id))?;
        tx.commit().await?;
        trace!("🗃️ Offer #{offer_id} status overwritten with {status}");
        Ok(offer)
    }

    async fn transition_offer_status(
        &self,
        offer_id: i64,
        from: OfferStatusType,
        to: OfferStatusType,
    ) -> Result<Offer, OfferStoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = offers::compare_and_set_status(offer_id, from, to, &mut tx).await?;
        let offer = offers::fetch_offer(offer_id, &mut tx).await?.ok_or(OfferStoreError::OfferNotFound(offer_id))?;
        if updated == 0 {
            debug!("🗃️ Offer #{offer_id} was expected to be {from}, but is {}. Not moving it to {to}", offer.status);
            return Err(OfferStoreError::StatusConflict { id: offer_id, expected: from, found: offer.status });
        }
        tx.commit().await?;
        trace!("🗃️ Offer #{offer_id} moved from {from} to {to}");
        Ok(offer)
    }

    async fn close(&mut self) -> Result<(), OfferStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `P2P_DATABASE_URL`
    pub async fn new() -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), 5).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        Self::new_with_options(url, max_connections, DEFAULT_DB_TIMEOUT).await
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections, timeout).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
