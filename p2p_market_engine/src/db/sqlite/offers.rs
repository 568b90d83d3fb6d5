use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewOffer, Offer, OfferStatusType},
};

const OFFER_SELECT: &str = r#"
    SELECT
        o.id,
        o.user_id AS owner_id,
        u.username AS owner_handle,
        o.amount_btc,
        o.price_usd,
        o.invoice_id,
        o.invoice_link,
        o.status,
        o.created_at,
        o.updated_at
    FROM offers o LEFT JOIN users u ON o.user_id = u.user_id
"#;

/// Inserts a new offer with `pending` status using the given connection and returns its id.
///
/// The owner check and the insert are one statement, so no offer can be written for a user that does not exist.
/// Returns `None` if the owner is not registered.
pub async fn insert_offer(offer: NewOffer, conn: &mut SqliteConnection) -> Result<Option<i64>, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO offers (
                user_id,
                amount_btc,
                price_usd,
                invoice_id,
                invoice_link,
                status
            )
            SELECT ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM users WHERE user_id = ?)
            RETURNING id;
        "#,
    )
    .bind(offer.owner_id)
    .bind(offer.amount_btc.value().to_string())
    .bind(offer.price_usd.value().to_string())
    .bind(offer.invoice.id)
    .bind(offer.invoice.link)
    .bind(OfferStatusType::Pending.to_string())
    .bind(offer.owner_id)
    .fetch_optional(conn)
    .await?;
    Ok(id)
}

#[derive(Debug, Clone, Default)]
pub struct OfferQueryFilter {
    offer_id: Option<i64>,
    owner_id: Option<i64>,
    statuses: Vec<OfferStatusType>,
    limit: Option<i64>,
}

impl OfferQueryFilter {
    pub fn with_offer_id(mut self, offer_id: i64) -> Self {
        self.offer_id = Some(offer_id);
        self
    }

    pub fn with_owner_id(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_status(mut self, status: OfferStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    /// Limits the number of rows returned. Zero or negative values mean no limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.offer_id.is_none() && self.owner_id.is_none() && self.statuses.is_empty()
    }
}

/// Fetches offers according to criteria specified in the `OfferQueryFilter`.
///
/// Results are ordered from most to least recent.
pub async fn fetch_offers(
    query: OfferQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Offer>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new(OFFER_SELECT);
    if !query.is_empty() {
        builder.push(" WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(id) = query.offer_id {
        where_clause.push("o.id = ");
        where_clause.push_bind_unseparated(id);
    }
    if let Some(owner_id) = query.owner_id {
        where_clause.push("o.user_id = ");
        where_clause.push_bind_unseparated(owner_id);
    }
    if !query.statuses.is_empty() {
        where_clause.push("o.status IN (");
        for (i, status) in query.statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY o.created_at DESC, o.id DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let offers = builder.build_query_as::<Offer>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_offers: {} rows", offers.len());
    Ok(offers)
}

/// Fetches a single offer, including the owner's handle.
pub async fn fetch_offer(offer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Offer>, SqliteDatabaseError> {
    let query = OfferQueryFilter::default().with_offer_id(offer_id);
    let mut offers = fetch_offers(query, conn).await?;
    Ok(offers.pop())
}

/// Unconditionally sets the status of the offer. Returns the number of rows affected.
pub async fn update_status(
    offer_id: i64,
    status: OfferStatusType,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE offers SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(status.to_string())
        .bind(offer_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Sets the status of the offer, but only if it currently has status `from`. Returns the number of rows affected,
/// which is zero when the offer does not exist or its status has moved on.
pub async fn compare_and_set_status(
    offer_id: i64,
    from: OfferStatusType,
    to: OfferStatusType,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE offers SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND status = ?")
        .bind(to.to_string())
        .bind(offer_id)
        .bind(from.to_string())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
