//! # Marketplace public API
//!
//! The `market_api` module exposes the programmatic API of the marketplace engine.
//!
//! * [`offer_flow_api`] is the offer lifecycle controller. It is the single authority on which status transitions are
//!   legal, checks ownership, and writes every change through the store.
//! * [`reconciler`] asks the payment backend whether an offer's invoice has been settled and reports whether the
//!   stored status lags behind. It never writes anything itself.
//!
//! # API usage
//!
//! The API is constructed from explicitly supplied collaborators: a store implementing
//! [`MarketplaceDatabase`](crate::MarketplaceDatabase) and a payment backend implementing
//! [`PaymentBackend`](crate::PaymentBackend).
//!
//! ```rust,ignore
//! let db = SqliteDatabase::new_with_url("sqlite://data/btc_trades.db", 5).await?;
//! let api = OfferFlowApi::new(db, Arc::new(btcpay), EventProducers::default());
//! let offer = api.create_offer(user_id, "0.01".parse()?, "500".parse()?).await?;
//! ```
pub mod errors;
pub mod offer_flow_api;
pub mod offer_objects;
pub mod reconciler;

#[cfg(test)]
mod mocks;
