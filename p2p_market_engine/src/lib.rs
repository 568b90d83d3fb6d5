//! P2P Market Engine
//!
//! The core of a peer-to-peer Bitcoin marketplace. Sellers list an amount of BTC for a USD price, each listing is
//! backed by an invoice on an external payment backend, and the offer moves through a small lifecycle as the invoice
//! is paid and the seller confirms receipt.
//!
//! The library is divided into three sections:
//! 1. The offer store ([`mod@db`]). SQLite is the supported backend. You should never need to access the database
//!    directly. The exception is the data types used in the database. These are defined in [`mod@db_types`] and are
//!    public.
//! 2. The collaborator contracts ([`mod@traits`]). The lifecycle controller depends only on these, so the store and the
//!    payment backend can be swapped out, which is how the tests run without a network.
//! 3. The public API ([`mod@market_api`]). [`OfferFlowApi`] owns every status transition, and
//!    [`SettlementReconciler`] decides whether an offer's invoice has been settled.
//!
//! Every successful status transition is published as an [`events::OfferStatusChangedEvent`]. A simple actor framework
//! is used so that you can hook into these events and perform custom actions, such as notifying the seller.
mod db;

pub mod db_types;
pub mod events;
pub mod market_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use market_api::{
    errors::{OfferFlowError, ReconcileError},
    offer_flow_api::OfferFlowApi,
    offer_objects,
    reconciler::SettlementReconciler,
};
pub use traits::{MarketplaceDatabase, OfferStoreError, PaymentBackend, PaymentBackendError};
