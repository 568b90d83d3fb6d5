//! # Collaborator contracts
//!
//! This module defines the interfaces the offer lifecycle depends on. Nothing in here knows about SQLite or BTCPay;
//! backends implement these traits and are handed to the [`OfferFlowApi`](crate::OfferFlowApi) at construction time.
//!
//! * [`MarketplaceDatabase`] is the durable record of users and offers. It is the only writer of offer status, but it
//!   does not judge whether a status change is legal. That is the job of the lifecycle controller.
//! * [`PaymentBackend`] issues invoices and reports whether they have been settled.
mod marketplace_database;
mod payment_backend;

pub use marketplace_database::{MarketplaceDatabase, OfferStoreError};
pub use payment_backend::{PaymentBackend, PaymentBackendError};
