//! # P2P market server
//! This crate hosts the chat bridge for the P2P Bitcoin marketplace. It is responsible for:
//! * Accepting commands from a chat transport over HTTP, tagged with the requesting user's id.
//! * Handing them to the offer lifecycle controller in `p2p_market_engine`.
//! * Rendering the results, either as JSON or as chat-ready text.
//! * Running the background sweep that marks settled offers as paid.
//!
//! The chat transport itself (Telegram or otherwise) is not part of this crate. It only needs to forward messages and
//! button presses and display the replies.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/register`, `/offers`, `/offers/{id}`, `/offers/{id}/confirm`, `/offers/{id}/cancel`, `/marketplace`: The
//!   marketplace operations as JSON endpoints. The caller identifies the user with the `X-Requester-Id` header.
//! * `/command`: Accepts raw chat text (`/sell 0.01 500`) or button callback data (`cancel_offer:3`) and returns a
//!   rendered text reply.
pub mod cli;
pub mod commands;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod reconcile_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
