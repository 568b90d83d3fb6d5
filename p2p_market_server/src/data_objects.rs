use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use p2p_market_engine::{
    db_types::{BtcAmount, Offer, UsdPrice},
    OfferFlowError,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

pub const REQUESTER_HEADER: &str = "X-Requester-Id";

/// The chat user on whose behalf a request is made, taken from the `X-Requester-Id` header.
///
/// The chat transport is trusted to set this header. The server performs no authentication of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester(pub i64);

impl Requester {
    pub fn id(&self) -> i64 {
        self.0
    }

    fn from_request_headers(req: &HttpRequest) -> Result<Self, ServerError> {
        req.headers()
            .get(REQUESTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(Requester)
            .ok_or(ServerError::MissingRequester)
    }
}

impl FromRequest for Requester {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_request_headers(req))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub handle: Option<String>,
}

/// Offer terms as typed by the seller. Kept as text until the engine parses them so that nothing is lost to floats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOfferRequest {
    pub amount_btc: String,
    pub price_usd: String,
}

impl NewOfferRequest {
    /// Parses the terms. Only the syntax is checked here; the lifecycle controller decides whether they are acceptable.
    pub fn terms(&self) -> Result<(BtcAmount, UsdPrice), OfferFlowError> {
        let amount = self
            .amount_btc
            .parse::<BtcAmount>()
            .map_err(|e| OfferFlowError::InvalidTerms(format!("Invalid BTC amount. {e}")))?;
        let price = self
            .price_usd
            .parse::<UsdPrice>()
            .map_err(|e| OfferFlowError::InvalidTerms(format!("Invalid USD price. {e}")))?;
        Ok((amount, price))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceParams {
    pub limit: Option<i64>,
}

/// A message or button press forwarded by the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCommandRequest {
    pub user_id: i64,
    pub handle: Option<String>,
    pub text: String,
}

/// A button to show under a chat reply. Either opens a link or sends `callback` back as a new command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
}

impl ReplyButton {
    pub fn link<L: Into<String>, U: Into<String>>(label: L, url: U) -> Self {
        Self { label: label.into(), url: Some(url.into()), callback: None }
    }

    pub fn callback<L: Into<String>, C: Into<String>>(label: L, callback: C) -> Self {
        Self { label: label.into(), url: None, callback: Some(callback.into()) }
    }
}

/// One chat message worth of reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ReplyButton>,
}

impl ChatMessage {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self { text: text.into(), buttons: vec![] }
    }

    pub fn with_button(mut self, button: ReplyButton) -> Self {
        self.buttons.push(button);
        self
    }
}

/// Everything the chat transport should send back to the user, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub messages: Vec<ChatMessage>,
}

impl ChatReply {
    pub fn single(message: ChatMessage) -> Self {
        Self { messages: vec![message] }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// All message texts joined together. Handy for transports that can only send a single message.
    pub fn full_text(&self) -> String {
        self.messages.iter().map(|m| m.text.as_str()).collect::<Vec<_>>().join("\n\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferListResponse {
    pub offers: Vec<Offer>,
}
