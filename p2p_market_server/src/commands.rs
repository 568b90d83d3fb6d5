//! Chat commands
//!
//! Parses the text (or button callback data) that a chat transport forwards to `/command`, runs it against the
//! [`OfferFlowApi`], and renders the outcome as chat messages. Errors are rendered too: a chat user should always get a
//! reply, so [`execute_command`] never fails.
use std::str::FromStr;

use log::*;
use p2p_market_engine::{
    db_types::{Offer, OfferStatusType},
    MarketplaceDatabase,
    OfferFlowApi,
    OfferFlowError,
    PaymentBackend,
};
use thiserror::Error;

use crate::data_objects::{ChatCommandRequest, ChatMessage, ChatReply, NewOfferRequest, ReplyButton};

pub const CONFIRM_PAYMENT_PREFIX: &str = "confirm_payment:";
pub const CANCEL_OFFER_PREFIX: &str = "cancel_offer:";
/// Per-offer buttons are only attached to this many offers in an owner listing.
pub const MAX_OFFERS_WITH_BUTTONS: usize = 10;

pub const HELP_TEXT: &str = "*P2P Bitcoin Shop Help*

*Available Commands:*
/start - Register as a user and show main menu
/sell <amount_btc> <price_usd> - Create a sell offer
/list - List your offers
/marketplace - Browse all available offers
/help - Show this help message

*How to use:*
1. Register with /start
2. Create an offer with /sell or use the button
3. View your offers with /list or use the button
4. Browse available offers in the marketplace
5. When you receive payment, confirm it to release funds

*Offer Status:*
⏳ Pending - Waiting for payment
💰 Paid - Payment received but not confirmed
✅ Completed - Payment confirmed, funds released
❌ Cancelled - Offer cancelled";

pub const SELL_USAGE: &str = "To create a new offer, send a message in this format:

/sell <amount_btc> <price_usd>

Example: /sell 0.01 500

This will create an offer to sell 0.01 BTC for $500.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Sell { amount_btc: String, price_usd: String },
    /// `/sell` without exactly two arguments, or the "Create Offer" button
    SellUsage,
    List,
    Marketplace,
    Help,
    ConfirmPayment(i64),
    CancelOffer(i64),
    /// Anything that isn't a command
    Menu,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Unknown command {0}. Send /help to see what I understand.")]
    UnknownCommand(String),
    #[error("'{0}' is not a valid offer number")]
    InvalidOfferId(String),
}

impl FromStr for ChatCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Some(id) = text.strip_prefix(CONFIRM_PAYMENT_PREFIX) {
            return parse_offer_id(id).map(ChatCommand::ConfirmPayment);
        }
        if let Some(id) = text.strip_prefix(CANCEL_OFFER_PREFIX) {
            return parse_offer_id(id).map(ChatCommand::CancelOffer);
        }
        // Menu buttons
        match text {
            "create_offer" => return Ok(ChatCommand::SellUsage),
            "list_offers" => return Ok(ChatCommand::List),
            "marketplace" => return Ok(ChatCommand::Marketplace),
            "help" => return Ok(ChatCommand::Help),
            _ => {},
        }
        let mut words = text.split_whitespace();
        let Some(first) = words.next().filter(|w| w.starts_with('/')) else {
            return Ok(ChatCommand::Menu);
        };
        // Group chats address commands as /sell@SomeBot
        let command = first.split('@').next().unwrap_or(first);
        let args = words.collect::<Vec<&str>>();
        match command {
            "/start" => Ok(ChatCommand::Start),
            "/sell" => match args.as_slice() {
                [amount_btc, price_usd] => {
                    Ok(ChatCommand::Sell { amount_btc: amount_btc.to_string(), price_usd: price_usd.to_string() })
                },
                _ => Ok(ChatCommand::SellUsage),
            },
            "/list" => Ok(ChatCommand::List),
            "/marketplace" => Ok(ChatCommand::Marketplace),
            "/help" => Ok(ChatCommand::Help),
            other => Err(CommandParseError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_offer_id(s: &str) -> Result<i64, CommandParseError> {
    s.trim().parse::<i64>().map_err(|_| CommandParseError::InvalidOfferId(s.to_string()))
}

/// Runs a chat command on behalf of `request.user_id` and renders the reply.
pub async fn execute_command<B, P>(
    api: &OfferFlowApi<B, P>,
    marketplace_limit: i64,
    request: &ChatCommandRequest,
) -> ChatReply
where
    B: MarketplaceDatabase,
    P: PaymentBackend,
{
    let user_id = request.user_id;
    let command = match request.text.parse::<ChatCommand>() {
        Ok(c) => c,
        Err(e) => {
            debug!("💬️ Could not parse '{}' from user #{user_id}. {e}", request.text);
            return ChatReply::single(ChatMessage::text(e.to_string()));
        },
    };
    debug!("💬️ User #{user_id} sent {command:?}");
    let result = match command {
        ChatCommand::Start => {
            api.register_user(user_id, request.handle.as_deref()).await.map(|_| render_welcome())
        },
        ChatCommand::Sell { amount_btc, price_usd } => match (NewOfferRequest { amount_btc, price_usd }).terms() {
            Ok((amount, price)) => api.create_offer(user_id, amount, price).await.map(|o| render_new_offer(&o)),
            Err(e) => Err(e),
        },
        ChatCommand::SellUsage => Ok(ChatReply::single(ChatMessage::text(SELL_USAGE))),
        ChatCommand::List => api.refresh_owner_offers(user_id).await.map(|offers| render_owner_offers(&offers)),
        ChatCommand::Marketplace => {
            api.list_marketplace(marketplace_limit).await.map(|offers| render_marketplace(&offers))
        },
        ChatCommand::Help => Ok(ChatReply::single(ChatMessage::text(HELP_TEXT))),
        ChatCommand::ConfirmPayment(id) => api.confirm_payment(id, user_id).await.map(|o| render_confirmed(&o)),
        ChatCommand::CancelOffer(id) => api.cancel_offer(id, user_id).await.map(|o| render_cancelled(&o)),
        ChatCommand::Menu => Ok(render_menu("Choose an option:")),
    };
    result.unwrap_or_else(|e| {
        if e.is_caller_error() {
            debug!("💬️ Command from user #{user_id} was refused. {e}");
        } else {
            warn!("💬️ Command from user #{user_id} failed. {e}");
        }
        ChatReply::single(ChatMessage::text(render_error(&e)))
    })
}

//--------------------------------------     Rendering     ---------------------------------------------------------

pub fn status_marker(status: OfferStatusType) -> &'static str {
    match status {
        OfferStatusType::Pending => "⏳",
        OfferStatusType::Paid => "💰",
        OfferStatusType::Completed => "✅",
        OfferStatusType::Cancelled => "❌",
    }
}

fn amount_line(offer: &Offer) -> String {
    format!("🔹 Amount: {} BTC\n🔹 Price: ${}", offer.amount_btc.value().normalize(), offer.price_usd.value().normalize())
}

fn date_line(offer: &Offer) -> String {
    format!("🔹 Date: {}", offer.created_at.format("%d %b %y %H:%M UTC"))
}

fn render_menu(greeting: &str) -> ChatReply {
    let message = ChatMessage::text(greeting)
        .with_button(ReplyButton::callback("🔄 Create Offer", "create_offer"))
        .with_button(ReplyButton::callback("📋 My Offers", "list_offers"))
        .with_button(ReplyButton::callback("🛒 Marketplace", "marketplace"))
        .with_button(ReplyButton::callback("❓ Help", "help"));
    ChatReply::single(message)
}

fn render_welcome() -> ChatReply {
    let mut reply = ChatReply::single(ChatMessage::text("Successfully registered!"));
    reply.messages.extend(render_menu("Welcome to P2P Bitcoin Shop! Choose an option:").messages);
    reply
}

pub fn render_new_offer(offer: &Offer) -> ChatReply {
    let text = format!(
        "✅ Offer #{} created!\n\n{}\n\nClick the button below to view the Lightning invoice:",
        offer.id,
        amount_line(offer)
    );
    ChatReply::single(ChatMessage::text(text).with_button(ReplyButton::link("View Invoice", &offer.invoice_link)))
}

pub fn render_offer(offer: &Offer) -> String {
    format!(
        "*Offer #{}*\n{}\n{}\n🔹 Status: {} {}",
        offer.id,
        amount_line(offer),
        date_line(offer),
        status_marker(offer.status),
        offer.status
    )
}

/// One message per offer, newest first. Buttons follow the state machine: only pending offers can be cancelled and
/// only paid offers can be confirmed.
pub fn render_owner_offers(offers: &[Offer]) -> ChatReply {
    if offers.is_empty() {
        return ChatReply::single(ChatMessage::text(
            "No offers found. Use the 'Create Offer' button to create your first offer.",
        ));
    }
    let mut reply = ChatReply::single(ChatMessage::text("📋 *Your offers:*"));
    for (i, offer) in offers.iter().enumerate() {
        let mut message = ChatMessage::text(render_offer(offer));
        if i < MAX_OFFERS_WITH_BUTTONS {
            message = message.with_button(ReplyButton::link("View Invoice", &offer.invoice_link));
            match offer.status {
                OfferStatusType::Paid => {
                    message = message.with_button(ReplyButton::callback(
                        "✅ Confirm Payment Received",
                        format!("{CONFIRM_PAYMENT_PREFIX}{}", offer.id),
                    ));
                },
                OfferStatusType::Pending => {
                    message = message.with_button(ReplyButton::callback(
                        "❌ Cancel Offer",
                        format!("{CANCEL_OFFER_PREFIX}{}", offer.id),
                    ));
                },
                _ => {},
            }
        }
        reply.push(message);
    }
    if offers.len() > MAX_OFFERS_WITH_BUTTONS {
        reply.push(ChatMessage::text(format!(
            "Showing buttons for the first {MAX_OFFERS_WITH_BUTTONS} offers. You have a total of {} offers.",
            offers.len()
        )));
    }
    reply
}

/// Groups offers by seller, in order of each seller's most recent offer.
pub fn render_marketplace(offers: &[Offer]) -> ChatReply {
    if offers.is_empty() {
        return ChatReply::single(ChatMessage::text("No active offers available in the marketplace right now."));
    }
    let mut sellers: Vec<(i64, Vec<&Offer>)> = Vec::new();
    for offer in offers {
        match sellers.iter_mut().find(|(id, _)| *id == offer.owner_id) {
            Some((_, list)) => list.push(offer),
            None => sellers.push((offer.owner_id, vec![offer])),
        }
    }
    let mut reply =
        ChatReply::single(ChatMessage::text("🛒 *Bitcoin Marketplace*\n\nHere are the latest offers from all users:"));
    for (_, seller_offers) in sellers {
        let first = seller_offers[0];
        let mut text = format!("👤 *Seller: {}*\n", first.seller_name());
        for offer in &seller_offers {
            text.push_str(&format!("\n*Offer #{}*\n{}\n{}\n", offer.id, amount_line(offer), date_line(offer)));
        }
        let mut message = ChatMessage::text(text.trim_end());
        if let Some(handle) = first.owner_handle.as_deref().filter(|h| !h.is_empty()) {
            message = message.with_button(ReplyButton::link(format!("Contact @{handle}"), format!("https://t.me/{handle}")));
        }
        reply.push(message);
    }
    reply
}

fn render_confirmed(offer: &Offer) -> ChatReply {
    ChatReply::single(ChatMessage::text(format!(
        "✅ *Payment Confirmed*\n\nYou have confirmed receipt of payment for Offer #{}.\nThe transaction is now \
         complete and funds have been released.",
        offer.id
    )))
}

fn render_cancelled(offer: &Offer) -> ChatReply {
    ChatReply::single(ChatMessage::text(format!("❌ *Offer Cancelled*\n\nYou have cancelled Offer #{}.", offer.id)))
}

/// System faults get a generic apology; the details are in the log.
pub fn render_error(e: &OfferFlowError) -> String {
    match e {
        OfferFlowError::InvalidTerms(reason) => format!("Invalid offer. {reason}\n\n{SELL_USAGE}"),
        OfferFlowError::NotRegistered(_) => "Please register first with /start".to_string(),
        OfferFlowError::NotFound(id) => format!("Offer #{id} does not exist"),
        OfferFlowError::Unauthorized { offer_id, action, status, .. } => {
            format!("You are not authorized to {action} offer #{offer_id}, which is {status}")
        },
        OfferFlowError::InvalidState { .. } => e.to_string(),
        OfferFlowError::PaymentBackendError(_) => "Failed to create Lightning invoice. Please try again later.".into(),
        OfferFlowError::BackendUnavailable(_) => {
            "The payment service is temporarily unavailable. Please try again later.".into()
        },
        OfferFlowError::PersistenceError(_) => "Something went wrong on our side. Please try again later.".into(),
    }
}
