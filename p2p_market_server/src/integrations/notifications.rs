//! Hooks that run after an offer changes status.
//!
//! The chat transport polls for updates, so for now the hooks only leave a trail in the log. This is the place to
//! push a message to the seller when their offer is paid.
use futures::future::BoxFuture;
use log::*;
use p2p_market_engine::{
    db_types::OfferStatusType,
    events::{EventHandlers, EventHooks, OfferStatusChangedEvent},
};

pub const EVENT_BUFFER_SIZE: usize = 128;

pub fn create_notification_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_status_changed(|ev| -> BoxFuture<'static, ()> {
        let message = status_change_message(&ev);
        Box::pin(async move {
            info!("📬️ {message}");
        })
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

pub fn status_change_message(ev: &OfferStatusChangedEvent) -> String {
    let offer = &ev.offer;
    match ev.new_status() {
        OfferStatusType::Paid => format!(
            "Offer #{} by {} has been paid. Waiting for the seller to confirm.",
            offer.id,
            offer.seller_name()
        ),
        OfferStatusType::Completed => format!("Offer #{} by {} is complete.", offer.id, offer.seller_name()),
        OfferStatusType::Cancelled => format!("Offer #{} by {} was cancelled.", offer.id, offer.seller_name()),
        OfferStatusType::Pending => {
            format!("Offer #{} moved from {} back to pending.", offer.id, ev.old_status)
        },
    }
}
