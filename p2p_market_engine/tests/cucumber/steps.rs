use std::str::FromStr;

use cucumber::{then, when};
use p2p_market_engine::{
    db_types::{BtcAmount, OfferStatusType, UsdPrice},
    OfferFlowError,
};

use crate::cucumber::MarketWorld;

fn error_name(err: &OfferFlowError) -> &'static str {
    match err {
        OfferFlowError::InvalidTerms(_) => "InvalidTerms",
        OfferFlowError::NotRegistered(_) => "NotRegistered",
        OfferFlowError::NotFound(_) => "NotFound",
        OfferFlowError::Unauthorized { .. } => "Unauthorized",
        OfferFlowError::InvalidState { .. } => "InvalidState",
        OfferFlowError::PaymentBackendError(_) => "PaymentBackendError",
        OfferFlowError::BackendUnavailable(_) => "BackendUnavailable",
        OfferFlowError::PersistenceError(_) => "PersistenceError",
    }
}

#[when(expr = "user {int} offers {word} BTC for {word} USD as {string}")]
async fn create_named_offer(world: &mut MarketWorld, user_id: i64, amount: String, price: String, name: String) {
    submit_offer(world, user_id, &amount, &price).await;
    let offer = world.last_result.as_ref().unwrap().as_ref().expect("Offer was not created");
    world.offers.insert(name, offer.id);
}

#[when(expr = "user {int} offers {word} BTC for {word} USD")]
async fn create_offer(world: &mut MarketWorld, user_id: i64, amount: String, price: String) {
    submit_offer(world, user_id, &amount, &price).await;
}

async fn submit_offer(world: &mut MarketWorld, user_id: i64, amount: &str, price: &str) {
    let amount = BtcAmount::from_str(amount).expect("Not a valid amount");
    let price = UsdPrice::from_str(price).expect("Not a valid price");
    world.issued_before = world.backend().issued_count();
    let result = world.api().create_offer(user_id, amount, price).await;
    world.last_result = Some(result);
}

#[when(expr = "the invoice for offer {string} is paid")]
async fn settle_invoice(world: &mut MarketWorld, name: String) {
    let offer = world.api().fetch_offer(world.offer_id(&name)).await.expect("Error fetching offer");
    world.backend().settle(&offer.invoice_id);
}

#[when(expr = "offer {string} is refreshed")]
async fn refresh_offer(world: &mut MarketWorld, name: String) {
    let result = world.api().refresh_status(world.offer_id(&name)).await;
    world.last_result = Some(result);
}

#[when(expr = "user {int} confirms payment for offer {string}")]
async fn confirm_payment(world: &mut MarketWorld, user_id: i64, name: String) {
    let result = world.api().confirm_payment(world.offer_id(&name), user_id).await;
    world.last_result = Some(result);
}

#[when(expr = "user {int} cancels offer {string}")]
async fn cancel_offer(world: &mut MarketWorld, user_id: i64, name: String) {
    let result = world.api().cancel_offer(world.offer_id(&name), user_id).await;
    world.last_result = Some(result);
}

#[when(expr = "user {int} cancels offer #{int}")]
async fn cancel_offer_by_id(world: &mut MarketWorld, user_id: i64, offer_id: i64) {
    let result = world.api().cancel_offer(offer_id, user_id).await;
    world.last_result = Some(result);
}

#[when("the pending offers are reconciled")]
async fn reconcile(world: &mut MarketWorld) {
    let summary = world.api().reconcile_pending().await.expect("Error reconciling pending offers");
    world.last_summary = Some(summary);
}

#[then(expr = "{int} offer(s) was/were marked paid")]
async fn newly_paid(world: &mut MarketWorld, count: usize) {
    let summary = world.last_summary.as_ref().expect("No reconciliation was run");
    assert_eq!(summary.newly_paid.len(), count);
    assert!(summary.newly_paid.iter().all(|o| o.status == OfferStatusType::Paid));
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut MarketWorld) {
    match world.last_result.as_ref().expect("No request was made") {
        Ok(_) => {},
        Err(e) => panic!("Request failed: {e}"),
    }
}

#[then(expr = "the request fails with {word}")]
async fn request_fails(world: &mut MarketWorld, expected: String) {
    match world.last_result.as_ref().expect("No request was made") {
        Ok(offer) => panic!("Request succeeded unexpectedly: {offer:?}"),
        Err(e) => assert_eq!(error_name(e), expected, "Unexpected error: {e}"),
    }
}

#[then(expr = "the error mentions {string}")]
async fn error_mentions(world: &mut MarketWorld, text: String) {
    let err = world.last_result.as_ref().expect("No request was made").as_ref().expect_err("Request succeeded");
    assert!(err.to_string().contains(&text), "'{err}' does not mention '{text}'");
}

#[then(expr = "offer {string} is {word}")]
async fn check_status(world: &mut MarketWorld, name: String, status: String) {
    let expected = OfferStatusType::from_str(&status).expect("Not a valid status");
    let offer = world.api().fetch_offer(world.offer_id(&name)).await.expect("Error fetching offer");
    assert_eq!(offer.status, expected);
}

#[then(expr = "offer {string} is for {word} BTC at {word} USD")]
async fn check_terms(world: &mut MarketWorld, name: String, amount: String, price: String) {
    let offer = world.api().fetch_offer(world.offer_id(&name)).await.expect("Error fetching offer");
    assert_eq!(offer.amount_btc, BtcAmount::from_str(&amount).unwrap());
    assert_eq!(offer.price_usd, UsdPrice::from_str(&price).unwrap());
    assert!(!offer.invoice_id.is_empty());
    assert!(offer.invoice_link.starts_with("https://"));
}

#[then("no invoice was issued")]
async fn no_invoice(world: &mut MarketWorld) {
    assert_eq!(world.backend().issued_count(), world.issued_before);
}

#[then(expr = "user {int} has {int} offer(s)")]
async fn owner_offer_count(world: &mut MarketWorld, user_id: i64, count: usize) {
    let offers = world.api().list_owner_offers(user_id).await.expect("Error listing offers");
    assert_eq!(offers.len(), count);
}

#[then(expr = "the marketplace lists {int} offer(s)")]
async fn marketplace_count(world: &mut MarketWorld, count: usize) {
    let listing = world.api().list_marketplace(20).await.expect("Error listing the marketplace");
    assert_eq!(listing.len(), count);
    assert!(listing.iter().all(|o| o.status == OfferStatusType::Pending));
}

#[then(expr = "the marketplace does not list offer {string}")]
async fn marketplace_excludes(world: &mut MarketWorld, name: String) {
    let id = world.offer_id(&name);
    let listing = world.api().list_marketplace(20).await.expect("Error listing the marketplace");
    assert!(listing.iter().all(|o| o.id != id), "offer '{name}' is listed");
}
