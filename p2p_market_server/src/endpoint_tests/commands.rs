use actix_web::http::StatusCode;
use p2p_market_engine::db_types::OfferStatusType;

use super::helpers::{parse, TestMarket, ALICE, BOB};
use crate::data_objects::{ChatCommandRequest, ChatReply};

async fn chat(market: &TestMarket, user_id: i64, handle: Option<&str>, text: &str) -> ChatReply {
    let request = ChatCommandRequest { user_id, handle: handle.map(String::from), text: text.to_string() };
    let (status, body) = market.post("/command", None, &request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    parse(&body)
}

#[actix_web::test]
async fn sell_before_start() {
    let market = TestMarket::new().await;
    let reply = chat(&market, ALICE, None, "/sell 0.01 500").await;
    assert_eq!(reply.full_text(), "Please register first with /start");
    assert_eq!(market.backend.issued_count(), 0);
    market.finish().await;
}

#[actix_web::test]
async fn chat_session() {
    let market = TestMarket::new().await;
    let reply = chat(&market, ALICE, Some("alice"), "/start").await;
    assert_eq!(reply.messages[0].text, "Successfully registered!");
    assert_eq!(reply.messages[1].buttons.len(), 4);

    let reply = chat(&market, ALICE, Some("alice"), "/sell 0.01 500").await;
    let text = reply.full_text();
    assert!(text.starts_with("✅ Offer #1 created!"), "{text}");
    assert!(text.contains("🔹 Amount: 0.01 BTC\n🔹 Price: $500"), "{text}");
    assert_eq!(reply.messages[0].buttons[0].url.as_deref(), Some("https://pay.example/i/fake-inv-1"));

    let reply = chat(&market, ALICE, None, "/sell 0.01").await;
    assert!(reply.full_text().starts_with("To create a new offer"));
    let reply = chat(&market, ALICE, None, "/sell abc 500").await;
    assert!(reply.full_text().starts_with("Invalid offer. Invalid BTC amount"), "{}", reply.full_text());

    let reply = chat(&market, BOB, None, "/marketplace").await;
    let text = reply.full_text();
    assert!(text.contains("👤 *Seller: @alice*"), "{text}");
    assert!(text.contains("*Offer #1*"), "{text}");

    let reply = chat(&market, BOB, None, "cancel_offer:1").await;
    assert_eq!(reply.full_text(), "You are not authorized to cancel offer #1, which is pending");

    market.backend.settle("fake-inv-1");
    let reply = chat(&market, ALICE, None, "/list").await;
    assert!(reply.full_text().contains("🔹 Status: 💰 paid"), "{}", reply.full_text());
    assert_eq!(reply.messages[1].buttons[1].callback.as_deref(), Some("confirm_payment:1"));

    let reply = chat(&market, ALICE, None, "confirm_payment:1").await;
    assert!(reply.full_text().starts_with("✅ *Payment Confirmed*"));
    let offers = market.my_offers(ALICE).await;
    assert_eq!(offers[0].status, OfferStatusType::Completed);

    let reply = chat(&market, ALICE, None, "confirm_payment:1").await;
    assert_eq!(reply.full_text(), "Cannot confirm payment for offer #1 because it is completed");
    market.finish().await;
}

#[actix_web::test]
async fn unknown_input() {
    let market = TestMarket::new().await;
    let reply = chat(&market, ALICE, None, "/buy 1").await;
    assert!(reply.full_text().starts_with("Unknown command /buy"));
    let reply = chat(&market, ALICE, None, "gm").await;
    assert_eq!(reply.messages[0].text, "Choose an option:");
    let reply = chat(&market, ALICE, None, "/help").await;
    assert!(reply.full_text().contains("⏳ Pending - Waiting for payment"));
    let reply = chat(&market, ALICE, None, "cancel_offer:42").await;
    assert_eq!(reply.full_text(), "Offer #42 does not exist");
    market.finish().await;
}
