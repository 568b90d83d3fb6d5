use std::sync::Arc;

use actix_web::{http::StatusCode, test, test::TestRequest, App};
use p2p_market_engine::{
    db_types::{Invoice, Offer, OfferStatusType},
    events::EventProducers,
    test_utils::prepare_env::{fresh_database, tear_down},
    OfferFlowApi,
    PaymentBackendError,
};

use super::{
    helpers::{error_message, parse, send, TestMarket, ALICE, BOB},
    mocks::MockBackend,
};
use crate::{data_objects::OfferListResponse, routes::health};

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().service(health)).await;
    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn requests_must_name_the_requester() {
    let market = TestMarket::new().await;
    let (status, body) = market.get("/offers", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "The X-Requester-Id header is missing or is not a user id");
    market.finish().await;
}

#[actix_web::test]
async fn malformed_bodies_are_rejected() {
    let market = TestMarket::new().await;
    market.register(ALICE, None).await;
    let (status, body) = market.post_raw("/offers", Some(ALICE), r#"{"amount_btc": "0.01", "#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Could not read request body: "), "{body}");
    let (status, body) = market.post_raw("/offers", Some(ALICE), r#"{"amount_btc": "0.01"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).starts_with("Could not read request body: "), "{body}");
    assert!(market.my_offers(ALICE).await.is_empty());
    market.finish().await;
}

#[actix_web::test]
async fn create_and_list_offers() {
    let market = TestMarket::new().await;
    market.register(ALICE, Some("alice")).await;
    let offer = market.sell(ALICE, "0.01", "500").await;
    assert_eq!(offer.owner_id, ALICE);
    assert_eq!(offer.status, OfferStatusType::Pending);
    assert_eq!(offer.amount_btc.value().to_string(), "0.01");
    assert_eq!(offer.invoice_link, format!("https://pay.example/i/{}", offer.invoice_id));
    let (_, sats, memo) = market.backend.last_issued().unwrap();
    assert_eq!(sats.value(), 1_000_000);
    assert_eq!(memo, format!("BTC sell offer by {ALICE}"));

    let second = market.sell(ALICE, "0.5", "30000").await;
    let offers = market.my_offers(ALICE).await;
    assert_eq!(offers.iter().map(|o| o.id).collect::<Vec<i64>>(), vec![second.id, offer.id]);
    assert!(market.my_offers(BOB).await.is_empty());

    let (status, body) = market.get(&format!("/offers/{}", offer.id), Some(BOB)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<Offer>(&body).id, offer.id);
    market.finish().await;
}

#[actix_web::test]
async fn offer_creation_errors() {
    let market = TestMarket::new().await;
    let terms = serde_json::json!({ "amount_btc": "0.01", "price_usd": "500" });
    let (status, body) = market.post("/offers", Some(ALICE), &terms).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), format!("User #{ALICE} is not registered"));

    market.register(ALICE, None).await;
    let bad_terms = serde_json::json!({ "amount_btc": "-1", "price_usd": "500" });
    let (status, _) = market.post("/offers", Some(ALICE), &bad_terms).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let bad_terms = serde_json::json!({ "amount_btc": "0.01", "price_usd": "five hundred" });
    let (status, body) = market.post("/offers", Some(ALICE), &bad_terms).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("Invalid USD price"), "{body}");

    market.backend.set_issuance_failure(true);
    let (status, _) = market.post("/offers", Some(ALICE), &terms).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(market.my_offers(ALICE).await.is_empty(), "No offer may be stored without an invoice");
    market.finish().await;
}

#[actix_web::test]
async fn paid_offer_lifecycle() {
    let market = TestMarket::new().await;
    market.register(ALICE, Some("alice")).await;
    market.register(BOB, None).await;
    let offer = market.sell(ALICE, "0.01", "500").await;
    let other = market.sell(BOB, "0.02", "1000").await;

    // Settlement is only noticed when someone looks
    market.backend.settle(&offer.invoice_id);
    let (status, body) = market.get("/marketplace", Some(BOB)).await;
    assert_eq!(status, StatusCode::OK);
    let listing = parse::<OfferListResponse>(&body).offers;
    assert_eq!(listing.iter().map(|o| o.id).collect::<Vec<i64>>(), vec![other.id]);
    let mine = market.my_offers(ALICE).await;
    assert_eq!(mine[0].status, OfferStatusType::Paid);

    let confirm = format!("/offers/{}/confirm", offer.id);
    let cancel = format!("/offers/{}/cancel", offer.id);
    let (status, _) = market.post_empty(&confirm, Some(BOB)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = market.post_empty(&cancel, Some(ALICE)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_message(&body), format!("Cannot cancel offer #{} because it is paid", offer.id));

    let (status, body) = market.post_empty(&confirm, Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<Offer>(&body).status, OfferStatusType::Completed);
    let (status, _) = market.post_empty(&confirm, Some(ALICE)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    market.finish().await;
}

#[actix_web::test]
async fn cancel_pending_offer() {
    let market = TestMarket::new().await;
    market.register(ALICE, None).await;
    let offer = market.sell(ALICE, "1", "60000").await;
    let (status, body) = market.post_empty(&format!("/offers/{}/cancel", offer.id), Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<Offer>(&body).status, OfferStatusType::Cancelled);

    // Paying a cancelled offer's invoice changes nothing
    market.backend.settle(&offer.invoice_id);
    assert_eq!(market.my_offers(ALICE).await[0].status, OfferStatusType::Cancelled);
    let (status, body) = market.get("/marketplace", Some(BOB)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(parse::<OfferListResponse>(&body).offers.is_empty());

    let (status, _) = market.post_empty("/offers/999/cancel", Some(ALICE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    market.finish().await;
}

#[actix_web::test]
async fn marketplace_limit_parameter() {
    let market = TestMarket::new().await;
    market.register(ALICE, None).await;
    for i in 1..=3 {
        market.sell(ALICE, &format!("0.0{i}"), "100").await;
    }
    let (_, body) = market.get("/marketplace?limit=2", Some(BOB)).await;
    assert_eq!(parse::<OfferListResponse>(&body).offers.len(), 2);
    let (_, body) = market.get("/marketplace", Some(BOB)).await;
    assert_eq!(parse::<OfferListResponse>(&body).offers.len(), 3);
    market.finish().await;
}

#[actix_web::test]
async fn unavailable_backend_keeps_offers_listed() {
    let db = fresh_database().await;
    let mut backend = MockBackend::new();
    backend.expect_issue_invoice().times(1).returning(|_, _| Ok(Invoice::new("inv-1", "https://pay.example/i/inv-1")));
    backend.expect_check_settled().returning(|_| Err(PaymentBackendError::Unavailable("no route to host".into())));
    let api = OfferFlowApi::new(db, Arc::new(backend), EventProducers::default());
    api.register_user(ALICE, None).await.unwrap();
    let offer =
        api.create_offer(ALICE, "0.01".parse().unwrap(), "500".parse().unwrap()).await.expect("offer should be created");

    let (status, body) = send(&api, TestRequest::get().uri("/marketplace").insert_header(("X-Requester-Id", "7"))).await;
    assert_eq!(status, StatusCode::OK);
    let listing = parse::<OfferListResponse>(&body).offers;
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, offer.id);
    assert_eq!(listing[0].status, OfferStatusType::Pending);
    tear_down(api.db().clone()).await;
}
