use std::sync::Arc;

use actix_web::{
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use log::debug;
use p2p_market_engine::{
    db_types::Offer,
    events::EventProducers,
    test_utils::{
        fake_backend::FakePaymentBackend,
        prepare_env::{fresh_database, tear_down},
    },
    MarketplaceDatabase,
    OfferFlowApi,
    PaymentBackend,
    SqliteDatabase,
};
use serde::de::DeserializeOwned;

use crate::{
    config::MarketplaceLimit,
    data_objects::{OfferListResponse, REQUESTER_HEADER},
    routes::configure_routes,
};

pub const ALICE: i64 = 1001;
pub const BOB: i64 = 1002;

/// A marketplace backed by a fresh SQLite file and the in-memory payment backend.
pub struct TestMarket {
    pub api: OfferFlowApi<SqliteDatabase, FakePaymentBackend>,
    pub backend: FakePaymentBackend,
}

impl TestMarket {
    pub async fn new() -> Self {
        let db = fresh_database().await;
        let backend = FakePaymentBackend::new();
        let api = OfferFlowApi::new(db, Arc::new(backend.clone()), EventProducers::default());
        Self { api, backend }
    }

    pub async fn get(&self, path: &str, user: Option<i64>) -> (StatusCode, String) {
        send(&self.api, with_requester(TestRequest::get().uri(path), user)).await
    }

    pub async fn post<T: serde::Serialize>(&self, path: &str, user: Option<i64>, body: &T) -> (StatusCode, String) {
        send(&self.api, with_requester(TestRequest::post().uri(path), user).set_json(body)).await
    }

    pub async fn post_raw(&self, path: &str, user: Option<i64>, body: &'static str) -> (StatusCode, String) {
        let req = with_requester(TestRequest::post().uri(path), user)
            .insert_header(ContentType::json())
            .set_payload(body);
        send(&self.api, req).await
    }

    pub async fn post_empty(&self, path: &str, user: Option<i64>) -> (StatusCode, String) {
        send(&self.api, with_requester(TestRequest::post().uri(path), user)).await
    }

    pub async fn register(&self, user: i64, handle: Option<&str>) {
        let (status, body) = self.post("/register", Some(user), &serde_json::json!({ "handle": handle })).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    pub async fn sell(&self, user: i64, amount_btc: &str, price_usd: &str) -> Offer {
        let (status, body) = self
            .post("/offers", Some(user), &serde_json::json!({ "amount_btc": amount_btc, "price_usd": price_usd }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        parse(&body)
    }

    pub async fn my_offers(&self, user: i64) -> Vec<Offer> {
        let (status, body) = self.get("/offers", Some(user)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        parse::<OfferListResponse>(&body).offers
    }

    pub async fn finish(self) {
        tear_down(self.api.db().clone()).await;
    }
}

fn with_requester(req: TestRequest, user: Option<i64>) -> TestRequest {
    match user {
        Some(id) => req.insert_header((REQUESTER_HEADER, id.to_string())),
        None => req,
    }
}

pub async fn send<B, P>(api: &OfferFlowApi<B, P>, req: TestRequest) -> (StatusCode, String)
where
    B: MarketplaceDatabase + 'static,
    P: PaymentBackend + 'static,
{
    let app = App::new()
        .app_data(web::Data::new(api.clone()))
        .app_data(web::Data::new(MarketplaceLimit::default()))
        .configure(configure_routes::<B, P>);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn parse<T: DeserializeOwned>(body: &str) -> T {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Unexpected response body {body}. {e}"))
}

pub fn error_message(body: &str) -> String {
    let value: serde_json::Value = parse(body);
    value["error"].as_str().unwrap_or_default().to_string()
}
