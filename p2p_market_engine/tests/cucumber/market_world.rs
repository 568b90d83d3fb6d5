use std::{collections::HashMap, sync::Arc, time::Duration};

use cucumber::World;
use log::*;
use p2p_market_engine::{
    db_types::Offer,
    offer_objects::ReconcileSummary,
    events::EventProducers,
    test_utils::{
        fake_backend::FakePaymentBackend,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    OfferFlowApi,
    OfferFlowError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketSystem>,
    /// Offers created during the scenario, by the name the scenario gave them
    pub offers: HashMap<String, i64>,
    pub last_result: Option<Result<Offer, OfferFlowError>>,
    pub last_summary: Option<ReconcileSummary>,
    pub issued_before: usize,
}

#[derive(Debug)]
pub struct MarketSystem {
    pub db_path: String,
    pub api: OfferFlowApi<SqliteDatabase, FakePaymentBackend>,
    pub backend: FakePaymentBackend,
}

impl MarketWorld {
    pub fn api(&self) -> &OfferFlowApi<SqliteDatabase, FakePaymentBackend> {
        &self.system.as_ref().expect("Marketplace not initialised").api
    }

    pub fn backend(&self) -> &FakePaymentBackend {
        &self.system.as_ref().expect("Marketplace not initialised").backend
    }

    pub fn offer_id(&self, name: &str) -> i64 {
        *self.offers.get(name).unwrap_or_else(|| panic!("No offer called '{name}' has been created"))
    }
}

impl MarketSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let backend = FakePaymentBackend::new();
        let api = OfferFlowApi::with_timeout(
            db,
            Arc::new(backend.clone()),
            EventProducers::default(),
            Duration::from_millis(250),
        );
        Self { db_path: url, api, backend }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
