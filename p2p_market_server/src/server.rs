use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use p2p_market_engine::{MarketplaceDatabase, OfferFlowApi, PaymentBackend, SqliteDatabase};

use crate::{
    config::{MarketplaceLimit, ServerConfig},
    errors::ServerError,
    integrations::{btcpay::BtcPayBackend, notifications::create_notification_handlers},
    reconcile_worker::start_reconcile_worker,
    routes::configure_routes,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(&config.database_url, config.db_max_connections, config.db_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let backend = BtcPayBackend::new(config.btcpay.clone())
        .map_err(|e| ServerError::ConfigurationError(format!("Could not create the BTCPay Server client. {e}")))?;
    let handlers = create_notification_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let api = OfferFlowApi::with_timeout(db, Arc::new(backend), producers, config.btcpay.timeout);
    match config.reconcile_interval {
        Some(period) => {
            // Runs for the life of the process
            let _ = start_reconcile_worker(api.clone(), period);
        },
        None => info!("🕰️ Settlement sweep is disabled. Offers are only checked for payment when they are listed."),
    }
    let srv = create_server_instance(config, api)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<B, P>(config: ServerConfig, api: OfferFlowApi<B, P>) -> Result<Server, ServerError>
where
    B: MarketplaceDatabase + Send + 'static,
    P: PaymentBackend + Send + Sync + 'static,
{
    let limit = MarketplaceLimit(config.marketplace_limit);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("p2p_market::access_log"))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(limit))
            .configure(configure_routes::<B, P>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
