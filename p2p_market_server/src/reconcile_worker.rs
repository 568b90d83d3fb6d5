use std::time::Duration;

use log::*;
use p2p_market_engine::{db_types::Offer, OfferFlowApi, SqliteDatabase};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::integrations::btcpay::BtcPayBackend;

/// Starts the settlement sweep. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Each tick checks every pending offer against BTCPay Server and marks the settled ones as paid. A sweep that
/// overruns the period delays the next one instead of stacking up behind it.
pub fn start_reconcile_worker(api: OfferFlowApi<SqliteDatabase, BtcPayBackend>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ Settlement sweep worker started. Running every {period:?}");
        loop {
            timer.tick().await;
            debug!("🕰️ Running settlement sweep");
            match api.reconcile_pending().await {
                Ok(summary) => {
                    info!(
                        "🕰️ Checked {} pending offers. {} newly paid, {} could not be checked",
                        summary.checked,
                        summary.newly_paid.len(),
                        summary.unknown
                    );
                    if !summary.newly_paid.is_empty() {
                        debug!("🕰️ Newly paid offers: {}", offer_list(&summary.newly_paid));
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running settlement sweep: {e}");
                },
            }
        }
    })
}

fn offer_list(offers: &[Offer]) -> String {
    offers
        .iter()
        .map(|o| format!("[{}] owner: {} invoice: {}", o.id, o.owner_id, o.invoice_id))
        .collect::<Vec<String>>()
        .join(", ")
}
