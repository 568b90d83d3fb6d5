use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::*;
use p2p_common::Sats;

use crate::{
    db_types::Invoice,
    traits::{PaymentBackend, PaymentBackendError},
};

#[derive(Debug, Default)]
struct FakeBackendState {
    next_invoice: u64,
    issued: Vec<(String, Sats, String)>,
    settled: HashSet<String>,
    offline: bool,
    fail_issuance: bool,
    delay: Option<Duration>,
}

/// An in-memory payment backend for tests.
///
/// Invoices are numbered `fake-inv-1`, `fake-inv-2`, and so on. Nothing is settled until the test says so.
#[derive(Debug, Clone, Default)]
pub struct FakePaymentBackend {
    state: Arc<Mutex<FakeBackendState>>,
}

impl FakePaymentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the invoice as paid.
    pub fn settle(&self, invoice_id: &str) {
        self.state.lock().unwrap().settled.insert(invoice_id.to_string());
    }

    /// While offline, every call fails with [`PaymentBackendError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// While set, invoice requests are refused with [`PaymentBackendError::Rejected`].
    pub fn set_issuance_failure(&self, fail: bool) {
        self.state.lock().unwrap().fail_issuance = fail;
    }

    /// Every call waits this long before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn issued_count(&self) -> usize {
        self.state.lock().unwrap().issued.len()
    }

    /// The amount and memo of the most recently issued invoice
    pub fn last_issued(&self) -> Option<(String, Sats, String)> {
        self.state.lock().unwrap().issued.last().cloned()
    }

    fn delay(&self) -> Option<Duration> {
        self.state.lock().unwrap().delay
    }
}

impl PaymentBackend for FakePaymentBackend {
    async fn issue_invoice(&self, amount: Sats, memo: &str) -> Result<Invoice, PaymentBackendError> {
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(PaymentBackendError::Unavailable("fake backend is offline".into()));
        }
        if state.fail_issuance {
            return Err(PaymentBackendError::Rejected("fake backend refused the invoice".into()));
        }
        state.next_invoice += 1;
        let id = format!("fake-inv-{}", state.next_invoice);
        state.issued.push((id.clone(), amount, memo.to_string()));
        trace!("🧾️ Fake invoice {id} issued for {amount}");
        Ok(Invoice::new(id.clone(), format!("https://pay.example/i/{id}")))
    }

    async fn check_settled(&self, invoice_id: &str) -> Result<bool, PaymentBackendError> {
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(PaymentBackendError::Unavailable("fake backend is offline".into()));
        }
        Ok(state.settled.contains(invoice_id))
    }
}
