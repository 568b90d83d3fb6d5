use mockall::mock;
use p2p_common::Sats;

use crate::{
    db_types::Invoice,
    traits::{PaymentBackend, PaymentBackendError},
};

mock! {
    pub Backend {}
    impl PaymentBackend for Backend {
        async fn issue_invoice(&self, amount: Sats, memo: &str) -> Result<Invoice, PaymentBackendError>;
        async fn check_settled(&self, invoice_id: &str) -> Result<bool, PaymentBackendError>;
    }
}
