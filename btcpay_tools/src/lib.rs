mod api;
mod config;
mod error;

mod data_objects;

pub use api::BtcPayApi;
pub use config::BtcPayConfig;
pub use data_objects::{BtcPayInvoice, CheckoutOptions, InvoiceMetadata, InvoiceStatus, NewInvoiceRequest};
pub use error::BtcPayApiError;
