pub mod btcpay;
pub mod notifications;
