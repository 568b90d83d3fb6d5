use std::sync::Arc;

use log::*;
use p2p_common::Sats;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    IntoUrl,
    Method,
    Url,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::BtcPayConfig,
    data_objects::{BtcPayInvoice, NewInvoiceRequest},
    BtcPayApiError,
};

#[derive(Clone)]
pub struct BtcPayApi {
    config: BtcPayConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for BtcPayApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BtcPayApi ({}, store {})", self.config.url, self.config.store_id)
    }
}

impl BtcPayApi {
    pub fn new(config: BtcPayConfig) -> Result<Self, BtcPayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let token = format!("token {}", config.api_key.reveal());
        let mut val = HeaderValue::from_str(&token).map_err(|e| BtcPayApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| BtcPayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &BtcPayConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, BtcPayApiError> {
        self.query_url(method, self.url(path), body).await
    }

    async fn query_url<T: DeserializeOwned, B: Serialize, U: IntoUrl + std::fmt::Display>(
        &self,
        method: Method,
        url: U,
        body: Option<B>,
    ) -> Result<T, BtcPayApiError> {
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| BtcPayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| BtcPayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| BtcPayApiError::RestResponseError(e.to_string()))?;
            Err(BtcPayApiError::QueryError { status, message })
        }
    }

    /// The full URL for a path relative to the configured store.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/stores/{}{path}", self.config.url, self.config.store_id)
    }

    /// The URL of a single invoice. The id is percent-encoded as one path segment.
    pub fn invoice_url(&self, invoice_id: &str) -> Result<Url, BtcPayApiError> {
        let mut url = Url::parse(&self.url("/invoices")).map_err(|e| BtcPayApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| BtcPayApiError::InvalidUrl(self.config.url.clone()))?
            .push(invoice_id);
        Ok(url)
    }

    /// Creates a Lightning invoice for `amount` and returns it as BTCPay reports it after creation.
    ///
    /// The creation response does not always carry the checkout link, so the invoice is fetched again and the link is
    /// taken from there.
    pub async fn create_invoice(&self, amount: Sats, memo: &str) -> Result<BtcPayInvoice, BtcPayApiError> {
        #[derive(Deserialize)]
        struct CreatedInvoice {
            id: String,
        }
        let request = NewInvoiceRequest::lightning(amount, memo, self.config.invoice_expiry_minutes);
        debug!("Creating invoice for {amount} ({} BTC)", request.amount);
        let created = self.rest_query::<CreatedInvoice, _>(Method::POST, "/invoices", Some(request)).await?;
        let invoice = self.get_invoice(&created.id).await?;
        if invoice.checkout_link.is_none() {
            return Err(BtcPayApiError::MissingField("checkoutLink".to_string()));
        }
        info!("Created invoice {} for {amount}", invoice.id);
        Ok(invoice)
    }

    pub async fn get_invoice(&self, invoice_id: &str) -> Result<BtcPayInvoice, BtcPayApiError> {
        let url = self.invoice_url(invoice_id)?;
        let invoice = self.query_url::<BtcPayInvoice, (), _>(Method::GET, url, None).await?;
        trace!("Invoice {invoice_id} is {}", invoice.status);
        Ok(invoice)
    }

    /// True once BTCPay reports the invoice as `Settled` or `Complete`.
    pub async fn is_settled(&self, invoice_id: &str) -> Result<bool, BtcPayApiError> {
        let invoice = self.get_invoice(invoice_id).await?;
        Ok(invoice.status.is_settled())
    }
}
