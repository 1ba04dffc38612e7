//! JSON-over-HTTP implementation of [`InvoiceBackend`].
//!
//! Endpoint layout (relative to the base URL):
//!
//! | Operation | Request |
//! |---|---|
//! | number check | `GET invoices/check-number?number=…` → `{"exists": bool}` |
//! | create | `POST invoices` |
//! | update | `PUT invoices/{id}` |
//! | send | `POST invoices/{id}/send` `{"message": …}` → `{"success": bool}` |
//! | list payments | `GET invoices/{id}/payments` |
//! | record payment | `POST invoices/{id}/payments` |
//! | edit payment | `PUT invoices/{id}/payments/{paymentId}` |
//! | delete payment | `DELETE invoices/{id}/payments/{paymentId}` |
//! | last-used settings | `GET invoices/last-settings` → settings or `null` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BackendError, InvoiceBackend};
use crate::core::{
    InvoiceRecord, InvoiceSettings, LedgerSnapshot, NewPayment, Payment, PaymentUpdate,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a tenant's invoice API.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: Option<&'a str>,
}

#[derive(Deserialize)]
struct SendResponse {
    success: bool,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl RestBackend {
    /// `base_url` like "https://api.example.com/v1/" (trailing slash optional).
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Transient(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Bearer token sent with every request.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let resp = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))?;
        debug!(%status, "invoice API response");

        if status.is_success() {
            Ok(body)
        } else {
            Err(classify(status, &body))
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::Transient(format!("unexpected response: {e}")))
    }
}

/// Map an HTTP error status onto the backend error taxonomy.
fn classify(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| format!("HTTP {status}: {body}"));

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::Validation(message)
        }
        StatusCode::CONFLICT => BackendError::Conflict(message),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        _ => BackendError::Transient(message),
    }
}

#[async_trait]
impl InvoiceBackend for RestBackend {
    async fn invoice_number_exists(&self, number: &str) -> Result<bool, BackendError> {
        let request = self
            .client
            .get(self.url("invoices/check-number"))
            .query(&[("number", number)]);
        let resp: ExistsResponse = self.fetch(request).await?;
        Ok(resp.exists)
    }

    async fn create_invoice(&self, invoice: &InvoiceRecord) -> Result<InvoiceRecord, BackendError> {
        let request = self.client.post(self.url("invoices")).json(invoice);
        self.fetch(request).await
    }

    async fn update_invoice(
        &self,
        id: &str,
        invoice: &InvoiceRecord,
    ) -> Result<InvoiceRecord, BackendError> {
        let request = self
            .client
            .put(self.url(&format!("invoices/{id}")))
            .json(invoice);
        self.fetch(request).await
    }

    async fn send_invoice(&self, id: &str, message: Option<&str>) -> Result<bool, BackendError> {
        let request = self
            .client
            .post(self.url(&format!("invoices/{id}/send")))
            .json(&SendRequest { message });
        let resp: SendResponse = self.fetch(request).await?;
        Ok(resp.success)
    }

    async fn list_payments(&self, invoice_id: &str) -> Result<LedgerSnapshot, BackendError> {
        let request = self
            .client
            .get(self.url(&format!("invoices/{invoice_id}/payments")));
        self.fetch(request).await
    }

    async fn record_payment(
        &self,
        invoice_id: &str,
        payment: &NewPayment,
    ) -> Result<Payment, BackendError> {
        let request = self
            .client
            .post(self.url(&format!("invoices/{invoice_id}/payments")))
            .json(payment);
        self.fetch(request).await
    }

    async fn edit_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Payment, BackendError> {
        let request = self
            .client
            .put(self.url(&format!("invoices/{invoice_id}/payments/{payment_id}")))
            .json(update);
        self.fetch(request).await
    }

    async fn delete_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .delete(self.url(&format!("invoices/{invoice_id}/payments/{payment_id}")));
        self.execute(request).await.map(|_| ())
    }

    async fn last_used_settings(&self) -> Result<Option<InvoiceSettings>, BackendError> {
        let request = self.client.get(self.url("invoices/last-settings"));
        self.fetch(request).await
    }
}
