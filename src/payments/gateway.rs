use axum::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use crate::config::PaymentConfig;

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub order_code: i64,
    pub amount: i64,
    pub description: String,
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub qr_code: Option<String>,
}

/// External payment gateway seam. Webhook signatures and the rest of the
/// gateway protocol stay on the provider's side of this boundary.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, request: CheckoutRequest) -> anyhow::Result<CheckoutSession>;
}

/// HTTP gateway client posting checkout requests to the configured endpoint.
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self, request), fields(order_code = request.order_code))]
    async fn create_checkout(&self, request: CheckoutRequest) -> anyhow::Result<CheckoutSession> {
        let body = json!({
            "orderCode": request.order_code,
            "amount": request.amount,
            "description": request.description,
            "items": [{ "name": request.description, "quantity": 1, "price": request.amount }],
            "returnUrl": request.return_url,
            "cancelUrl": request.cancel_url,
        });

        let resp = self
            .http
            .post(format!("{}/v2/payment-requests", self.endpoint))
            .header("x-client-id", &self.client_id)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            anyhow::bail!("payment gateway returned {}", resp.status());
        }

        let payload: Value = resp.json().await?;
        let data = &payload["data"];
        let checkout_url = data["checkoutUrl"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("gateway response missing checkoutUrl"))?
            .to_string();
        let qr_code = data["qrCode"].as_str().map(str::to_string);

        Ok(CheckoutSession {
            checkout_url,
            qr_code,
        })
    }
}

/// Used when no gateway credentials are configured; trial activation still
/// works, checkout creation does not.
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_checkout(&self, _request: CheckoutRequest) -> anyhow::Result<CheckoutSession> {
        anyhow::bail!("payment gateway is not configured")
    }
}
