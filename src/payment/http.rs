use super::{ChargeReceipt, ChargeRequest, PaymentGateway};
use crate::error::PaymentError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
struct ChargeResponse {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    error: Option<GatewayErrorDetail>,
}

#[derive(Deserialize)]
struct GatewayErrorDetail {
    message: Option<String>,
}

/// Charges through a remote gateway at `POST {base_url}/v1/charges`.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| PaymentError::Unavailable(format!("client init: {}", e)))?;
        Ok(HttpPaymentGateway {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn charges_url(&self) -> String {
        format!("{}/v1/charges", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        let mut req = self
            .client
            .post(self.charges_url())
            .header("Idempotency-Key", &request.idempotency_key)
            .json(request);
        if let Some(key) = self.api_key.as_deref() {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(e.to_string()))?;
        let status = response.status();

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PaymentError::Unavailable(format!("gateway returned {}", status)));
        }
        if status.is_client_error() {
            let message = response
                .json::<GatewayErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|d| d.message)
                .unwrap_or_else(|| format!("gateway returned {}", status));
            return Err(PaymentError::Declined(message));
        }

        let body: ChargeResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("unreadable gateway response: {}", e)))?;
        if body.status != "succeeded" {
            return Err(PaymentError::Declined(format!("charge {} is {}", body.id, body.status)));
        }
        tracing::info!(reference = %body.id, amount = request.amount, "charge succeeded");
        Ok(ChargeReceipt { reference: body.id })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charges_url_joins_cleanly() {
        let gw = HttpPaymentGateway::new("https://pay.example.com/", None).unwrap();
        assert_eq!(gw.charges_url(), "https://pay.example.com/v1/charges");
    }

    #[tokio::test]
    async fn unreachable_gateway_is_unavailable_not_declined() {
        let gw = HttpPaymentGateway::new("http://127.0.0.1:1", Some("sk_test".into())).unwrap();
        let err = gw
            .charge(&ChargeRequest {
                amount: 100,
                currency: "usd".into(),
                source: "tok_visa".into(),
                description: "pledge".into(),
                idempotency_key: "k".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Unavailable(_)));
    }
}
