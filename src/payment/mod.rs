//! Payment gateway seam. The pledge flow charges through `PaymentGateway` inside its database transaction.

mod http;
mod simulated;

pub use http::HttpPaymentGateway;
pub use simulated::SimulatedPaymentGateway;

use crate::error::PaymentError;
use async_trait::async_trait;
use serde::Serialize;

/// One charge attempt. `amount` is in minor units (cents).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub amount: i64,
    pub currency: String,
    pub source: String,
    pub description: String,
    pub idempotency_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChargeReceipt {
    /// Gateway-side charge id, stored on the payment row.
    pub reference: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError>;

    fn name(&self) -> &'static str;
}
