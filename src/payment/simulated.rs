use super::{ChargeReceipt, ChargeRequest, PaymentGateway};
use crate::error::PaymentError;
use async_trait::async_trait;

/// Token prefix the simulated gateway always declines.
pub const DECLINE_PREFIX: &str = "tok_decline";

/// Local stand-in used when no gateway URL is configured.
#[derive(Clone, Debug, Default)]
pub struct SimulatedPaymentGateway;

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        if request.source.starts_with(DECLINE_PREFIX) {
            return Err(PaymentError::Declined("card declined".into()));
        }
        if request.amount <= 0 {
            return Err(PaymentError::Declined("amount must be positive".into()));
        }
        tracing::debug!(amount = request.amount, key = %request.idempotency_key, "simulated charge");
        Ok(ChargeReceipt {
            reference: format!("sim_{}", request.idempotency_key.replace('-', "")),
        })
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: &str, amount: i64) -> ChargeRequest {
        ChargeRequest {
            amount,
            currency: "usd".into(),
            source: source.into(),
            description: "pledge".into(),
            idempotency_key: "5f0c6f1e-0000-4000-8000-000000000001".into(),
        }
    }

    #[tokio::test]
    async fn approves_ordinary_tokens_with_stable_reference() {
        let gw = SimulatedPaymentGateway;
        let a = gw.charge(&request("tok_visa", 2500)).await.unwrap();
        let b = gw.charge(&request("tok_visa", 2500)).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.reference, "sim_5f0c6f1e000040008000000000000001");
    }

    #[tokio::test]
    async fn declines_marked_tokens() {
        let gw = SimulatedPaymentGateway;
        let err = gw.charge(&request("tok_decline_insufficient", 2500)).await.unwrap_err();
        assert!(matches!(err, PaymentError::Declined(_)));
    }
}
