use super::UnknownVariant;
use crate::error::AppError;
use crate::validation::{check_amount, check_length, check_optional_length};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(UnknownVariant {
                kind: "payment status",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = UnknownVariant;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pledge {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub backer_id: Uuid,
    pub amount: BigDecimal,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub pledge_id: Uuid,
    pub gateway_reference: String,
    pub amount: BigDecimal,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Pledge with joined campaign/backer names and its payment outcome.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PledgeSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub pledge: Pledge,
    pub campaign_title: String,
    pub campaign_owner_id: Uuid,
    pub backer_name: String,
    pub gateway_reference: String,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PledgeReceipt {
    pub pledge: Pledge,
    pub payment: Payment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePledgeRequest {
    pub campaign_id: Uuid,
    #[serde(deserialize_with = "super::money::deserialize")]
    pub amount: BigDecimal,
    /// Opaque card/source token issued to the client by the payment gateway.
    pub payment_token: String,
    pub message: Option<String>,
}

impl CreatePledgeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_amount("amount", &self.amount, &super::max_amount())?;
        check_length("paymentToken", &self.payment_token, 1, 255)?;
        check_optional_length("message", self.message.as_deref(), 500)
    }
}

/// Convert a two-decimal amount to integer minor units (cents) for the gateway.
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    use bigdecimal::ToPrimitive;
    (amount.clone() * BigDecimal::from(100)).with_scale(0).to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_units() {
        assert_eq!(to_minor_units(&BigDecimal::from_str("12.34").unwrap()), Some(1234));
        assert_eq!(to_minor_units(&BigDecimal::from(5)), Some(500));
    }

    #[test]
    fn pledge_request_requires_token() {
        let r = CreatePledgeRequest {
            campaign_id: Uuid::new_v4(),
            amount: BigDecimal::from(10),
            payment_token: " ".into(),
            message: None,
        };
        assert!(r.validate().unwrap_err().to_string().contains("paymentToken"));
    }

    #[test]
    fn numeric_amounts_validate_like_strings() {
        let body = format!(
            r#"{{"campaignId":"{}","amount":12.34,"paymentToken":"tok_visa"}}"#,
            Uuid::new_v4()
        );
        let r: CreatePledgeRequest = serde_json::from_str(&body).unwrap();
        assert!(r.validate().is_ok());
        assert_eq!(to_minor_units(&r.amount), Some(1234));

        let body = format!(
            r#"{{"campaignId":"{}","amount":0.001,"paymentToken":"tok_visa"}}"#,
            Uuid::new_v4()
        );
        let r: CreatePledgeRequest = serde_json::from_str(&body).unwrap();
        assert!(r.validate().unwrap_err().to_string().contains("decimal"));
    }
}
