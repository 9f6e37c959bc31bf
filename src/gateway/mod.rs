use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::AppError;

/// The only redirect/lookup status that allows a ticket to be issued.
pub const APPROVED: &str = "approved";

/// One line of a checkout preference. Purchases are always a single line
/// with quantity 1 at the server-resolved unit price.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    /// Serialized as a JSON number; the gateway rejects string amounts.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub currency_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferencePayer {
    pub email: String,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// Opaque correlation data echoed back by the gateway. The reconciler does
/// not depend on it (the server-side intent row is authoritative), but it
/// makes gateway-side records attributable.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceMetadata {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub lot_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPreference {
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    pub back_urls: BackUrls,
    pub metadata: PreferenceMetadata,
}

impl CheckoutPreference {
    pub fn single_item(
        item_id: Uuid,
        title: impl Into<String>,
        unit_price: Decimal,
        currency: impl Into<String>,
        payer: PreferencePayer,
        back_urls: BackUrls,
        metadata: PreferenceMetadata,
    ) -> Self {
        Self {
            items: vec![PreferenceItem {
                id: item_id.to_string(),
                title: title.into(),
                quantity: 1,
                unit_price,
                currency_id: currency.into(),
            }],
            payer,
            back_urls,
            metadata,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceResponse {
    pub id: String,
    pub init_point: String,
    pub sandbox_init_point: Option<String>,
}

/// Server-side view of a payment, fetched by id during reconciliation.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLookup {
    pub id: String,
    pub status: String,
}

impl PaymentLookup {
    pub fn is_approved(&self) -> bool {
        self.status == APPROVED
    }
}

/// HTTP client for the checkout-preference payment gateway
/// (MercadoPago-compatible wire format).
#[derive(Clone)]
pub struct PaymentGateway {
    http: Client,
    base_url: String,
    access_token: String,
}

impl PaymentGateway {
    pub fn new(base_url: String, access_token: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            access_token,
        }
    }

    /// Create a checkout preference. Nothing local is committed by this
    /// call; a failure here is safe to retry from scratch.
    pub async fn create_preference(
        &self,
        preference: &CheckoutPreference,
    ) -> Result<PreferenceResponse, AppError> {
        let url = format!("{}/checkout/preferences", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(preference)
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("checkout creation failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::GatewayUnavailable(format!(
                "gateway rejected checkout creation with status {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AppError::GatewayUnavailable(format!("malformed checkout creation response: {e}"))
        })
    }

    /// Look a payment up by id. The reconciler trusts this, never the
    /// status query parameter the client arrives with.
    pub async fn lookup_payment(&self, payment_id: &str) -> Result<PaymentLookup, AppError> {
        let url = format!("{}/v1/payments/{payment_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("payment lookup failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::GatewayUnavailable(format!(
                "gateway rejected payment lookup with status {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AppError::GatewayUnavailable(format!("malformed payment lookup response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_preference() -> CheckoutPreference {
        CheckoutPreference::single_item(
            Uuid::nil(),
            "Rust Meetup - Early Bird",
            dec!(20.00),
            "USD",
            PreferencePayer {
                email: "ada@example.com".into(),
                name: "Ada".into(),
                surname: "Lovelace".into(),
            },
            BackUrls {
                success: "http://localhost:3001/payments/return".into(),
                failure: "http://localhost:3001/payments/failure".into(),
                pending: "http://localhost:3001/payments/pending".into(),
            },
            PreferenceMetadata {
                user_id: Uuid::nil(),
                event_id: Uuid::nil(),
                lot_id: None,
            },
        )
    }

    #[test]
    fn preference_serializes_to_the_gateway_wire_shape() {
        let value = serde_json::to_value(sample_preference()).unwrap();

        let item = &value["items"][0];
        assert_eq!(item["quantity"], 1);
        assert_eq!(item["unit_price"], serde_json::json!(20.0));
        assert_eq!(item["currency_id"], "USD");
        assert_eq!(item["title"], "Rust Meetup - Early Bird");

        assert_eq!(value["payer"]["surname"], "Lovelace");
        assert!(value["back_urls"]["success"]
            .as_str()
            .unwrap()
            .ends_with("/payments/return"));
        assert!(value["metadata"].get("user_id").is_some());
        assert!(value["metadata"].get("event_id").is_some());
    }

    #[test]
    fn only_the_approved_status_counts_as_approved() {
        let approved = PaymentLookup {
            id: "pay_1".into(),
            status: "approved".into(),
        };
        let pending = PaymentLookup {
            id: "pay_2".into(),
            status: "pending".into(),
        };
        assert!(approved.is_approved());
        assert!(!pending.is_approved());
    }
}
