// restaurant_api/src/services/payment_gateway.rs

use crate::errors::Result;
use crate::services::pricing::LineItem;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Everything the payment processor needs to open a hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
  pub order_id: Uuid,
  pub restaurant_id: Uuid,
  pub currency: String,
  pub line_items: Vec<LineItem>,
  /// Withheld by the platform from the destination charge.
  pub application_fee_cents: i64,
  pub destination_account_id: String,
  pub customer_email: Option<String>,
  pub success_url: String,
  pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
  pub session_id: String,
  pub url: String,
}

/// Seam to the payment processor. Failures surface as `AppError::PaymentProvider`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession>;
}
