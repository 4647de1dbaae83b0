// restaurant_api/src/services/stripe_gateway.rs

use crate::errors::{AppError, Result};
use crate::services::payment_gateway::{CheckoutSession, CheckoutSessionRequest, PaymentGateway};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Creates hosted checkout sessions as destination charges on the restaurant's connected account.
pub struct StripeGateway {
  client: reqwest::Client,
  api_base: String,
  secret_key: String,
}

impl StripeGateway {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
    Self {
      client: reqwest::Client::new(),
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    }
  }

  /// Form body for `POST /v1/checkout/sessions`.
  pub fn session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
      ("mode".to_string(), "payment".to_string()),
      ("success_url".to_string(), request.success_url.clone()),
      ("cancel_url".to_string(), request.cancel_url.clone()),
      ("metadata[orderId]".to_string(), request.order_id.to_string()),
      ("metadata[restaurantId]".to_string(), request.restaurant_id.to_string()),
      (
        "payment_intent_data[application_fee_amount]".to_string(),
        request.application_fee_cents.to_string(),
      ),
      (
        "payment_intent_data[transfer_data][destination]".to_string(),
        request.destination_account_id.clone(),
      ),
      (
        "payment_intent_data[metadata][orderId]".to_string(),
        request.order_id.to_string(),
      ),
      ("shipping_address_collection[allowed_countries][0]".to_string(), "US".to_string()),
      ("phone_number_collection[enabled]".to_string(), "true".to_string()),
    ];
    if let Some(email) = &request.customer_email {
      form.push(("customer_email".to_string(), email.clone()));
    }
    for (idx, item) in request.line_items.iter().enumerate() {
      let prefix = format!("line_items[{}]", idx);
      form.push((format!("{}[price_data][currency]", prefix), request.currency.clone()));
      form.push((format!("{}[price_data][product_data][name]", prefix), item.name.clone()));
      form.push((
        format!("{}[price_data][unit_amount]", prefix),
        item.unit_amount_cents.to_string(),
      ));
      form.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
    }
    form
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  #[instrument(name = "stripe::create_checkout_session", skip_all, fields(order_id = %request.order_id))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession> {
    let form = Self::session_form(request);
    let res = self
      .client
      .post(format!("{}/v1/checkout/sessions", self.api_base))
      .bearer_auth(&self.secret_key)
      .form(&form)
      .send()
      .await
      .map_err(|e| AppError::PaymentProvider(format!("Request to payment processor failed: {}", e)))?;

    let status = res.status();
    if !status.is_success() {
      let text = res.text().await.unwrap_or_default();
      warn!(%status, body = %text, "Payment processor rejected checkout session.");
      return Err(AppError::PaymentProvider(format!(
        "Checkout session creation failed with status {}",
        status
      )));
    }

    let body: Value = res
      .json()
      .await
      .map_err(|e| AppError::PaymentProvider(format!("Invalid payment processor response: {}", e)))?;
    let session_id = body
      .get("id")
      .and_then(Value::as_str)
      .ok_or_else(|| AppError::PaymentProvider("Response missing session id".to_string()))?;
    let url = body
      .get("url")
      .and_then(Value::as_str)
      .ok_or_else(|| AppError::PaymentProvider("Response missing checkout URL".to_string()))?;

    info!(session_id, "Checkout session created.");
    Ok(CheckoutSession {
      session_id: session_id.to_string(),
      url: url.to_string(),
    })
  }
}
