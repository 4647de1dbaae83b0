// restaurant_api/src/services/payment_mock.rs

use crate::errors::{AppError, Result};
use crate::services::payment_gateway::{CheckoutSession, CheckoutSessionRequest, PaymentGateway};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

/// In-process gateway for local runs and tests.
///
/// Only a gateway built with `recording()` keeps the requests it receives, so
/// a long-running local server does not accumulate them.
#[derive(Default)]
pub struct MockPaymentGateway {
  requests: Option<Mutex<Vec<CheckoutSessionRequest>>>,
  fail_with: Option<String>,
}

impl MockPaymentGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn recording() -> Self {
    Self {
      requests: Some(Mutex::new(Vec::new())),
      fail_with: None,
    }
  }

  /// A gateway whose every call fails as an unreachable processor would.
  pub fn failing(message: impl Into<String>) -> Self {
    Self {
      requests: None,
      fail_with: Some(message.into()),
    }
  }

  /// Empty unless the gateway was built with `recording()`.
  pub async fn recorded_requests(&self) -> Vec<CheckoutSessionRequest> {
    match &self.requests {
      Some(requests) => requests.lock().await.clone(),
      None => Vec::new(),
    }
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(name = "mock_gateway::create_checkout_session", skip_all, fields(order_id = %request.order_id))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession> {
    if let Some(requests) = &self.requests {
      requests.lock().await.push(request.clone());
    }
    if let Some(message) = &self.fail_with {
      return Err(AppError::PaymentProvider(message.clone()));
    }
    let session_id = format!("cs_mock_{}", Uuid::new_v4().simple());
    info!(%session_id, "Simulated checkout session.");
    Ok(CheckoutSession {
      url: format!("https://checkout.mock.local/pay/{}", session_id),
      session_id,
    })
  }
}
