// restaurant_api/src/models/order.rs

use crate::errors::AppError;
use crate::models::delivery::{DeliveryInfo, Driver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle. Stored as its SCREAMING_SNAKE_CASE name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  PaymentProcessing,
  Paid,
  Preparing,
  Ready,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::PaymentProcessing => "PAYMENT_PROCESSING",
      OrderStatus::Paid => "PAID",
      OrderStatus::Preparing => "PREPARING",
      OrderStatus::Ready => "READY",
      OrderStatus::Completed => "COMPLETED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }

  // Cancelled sits outside the forward order; it is reachable from any non-terminal state.
  fn rank(self) -> u8 {
    match self {
      OrderStatus::Pending => 0,
      OrderStatus::PaymentProcessing => 1,
      OrderStatus::Paid => 2,
      OrderStatus::Preparing => 3,
      OrderStatus::Ready => 4,
      OrderStatus::Completed => 5,
      OrderStatus::Cancelled => u8::MAX,
    }
  }

  /// Forward-only transition guard shared by both webhook reconcilers and the portal.
  pub fn can_advance_to(self, next: OrderStatus) -> bool {
    if next == self || self.is_terminal() {
      return false;
    }
    if next == OrderStatus::Cancelled {
      return true;
    }
    next.rank() > self.rank()
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for OrderStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "PENDING" => Ok(OrderStatus::Pending),
      "PAYMENT_PROCESSING" => Ok(OrderStatus::PaymentProcessing),
      "PAID" => Ok(OrderStatus::Paid),
      "PREPARING" => Ok(OrderStatus::Preparing),
      "READY" => Ok(OrderStatus::Ready),
      "COMPLETED" => Ok(OrderStatus::Completed),
      "CANCELLED" => Ok(OrderStatus::Cancelled),
      other => Err(AppError::Validation(format!("Unknown order status '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  pub line1: Option<String>,
  pub line2: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub postal_code: Option<String>,
  pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub restaurant_id: Uuid,
  pub status: OrderStatus,
  pub is_delivery: bool,
  pub delivery_fee_cents: i64,
  pub delivery_info: Option<DeliveryInfo>,
  pub driver: Option<Driver>,
  pub checkout_session_id: Option<String>,
  pub payment_intent_id: Option<String>,
  pub customer: CustomerDetails,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn new(restaurant_id: Uuid, is_delivery: bool, delivery_fee_cents: i64) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      restaurant_id,
      status: OrderStatus::Pending,
      is_delivery,
      delivery_fee_cents,
      delivery_info: None,
      driver: None,
      checkout_session_id: None,
      payment_intent_id: None,
      customer: CustomerDetails::default(),
      created_at: now,
      updated_at: now,
    }
  }

  /// Applies `next` through the forward-only guard. Returns whether the status changed.
  pub fn advance_status(&mut self, next: OrderStatus) -> bool {
    if self.status.can_advance_to(next) {
      self.status = next;
      true
    } else {
      false
    }
  }
}
