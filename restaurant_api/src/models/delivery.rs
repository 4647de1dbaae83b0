// restaurant_api/src/models/delivery.rs

use crate::models::order::OrderStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
  Pending,
  Confirmed,
  PickingUp,
  PickedUp,
  Delivering,
  Completed,
  Cancelled,
  Failed,
}

impl DeliveryStatus {
  /// Maps a delivery provider event code. Unrecognized codes map to `Pending`.
  pub fn from_provider_event(event: &str) -> Self {
    match event {
      "created" => DeliveryStatus::Pending,
      "assigned_driver" => DeliveryStatus::Confirmed,
      "pickup_enroute" | "pickup_arrived" => DeliveryStatus::PickingUp,
      "pickup_complete" | "dropoff_enroute" => DeliveryStatus::PickedUp,
      "dropoff_arrived" => DeliveryStatus::Delivering,
      "dropoff_complete" => DeliveryStatus::Completed,
      "failed" => DeliveryStatus::Failed,
      e if e.starts_with("canceled_by_") || e.starts_with("cancelled_by_") => DeliveryStatus::Cancelled,
      _ => DeliveryStatus::Pending,
    }
  }

  /// The order status this delivery state implies.
  pub fn order_status(self) -> OrderStatus {
    match self {
      DeliveryStatus::Pending
      | DeliveryStatus::Confirmed
      | DeliveryStatus::PickingUp
      | DeliveryStatus::PickedUp
      | DeliveryStatus::Delivering => OrderStatus::Preparing,
      DeliveryStatus::Completed => OrderStatus::Completed,
      DeliveryStatus::Cancelled | DeliveryStatus::Failed => OrderStatus::Cancelled,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub lat: f64,
  pub lng: f64,
}

/// Delivery sub-record embedded in the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
  pub delivery_id: String,
  pub provider: String,
  pub status: DeliveryStatus,
  pub fee_cents: i64,
  pub tracking_url: Option<String>,
  /// Raw provider event code of the last applied event.
  pub last_event: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl DeliveryInfo {
  pub fn new(delivery_id: impl Into<String>, provider: impl Into<String>, fee_cents: i64) -> Self {
    let now = Utc::now();
    Self {
      delivery_id: delivery_id.into(),
      provider: provider.into(),
      status: DeliveryStatus::Pending,
      fee_cents,
      tracking_url: None,
      last_event: None,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Courier sub-record embedded in the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
  pub name: Option<String>,
  pub phone: Option<String>,
  pub location: Option<Coordinates>,
  pub location_updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn provider_events_map_to_delivery_status() {
    let table = [
      ("created", DeliveryStatus::Pending),
      ("assigned_driver", DeliveryStatus::Confirmed),
      ("pickup_enroute", DeliveryStatus::PickingUp),
      ("pickup_arrived", DeliveryStatus::PickingUp),
      ("pickup_complete", DeliveryStatus::PickedUp),
      ("dropoff_enroute", DeliveryStatus::PickedUp),
      ("dropoff_arrived", DeliveryStatus::Delivering),
      ("dropoff_complete", DeliveryStatus::Completed),
      ("canceled_by_customer", DeliveryStatus::Cancelled),
      ("canceled_by_oneroute", DeliveryStatus::Cancelled),
      ("failed", DeliveryStatus::Failed),
      ("returned_to_sender", DeliveryStatus::Pending),
      ("", DeliveryStatus::Pending),
    ];
    for (event, expected) in table {
      assert_eq!(DeliveryStatus::from_provider_event(event), expected, "event {}", event);
    }
  }

  #[test]
  fn delivery_status_maps_to_order_status() {
    assert_eq!(DeliveryStatus::Confirmed.order_status(), OrderStatus::Preparing);
    assert_eq!(DeliveryStatus::Delivering.order_status(), OrderStatus::Preparing);
    assert_eq!(DeliveryStatus::Completed.order_status(), OrderStatus::Completed);
    assert_eq!(DeliveryStatus::Failed.order_status(), OrderStatus::Cancelled);
    assert_eq!(DeliveryStatus::Cancelled.order_status(), OrderStatus::Cancelled);
  }
}
