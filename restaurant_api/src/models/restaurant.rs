// restaurant_api/src/models/restaurant.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
  pub id: Uuid,
  pub name: String,
  /// Payment processor account that receives the restaurant's payout.
  pub connected_account_id: Option<String>,
}
