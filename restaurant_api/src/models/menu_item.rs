// restaurant_api/src/models/menu_item.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
  pub id: Uuid,
  pub restaurant_id: Uuid,
  pub name: String,
  pub price_cents: i64,
}
