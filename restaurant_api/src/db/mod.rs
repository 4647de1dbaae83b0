// restaurant_api/src/db/mod.rs

//! Order store seam. Writes are per-record upserts; the last write wins.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{MenuItem, Order, OrderItem, Restaurant};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>>;

  /// Inserts or replaces the whole order record.
  async fn save_order(&self, order: &Order) -> Result<()>;

  /// Every order flagged for delivery, in creation order.
  async fn list_delivery_orders(&self) -> Result<Vec<Order>>;

  /// Newest first.
  async fn list_orders_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Order>>;

  async fn get_restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>>;

  async fn list_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>>;

  async fn get_menu_item(&self, menu_item_id: Uuid) -> Result<Option<MenuItem>>;
}
