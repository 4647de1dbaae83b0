// restaurant_api/src/db/memory.rs

use crate::db::OrderStore;
use crate::errors::Result;
use crate::models::{MenuItem, Order, OrderItem, Restaurant};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Map-backed store used by tests and when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
  orders: RwLock<HashMap<Uuid, Order>>,
  restaurants: RwLock<HashMap<Uuid, Restaurant>>,
  menu_items: RwLock<HashMap<Uuid, MenuItem>>,
  order_items: RwLock<Vec<OrderItem>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn insert_restaurant(&self, restaurant: Restaurant) {
    self.restaurants.write().await.insert(restaurant.id, restaurant);
  }

  pub async fn insert_menu_item(&self, item: MenuItem) {
    self.menu_items.write().await.insert(item.id, item);
  }

  pub async fn insert_order_item(&self, item: OrderItem) {
    self.order_items.write().await.push(item);
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.orders.read().await.get(&order_id).cloned())
  }

  async fn save_order(&self, order: &Order) -> Result<()> {
    self.orders.write().await.insert(order.id, order.clone());
    Ok(())
  }

  async fn list_delivery_orders(&self) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self.orders.read().await.values().filter(|o| o.is_delivery).cloned().collect();
    orders.sort_by_key(|o| o.created_at);
    Ok(orders)
  }

  async fn list_orders_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .orders
      .read()
      .await
      .values()
      .filter(|o| o.restaurant_id == restaurant_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn get_restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>> {
    Ok(self.restaurants.read().await.get(&restaurant_id).cloned())
  }

  async fn list_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    Ok(
      self
        .order_items
        .read()
        .await
        .iter()
        .filter(|i| i.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn get_menu_item(&self, menu_item_id: Uuid) -> Result<Option<MenuItem>> {
    Ok(self.menu_items.read().await.get(&menu_item_id).cloned())
  }
}
