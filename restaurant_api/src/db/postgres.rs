// restaurant_api/src/db/postgres.rs

use crate::db::OrderStore;
use crate::errors::{AppError, Result};
use crate::models::{CustomerDetails, DeliveryInfo, Driver, MenuItem, Order, OrderItem, OrderStatus, Restaurant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, restaurant_id, status, is_delivery, delivery_fee_cents, delivery_info, driver, \
   checkout_session_id, payment_intent_id, customer, created_at, updated_at";

/// Postgres-backed store. Delivery info, driver and customer are JSONB columns on `orders`.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPool::connect(database_url).await?;
    Ok(Self::new(pool))
  }

  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))
  }

  fn order_from_row(row: &PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let delivery_info: Option<Json<DeliveryInfo>> = row.try_get("delivery_info")?;
    let driver: Option<Json<Driver>> = row.try_get("driver")?;
    let customer: Json<CustomerDetails> = row.try_get("customer")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Order {
      id: row.try_get("id")?,
      restaurant_id: row.try_get("restaurant_id")?,
      status: status.parse::<OrderStatus>()?,
      is_delivery: row.try_get("is_delivery")?,
      delivery_fee_cents: row.try_get("delivery_fee_cents")?,
      delivery_info: delivery_info.map(|j| j.0),
      driver: driver.map(|j| j.0),
      checkout_session_id: row.try_get("checkout_session_id")?,
      payment_intent_id: row.try_get("payment_intent_id")?,
      customer: customer.0,
      created_at,
      updated_at,
    })
  }

  async fn fetch_orders(&self, sql: &str, restaurant_id: Option<Uuid>) -> Result<Vec<Order>> {
    let mut query = sqlx::query(sql);
    if let Some(id) = restaurant_id {
      query = query.bind(id);
    }
    let rows = query.fetch_all(&self.pool).await?;
    rows.iter().map(Self::order_from_row).collect()
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let row = sqlx::query(&sql).bind(order_id).fetch_optional(&self.pool).await?;
    row.as_ref().map(Self::order_from_row).transpose()
  }

  async fn save_order(&self, order: &Order) -> Result<()> {
    sqlx::query(
      "INSERT INTO orders (id, restaurant_id, status, is_delivery, delivery_fee_cents, delivery_info, driver, \
         checkout_session_id, payment_intent_id, customer, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
       ON CONFLICT (id) DO UPDATE SET \
         status = EXCLUDED.status, is_delivery = EXCLUDED.is_delivery, \
         delivery_fee_cents = EXCLUDED.delivery_fee_cents, delivery_info = EXCLUDED.delivery_info, \
         driver = EXCLUDED.driver, checkout_session_id = EXCLUDED.checkout_session_id, \
         payment_intent_id = EXCLUDED.payment_intent_id, customer = EXCLUDED.customer, \
         updated_at = EXCLUDED.updated_at",
    )
    .bind(order.id)
    .bind(order.restaurant_id)
    .bind(order.status.as_str())
    .bind(order.is_delivery)
    .bind(order.delivery_fee_cents)
    .bind(order.delivery_info.as_ref().map(Json))
    .bind(order.driver.as_ref().map(Json))
    .bind(order.checkout_session_id.as_deref())
    .bind(order.payment_intent_id.as_deref())
    .bind(Json(&order.customer))
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn list_delivery_orders(&self) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE is_delivery ORDER BY created_at",
      ORDER_COLUMNS
    );
    self.fetch_orders(&sql, None).await
  }

  async fn list_orders_for_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE restaurant_id = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    );
    self.fetch_orders(&sql, Some(restaurant_id)).await
  }

  async fn get_restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>> {
    let restaurant =
      sqlx::query_as::<_, Restaurant>("SELECT id, name, connected_account_id FROM restaurants WHERE id = $1")
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
    Ok(restaurant)
  }

  async fn list_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
      "SELECT id, order_id, menu_item_id, quantity, special_instructions FROM order_items WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(items)
  }

  async fn get_menu_item(&self, menu_item_id: Uuid) -> Result<Option<MenuItem>> {
    let item = sqlx::query_as::<_, MenuItem>("SELECT id, restaurant_id, name, price_cents FROM menu_items WHERE id = $1")
      .bind(menu_item_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(item)
  }
}
