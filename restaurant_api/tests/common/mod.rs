// restaurant_api/tests/common/mod.rs
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use chrono::Utc;
use once_cell::sync::Lazy;
use restaurant_api::config::AppConfig;
use restaurant_api::db::{MemoryStore, OrderStore};
use restaurant_api::models::{DeliveryInfo, MenuItem, Order, OrderItem, OrderStatus, Restaurant};
use restaurant_api::services::payment_mock::MockPaymentGateway;
use restaurant_api::services::signature::{sign_hex_hmac, sign_stripe_payload};
use restaurant_api::state::AppState;
use restaurant_api::web::configure_app_routes;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub const PAYMENT_SECRET: &str = "whsec_test_secret";
pub const DELIVERY_SECRET: &str = "delivery_test_secret";
pub const CONNECTED_ACCOUNT: &str = "acct_test_kitchen";

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// Local config with both webhook secrets set.
pub fn signed_config() -> AppConfig {
  let mut config = AppConfig::for_local();
  config.payment_webhook_secret = Some(PAYMENT_SECRET.to_string());
  config.delivery_webhook_secret = Some(DELIVERY_SECRET.to_string());
  config
}

pub struct Fixture {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<MockPaymentGateway>,
  pub restaurant: Restaurant,
  pub burger: MenuItem,
  pub fries: MenuItem,
}

impl Fixture {
  pub async fn new() -> Self {
    Self::with(signed_config(), MockPaymentGateway::recording()).await
  }

  pub async fn with(config: AppConfig, gateway: MockPaymentGateway) -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(gateway);

    let restaurant = Restaurant {
      id: Uuid::new_v4(),
      name: "Corner Kitchen".to_string(),
      connected_account_id: Some(CONNECTED_ACCOUNT.to_string()),
    };
    let burger = MenuItem {
      id: Uuid::new_v4(),
      restaurant_id: restaurant.id,
      name: "Smash Burger".to_string(),
      price_cents: 1299,
    };
    let fries = MenuItem {
      id: Uuid::new_v4(),
      restaurant_id: restaurant.id,
      name: "Fries".to_string(),
      price_cents: 450,
    };
    store.insert_restaurant(restaurant.clone()).await;
    store.insert_menu_item(burger.clone()).await;
    store.insert_menu_item(fries.clone()).await;

    let state = AppState::new(store.clone(), gateway.clone(), Arc::new(config));
    Self {
      state,
      store,
      gateway,
      restaurant,
      burger,
      fries,
    }
  }

  pub fn app(
    &self,
  ) -> App<
    impl ServiceFactory<
      ServiceRequest,
      Config = (),
      Response = ServiceResponse<impl MessageBody>,
      Error = actix_web::Error,
      InitError = (),
    >,
  > {
    App::new()
      .app_data(web::Data::new(self.state.clone()))
      .configure(configure_app_routes)
  }

  /// A pickup order of two burgers and one fries.
  pub async fn pickup_order(&self, status: OrderStatus) -> Order {
    let mut order = Order::new(self.restaurant.id, false, 0);
    order.status = status;
    self.store.save_order(&order).await.unwrap();
    self.add_item(order.id, &self.burger, 2).await;
    self.add_item(order.id, &self.fries, 1).await;
    order
  }

  pub async fn delivery_order(&self, delivery_id: &str, status: OrderStatus) -> Order {
    let mut order = Order::new(self.restaurant.id, true, 599);
    order.status = status;
    order.delivery_info = Some(DeliveryInfo::new(delivery_id, "courier-co", 599));
    self.store.save_order(&order).await.unwrap();
    self.add_item(order.id, &self.burger, 1).await;
    order
  }

  pub async fn add_item(&self, order_id: Uuid, menu_item: &MenuItem, quantity: i32) {
    self
      .store
      .insert_order_item(OrderItem {
        id: Uuid::new_v4(),
        order_id,
        menu_item_id: menu_item.id,
        quantity,
        special_instructions: None,
      })
      .await;
  }

  pub async fn stored_order(&self, order_id: Uuid) -> Order {
    self.store.get_order(order_id).await.unwrap().expect("order should exist")
  }
}

pub fn payment_signature(body: &[u8]) -> String {
  sign_stripe_payload(body, PAYMENT_SECRET, Utc::now().timestamp()).unwrap()
}

pub fn delivery_signature(body: &[u8]) -> String {
  sign_hex_hmac(body, DELIVERY_SECRET).unwrap()
}
