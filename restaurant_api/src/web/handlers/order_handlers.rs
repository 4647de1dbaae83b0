// restaurant_api/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::contexts::StatusUpdateCtxData;
use crate::state::AppState;
use crate::web::extractors::RestaurantScope;
use galley::ContextData;

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let order = app_state
    .store
    .get_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

  Ok(HttpResponse::Ok().json(json!({
    "id": order.id,
    "restaurantId": order.restaurant_id,
    "status": order.status,
    "isDelivery": order.is_delivery,
    "deliveryInfo": order.delivery_info,
    "driver": order.driver,
    "updatedAt": order.updated_at,
  })))
}

#[instrument(name = "handler::list_portal_orders", skip(app_state), fields(restaurant_id = %scope.restaurant_id))]
pub async fn list_portal_orders_handler(
  app_state: web::Data<AppState>,
  scope: RestaurantScope,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.store.list_orders_for_restaurant(scope.restaurant_id).await?;
  info!(count = orders.len(), "Portal orders listed.");
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[derive(Deserialize, Debug)]
pub struct StatusUpdatePayload {
  pub status: String,
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, path, payload),
  fields(restaurant_id = %scope.restaurant_id, order_id = %path.as_ref())
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  scope: RestaurantScope,
  path: web::Path<Uuid>,
  payload: web::Json<StatusUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let requested: OrderStatus = payload.status.parse()?;

  let ctx_data = ContextData::new(StatusUpdateCtxData::new(
    app_state.get_ref().clone(),
    scope.restaurant_id,
    order_id,
    requested,
  ));
  app_state.galley.run(ctx_data.clone()).await?;

  let order = ctx_data
    .read()
    .loaded
    .current
    .clone()
    .ok_or_else(|| AppError::Internal("Status update finished without an order".to_string()))?;
  Ok(HttpResponse::Ok().json(order))
}
