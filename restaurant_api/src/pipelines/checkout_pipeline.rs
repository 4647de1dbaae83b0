// restaurant_api/src/pipelines/checkout_pipeline.rs

//! Prices an order and opens a hosted checkout session for it.

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::payment_gateway::CheckoutSessionRequest;
use crate::services::pricing::{quote_checkout, PricedItem};
use chrono::Utc;
use galley::{ContextData, Galley, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn};

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("load_checkout_order", false, None),
    ("load_restaurant", false, None),
    ("price_order_items", false, None),
    ("compute_checkout_quote", false, None),
    ("create_payment_session", false, None),
    ("mark_payment_processing", false, None),
  ]);

  p.on_root("load_checkout_order", |ctx: ContextData<CheckoutCtxData>| async move {
    let (store, order_id) = {
      let guard = ctx.read();
      (guard.app_state.store.clone(), guard.order_id)
    };
    let order = store
      .get_order(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
    if !matches!(order.status, OrderStatus::Pending | OrderStatus::PaymentProcessing) {
      return Err(AppError::Conflict(format!(
        "Order {} is {} and can no longer be checked out",
        order_id, order.status
      )));
    }
    ctx.write().order = Some(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("load_restaurant", |ctx: ContextData<CheckoutCtxData>| async move {
    let (store, restaurant_id, order_restaurant_id) = {
      let guard = ctx.read();
      (
        guard.app_state.store.clone(),
        guard.restaurant_id,
        guard.order.as_ref().map(|o| o.restaurant_id),
      )
    };
    let restaurant = store
      .get_restaurant(restaurant_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", restaurant_id)))?;
    if order_restaurant_id != Some(restaurant.id) {
      return Err(AppError::Validation("Order does not belong to this restaurant".to_string()));
    }
    if restaurant.connected_account_id.is_none() {
      warn!(%restaurant_id, "Restaurant has no connected payment account.");
      return Err(AppError::Validation(
        "Restaurant has not finished payment account setup".to_string(),
      ));
    }
    ctx.write().restaurant = Some(restaurant);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("price_order_items", |ctx: ContextData<CheckoutCtxData>| async move {
    let (store, order_id) = {
      let guard = ctx.read();
      (guard.app_state.store.clone(), guard.order_id)
    };
    let items = store.list_order_items(order_id).await?;
    if items.is_empty() {
      return Err(AppError::Validation(format!("Order {} has no items", order_id)));
    }

    let mut priced = Vec::with_capacity(items.len());
    for item in items {
      let menu_item = store
        .get_menu_item(item.menu_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Menu item {} not found", item.menu_item_id)))?;
      priced.push(PricedItem {
        name: menu_item.name,
        unit_price_cents: menu_item.price_cents,
        quantity: i64::from(item.quantity),
      });
    }
    ctx.write().priced_items = priced;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("compute_checkout_quote", |ctx: ContextData<CheckoutCtxData>| async move {
    let mut guard = ctx.write();
    let (is_delivery, delivery_fee_cents) = guard
      .order
      .as_ref()
      .map(|o| (o.is_delivery, o.delivery_fee_cents))
      .ok_or_else(|| AppError::Internal("Order missing after load".to_string()))?;
    let quote = quote_checkout(
      &guard.priced_items,
      is_delivery,
      delivery_fee_cents,
      &guard.app_state.config.fees,
    )?;
    info!(
      items_total = quote.items_total_cents,
      platform_fee = quote.platform_fee_cents,
      total = quote.total_cents,
      "Checkout quote computed."
    );
    guard.quote = Some(quote);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("create_payment_session", |ctx: ContextData<CheckoutCtxData>| async move {
    let (gateway, request) = {
      let guard = ctx.read();
      let quote = guard
        .quote
        .as_ref()
        .ok_or_else(|| AppError::Internal("Quote missing before session creation".to_string()))?;
      let destination = guard
        .restaurant
        .as_ref()
        .and_then(|r| r.connected_account_id.clone())
        .ok_or_else(|| AppError::Internal("Restaurant missing before session creation".to_string()))?;
      let config = &guard.app_state.config;
      let base = config.storefront_base_url.trim_end_matches('/');
      let request = CheckoutSessionRequest {
        order_id: guard.order_id,
        restaurant_id: guard.restaurant_id,
        currency: config.currency.clone(),
        line_items: quote.line_items.clone(),
        application_fee_cents: quote.platform_fee_cents,
        destination_account_id: destination,
        customer_email: guard.order.as_ref().and_then(|o| o.customer.email.clone()),
        success_url: format!("{}/orders/{}?checkout=success", base, guard.order_id),
        cancel_url: format!("{}/orders/{}?checkout=cancelled", base, guard.order_id),
      };
      (guard.app_state.gateway.clone(), request)
    };

    let session = gateway.create_checkout_session(&request).await?;
    ctx.write().session = Some(session);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("mark_payment_processing", |ctx: ContextData<CheckoutCtxData>| async move {
    let (store, order) = {
      let mut guard = ctx.write();
      let session_id = guard.session.as_ref().map(|s| s.session_id.clone());
      let store = guard.app_state.store.clone();
      let order = guard
        .order
        .as_mut()
        .ok_or_else(|| AppError::Internal("Order missing after load".to_string()))?;
      order.advance_status(OrderStatus::PaymentProcessing);
      order.checkout_session_id = session_id;
      order.updated_at = Utc::now();
      (store, order.clone())
    };
    store.save_order(&order).await?;
    info!(order_id = %order.id, session_id = ?order.checkout_session_id, "Order awaiting payment.");
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p
}

pub fn register_checkout_pipeline(galley: &Arc<Galley<AppError>>) {
  galley.register_pipeline(build_checkout_pipeline());
  info!("Checkout pipeline registered.");
}
