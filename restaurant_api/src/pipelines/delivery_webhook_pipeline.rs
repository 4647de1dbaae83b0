// restaurant_api/src/pipelines/delivery_webhook_pipeline.rs

//! Reconciles delivery provider events into the order's delivery and courier sub-records.

use crate::errors::AppError;
use crate::models::{Coordinates, DeliveryStatus, Driver, Order};
use crate::pipelines::common_steps::{register_persist_order_step, skip_when_unchanged, PERSIST_ORDER_STEP};
use crate::pipelines::contexts::{DeliveryEventCtxData, LoadedOrder};
use crate::services::signature::verify_hex_hmac;
use chrono::Utc;
use galley::{ContextData, Pipeline, PipelineControl};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Deserialize)]
struct DeliveryWebhookPayload {
  #[serde(rename = "type")]
  event_type: Option<String>,
  event: Option<String>,
  data: Option<DeliveryWebhookData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryWebhookData {
  id: Option<String>,
  #[serde(default)]
  job_configurations: Vec<JobConfiguration>,
}

#[derive(Deserialize)]
struct JobConfiguration {
  #[serde(default)]
  tasks: Vec<JobTask>,
}

#[derive(Deserialize)]
struct JobTask {
  delivery: Option<TaskDelivery>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TaskDelivery {
  tracking_url: Option<String>,
  courier_name: Option<String>,
  courier_phone_number: Option<String>,
  courier_location: Option<CourierLocation>,
}

#[derive(Deserialize)]
struct CourierLocation {
  lat: f64,
  lng: f64,
}

/// Courier fields present in one event. Absent fields leave the stored driver untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourierUpdate {
  pub name: Option<String>,
  pub phone: Option<String>,
  pub location: Option<Coordinates>,
}

impl CourierUpdate {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.phone.is_none() && self.location.is_none()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryEvent {
  pub event_type: String,
  /// Provider status code, e.g. `dropoff_complete`.
  pub event: String,
  pub delivery_id: String,
  pub tracking_url: Option<String>,
  pub courier: CourierUpdate,
}

pub fn parse_delivery_event(body: &[u8]) -> Result<DeliveryEvent, AppError> {
  let payload: DeliveryWebhookPayload =
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Malformed delivery event: {}", e)))?;

  let event_type = payload
    .event_type
    .ok_or_else(|| AppError::Validation("Delivery event has no type".to_string()))?;
  let event = payload
    .event
    .ok_or_else(|| AppError::Validation("Delivery event has no event code".to_string()))?;
  let data = payload
    .data
    .ok_or_else(|| AppError::Validation("Delivery event has no data".to_string()))?;
  let delivery_id = data
    .id
    .filter(|id| !id.is_empty())
    .ok_or_else(|| AppError::Validation("Delivery event has no data.id".to_string()))?;

  let delivery = data
    .job_configurations
    .into_iter()
    .next()
    .and_then(|job| job.tasks.into_iter().next())
    .and_then(|task| task.delivery)
    .unwrap_or_default();

  Ok(DeliveryEvent {
    event_type,
    event,
    delivery_id,
    tracking_url: delivery.tracking_url,
    courier: CourierUpdate {
      name: delivery.courier_name,
      phone: delivery.courier_phone_number,
      location: delivery.courier_location.map(|l| Coordinates { lat: l.lat, lng: l.lng }),
    },
  })
}

/// Updates `delivery_info` from the event (last write wins) and derives the order status through the guard.
///
/// Returns `false` when the order has no delivery sub-record to update.
pub fn apply_delivery_status(order: &mut Order, event: &DeliveryEvent) -> bool {
  let delivery_status = DeliveryStatus::from_provider_event(&event.event);
  let info = match order.delivery_info.as_mut() {
    Some(info) => info,
    None => return false,
  };
  if info.status != delivery_status || info.last_event.as_deref() != Some(event.event.as_str()) {
    info.status = delivery_status;
    info.last_event = Some(event.event.clone());
    info.updated_at = Utc::now();
  }
  if let Some(url) = &event.tracking_url {
    if info.tracking_url.as_ref() != Some(url) {
      info.tracking_url = Some(url.clone());
      info.updated_at = Utc::now();
    }
  }

  let target = delivery_status.order_status();
  if !order.advance_status(target) {
    info!(
      order_id = %order.id,
      current = %order.status,
      requested = %target,
      "Order status left as is by lifecycle guard."
    );
  }
  true
}

/// Merges courier identity and location into `order.driver` without clobbering absent fields.
pub fn merge_courier_details(order: &mut Order, courier: &CourierUpdate) {
  let driver = order.driver.get_or_insert_with(Driver::default);
  if courier.name.is_some() && driver.name != courier.name {
    driver.name = courier.name.clone();
  }
  if courier.phone.is_some() && driver.phone != courier.phone {
    driver.phone = courier.phone.clone();
  }
  if courier.location.is_some() && driver.location != courier.location {
    driver.location = courier.location;
    driver.location_updated_at = Some(Utc::now());
  }
}

pub fn build_delivery_webhook_pipeline() -> Pipeline<DeliveryEventCtxData, AppError> {
  let mut p = Pipeline::<DeliveryEventCtxData, AppError>::new(&[
    (
      "verify_delivery_signature",
      false,
      Some(Arc::new(|ctx: ContextData<DeliveryEventCtxData>| {
        ctx.read().app_state.config.delivery_webhook_secret.is_none()
      })),
    ),
    ("parse_delivery_event", false, None),
    ("locate_delivery_order", false, None),
    ("apply_delivery_status", false, None),
    (
      "merge_courier_details",
      false,
      Some(Arc::new(|ctx: ContextData<DeliveryEventCtxData>| {
        ctx.read().event.as_ref().map_or(true, |e| e.courier.is_empty())
      })),
    ),
    (PERSIST_ORDER_STEP, false, Some(skip_when_unchanged())),
  ]);

  p.on_root("verify_delivery_signature", |ctx: ContextData<DeliveryEventCtxData>| async move {
    let guard = ctx.read();
    let secret = guard
      .app_state
      .config
      .delivery_webhook_secret
      .as_deref()
      .ok_or_else(|| AppError::Config("DELIVERY_WEBHOOK_SECRET is not configured".to_string()))?;
    let signature = guard
      .signature_header
      .as_deref()
      .ok_or_else(|| AppError::Signature("Missing X-Delivery-Signature header".to_string()))?;
    verify_hex_hmac(signature, &guard.raw_body, secret)?;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("parse_delivery_event", |ctx: ContextData<DeliveryEventCtxData>| async move {
    let raw_body = ctx.read().raw_body.clone();
    let event = parse_delivery_event(&raw_body)?;
    info!(
      event_type = %event.event_type,
      event = %event.event,
      delivery_id = %event.delivery_id,
      "Delivery event parsed."
    );
    ctx.write().event = Some(event);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  // No index on the embedded delivery id: scan every delivery order.
  p.on_root("locate_delivery_order", |ctx: ContextData<DeliveryEventCtxData>| async move {
    let (store, delivery_id) = {
      let guard = ctx.read();
      let delivery_id = guard.event.as_ref().map(|e| e.delivery_id.clone());
      (guard.app_state.store.clone(), delivery_id)
    };
    let delivery_id = delivery_id.ok_or_else(|| AppError::Internal("Delivery event missing after parse".to_string()))?;

    let found = store.list_delivery_orders().await?.into_iter().find(|order| {
      order
        .delivery_info
        .as_ref()
        .is_some_and(|info| info.delivery_id == delivery_id)
    });
    match found {
      Some(order) => {
        ctx.write().loaded = LoadedOrder::load(order);
        Ok::<_, AppError>(PipelineControl::Continue)
      }
      None => {
        warn!(%delivery_id, "No order matches delivery id, acknowledging without changes.");
        ctx.write().ignored_reason = Some(format!("no order for delivery {}", delivery_id));
        Ok(PipelineControl::Stop)
      }
    }
  });

  p.on_root("apply_delivery_status", |ctx: ContextData<DeliveryEventCtxData>| async move {
    let mut guard = ctx.write();
    let ctx_data = &mut *guard;
    let event = ctx_data
      .event
      .as_ref()
      .ok_or_else(|| AppError::Internal("Delivery event missing after parse".to_string()))?;
    let order = ctx_data
      .loaded
      .current
      .as_mut()
      .ok_or_else(|| AppError::Internal("Order missing after lookup".to_string()))?;
    apply_delivery_status(order, event);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("merge_courier_details", |ctx: ContextData<DeliveryEventCtxData>| async move {
    let mut guard = ctx.write();
    let ctx_data = &mut *guard;
    if let (Some(event), Some(order)) = (ctx_data.event.as_ref(), ctx_data.loaded.current.as_mut()) {
      merge_courier_details(order, &event.courier);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  register_persist_order_step(&mut p);
  p
}
