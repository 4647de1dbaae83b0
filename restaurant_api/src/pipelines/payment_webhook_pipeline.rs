// restaurant_api/src/pipelines/payment_webhook_pipeline.rs

//! Reconciles payment processor checkout events into order status and customer details.

use crate::errors::AppError;
use crate::models::{Address, CustomerDetails, Order, OrderStatus};
use crate::pipelines::common_steps::{register_persist_order_step, skip_when_unchanged, PERSIST_ORDER_STEP};
use crate::pipelines::contexts::{LoadedOrder, PaymentEventCtxData};
use crate::services::signature::verify_stripe_signature;
use galley::{ContextData, Pipeline, PipelineControl};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
  SessionCompleted,
  SessionExpired,
  AsyncPaymentFailed,
  AsyncPaymentSucceeded,
}

impl PaymentEventKind {
  pub fn from_event_type(event_type: &str) -> Option<Self> {
    match event_type {
      "checkout.session.completed" => Some(PaymentEventKind::SessionCompleted),
      "checkout.session.expired" => Some(PaymentEventKind::SessionExpired),
      "checkout.session.async_payment_failed" => Some(PaymentEventKind::AsyncPaymentFailed),
      "checkout.session.async_payment_succeeded" => Some(PaymentEventKind::AsyncPaymentSucceeded),
      _ => None,
    }
  }

  pub fn target_status(self) -> OrderStatus {
    match self {
      PaymentEventKind::SessionCompleted | PaymentEventKind::AsyncPaymentSucceeded => OrderStatus::Paid,
      PaymentEventKind::SessionExpired | PaymentEventKind::AsyncPaymentFailed => OrderStatus::Cancelled,
    }
  }

  /// Failure events only cancel orders that are still waiting on a payment.
  /// A stale session expiring after a later session paid must not cancel the order.
  pub fn may_apply_to(self, status: OrderStatus) -> bool {
    match self.target_status() {
      OrderStatus::Cancelled => matches!(status, OrderStatus::Pending | OrderStatus::PaymentProcessing),
      _ => true,
    }
  }
}

/// A recognized checkout event, reduced to what reconciliation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEvent {
  pub id: Option<String>,
  pub kind: PaymentEventKind,
  /// Raw `orderId` metadata value, validated when the order is loaded.
  pub order_ref: Option<String>,
  pub session_id: Option<String>,
  pub payment_intent_id: Option<String>,
  pub customer: CustomerDetails,
}

#[derive(Deserialize)]
struct EventEnvelope {
  id: Option<String>,
  #[serde(rename = "type")]
  event_type: String,
  data: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SessionObject {
  id: Option<String>,
  metadata: Option<Value>,
  payment_intent: Option<Value>,
  customer_details: Option<ProviderCustomer>,
  shipping_details: Option<ProviderShipping>,
  collected_information: Option<CollectedInformation>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProviderCustomer {
  name: Option<String>,
  email: Option<String>,
  phone: Option<String>,
  address: Option<ProviderAddress>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProviderShipping {
  name: Option<String>,
  phone: Option<String>,
  address: Option<ProviderAddress>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CollectedInformation {
  shipping_details: Option<ProviderShipping>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProviderAddress {
  line1: Option<String>,
  line2: Option<String>,
  city: Option<String>,
  state: Option<String>,
  postal_code: Option<String>,
  country: Option<String>,
}

impl From<ProviderAddress> for Address {
  fn from(a: ProviderAddress) -> Self {
    Address {
      line1: a.line1,
      line2: a.line2,
      city: a.city,
      state: a.state,
      postal_code: a.postal_code,
      country: a.country,
    }
  }
}

/// Parses an event envelope. `Ok(None)` means a well-formed event of a type we do not handle.
pub fn parse_payment_event(body: &[u8]) -> Result<Option<(String, PaymentEvent)>, AppError> {
  let envelope: EventEnvelope =
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Malformed payment event: {}", e)))?;

  let kind = match PaymentEventKind::from_event_type(&envelope.event_type) {
    Some(kind) => kind,
    None => return Ok(None),
  };
  let object = envelope
    .data
    .as_ref()
    .and_then(|d| d.get("object"))
    .cloned()
    .ok_or_else(|| AppError::Validation("Payment event has no data.object".to_string()))?;
  let object: SessionObject = serde_json::from_value(object)
    .map_err(|e| AppError::Validation(format!("Malformed checkout session object: {}", e)))?;

  let order_ref = object.metadata.as_ref().and_then(|m| {
    m.get("orderId")
      .or_else(|| m.get("order_id"))
      .and_then(Value::as_str)
      .map(str::to_string)
  });
  let payment_intent_id = match &object.payment_intent {
    Some(Value::String(id)) => Some(id.clone()),
    Some(Value::Object(pi)) => pi.get("id").and_then(Value::as_str).map(str::to_string),
    _ => None,
  };

  let shipping = object
    .shipping_details
    .or_else(|| object.collected_information.and_then(|c| c.shipping_details));
  let billing = object.customer_details.unwrap_or_default();
  let (shipping_name, shipping_phone, shipping_address) = match shipping {
    Some(s) => (s.name, s.phone, s.address),
    None => (None, None, None),
  };
  let customer = CustomerDetails {
    name: billing.name.or(shipping_name),
    email: billing.email,
    phone: billing.phone.or(shipping_phone),
    address: shipping_address.or(billing.address).map(Address::from),
  };

  Ok(Some((
    envelope.event_type,
    PaymentEvent {
      id: envelope.id,
      kind,
      order_ref,
      session_id: object.id,
      payment_intent_id,
      customer,
    },
  )))
}

/// Overwrites customer fields present in `captured`; absent fields keep their stored value.
fn merge_customer(current: &mut CustomerDetails, captured: &CustomerDetails) {
  if captured.name.is_some() {
    current.name = captured.name.clone();
  }
  if captured.email.is_some() {
    current.email = captured.email.clone();
  }
  if captured.phone.is_some() {
    current.phone = captured.phone.clone();
  }
  if captured.address.is_some() {
    current.address = captured.address.clone();
  }
}

/// Applies a recognized event to `order`. Status changes go through the forward-only guard.
pub fn apply_payment_event(order: &mut Order, event: &PaymentEvent) {
  if event.kind == PaymentEventKind::SessionCompleted {
    merge_customer(&mut order.customer, &event.customer);
    if event.payment_intent_id.is_some() {
      order.payment_intent_id = event.payment_intent_id.clone();
    }
  }
  let target = event.kind.target_status();
  if !event.kind.may_apply_to(order.status) {
    info!(
      order_id = %order.id,
      current = %order.status,
      requested = %target,
      "Payment failure ignored, order is no longer awaiting payment."
    );
    return;
  }
  if !order.advance_status(target) {
    info!(
      order_id = %order.id,
      current = %order.status,
      requested = %target,
      "Status transition blocked by lifecycle guard."
    );
  }
}

pub fn build_payment_webhook_pipeline() -> Pipeline<PaymentEventCtxData, AppError> {
  let mut p = Pipeline::<PaymentEventCtxData, AppError>::new(&[
    ("verify_payment_signature", false, None),
    ("parse_payment_event", false, None),
    ("load_payment_order", false, None),
    ("apply_payment_event", false, None),
    (PERSIST_ORDER_STEP, false, Some(skip_when_unchanged())),
  ]);

  p.on_root("verify_payment_signature", |ctx: ContextData<PaymentEventCtxData>| async move {
    let guard = ctx.read();
    let config = &guard.app_state.config;
    let secret = config
      .payment_webhook_secret
      .as_deref()
      .ok_or_else(|| AppError::Config("PAYMENT_WEBHOOK_SECRET is not configured".to_string()))?;
    let header = guard
      .signature_header
      .as_deref()
      .ok_or_else(|| AppError::Signature("Missing Stripe-Signature header".to_string()))?;

    verify_stripe_signature(
      header,
      &guard.raw_body,
      secret,
      config.webhook_tolerance_secs,
      chrono::Utc::now().timestamp(),
    )?;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("parse_payment_event", |ctx: ContextData<PaymentEventCtxData>| async move {
    let raw_body = ctx.read().raw_body.clone();
    match parse_payment_event(&raw_body)? {
      Some((event_type, event)) => {
        info!(%event_type, event_id = ?event.id, "Payment event parsed.");
        ctx.write().event = Some(event);
        Ok::<_, AppError>(PipelineControl::Continue)
      }
      None => {
        info!("Payment event type not handled, acknowledging without changes.");
        ctx.write().ignored_reason = Some("unhandled event type".to_string());
        Ok(PipelineControl::Stop)
      }
    }
  });

  p.on_root("load_payment_order", |ctx: ContextData<PaymentEventCtxData>| async move {
    let (store, order_ref) = {
      let guard = ctx.read();
      let order_ref = guard.event.as_ref().and_then(|e| e.order_ref.clone());
      (guard.app_state.store.clone(), order_ref)
    };
    let order_ref =
      order_ref.ok_or_else(|| AppError::Validation("Payment event metadata has no orderId".to_string()))?;
    let order_id = Uuid::parse_str(&order_ref)
      .map_err(|_| AppError::Validation(format!("Payment event orderId '{}' is not a valid id", order_ref)))?;

    let order = store
      .get_order(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
    ctx.write().loaded = LoadedOrder::load(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("apply_payment_event", |ctx: ContextData<PaymentEventCtxData>| async move {
    let mut guard = ctx.write();
    let ctx_data = &mut *guard;
    let event = ctx_data
      .event
      .as_ref()
      .ok_or_else(|| AppError::Internal("Payment event missing after parse".to_string()))?;
    let order = ctx_data
      .loaded
      .current
      .as_mut()
      .ok_or_else(|| AppError::Internal("Order missing after load".to_string()))?;

    apply_payment_event(order, event);
    if !ctx_data.loaded.changed() {
      warn!(order_id = ?ctx_data.loaded.order_id(), "Payment event produced no change (duplicate or late delivery).");
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  register_persist_order_step(&mut p);
  p
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn event_body(event_type: &str, object: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({"id": "evt_1", "type": event_type, "data": {"object": object}})).unwrap()
  }

  #[test]
  fn unknown_event_type_is_not_an_error() {
    let body = event_body("payment_intent.created", json!({}));
    assert!(parse_payment_event(&body).unwrap().is_none());
  }

  #[test]
  fn malformed_body_is_a_validation_error() {
    assert!(matches!(parse_payment_event(b"not json"), Err(AppError::Validation(_))));
    assert!(matches!(parse_payment_event(br#"{"id": "evt_1"}"#), Err(AppError::Validation(_))));
    assert!(matches!(
      parse_payment_event(br#"{"type": "checkout.session.expired"}"#),
      Err(AppError::Validation(_))
    ));
  }

  #[test]
  fn completed_event_captures_customer_with_shipping_address_preferred() {
    let body = event_body(
      "checkout.session.completed",
      json!({
        "id": "cs_1",
        "payment_intent": "pi_1",
        "metadata": {"orderId": "abc"},
        "customer_details": {
          "email": "ana@example.com",
          "phone": "+15550100",
          "name": "Ana",
          "address": {"line1": "1 Billing Way", "city": "Austin"}
        },
        "shipping_details": {"name": "Ana B", "address": {"line1": "9 Ship St", "postal_code": "78701"}}
      }),
    );
    let (_, event) = parse_payment_event(&body).unwrap().unwrap();
    assert_eq!(event.kind, PaymentEventKind::SessionCompleted);
    assert_eq!(event.order_ref.as_deref(), Some("abc"));
    assert_eq!(event.payment_intent_id.as_deref(), Some("pi_1"));
    assert_eq!(event.customer.email.as_deref(), Some("ana@example.com"));
    assert_eq!(event.customer.name.as_deref(), Some("Ana"));
    let address = event.customer.address.unwrap();
    assert_eq!(address.line1.as_deref(), Some("9 Ship St"));
    assert_eq!(address.postal_code.as_deref(), Some("78701"));
  }

  #[test]
  fn order_id_metadata_accepts_snake_case_key() {
    let body = event_body("checkout.session.expired", json!({"metadata": {"order_id": "xyz"}}));
    let (_, event) = parse_payment_event(&body).unwrap().unwrap();
    assert_eq!(event.order_ref.as_deref(), Some("xyz"));
  }

  #[test]
  fn event_kinds_map_to_statuses() {
    assert_eq!(PaymentEventKind::SessionCompleted.target_status(), OrderStatus::Paid);
    assert_eq!(PaymentEventKind::AsyncPaymentSucceeded.target_status(), OrderStatus::Paid);
    assert_eq!(PaymentEventKind::SessionExpired.target_status(), OrderStatus::Cancelled);
    assert_eq!(PaymentEventKind::AsyncPaymentFailed.target_status(), OrderStatus::Cancelled);
  }

  fn failure_event(kind: PaymentEventKind, order: &Order) -> PaymentEvent {
    PaymentEvent {
      id: None,
      kind,
      order_ref: Some(order.id.to_string()),
      session_id: Some("cs_stale".to_string()),
      payment_intent_id: None,
      customer: CustomerDetails::default(),
    }
  }

  #[test]
  fn failure_events_cancel_only_orders_awaiting_payment() {
    for kind in [PaymentEventKind::SessionExpired, PaymentEventKind::AsyncPaymentFailed] {
      for status in [OrderStatus::Pending, OrderStatus::PaymentProcessing] {
        let mut order = Order::new(Uuid::new_v4(), false, 0);
        order.status = status;
        let event = failure_event(kind, &order);
        apply_payment_event(&mut order, &event);
        assert_eq!(order.status, OrderStatus::Cancelled);
      }
      for status in [OrderStatus::Paid, OrderStatus::Preparing, OrderStatus::Ready] {
        let mut order = Order::new(Uuid::new_v4(), false, 0);
        order.status = status;
        let event = failure_event(kind, &order);
        apply_payment_event(&mut order, &event);
        assert_eq!(order.status, status, "{:?} must not cancel a {} order", kind, status);
      }
    }
  }

  #[test]
  fn applying_same_event_twice_is_idempotent() {
    let mut order = Order::new(Uuid::new_v4(), false, 0);
    order.status = OrderStatus::PaymentProcessing;
    let event = PaymentEvent {
      id: None,
      kind: PaymentEventKind::SessionCompleted,
      order_ref: Some(order.id.to_string()),
      session_id: None,
      payment_intent_id: Some("pi_1".to_string()),
      customer: CustomerDetails {
        email: Some("a@b.c".to_string()),
        ..Default::default()
      },
    };
    apply_payment_event(&mut order, &event);
    let once = order.clone();
    apply_payment_event(&mut order, &event);
    assert_eq!(order, once);
    assert_eq!(order.status, OrderStatus::Paid);
  }
}
