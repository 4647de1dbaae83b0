// restaurant_api/src/pipelines/contexts.rs

//! Context data for every pipeline. Handlers receive these wrapped in `galley::ContextData`.

use crate::models::{Order, OrderStatus};
use crate::services::payment_gateway::CheckoutSession;
use crate::services::pricing::{CheckoutQuote, PricedItem};
use crate::state::AppState;
use actix_web::web::Bytes;
use galley::ContextData;
use uuid::Uuid;

use crate::models::Restaurant;
use crate::pipelines::delivery_webhook_pipeline::DeliveryEvent;
use crate::pipelines::payment_webhook_pipeline::PaymentEvent;

/// An order loaded for reconciliation, with the copy it was loaded as.
#[derive(Debug, Clone, Default)]
pub struct LoadedOrder {
  pub original: Option<Order>,
  pub current: Option<Order>,
  pub persisted: bool,
}

impl LoadedOrder {
  pub fn load(order: Order) -> Self {
    Self {
      original: Some(order.clone()),
      current: Some(order),
      persisted: false,
    }
  }

  pub fn changed(&self) -> bool {
    match (&self.original, &self.current) {
      (Some(before), Some(after)) => before != after,
      _ => false,
    }
  }

  pub fn order_id(&self) -> Option<Uuid> {
    self.current.as_ref().map(|o| o.id)
  }
}

/// Implemented by contexts whose pipelines end in the shared `persist_order` step.
pub trait ReconciliationCtx: Send + Sync + 'static {
  fn app_state(&self) -> &AppState;
  fn loaded(&self) -> &LoadedOrder;
  fn loaded_mut(&mut self) -> &mut LoadedOrder;
}

// --- Payment processor events ---

#[derive(Clone)]
pub struct PaymentEventCtxData {
  pub app_state: AppState,
  pub raw_body: Bytes,
  pub signature_header: Option<String>,
  pub event: Option<PaymentEvent>,
  pub loaded: LoadedOrder,
  /// Set when the event is acknowledged without touching any order.
  pub ignored_reason: Option<String>,
}

impl PaymentEventCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, signature_header: Option<String>) -> Self {
    Self {
      app_state,
      raw_body,
      signature_header,
      event: None,
      loaded: LoadedOrder::default(),
      ignored_reason: None,
    }
  }
}

impl ReconciliationCtx for PaymentEventCtxData {
  fn app_state(&self) -> &AppState {
    &self.app_state
  }
  fn loaded(&self) -> &LoadedOrder {
    &self.loaded
  }
  fn loaded_mut(&mut self) -> &mut LoadedOrder {
    &mut self.loaded
  }
}

// --- Delivery provider events ---

#[derive(Clone)]
pub struct DeliveryEventCtxData {
  pub app_state: AppState,
  pub raw_body: Bytes,
  pub signature_header: Option<String>,
  pub event: Option<DeliveryEvent>,
  pub loaded: LoadedOrder,
  pub ignored_reason: Option<String>,
}

impl DeliveryEventCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, signature_header: Option<String>) -> Self {
    Self {
      app_state,
      raw_body,
      signature_header,
      event: None,
      loaded: LoadedOrder::default(),
      ignored_reason: None,
    }
  }
}

impl ReconciliationCtx for DeliveryEventCtxData {
  fn app_state(&self) -> &AppState {
    &self.app_state
  }
  fn loaded(&self) -> &LoadedOrder {
    &self.loaded
  }
  fn loaded_mut(&mut self) -> &mut LoadedOrder {
    &mut self.loaded
  }
}

// --- Webhook intake ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookSource {
  Payment,
  Delivery,
}

impl WebhookSource {
  pub fn from_path(source: &str) -> Option<Self> {
    match source {
      "payment" | "stripe" => Some(WebhookSource::Payment),
      "delivery" => Some(WebhookSource::Delivery),
      _ => None,
    }
  }

  /// Header carrying the sender's signature.
  pub fn signature_header_name(self) -> &'static str {
    match self {
      WebhookSource::Payment => "Stripe-Signature",
      WebhookSource::Delivery => "X-Delivery-Signature",
    }
  }
}

/// The reconciler sub-context selected for this delivery of a webhook.
#[derive(Clone)]
pub enum ActiveReconciliation {
  None,
  Payment(ContextData<PaymentEventCtxData>),
  Delivery(ContextData<DeliveryEventCtxData>),
}

#[derive(Clone)]
pub struct WebhookIntakeCtxData {
  pub app_state: AppState,
  pub source: WebhookSource,
  pub raw_body: Bytes,
  pub signature_header: Option<String>,
  pub reconciliation: ActiveReconciliation,
  pub acknowledged: bool,
}

impl WebhookIntakeCtxData {
  pub fn new(app_state: AppState, source: WebhookSource, raw_body: Bytes, signature_header: Option<String>) -> Self {
    Self {
      app_state,
      source,
      raw_body,
      signature_header,
      reconciliation: ActiveReconciliation::None,
      acknowledged: false,
    }
  }

  /// Order touched by the reconciler, if it got as far as loading one.
  pub fn affected_order_id(&self) -> Option<Uuid> {
    match &self.reconciliation {
      ActiveReconciliation::None => None,
      ActiveReconciliation::Payment(c) => c.read().loaded.order_id(),
      ActiveReconciliation::Delivery(c) => c.read().loaded.order_id(),
    }
  }

  pub fn order_updated(&self) -> bool {
    match &self.reconciliation {
      ActiveReconciliation::None => false,
      ActiveReconciliation::Payment(c) => c.read().loaded.persisted,
      ActiveReconciliation::Delivery(c) => c.read().loaded.persisted,
    }
  }
}

// --- Checkout ---

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub order_id: Uuid,
  pub restaurant_id: Uuid,
  pub order: Option<Order>,
  pub restaurant: Option<Restaurant>,
  pub priced_items: Vec<PricedItem>,
  pub quote: Option<CheckoutQuote>,
  pub session: Option<CheckoutSession>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, order_id: Uuid, restaurant_id: Uuid) -> Self {
    Self {
      app_state,
      order_id,
      restaurant_id,
      order: None,
      restaurant: None,
      priced_items: Vec::new(),
      quote: None,
      session: None,
    }
  }
}

// --- Portal status action ---

#[derive(Clone)]
pub struct StatusUpdateCtxData {
  pub app_state: AppState,
  /// Restaurant the request is scoped to.
  pub restaurant_id: Uuid,
  pub order_id: Uuid,
  pub requested: OrderStatus,
  pub loaded: LoadedOrder,
}

impl StatusUpdateCtxData {
  pub fn new(app_state: AppState, restaurant_id: Uuid, order_id: Uuid, requested: OrderStatus) -> Self {
    Self {
      app_state,
      restaurant_id,
      order_id,
      requested,
      loaded: LoadedOrder::default(),
    }
  }
}

impl ReconciliationCtx for StatusUpdateCtxData {
  fn app_state(&self) -> &AppState {
    &self.app_state
  }
  fn loaded(&self) -> &LoadedOrder {
    &self.loaded
  }
  fn loaded_mut(&mut self) -> &mut LoadedOrder {
    &mut self.loaded
  }
}
