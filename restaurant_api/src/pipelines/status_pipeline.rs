// restaurant_api/src/pipelines/status_pipeline.rs

//! Staff-driven order status changes from the restaurant portal.

use crate::errors::AppError;
use crate::pipelines::common_steps::{register_persist_order_step, skip_when_unchanged, PERSIST_ORDER_STEP};
use crate::pipelines::contexts::{LoadedOrder, StatusUpdateCtxData};
use galley::{ContextData, Galley, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn};

pub fn build_status_pipeline() -> Pipeline<StatusUpdateCtxData, AppError> {
  let mut p = Pipeline::<StatusUpdateCtxData, AppError>::new(&[
    ("load_portal_order", false, None),
    ("apply_staff_transition", false, None),
    (PERSIST_ORDER_STEP, false, Some(skip_when_unchanged())),
  ]);

  p.on_root("load_portal_order", |ctx: ContextData<StatusUpdateCtxData>| async move {
    let (store, order_id, restaurant_id) = {
      let guard = ctx.read();
      (guard.app_state.store.clone(), guard.order_id, guard.restaurant_id)
    };
    // Another restaurant's order is reported exactly like a missing one.
    let order = store
      .get_order(order_id)
      .await?
      .filter(|order| order.restaurant_id == restaurant_id)
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
    ctx.write().loaded = LoadedOrder::load(order);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("apply_staff_transition", |ctx: ContextData<StatusUpdateCtxData>| async move {
    let mut guard = ctx.write();
    let requested = guard.requested;
    let order = guard
      .loaded
      .current
      .as_mut()
      .ok_or_else(|| AppError::Internal("Order missing after load".to_string()))?;
    let from = order.status;
    if !order.advance_status(requested) {
      warn!(order_id = %order.id, %from, to = %requested, "Blocked portal status change.");
      return Err(AppError::Conflict(format!(
        "Order cannot move from {} to {}",
        from, requested
      )));
    }
    info!(order_id = %order.id, %from, to = %requested, "Order status changed from portal.");
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  register_persist_order_step(&mut p);
  p
}

pub fn register_status_pipeline(galley: &Arc<Galley<AppError>>) {
  galley.register_pipeline(build_status_pipeline());
  info!("Portal status pipeline registered.");
}
