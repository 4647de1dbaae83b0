// restaurant_api/src/pipelines/common_steps.rs

//! Steps shared by the reconciliation pipelines.

use crate::errors::AppError;
use crate::pipelines::contexts::ReconciliationCtx;
use chrono::Utc;
use galley::{ContextData, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::{debug, info};

pub const PERSIST_ORDER_STEP: &str = "persist_order";

/// Skips persistence when reconciliation left the order as it was loaded.
pub fn skip_when_unchanged<T: ReconciliationCtx>() -> SkipCondition<T> {
  Arc::new(|ctx: ContextData<T>| {
    let unchanged = !ctx.read().loaded().changed();
    if unchanged {
      debug!("Order unchanged, nothing to persist.");
    }
    unchanged
  })
}

/// Registers the handler that stamps `updated_at` and saves the reconciled order.
pub fn register_persist_order_step<T: ReconciliationCtx>(p: &mut Pipeline<T, AppError>) {
  p.on_root(PERSIST_ORDER_STEP, |ctx: ContextData<T>| async move {
    let (store, order) = {
      let mut guard = ctx.write();
      let store = guard.app_state().store.clone();
      let order = guard.loaded_mut().current.as_mut().map(|order| {
        order.updated_at = Utc::now();
        order.clone()
      });
      (store, order)
    };
    let order = order.ok_or_else(|| AppError::Internal("No order loaded to persist".to_string()))?;

    store.save_order(&order).await?;
    ctx.write().loaded_mut().persisted = true;
    info!(order_id = %order.id, status = %order.status, "Order persisted.");
    Ok::<_, AppError>(PipelineControl::Continue)
  });
}
