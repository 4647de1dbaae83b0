// restaurant_api/src/pipelines/webhook_pipeline.rs

//! Webhook intake: picks the reconciler for the sending system and runs it as a scoped pipeline.

use crate::errors::AppError;
use crate::pipelines::contexts::{
  ActiveReconciliation, DeliveryEventCtxData, PaymentEventCtxData, WebhookIntakeCtxData, WebhookSource,
};
use crate::pipelines::delivery_webhook_pipeline::build_delivery_webhook_pipeline;
use crate::pipelines::payment_webhook_pipeline::build_payment_webhook_pipeline;
use anyhow::anyhow;
use galley::{ContextData, Galley, GalleyError, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::info;

pub fn build_webhook_pipeline() -> Pipeline<WebhookIntakeCtxData, AppError> {
  let mut p = Pipeline::<WebhookIntakeCtxData, AppError>::new(&[
    ("prepare_reconciliation", false, None),
    ("reconcile_event", false, None),
    ("acknowledge_webhook", false, None),
  ]);

  p.on_root("prepare_reconciliation", |ctx: ContextData<WebhookIntakeCtxData>| async move {
    let mut guard = ctx.write();
    let app_state = guard.app_state.clone();
    let raw_body = guard.raw_body.clone();
    let signature = guard.signature_header.clone();
    guard.reconciliation = match guard.source {
      WebhookSource::Payment => {
        ActiveReconciliation::Payment(ContextData::new(PaymentEventCtxData::new(app_state, raw_body, signature)))
      }
      WebhookSource::Delivery => {
        ActiveReconciliation::Delivery(ContextData::new(DeliveryEventCtxData::new(app_state, raw_body, signature)))
      }
    };
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.conditional_scopes_for_step("reconcile_event")
    .add_static_scope(
      Arc::new(build_payment_webhook_pipeline()),
      |ctx: ContextData<WebhookIntakeCtxData>| match &ctx.read().reconciliation {
        ActiveReconciliation::Payment(sub) => Ok(sub.clone()),
        _ => Err(GalleyError::from(anyhow!("payment reconciliation context was not prepared"))),
      },
    )
    .on_condition(|ctx: ContextData<WebhookIntakeCtxData>| ctx.read().source == WebhookSource::Payment)
    .add_static_scope(
      Arc::new(build_delivery_webhook_pipeline()),
      |ctx: ContextData<WebhookIntakeCtxData>| match &ctx.read().reconciliation {
        ActiveReconciliation::Delivery(sub) => Ok(sub.clone()),
        _ => Err(GalleyError::from(anyhow!("delivery reconciliation context was not prepared"))),
      },
    )
    .on_condition(|ctx: ContextData<WebhookIntakeCtxData>| ctx.read().source == WebhookSource::Delivery)
    .if_no_scope_matches(PipelineControl::Stop)
    .finalize_conditional_step(false);

  p.on_root("acknowledge_webhook", |ctx: ContextData<WebhookIntakeCtxData>| async move {
    let mut guard = ctx.write();
    guard.acknowledged = true;
    info!(
      source = ?guard.source,
      order_id = ?guard.affected_order_id(),
      order_updated = guard.order_updated(),
      "Webhook reconciled."
    );
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p
}

pub fn register_webhook_pipeline(galley: &Arc<Galley<AppError>>) {
  galley.register_pipeline(build_webhook_pipeline());
  info!("Webhook intake pipeline registered.");
}
