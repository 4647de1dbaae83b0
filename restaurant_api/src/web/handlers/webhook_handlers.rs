// restaurant_api/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::{WebhookIntakeCtxData, WebhookSource};
use crate::state::AppState;
use galley::{ContextData, PipelineResult};

#[instrument(
  name = "handler::webhook_intake",
  skip(app_state, req, body),
  fields(webhook_source = %source, payload_bytes = body.len())
)]
pub async fn webhook_intake_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  source: web::Path<String>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let source_name = source.into_inner();
  let source = WebhookSource::from_path(&source_name)
    .ok_or_else(|| AppError::NotFound(format!("Unknown webhook source '{}'", source_name)))?;

  let signature_header = req
    .headers()
    .get(source.signature_header_name())
    .and_then(|value| value.to_str().ok())
    .map(String::from);

  let ctx_data = ContextData::new(WebhookIntakeCtxData::new(
    app_state.get_ref().clone(),
    source,
    body,
    signature_header,
  ));

  let outcome = app_state.galley.run(ctx_data.clone()).await?;
  let guard = ctx_data.read();
  match outcome {
    PipelineResult::Completed => {
      info!(
        order_id = ?guard.affected_order_id(),
        order_updated = guard.order_updated(),
        "Webhook processed."
      );
      Ok(HttpResponse::Ok().json(json!({
        "status": "processed",
        "orderId": guard.affected_order_id(),
        "orderUpdated": guard.order_updated(),
      })))
    }
    PipelineResult::Stopped => {
      warn!(order_id = ?guard.affected_order_id(), "Webhook acknowledged without changes.");
      Ok(HttpResponse::Ok().json(json!({ "status": "ignored" })))
    }
  }
}
