// restaurant_api/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use galley::{ContextData, PipelineResult};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequestPayload {
  pub order_id: Uuid,
  pub restaurant_id: Uuid,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
  pub session_id: String,
  pub url: String,
}

#[instrument(
  name = "handler::create_checkout",
  skip(app_state, payload),
  fields(order_id = %payload.order_id, restaurant_id = %payload.restaurant_id)
)]
pub async fn create_checkout_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let CheckoutRequestPayload { order_id, restaurant_id } = payload.into_inner();
  let ctx_data = ContextData::new(CheckoutCtxData::new(app_state.get_ref().clone(), order_id, restaurant_id));

  match app_state.galley.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let session = ctx_data
        .read()
        .session
        .clone()
        .ok_or_else(|| AppError::Internal("Checkout completed without a payment session".to_string()))?;
      info!(session_id = %session.session_id, "Checkout session created.");
      Ok(HttpResponse::Ok().json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
      }))
    }
    PipelineResult::Stopped => Err(AppError::Internal("Checkout was halted before a session was created".to_string())),
  }
}
