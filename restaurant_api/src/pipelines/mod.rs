// restaurant_api/src/pipelines/mod.rs

//! Defines and registers every galley pipeline used by the service.

use crate::errors::AppError;
use galley::Galley;
use std::sync::Arc;

pub mod common_steps;
pub mod contexts;

pub mod checkout_pipeline;
pub mod delivery_webhook_pipeline;
pub mod payment_webhook_pipeline;
pub mod status_pipeline;
pub mod webhook_pipeline;

/// Called once per registry at startup.
pub fn register_all_pipelines(galley: &Arc<Galley<AppError>>) {
  webhook_pipeline::register_webhook_pipeline(galley);
  checkout_pipeline::register_checkout_pipeline(galley);
  status_pipeline::register_status_pipeline(galley);
  tracing::info!("All application pipelines registered.");
}
