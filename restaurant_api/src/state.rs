// restaurant_api/src/state.rs
use crate::config::AppConfig;
use crate::db::OrderStore;
use crate::errors::AppError;
use crate::services::payment_gateway::PaymentGateway;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn OrderStore>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub galley: Arc<galley::Galley<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Builds the state and registers every pipeline on a fresh registry.
  pub fn new(store: Arc<dyn OrderStore>, gateway: Arc<dyn PaymentGateway>, config: Arc<AppConfig>) -> Self {
    let state = Self {
      store,
      gateway,
      galley: Arc::new(galley::Galley::new()),
      config,
    };
    crate::pipelines::register_all_pipelines(&state.galley);
    state
  }
}
