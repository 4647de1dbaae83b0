// restaurant_api/src/main.rs

use restaurant_api::config::{AppConfig, PaymentProviderKind};
use restaurant_api::db::{MemoryStore, OrderStore, PgStore};
use restaurant_api::errors::AppError;
use restaurant_api::services::payment_gateway::PaymentGateway;
use restaurant_api::services::payment_mock::MockPaymentGateway;
use restaurant_api::services::stripe_gateway::StripeGateway;
use restaurant_api::state::AppState;
use restaurant_api::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_span_events(FmtSpan::CLOSE);

  if std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false) {
    builder.json().init();
  } else {
    builder.init();
  }
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn OrderStore>, AppError> {
  match &config.database_url {
    Some(url) => {
      let store = PgStore::connect(url).await?;
      store.migrate().await?;
      tracing::info!("Connected to Postgres and applied migrations.");
      Ok(Arc::new(store))
    }
    None => {
      tracing::warn!("DATABASE_URL not set; orders are kept in memory and lost on restart.");
      Ok(Arc::new(MemoryStore::new()))
    }
  }
}

fn build_gateway(config: &AppConfig) -> Result<Arc<dyn PaymentGateway>, AppError> {
  match config.payment_provider {
    PaymentProviderKind::Stripe => {
      let key = config
        .stripe_secret_key
        .clone()
        .ok_or_else(|| AppError::Config("STRIPE_SECRET_KEY is not set".to_string()))?;
      Ok(Arc::new(StripeGateway::new(config.stripe_api_base.clone(), key)))
    }
    PaymentProviderKind::Mock => {
      tracing::warn!("Using the mock payment gateway; checkout sessions are not real.");
      Ok(Arc::new(MockPaymentGateway::new()))
    }
  }
}

async fn bootstrap() -> anyhow::Result<AppState> {
  let config = Arc::new(AppConfig::from_env().context("loading configuration")?);
  let store = build_store(&config).await.context("opening the order store")?;
  let gateway = build_gateway(&config).context("building the payment gateway")?;
  Ok(AppState::new(store, gateway, config))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  init_tracing();
  tracing::info!("Starting restaurant ordering service...");

  let app_state = match bootstrap().await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = ?e, "Service startup failed.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e)));
    }
  };

  let server_address = format!("{}:{}", app_state.config.server_host, app_state.config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
