// restaurant_api/src/config.rs

use crate::errors::{AppError, Result};
use crate::services::pricing::FeeSchedule;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProviderKind {
  Stripe,
  Mock,
}

impl std::str::FromStr for PaymentProviderKind {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "stripe" => Ok(PaymentProviderKind::Stripe),
      "mock" => Ok(PaymentProviderKind::Mock),
      other => Err(AppError::Config(format!("Unknown PAYMENT_PROVIDER '{}'", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// When unset the service runs on the in-memory store.
  pub database_url: Option<String>,
  /// Base URL of the customer storefront; checkout success/cancel pages live under it.
  pub storefront_base_url: String,

  pub payment_provider: PaymentProviderKind,
  pub stripe_secret_key: Option<String>,
  pub stripe_api_base: String,
  pub payment_webhook_secret: Option<String>,
  pub webhook_tolerance_secs: i64,

  /// Delivery webhooks are only verified when this is set.
  pub delivery_webhook_secret: Option<String>,

  pub currency: String,
  pub fees: FeeSchedule,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_optional = |var_name: &str| get_env(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_optional("DATABASE_URL");
    let storefront_base_url =
      get_env("STOREFRONT_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let payment_provider = get_env("PAYMENT_PROVIDER")
      .unwrap_or_else(|_| "mock".to_string())
      .parse::<PaymentProviderKind>()?;
    let stripe_secret_key = get_optional("STRIPE_SECRET_KEY");
    if payment_provider == PaymentProviderKind::Stripe && stripe_secret_key.is_none() {
      return Err(AppError::Config(
        "STRIPE_SECRET_KEY is required when PAYMENT_PROVIDER=stripe".to_string(),
      ));
    }
    let stripe_api_base = get_env("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".to_string());
    let payment_webhook_secret = get_optional("PAYMENT_WEBHOOK_SECRET");
    let webhook_tolerance_secs = get_env("WEBHOOK_TOLERANCE_SECS")
      .unwrap_or_else(|_| "300".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid WEBHOOK_TOLERANCE_SECS: {}", e)))?;
    let delivery_webhook_secret = get_optional("DELIVERY_WEBHOOK_SECRET");

    let currency = get_env("CURRENCY").unwrap_or_else(|_| "usd".to_string()).to_lowercase();

    let defaults = FeeSchedule::default();
    let service_fee_cents = match get_optional("SERVICE_FEE_CENTS") {
      Some(v) => v
        .parse::<i64>()
        .map_err(|e| AppError::Config(format!("Invalid SERVICE_FEE_CENTS: {}", e)))?,
      None => defaults.service_fee_cents,
    };
    let processing_fee_bps = match get_optional("PROCESSING_FEE_BPS") {
      Some(v) => v
        .parse::<i64>()
        .map_err(|e| AppError::Config(format!("Invalid PROCESSING_FEE_BPS: {}", e)))?,
      None => defaults.processing_fee_bps,
    };
    if service_fee_cents < 0 || processing_fee_bps < 0 {
      return Err(AppError::Config("Fee settings must not be negative".to_string()));
    }

    tracing::info!(
      provider = ?payment_provider,
      persistent_store = database_url.is_some(),
      delivery_signatures = delivery_webhook_secret.is_some(),
      "Application configuration loaded."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      storefront_base_url,
      payment_provider,
      stripe_secret_key,
      stripe_api_base,
      payment_webhook_secret,
      webhook_tolerance_secs,
      delivery_webhook_secret,
      currency,
      fees: FeeSchedule {
        service_fee_cents,
        processing_fee_bps,
      },
    })
  }

  /// Settings for tests and local runs: mock gateway, no secrets.
  pub fn for_local() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      storefront_base_url: "http://localhost:3000".to_string(),
      payment_provider: PaymentProviderKind::Mock,
      stripe_secret_key: None,
      stripe_api_base: "https://api.stripe.com".to_string(),
      payment_webhook_secret: None,
      webhook_tolerance_secs: 300,
      delivery_webhook_secret: None,
      currency: "usd".to_string(),
      fees: FeeSchedule::default(),
    }
  }
}
