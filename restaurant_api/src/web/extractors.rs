// restaurant_api/src/web/extractors.rs

use crate::errors::AppError;
use actix_web::{FromRequest, HttpRequest};
use tracing::warn;
use uuid::Uuid;

pub const RESTAURANT_SCOPE_HEADER: &str = "X-Restaurant-Id";

/// The restaurant a portal request acts for, taken from the `X-Restaurant-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct RestaurantScope {
  pub restaurant_id: Uuid,
}

impl FromRequest for RestaurantScope {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let parsed = req
      .headers()
      .get(RESTAURANT_SCOPE_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| Uuid::parse_str(value.trim()).ok());

    futures_util::future::ready(match parsed {
      Some(restaurant_id) => Ok(RestaurantScope { restaurant_id }),
      None => {
        warn!("Missing or invalid {} header.", RESTAURANT_SCOPE_HEADER);
        Err(AppError::Validation(format!(
          "A valid {} header is required",
          RESTAURANT_SCOPE_HEADER
        )))
      }
    })
  }
}
