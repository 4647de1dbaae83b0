// restaurant_api/src/services/signature.rs

//! Webhook signature checks (HMAC-SHA256).

use crate::errors::{AppError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str) -> Result<HmacSha256> {
  HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Config(format!("Invalid webhook secret: {}", e)))
}

/// Verifies a payment processor header of the form `t=<unix>,v1=<hex>[,v1=<hex>...]`.
///
/// The signed payload is `"<t>.<body>"`. Any `v1` entry may match. Timestamps
/// further than `tolerance_secs` from `now_unix` are rejected.
pub fn verify_stripe_signature(
  header: &str,
  body: &[u8],
  secret: &str,
  tolerance_secs: i64,
  now_unix: i64,
) -> Result<()> {
  let mut timestamp: Option<&str> = None;
  let mut candidates: Vec<&str> = Vec::new();
  for part in header.split(',') {
    let mut kv = part.splitn(2, '=');
    let key = kv.next().unwrap_or("").trim();
    let value = kv.next().unwrap_or("").trim();
    match key {
      "t" => timestamp = Some(value),
      "v1" => candidates.push(value),
      _ => {}
    }
  }

  let timestamp = timestamp.ok_or_else(|| AppError::Signature("Signature header has no timestamp".to_string()))?;
  if candidates.is_empty() {
    return Err(AppError::Signature("Signature header has no v1 signature".to_string()));
  }
  let ts: i64 = timestamp
    .parse()
    .map_err(|_| AppError::Signature("Signature timestamp is not a number".to_string()))?;
  if now_unix.abs_diff(ts) > tolerance_secs.unsigned_abs() {
    return Err(AppError::Signature("Signature timestamp outside tolerance".to_string()));
  }

  let mut mac = mac_for(secret)?;
  mac.update(timestamp.as_bytes());
  mac.update(b".");
  mac.update(body);

  let matched = candidates.iter().any(|candidate| match hex::decode(candidate) {
    Ok(bytes) => mac.clone().verify_slice(&bytes).is_ok(),
    Err(_) => false,
  });
  if matched {
    Ok(())
  } else {
    Err(AppError::Signature("No matching signature".to_string()))
  }
}

/// Verifies a bare hex HMAC-SHA256 of `body`.
pub fn verify_hex_hmac(signature_hex: &str, body: &[u8], secret: &str) -> Result<()> {
  let expected =
    hex::decode(signature_hex.trim()).map_err(|_| AppError::Signature("Signature is not valid hex".to_string()))?;
  let mut mac = mac_for(secret)?;
  mac.update(body);
  mac
    .verify_slice(&expected)
    .map_err(|_| AppError::Signature("Signature mismatch".to_string()))
}

/// Produces a header value accepted by `verify_stripe_signature`. Used by tests and local tooling.
pub fn sign_stripe_payload(body: &[u8], secret: &str, timestamp: i64) -> Result<String> {
  let mut mac = mac_for(secret)?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(body);
  Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
}

pub fn sign_hex_hmac(body: &[u8], secret: &str) -> Result<String> {
  let mut mac = mac_for(secret)?;
  mac.update(body);
  Ok(hex::encode(mac.finalize().into_bytes()))
}
