// restaurant_api/src/services/pricing.rs

//! Checkout pricing in integer minor units.

use crate::errors::{AppError, Result};
use serde::Serialize;

pub const DEFAULT_SERVICE_FEE_CENTS: i64 = 229;
/// 2.9% expressed in basis points.
pub const DEFAULT_PROCESSING_FEE_BPS: i64 = 290;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
  pub service_fee_cents: i64,
  pub processing_fee_bps: i64,
}

impl Default for FeeSchedule {
  fn default() -> Self {
    Self {
      service_fee_cents: DEFAULT_SERVICE_FEE_CENTS,
      processing_fee_bps: DEFAULT_PROCESSING_FEE_BPS,
    }
  }
}

impl FeeSchedule {
  /// `amount × bps / 10000`, rounded half up.
  pub fn processing_fee(&self, amount_cents: i64) -> Result<i64> {
    amount_cents
      .checked_mul(self.processing_fee_bps)
      .and_then(|scaled| scaled.checked_add(5_000))
      .map(|scaled| scaled / 10_000)
      .ok_or_else(amount_overflow)
  }
}

fn amount_overflow() -> AppError {
  AppError::Validation("Order amount is out of range".to_string())
}

/// An order item resolved against its menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
  pub name: String,
  pub unit_price_cents: i64,
  pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
  MenuItem,
  DeliveryFee,
  ServiceFee,
  ProcessingFee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  pub kind: LineItemKind,
  pub name: String,
  pub unit_amount_cents: i64,
  pub quantity: i64,
}

impl LineItem {
  pub fn amount_cents(&self) -> i64 {
    self.unit_amount_cents * self.quantity
  }

  fn fee(kind: LineItemKind, name: &str, amount_cents: i64) -> Self {
    Self {
      kind,
      name: name.to_string(),
      unit_amount_cents: amount_cents,
      quantity: 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
  pub line_items: Vec<LineItem>,
  pub items_total_cents: i64,
  pub delivery_fee_cents: i64,
  pub service_fee_cents: i64,
  pub processing_fee_cents: i64,
  /// Withheld from the restaurant's payout.
  pub platform_fee_cents: i64,
  pub restaurant_payout_cents: i64,
  pub total_cents: i64,
}

/// Builds the line items and fee split for a checkout.
pub fn quote_checkout(
  items: &[PricedItem],
  is_delivery: bool,
  delivery_fee_cents: i64,
  fees: &FeeSchedule,
) -> Result<CheckoutQuote> {
  if items.is_empty() {
    return Err(AppError::Validation("Order has no items".to_string()));
  }

  let mut line_items = Vec::with_capacity(items.len() + 3);
  let mut items_total_cents = 0i64;
  for item in items {
    if item.quantity <= 0 {
      return Err(AppError::Validation(format!(
        "Item '{}' has invalid quantity {}",
        item.name, item.quantity
      )));
    }
    if item.unit_price_cents < 0 {
      return Err(AppError::Validation(format!("Item '{}' has a negative price", item.name)));
    }
    items_total_cents = item
      .unit_price_cents
      .checked_mul(item.quantity)
      .and_then(|amount| items_total_cents.checked_add(amount))
      .ok_or_else(amount_overflow)?;
    line_items.push(LineItem {
      kind: LineItemKind::MenuItem,
      name: item.name.clone(),
      unit_amount_cents: item.unit_price_cents,
      quantity: item.quantity,
    });
  }

  let delivery_fee_cents = if is_delivery { delivery_fee_cents } else { 0 };
  if delivery_fee_cents < 0 {
    return Err(AppError::Validation("Delivery fee must not be negative".to_string()));
  }
  let service_fee_cents = fees.service_fee_cents;
  let fee_base = items_total_cents
    .checked_add(delivery_fee_cents)
    .and_then(|sum| sum.checked_add(service_fee_cents))
    .ok_or_else(amount_overflow)?;
  let processing_fee_cents = fees.processing_fee(fee_base)?;

  if delivery_fee_cents > 0 {
    line_items.push(LineItem::fee(LineItemKind::DeliveryFee, "Delivery Fee", delivery_fee_cents));
  }
  line_items.push(LineItem::fee(LineItemKind::ServiceFee, "Service Fee", service_fee_cents));
  line_items.push(LineItem::fee(
    LineItemKind::ProcessingFee,
    "Processing Fee",
    processing_fee_cents,
  ));

  let platform_fee_cents = service_fee_cents
    .checked_add(delivery_fee_cents)
    .and_then(|sum| sum.checked_add(processing_fee_cents))
    .ok_or_else(amount_overflow)?;
  let total_cents = items_total_cents
    .checked_add(platform_fee_cents)
    .ok_or_else(amount_overflow)?;
  Ok(CheckoutQuote {
    line_items,
    items_total_cents,
    delivery_fee_cents,
    service_fee_cents,
    processing_fee_cents,
    platform_fee_cents,
    restaurant_payout_cents: items_total_cents,
    total_cents,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn two_items() -> Vec<PricedItem> {
    vec![
      PricedItem {
        name: "Margherita".to_string(),
        unit_price_cents: 1000,
        quantity: 1,
      },
      PricedItem {
        name: "Lasagna".to_string(),
        unit_price_cents: 1500,
        quantity: 1,
      },
    ]
  }

  fn line_sum(q: &CheckoutQuote) -> i64 {
    q.line_items.iter().map(LineItem::amount_cents).sum()
  }

  #[test]
  fn pickup_order_totals() {
    let q = quote_checkout(&two_items(), false, 400, &FeeSchedule::default()).unwrap();
    assert_eq!(q.items_total_cents, 2500);
    assert_eq!(q.delivery_fee_cents, 0);
    assert_eq!(q.service_fee_cents, 229);
    assert_eq!(q.processing_fee_cents, 79);
    assert_eq!(line_sum(&q), 2808);
    assert_eq!(q.total_cents, 2808);
    assert!(q.line_items.iter().all(|l| l.kind != LineItemKind::DeliveryFee));
  }

  #[test]
  fn delivery_order_fee_split() {
    let q = quote_checkout(&two_items(), true, 400, &FeeSchedule::default()).unwrap();
    assert_eq!(q.processing_fee_cents, 91);
    assert_eq!(q.platform_fee_cents, 720);
    assert_eq!(q.restaurant_payout_cents, 2500);
    assert_eq!(line_sum(&q), 2500 + 400 + 229 + 91);
    let kinds: Vec<_> = q.line_items.iter().map(|l| l.kind).collect();
    assert_eq!(
      kinds,
      vec![
        LineItemKind::MenuItem,
        LineItemKind::MenuItem,
        LineItemKind::DeliveryFee,
        LineItemKind::ServiceFee,
        LineItemKind::ProcessingFee
      ]
    );
  }

  #[test]
  fn line_items_always_sum_to_total() {
    let fees = FeeSchedule::default();
    for (price, qty, delivery) in [(0, 1, 0), (1, 1, 0), (999, 3, 150), (12345, 7, 999), (5, 100, 1)] {
      let items = vec![PricedItem {
        name: "x".to_string(),
        unit_price_cents: price,
        quantity: qty,
      }];
      let q = quote_checkout(&items, delivery > 0, delivery, &fees).unwrap();
      assert_eq!(
        line_sum(&q),
        q.items_total_cents + q.delivery_fee_cents + q.service_fee_cents + q.processing_fee_cents
      );
    }
  }

  #[test]
  fn processing_fee_rounds_half_up() {
    let fees = FeeSchedule {
      service_fee_cents: 0,
      processing_fee_bps: 5000,
    };
    assert_eq!(fees.processing_fee(1).unwrap(), 1);
    assert_eq!(fees.processing_fee(3).unwrap(), 2);
  }

  #[test]
  fn oversized_amounts_are_rejected_instead_of_overflowing() {
    let fees = FeeSchedule::default();
    let corrupt_price = vec![PricedItem {
      name: "Caviar".to_string(),
      unit_price_cents: i64::MAX / 2,
      quantity: 3,
    }];
    assert!(matches!(quote_checkout(&corrupt_price, false, 0, &fees), Err(AppError::Validation(_))));

    let near_limit = vec![PricedItem {
      name: "Truffle".to_string(),
      unit_price_cents: i64::MAX / 100,
      quantity: 1,
    }];
    assert!(matches!(quote_checkout(&near_limit, false, 0, &fees), Err(AppError::Validation(_))));
    assert!(matches!(fees.processing_fee(i64::MAX), Err(AppError::Validation(_))));
  }

  #[test]
  fn rejects_empty_orders_and_bad_quantities() {
    let fees = FeeSchedule::default();
    assert!(matches!(quote_checkout(&[], false, 0, &fees), Err(AppError::Validation(_))));
    let bad = vec![PricedItem {
      name: "Soup".to_string(),
      unit_price_cents: 500,
      quantity: 0,
    }];
    assert!(matches!(quote_checkout(&bad, false, 0, &fees), Err(AppError::Validation(_))));
  }
}
