// restaurant_api/tests/payment_webhook_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Utc;
use common::{payment_signature, Fixture};
use restaurant_api::config::AppConfig;
use restaurant_api::models::OrderStatus;
use restaurant_api::services::payment_mock::MockPaymentGateway;
use restaurant_api::services::signature::sign_stripe_payload;
use serde_json::{json, Value};
use uuid::Uuid;

fn session_event(event_type: &str, order_id: Uuid) -> Vec<u8> {
  serde_json::to_vec(&json!({
    "id": "evt_test_1",
    "type": event_type,
    "data": {
      "object": {
        "id": "cs_test_1",
        "metadata": { "orderId": order_id.to_string() },
        "payment_intent": "pi_test_1",
        "customer_details": {
          "name": "Ada Diner",
          "email": "ada@example.com",
          "phone": "+15550100",
          "address": { "line1": "1 Billing Way", "city": "Springfield" }
        },
        "shipping_details": {
          "name": "Ada Diner",
          "address": { "line1": "9 Shipping Rd", "city": "Springfield" }
        }
      }
    }
  }))
  .unwrap()
}

fn signed_request(body: Vec<u8>) -> test::TestRequest {
  let signature = payment_signature(&body);
  test::TestRequest::post()
    .uri("/api/v1/webhooks/payment")
    .insert_header(("Stripe-Signature", signature))
    .set_payload(body)
}

#[actix_web::test]
async fn completed_session_marks_order_paid_and_captures_customer() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let resp = test::call_service(&app, signed_request(session_event("checkout.session.completed", order.id)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "processed");
  assert_eq!(body["orderUpdated"], true);

  let stored = fx.stored_order(order.id).await;
  assert_eq!(stored.status, OrderStatus::Paid);
  assert_eq!(stored.payment_intent_id.as_deref(), Some("pi_test_1"));
  assert_eq!(stored.customer.email.as_deref(), Some("ada@example.com"));
  let address = stored.customer.address.expect("address captured");
  assert_eq!(address.line1.as_deref(), Some("9 Shipping Rd"));
}

#[actix_web::test]
async fn replayed_event_leaves_order_untouched() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;
  let body = session_event("checkout.session.completed", order.id);

  let first = test::call_service(&app, signed_request(body.clone()).to_request()).await;
  assert_eq!(first.status(), StatusCode::OK);
  let after_first = fx.stored_order(order.id).await;

  let second = test::call_service(&app, signed_request(body).to_request()).await;
  assert_eq!(second.status(), StatusCode::OK);
  let body: Value = test::read_body_json(second).await;
  assert_eq!(body["orderUpdated"], false);
  assert_eq!(fx.stored_order(order.id).await, after_first);
}

#[actix_web::test]
async fn expiry_after_payment_does_not_cancel() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::Paid).await;
  let app = test::init_service(fx.app()).await;

  let resp = test::call_service(&app, signed_request(session_event("checkout.session.expired", order.id)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(fx.stored_order(order.id).await.status, OrderStatus::Paid);
}

#[actix_web::test]
async fn expired_session_cancels_order_awaiting_payment() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let resp = test::call_service(&app, signed_request(session_event("checkout.session.expired", order.id)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "processed");
  assert_eq!(fx.stored_order(order.id).await.status, OrderStatus::Cancelled);
}

#[actix_web::test]
async fn async_payment_success_marks_order_paid() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let body = session_event("checkout.session.async_payment_succeeded", order.id);
  let resp = test::call_service(&app, signed_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let stored = fx.stored_order(order.id).await;
  assert_eq!(stored.status, OrderStatus::Paid);
  // Customer capture belongs to the completed event only.
  assert!(stored.customer.email.is_none());
}

#[actix_web::test]
async fn stale_session_failure_after_payment_keeps_order_paid() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::Paid).await;
  let app = test::init_service(fx.app()).await;

  let body = session_event("checkout.session.async_payment_failed", order.id);
  let resp = test::call_service(&app, signed_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["orderUpdated"], false);
  assert_eq!(fx.stored_order(order.id).await, order);
}

#[actix_web::test]
async fn async_payment_failure_cancels_pending_payment() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let body = session_event("checkout.session.async_payment_failed", order.id);
  let resp = test::call_service(&app, signed_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(fx.stored_order(order.id).await.status, OrderStatus::Cancelled);
}

#[actix_web::test]
async fn tampered_body_is_rejected_without_mutation() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let body = session_event("checkout.session.completed", order.id);
  let signature = payment_signature(&body);
  let tampered = session_event("checkout.session.completed", Uuid::new_v4());
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/payment")
    .insert_header(("Stripe-Signature", signature))
    .set_payload(tampered)
    .to_request();

  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(fx.stored_order(order.id).await, order);
}

#[actix_web::test]
async fn stale_signature_timestamp_is_rejected() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let body = session_event("checkout.session.completed", order.id);
  let stale = sign_stripe_payload(&body, common::PAYMENT_SECRET, Utc::now().timestamp() - 3600).unwrap();
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/payment")
    .insert_header(("Stripe-Signature", stale))
    .set_payload(body)
    .to_request();

  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn missing_signature_header_is_rejected() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/payment")
    .set_payload(session_event("checkout.session.completed", order.id))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unhandled_event_type_is_acknowledged() {
  let fx = Fixture::new().await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let body = session_event("payment_intent.created", order.id);
  let resp = test::call_service(&app, signed_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "ignored");
  assert_eq!(fx.stored_order(order.id).await, order);
}

#[actix_web::test]
async fn unknown_order_is_not_found() {
  let fx = Fixture::new().await;
  let app = test::init_service(fx.app()).await;

  let body = session_event("checkout.session.completed", Uuid::new_v4());
  let resp = test::call_service(&app, signed_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn missing_order_metadata_is_a_bad_request() {
  let fx = Fixture::new().await;
  let app = test::init_service(fx.app()).await;

  let body = serde_json::to_vec(&json!({
    "id": "evt_test_2",
    "type": "checkout.session.completed",
    "data": { "object": { "id": "cs_test_2", "metadata": {} } }
  }))
  .unwrap();
  let resp = test::call_service(&app, signed_request(body).to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unconfigured_secret_is_a_server_error() {
  let fx = Fixture::with(AppConfig::for_local(), MockPaymentGateway::new()).await;
  let order = fx.pickup_order(OrderStatus::PaymentProcessing).await;
  let app = test::init_service(fx.app()).await;

  let resp = test::call_service(&app, signed_request(session_event("checkout.session.completed", order.id)).to_request()).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(fx.stored_order(order.id).await.status, OrderStatus::PaymentProcessing);
}

#[actix_web::test]
async fn unknown_webhook_source_is_not_found() {
  let fx = Fixture::new().await;
  let app = test::init_service(fx.app()).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/carrier-pigeon")
    .set_payload("{}")
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
