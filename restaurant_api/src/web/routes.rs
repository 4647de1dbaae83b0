// restaurant_api/src/web/routes.rs

use crate::web::handlers::{checkout_handlers, order_handlers, webhook_handlers};
use actix_web::{web, HttpResponse};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Mounted once per worker in `main.rs`, and by the HTTP tests.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/webhooks").route("/{source}", web::post().to(webhook_handlers::webhook_intake_handler)),
      )
      .service(web::scope("/checkout").route("", web::post().to(checkout_handlers::create_checkout_handler)))
      .service(web::scope("/orders").route("/{order_id}", web::get().to(order_handlers::get_order_handler)))
      .service(
        web::scope("/portal")
          .route("/orders", web::get().to(order_handlers::list_portal_orders_handler))
          .route(
            "/orders/{order_id}/status",
            web::post().to(order_handlers::update_order_status_handler),
          ),
      ),
  );
}
