// restaurant_api/src/web/handlers/mod.rs

pub mod checkout_handlers;
pub mod order_handlers;
pub mod webhook_handlers;
