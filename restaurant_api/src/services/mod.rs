// restaurant_api/src/services/mod.rs

pub mod payment_gateway;
pub mod payment_mock;
pub mod pricing;
pub mod signature;
pub mod stripe_gateway;
