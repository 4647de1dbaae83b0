// restaurant_api/src/lib.rs

//! Restaurant ordering service: payment and delivery webhook reconciliation,
//! hosted checkout sessions and the restaurant portal, each request-level
//! workflow running as a galley pipeline.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;
