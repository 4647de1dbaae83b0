// galley/src/conditional/mod.rs

//! Routing a step to one of several scoped sub-pipelines.
//!
//! Each scope pairs a condition on the parent context with a static
//! `Pipeline<SData, Err>` and an extractor producing its `ContextData<SData>`.
//! The first scope whose condition holds is run; its result becomes the step's
//! control signal.

pub mod builder;
pub mod scope;

pub use builder::{ConditionalScopeBuilder, ConditionalScopeConfigurator};
